use crate::metadata::{FallbackReason, StructuredDocument};
use crate::shape::{Diagnostic, Extraction};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSONL record of what each import did: skipped elements, the kinds of
/// records emitted, and whether the embedded payload was used.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: HashMap<String, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: HashMap::new(),
            })),
        })
    }

    fn log_json(&self, json: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{json}");
        }
    }

    /// One `svg.skip` line per diagnostic, then an `svg.extract` line with
    /// record counts by kind.
    pub fn log_extraction(&self, import_id: usize, extraction: &Extraction) {
        for diagnostic in &extraction.diagnostics {
            self.log_skip(import_id, diagnostic);
        }
        let mut kinds: BTreeMap<&str, u64> = BTreeMap::new();
        for shape in &extraction.shapes {
            *kinds.entry(shape.kind.as_str()).or_insert(0) += 1;
        }
        let by_kind = kinds
            .iter()
            .map(|(kind, n)| format!("\"{}\":{}", kind, n))
            .collect::<Vec<_>>()
            .join(",");
        let view_box = extraction
            .view_box
            .map(|vb| format!("[{},{},{},{}]", vb.min_x, vb.min_y, vb.width, vb.height))
            .unwrap_or_else(|| "null".to_string());
        self.log_json(&format!(
            "{{\"type\":\"svg.extract\",\"import_id\":{},\"kinds\":{{{}}},\"images\":{},\"skipped\":{},\"view_box\":{}}}",
            import_id,
            by_kind,
            extraction.images.len(),
            extraction.diagnostics.len(),
            view_box
        ));
        self.increment("svg.shapes", extraction.shapes.len() as u64);
        self.increment("svg.images", extraction.images.len() as u64);
        self.increment("svg.skipped", extraction.diagnostics.len() as u64);
    }

    fn log_skip(&self, import_id: usize, diagnostic: &Diagnostic) {
        let id = diagnostic
            .id
            .as_deref()
            .map(|v| format!("\"{}\"", json_escape(v)))
            .unwrap_or_else(|| "null".to_string());
        self.log_json(&format!(
            "{{\"type\":\"svg.skip\",\"import_id\":{},\"element\":\"{}\",\"id\":{},\"message\":\"{}\"}}",
            import_id,
            json_escape(&diagnostic.element),
            id,
            json_escape(&diagnostic.message)
        ));
    }

    pub fn log_structured(&self, import_id: usize, structured: &StructuredDocument) {
        let plugin_version = structured
            .payload
            .plugin_version
            .as_deref()
            .map(|v| format!("\"{}\"", json_escape(v)))
            .unwrap_or_else(|| "null".to_string());
        self.log_json(&format!(
            "{{\"type\":\"import.structured\",\"import_id\":{},\"shapes\":{},\"images\":{},\"plugin_version\":{},\"fingerprint\":\"{}\"}}",
            import_id,
            structured.shape_count,
            structured.image_reference_count,
            plugin_version,
            structured.fingerprint
        ));
        self.increment("import.structured", 1);
    }

    pub fn log_fallback(&self, import_id: usize, reason: &FallbackReason) {
        let detail = match reason {
            FallbackReason::NoPayload => "null".to_string(),
            FallbackReason::CorruptPayload(err) => {
                format!("\"{}\"", json_escape(&err.to_string()))
            }
            FallbackReason::EmptyPayloadWithImages { images } => images.to_string(),
        };
        self.log_json(&format!(
            "{{\"type\":\"import.fallback\",\"import_id\":{},\"reason\":\"{}\",\"detail\":{}}}",
            import_id,
            reason.as_str(),
            detail
        ));
        self.increment("import.fallback", 1);
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let mut counters: Vec<(String, u64)> = state.counters.drain().collect();
            counters.sort_by(|a, b| a.0.cmp(&b.0));
            let counts = counters
                .iter()
                .map(|(key, value)| format!("\"{}\":{}", json_escape(key), value))
                .collect::<Vec<_>>()
                .join(",");
            let json = format!(
                "{{\"type\":\"debug.summary\",\"context\":\"{}\",\"counts\":{{{}}}}}",
                json_escape(context),
                counts
            );
            let _ = writeln!(state.writer, "{json}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(json_escape("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(json_escape("\u{1}"), "\\u0001");
    }

    fn temp_log(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("inkport_debug_{}_{}.jsonl", name, std::process::id()))
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .expect("log file should exist")
            .lines()
            .map(|line| serde_json::from_str(line).expect("jsonl line"))
            .collect()
    }

    #[test]
    fn extraction_records_skips_kinds_and_summary() {
        let path = temp_log("extract");
        let extraction = crate::extract_shapes(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 20">
                <rect id="r&quot;1" width="0" height="3"/>
                <rect width="4" height="4"/><circle r="2"/>
                <path d="M 0 0 L 5 5"/>
            </svg>"#,
        )
        .expect("svg extracts");
        let logger = DebugLogger::new(&path).expect("temp file should be writable");
        logger.log_extraction(3, &extraction);
        logger.log_extraction(4, &extraction);
        logger.emit_summary("test");
        logger.flush();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["type"], "svg.skip");
        assert_eq!(lines[0]["id"], "r\"1");
        assert_eq!(lines[0]["import_id"], 3);
        assert_eq!(lines[1]["type"], "svg.extract");
        assert_eq!(lines[1]["kinds"]["geo"], 2);
        assert_eq!(lines[1]["kinds"]["freeform"], 1);
        assert_eq!(lines[1]["view_box"][2], 40.0);
        let summary = &lines[4];
        assert_eq!(summary["type"], "debug.summary");
        assert_eq!(summary["counts"]["svg.shapes"], 6);
        assert_eq!(summary["counts"]["svg.skipped"], 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn fallback_records_carry_reason_detail() {
        let path = temp_log("fallback");
        let logger = DebugLogger::new(&path).expect("temp file should be writable");
        logger.log_fallback(1, &FallbackReason::NoPayload);
        logger.log_fallback(2, &FallbackReason::EmptyPayloadWithImages { images: 4 });
        logger.emit_summary("import");
        logger.flush();

        let lines = read_lines(&path);
        assert_eq!(lines[0]["reason"], "no_payload");
        assert!(lines[0]["detail"].is_null());
        assert_eq!(lines[1]["reason"], "empty_payload_with_images");
        assert_eq!(lines[1]["detail"], 4);
        assert_eq!(lines[2]["counts"]["import.fallback"], 2);
        let _ = std::fs::remove_file(&path);
    }
}
