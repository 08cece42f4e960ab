use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::debug::json_escape;
use crate::shape::Extraction;
use crate::svg::PhaseTimings;

pub(crate) const DEFAULT_PERF_LOG: &str = "inkport_perf.log";

/// Per-import timings for the parse, walk, path and assemble phases, with
/// output volume counts. Totals are ranked into `_hot.log` when the last
/// handle is dropped.
#[derive(Clone)]
pub(crate) struct PerfLogger {
    inner: Arc<Mutex<PerfState>>,
}

struct PerfState {
    writer: BufWriter<File>,
    path: PathBuf,
    span_totals: HashMap<String, f64>,
    span_counts: HashMap<String, u64>,
    count_totals: HashMap<String, u64>,
}

impl PerfLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(PerfState {
                writer: BufWriter::new(file),
                path,
                span_totals: HashMap::new(),
                span_counts: HashMap::new(),
                count_totals: HashMap::new(),
            })),
        })
    }

    pub fn log_parse(&self, import_id: usize, parse_ms: f64) {
        self.log_span_ms("svg.parse", Some(import_id), parse_ms);
    }

    pub fn log_import(
        &self,
        import_id: usize,
        parse_ms: f64,
        timings: &PhaseTimings,
        extraction: &Extraction,
    ) {
        self.log_parse(import_id, parse_ms);
        self.log_span_ms("svg.walk", Some(import_id), timings.walk_ms);
        self.log_span_ms("svg.paths", Some(import_id), timings.paths_ms);
        self.log_span_ms("svg.assemble", Some(import_id), timings.assemble_ms);
        let segments = extraction.shapes.iter().flat_map(|s| s.segments());
        let (segment_count, points) = segments.fold((0u64, 0u64), |(n, p), s| {
            (n + 1, p + s.points.len() as u64)
        });
        self.log_counts(
            "svg",
            Some(import_id),
            &[
                ("shapes", extraction.shapes.len() as u64),
                ("images", extraction.images.len() as u64),
                ("segments", segment_count),
                ("points", points),
                ("skipped", extraction.diagnostics.len() as u64),
            ],
        );
    }

    fn log_span_ms(&self, name: &str, import_id: Option<usize>, ms: f64) {
        let json = format!(
            "{{\"type\":\"perf.span\",\"name\":\"{}\",\"import_id\":{},\"unit\":\"ms\",\"ms\":{:.3}}}",
            json_escape(name),
            id_json(import_id),
            ms
        );
        if let Ok(mut state) = self.inner.lock() {
            *state.span_totals.entry(name.to_string()).or_insert(0.0) += ms;
            let entry = state.span_counts.entry(name.to_string()).or_insert(0);
            *entry = entry.saturating_add(1);
            let _ = writeln!(state.writer, "{json}");
        }
    }

    fn log_counts(&self, name: &str, import_id: Option<usize>, counts: &[(&str, u64)]) {
        let body = counts
            .iter()
            .map(|(key, value)| format!("\"{}\":{}", json_escape(key), value))
            .collect::<Vec<_>>()
            .join(",");
        let json = format!(
            "{{\"type\":\"perf.counts\",\"name\":\"{}\",\"import_id\":{},\"counts\":{{{}}}}}",
            json_escape(name),
            id_json(import_id),
            body
        );
        if let Ok(mut state) = self.inner.lock() {
            for (key, value) in counts {
                let entry = state.count_totals.entry(format!("{name}.{key}")).or_insert(0);
                *entry = entry.saturating_add(*value);
            }
            let _ = writeln!(state.writer, "{json}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

fn id_json(import_id: Option<usize>) -> String {
    import_id
        .map(|v| v.to_string())
        .unwrap_or_else(|| "null".to_string())
}

impl Drop for PerfState {
    fn drop(&mut self) {
        let _ = self.writer.flush();
        let Ok(file) = File::create(hot_path_for(&self.path)) else {
            return;
        };
        let mut writer = BufWriter::new(file);

        let mut spans: Vec<(&String, &f64)> = self.span_totals.iter().collect();
        spans.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (rank, (name, ms)) in spans.into_iter().take(100).enumerate() {
            let count = *self.span_counts.get(name).unwrap_or(&1);
            let avg = if count == 0 { 0.0 } else { ms / count as f64 };
            let _ = writeln!(
                writer,
                "{{\"type\":\"perf.hot.span\",\"rank\":{},\"name\":\"{}\",\"unit\":\"ms\",\"ms\":{:.3},\"count\":{},\"avg_ms\":{:.3}}}",
                rank + 1,
                json_escape(name),
                ms,
                count,
                avg
            );
        }

        let mut counts: Vec<(&String, &u64)> = self.count_totals.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (rank, (name, value)) in counts.into_iter().take(100).enumerate() {
            let _ = writeln!(
                writer,
                "{{\"type\":\"perf.hot.count\",\"rank\":{},\"name\":\"{}\",\"value\":{}}}",
                rank + 1,
                json_escape(name),
                value
            );
        }
    }
}

fn hot_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_PERF_LOG);
    let stem = file_name
        .rsplit_once('.')
        .map(|(s, _)| s)
        .unwrap_or(file_name);
    path.with_file_name(format!("{stem}_hot.log"))
}
