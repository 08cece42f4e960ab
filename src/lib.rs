mod assets;
mod color;
mod debug;
mod error;
mod matrix;
mod metadata;
mod path;
mod perf;
mod shape;
mod style;
mod stylesheet;
mod svg;
mod types;

pub use color::{ColorMode, PaletteColor, ShapeColor};
use debug::DebugLogger;
pub use error::InkportError;
pub use inkport_format::{EmbeddedPayload, FileType, FormatError};
pub use matrix::{Matrix, compose, parse_transform};
pub use metadata::{FallbackReason, ImportOutcome, StructuredDocument};
pub use path::{
    CoordinateRescale, DEFAULT_ARC_SEGMENTS, DEFAULT_CURVE_SEGMENTS, FlattenTolerance,
    PathCommand, PathConfig, convert_path, normalize_winding, sanitize_path_data,
    segments_to_path_data, tokenize_path_data,
};
use perf::{DEFAULT_PERF_LOG, PerfLogger};
pub use shape::{
    Diagnostic, Extraction, GeoKind, ImagePayload, ImageSource, ShapeKind, ShapeRecord, ViewBox,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
pub use style::{DashStyle, FillMode, ShapeStyle, StrokeSize};
use svg::{ExtractOptions, PhaseTimings};
pub use types::{Bounds, Color, Point, Segment, SegmentKind};

/// Extracts a shape graph with default settings and no logging.
pub fn extract_shapes(svg: &str) -> Result<Extraction, InkportError> {
    let doc = svg::parse_document(svg)?;
    let (extraction, _) = svg::extract_document(&doc, &ExtractOptions::default())?;
    Ok(extraction)
}

pub struct Importer {
    options: ExtractOptions,
    debug: Option<Arc<DebugLogger>>,
    perf: Option<Arc<PerfLogger>>,
    next_import_id: AtomicUsize,
}

impl Default for Importer {
    fn default() -> Self {
        Self {
            options: ExtractOptions::default(),
            debug: None,
            perf: None,
            next_import_id: AtomicUsize::new(1),
        }
    }
}

impl Importer {
    pub fn builder() -> ImporterBuilder {
        ImporterBuilder::new()
    }

    pub fn path_config(&self) -> &PathConfig {
        &self.options.path
    }

    pub fn color_mode(&self) -> ColorMode {
        self.options.color_mode
    }

    /// Flattens one path `d` attribute with this importer's path settings.
    pub fn convert_path(&self, d: &str) -> Vec<Segment> {
        convert_path(d, &self.options.path)
    }

    /// Geometric extraction only; any embedded structured payload is ignored.
    pub fn extract(&self, svg: &str) -> Result<Extraction, InkportError> {
        let import_id = self.next_import_id();
        let parse_start = Instant::now();
        let doc = svg::parse_document(svg)?;
        let parse_ms = parse_start.elapsed().as_secs_f64() * 1000.0;
        let extraction = self.extract_parsed(&doc, import_id, parse_ms)?;
        self.emit_debug_summary("extract");
        Ok(extraction)
    }

    /// Structured-first import: the embedded drawing payload when it is present
    /// and trustworthy, otherwise the geometric extraction and the reason.
    /// A `Parse` error means the input should be treated as an opaque image.
    pub fn import_document(&self, svg: &str) -> Result<ImportOutcome, InkportError> {
        let import_id = self.next_import_id();
        let parse_start = Instant::now();
        let doc = svg::parse_document(svg)?;
        let parse_ms = parse_start.elapsed().as_secs_f64() * 1000.0;

        let outcome = match metadata::resolve_structured(&doc) {
            Ok(structured) => {
                if let Some(logger) = self.debug.as_deref() {
                    logger.log_structured(import_id, &structured);
                }
                if let Some(perf) = self.perf.as_deref() {
                    perf.log_parse(import_id, parse_ms);
                }
                ImportOutcome::Structured(structured)
            }
            Err(reason) => {
                if let FallbackReason::CorruptPayload(err) = &reason {
                    eprintln!(
                        "[inkport][svg] import {}: embedded payload ignored: {}",
                        import_id, err
                    );
                }
                if let Some(logger) = self.debug.as_deref() {
                    logger.log_fallback(import_id, &reason);
                }
                let extraction = self.extract_parsed(&doc, import_id, parse_ms)?;
                ImportOutcome::Geometric { extraction, reason }
            }
        };
        self.emit_debug_summary("import");
        Ok(outcome)
    }

    fn next_import_id(&self) -> usize {
        self.next_import_id.fetch_add(1, Ordering::Relaxed)
    }

    fn extract_parsed(
        &self,
        doc: &roxmltree::Document<'_>,
        import_id: usize,
        parse_ms: f64,
    ) -> Result<Extraction, InkportError> {
        let (extraction, timings) = svg::extract_document(doc, &self.options)?;
        self.report(import_id, &extraction, parse_ms, &timings);
        Ok(extraction)
    }

    fn report(
        &self,
        import_id: usize,
        extraction: &Extraction,
        parse_ms: f64,
        timings: &PhaseTimings,
    ) {
        let skipped = extraction.diagnostics.len();
        if skipped > 0 {
            let mut preview: Vec<String> = extraction
                .diagnostics
                .iter()
                .take(3)
                .map(|d| match &d.id {
                    Some(id) => format!("<{} id={}>: {}", d.element, id, d.message),
                    None => format!("<{}>: {}", d.element, d.message),
                })
                .collect();
            if skipped > preview.len() {
                preview.push("...".to_string());
            }
            eprintln!(
                "[inkport][svg] import {}: skipped {} element(s) ({})",
                import_id,
                skipped,
                preview.join(", ")
            );
        }

        if let Some(logger) = self.debug.as_deref() {
            logger.log_extraction(import_id, extraction);
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.log_import(import_id, parse_ms, timings, extraction);
        }
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary(context);
            logger.flush();
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.flush();
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImporterBuilder {
    options: ExtractOptions,
    debug_path: Option<PathBuf>,
    perf_path: Option<PathBuf>,
    perf_enabled: bool,
}

impl Default for ImporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImporterBuilder {
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            debug_path: None,
            perf_path: None,
            perf_enabled: false,
        }
    }

    // Sample steps for cubic and quadratic Béziers.
    pub fn curve_segments(mut self, segments: u32) -> Self {
        self.options.path.curve_segments = segments;
        self
    }

    pub fn arc_segments(mut self, segments: u32) -> Self {
        self.options.path.arc_segments = segments;
        self
    }

    // `None` samples every curve at the full step count.
    pub fn flatten_tolerance(mut self, tolerance: Option<FlattenTolerance>) -> Self {
        self.options.path.flatten = tolerance;
        self
    }

    pub fn rescale_large_coordinates(mut self, rescale: Option<CoordinateRescale>) -> Self {
        self.options.path.rescale = rescale;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.options.color_mode = mode;
        self
    }

    // Closed filled shapes get `FillMode::Semi` when true, `FillMode::Solid` otherwise.
    pub fn translucent_fills(mut self, enabled: bool) -> Self {
        self.options.translucent_fills = enabled;
        self
    }

    pub fn preserve_groups(mut self, enabled: bool) -> Self {
        self.options.preserve_groups = enabled;
        self
    }

    // Convert path data on the rayon pool. Output order is unchanged.
    pub fn parallel_paths(mut self, enabled: bool) -> Self {
        self.options.parallel_paths = enabled;
        self
    }

    // Enable debug logging to a JSONL file for skipped-element inspection.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    // Enable performance logging to a JSONL file for timing/counter inspection.
    pub fn perf_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.perf_enabled = true;
        self.perf_path = Some(path.into());
        self
    }

    // Toggle performance logging (uses default file when enabled and no path is set).
    pub fn perf_enabled(mut self, enabled: bool) -> Self {
        self.perf_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<Importer, InkportError> {
        validate_path_config(&self.options.path)?;
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        let perf = if self.perf_enabled || self.perf_path.is_some() {
            let path = self
                .perf_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PERF_LOG));
            Some(Arc::new(PerfLogger::new(path)?))
        } else {
            None
        };
        Ok(Importer {
            options: self.options,
            debug,
            perf,
            next_import_id: AtomicUsize::new(1),
        })
    }
}

fn validate_path_config(config: &PathConfig) -> Result<(), InkportError> {
    if config.curve_segments == 0 {
        return Err(InkportError::InvalidConfiguration(
            "curve_segments must be >= 1".to_string(),
        ));
    }
    if config.arc_segments == 0 {
        return Err(InkportError::InvalidConfiguration(
            "arc_segments must be >= 1".to_string(),
        ));
    }
    if let Some(tolerance) = config.flatten {
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(tolerance.epsilon) || !valid(tolerance.chord_fraction) {
            return Err(InkportError::InvalidConfiguration(
                "flatten tolerance must be finite and non-negative".to_string(),
            ));
        }
    }
    if let Some(rescale) = config.rescale {
        if !(rescale.factor > 0.0 && rescale.factor <= 1.0) {
            return Err(InkportError::InvalidConfiguration(
                "rescale factor must be in (0, 1]".to_string(),
            ));
        }
        if !(rescale.threshold.is_finite() && rescale.threshold > 0.0) {
            return Err(InkportError::InvalidConfiguration(
                "rescale threshold must be finite and positive".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "inkport_{}_{}.jsonl",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn builder_rejects_invalid_settings() {
        let cases = [
            Importer::builder().curve_segments(0),
            Importer::builder().arc_segments(0),
            Importer::builder().flatten_tolerance(Some(FlattenTolerance {
                epsilon: -1.0,
                chord_fraction: 0.001,
            })),
            Importer::builder().flatten_tolerance(Some(FlattenTolerance {
                epsilon: 0.01,
                chord_fraction: f32::NAN,
            })),
            Importer::builder().rescale_large_coordinates(Some(CoordinateRescale {
                threshold: 10_000.0,
                factor: 1.5,
            })),
            Importer::builder().rescale_large_coordinates(Some(CoordinateRescale {
                threshold: 10_000.0,
                factor: 0.0,
            })),
        ];
        for builder in cases {
            assert!(
                matches!(builder.build(), Err(InkportError::InvalidConfiguration(_))),
                "expected invalid configuration"
            );
        }
        assert!(Importer::builder().build().is_ok());
    }

    #[test]
    fn importer_uses_its_path_settings() {
        let importer = Importer::builder()
            .curve_segments(4)
            .flatten_tolerance(None)
            .build()
            .expect("importer");
        let segments = importer.convert_path("M 0 0 C 0 10 10 10 10 0");
        assert_eq!(segments[0].points.len(), 5);
        assert_eq!(importer.path_config().curve_segments, 4);
    }

    #[test]
    fn pass_through_keeps_literal_colors() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><rect width="4" height="4" fill="#123456"/></svg>"##;
        let importer = Importer::builder()
            .color_mode(ColorMode::PassThrough)
            .translucent_fills(false)
            .build()
            .expect("importer");
        let extraction = importer.extract(svg).expect("extract");
        let style = extraction.shapes[0].style;
        assert_eq!(style.color.to_hex(), "#123456");
        assert_eq!(style.fill, FillMode::Solid);

        let snapped = extract_shapes(svg).expect("extract");
        assert!(snapped.shapes[0].style.color.palette().is_some());
        assert_eq!(snapped.shapes[0].style.fill, FillMode::Semi);
    }

    #[test]
    fn import_prefers_structured_payload() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <metadata><tldraw>{"meta":{"fileType":"inkWriting"},"tldraw":{"store":{"shape:1":{"typeName":"shape"}}}}</tldraw></metadata>
            <rect width="4" height="4"/>
        </svg>"#;
        let outcome = Importer::default().import_document(svg).expect("import");
        match outcome {
            ImportOutcome::Structured(doc) => {
                assert_eq!(doc.shape_count, 1);
                assert_eq!(doc.payload.file_type, FileType::Writing);
            }
            other => panic!("expected structured import, got {:?}", other),
        }
    }

    #[test]
    fn empty_payload_with_images_retries_geometrically() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <metadata><tldraw>{"meta":{"fileType":"inkDrawing"},"tldraw":{"store":{}}}</tldraw></metadata>
            <image href="a.png" width="10" height="10"/>
            <image href="b.png" x="20" width="10" height="10"/>
        </svg>"#;
        match Importer::default().import_document(svg).expect("import") {
            ImportOutcome::Geometric { extraction, reason } => {
                assert_eq!(reason, FallbackReason::EmptyPayloadWithImages { images: 2 });
                assert_eq!(extraction.images.len(), 2);
                assert_eq!(extraction.image_reference_count(), 2);
            }
            other => panic!("expected geometric fallback, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_input_is_a_parse_error() {
        let result = Importer::default().import_document("\u{89}PNG not xml");
        assert!(matches!(result, Err(InkportError::Parse(_))));
        let outcome = Importer::default()
            .import_document(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#)
            .expect("empty svg imports");
        match outcome {
            ImportOutcome::Geometric { extraction, reason } => {
                assert_eq!(reason, FallbackReason::NoPayload);
                assert!(extraction.is_empty());
            }
            other => panic!("expected geometric fallback, got {:?}", other),
        }
    }

    #[test]
    fn debug_log_records_skips_and_counts() {
        let log_path = temp_log_path("skips");
        let importer = Importer::builder()
            .debug_log(&log_path)
            .build()
            .expect("importer");
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect id="flat" width="0" height="3"/>
            <circle r="2"/>
        </svg>"#;
        let extraction = importer.extract(svg).expect("extract");
        assert_eq!(extraction.shapes.len(), 1);
        drop(importer);

        let log = std::fs::read_to_string(&log_path).expect("read debug log");
        let lines: Vec<serde_json::Value> = log
            .lines()
            .map(|line| serde_json::from_str(line).expect("jsonl line"))
            .collect();
        assert_eq!(lines[0]["type"], "svg.skip");
        assert_eq!(lines[0]["id"], "flat");
        let summary = lines.last().expect("summary line");
        assert_eq!(summary["type"], "debug.summary");
        assert_eq!(summary["counts"]["svg.shapes"], 1);
        assert_eq!(summary["counts"]["svg.skipped"], 1);
        let _ = std::fs::remove_file(log_path);
    }

    #[test]
    fn perf_log_records_phase_spans() {
        let log_path = temp_log_path("perf");
        let importer = Importer::builder()
            .perf_log(&log_path)
            .parallel_paths(true)
            .build()
            .expect("importer");
        importer
            .extract(r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L5 5"/></svg>"#)
            .expect("extract");
        drop(importer);

        let log = std::fs::read_to_string(&log_path).expect("read perf log");
        for phase in ["svg.parse", "svg.walk", "svg.paths", "svg.assemble"] {
            assert!(log.contains(&format!("\"{}\"", phase)), "missing span {}", phase);
        }
        assert!(log.contains("\"perf.counts\""));
        let hot = log_path.with_file_name(format!(
            "inkport_perf_{}_hot.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(log_path);
        let _ = std::fs::remove_file(hot);
    }
}
