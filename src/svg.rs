use crate::assets::{ResolvedImage, asset_key};
use crate::color::ColorMode;
use crate::error::InkportError;
use crate::matrix::{Matrix, compose, parse_number_list, parse_transform};
use crate::path::{PathConfig, convert_path_in_context, normalize_winding};
use crate::shape::{
    Diagnostic, Extraction, GeoKind, ImagePayload, ShapeKind, ShapeRecord, ViewBox,
};
use crate::style::{ComputedStyle, GradientTable, ShapeStyle, collect_gradients, parse_length};
use crate::stylesheet::Stylesheet;
use crate::types::{Bounds, Segment};
use rayon::prelude::*;
use roxmltree::{Node, NodeId};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

// Deeply chained <use> references multiply work; past this depth they are skipped.
const MAX_USE_DEPTH: usize = 32;

const DEFAULT_FONT_SIZE: f32 = 16.0;
// Average glyph advance as a fraction of the font size, for text extents.
const GLYPH_ADVANCE: f32 = 0.6;

// Elements whose content is never drawn in place.
const NON_RENDERED: [&str; 16] = [
    "defs",
    "symbol",
    "clipPath",
    "mask",
    "pattern",
    "marker",
    "linearGradient",
    "radialGradient",
    "filter",
    "style",
    "script",
    "metadata",
    "title",
    "desc",
    "foreignObject",
    "font",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ExtractOptions {
    pub path: PathConfig,
    pub color_mode: ColorMode,
    pub translucent_fills: bool,
    pub preserve_groups: bool,
    pub parallel_paths: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            path: PathConfig::default(),
            color_mode: ColorMode::Palette,
            translucent_fills: true,
            preserve_groups: false,
            parallel_paths: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PhaseTimings {
    pub walk_ms: f64,
    pub paths_ms: f64,
    pub assemble_ms: f64,
}

/// Parses SVG text, tolerating a byte-order mark, leading whitespace and a DOCTYPE.
pub(crate) fn parse_document(svg: &str) -> Result<roxmltree::Document<'_>, InkportError> {
    let text = svg.trim_start_matches('\u{feff}').trim_start();
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    Ok(roxmltree::Document::parse_with_options(text, options)?)
}

pub(crate) fn find_root<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Option<Node<'a, 'input>> {
    let root = doc.root_element();
    if root.tag_name().name() == "svg" {
        return Some(root);
    }
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "svg")
}

pub(crate) fn href_value<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute("href")
        .or_else(|| node.attribute((XLINK_NS, "href")))
}

pub(crate) fn href_id(node: Node<'_, '_>) -> Option<String> {
    let raw = href_value(node)?.trim();
    let id = raw.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

/// Walks a parsed document into shape records, image payloads and diagnostics.
pub(crate) fn extract_document(
    doc: &roxmltree::Document<'_>,
    options: &ExtractOptions,
) -> Result<(Extraction, PhaseTimings), InkportError> {
    let root = find_root(doc).ok_or(InkportError::MissingRoot)?;
    let mut timings = PhaseTimings::default();

    let walk_start = Instant::now();
    let view_box = root.attribute("viewBox").and_then(ViewBox::parse);
    let stylesheet = Stylesheet::from_document(doc);
    let gradients = collect_gradients(doc, &stylesheet);
    let mut walker = Walker {
        options,
        stylesheet,
        gradients,
        ids: build_id_map(doc),
        origin: view_box.map(|vb| (vb.min_x, vb.min_y)).unwrap_or((0.0, 0.0)),
        has_view_box: view_box.is_some(),
        items: Vec::new(),
        images: BTreeMap::new(),
        image_assets: HashMap::new(),
        image_ordinal: 0,
        diagnostics: Vec::new(),
        use_stack: Vec::new(),
    };
    walker.walk_root(root);
    timings.walk_ms = elapsed_ms(walk_start);

    let paths_start = Instant::now();
    let converted: Vec<Vec<Segment>> = {
        let jobs: Vec<&PathJob> = walker
            .items
            .iter()
            .filter_map(|item| match item {
                Pending::Path(job) => Some(job),
                _ => None,
            })
            .collect();
        let convert =
            |job: &&PathJob| convert_path_in_context(&job.data, &options.path, job.has_context);
        if options.parallel_paths {
            jobs.par_iter().map(convert).collect()
        } else {
            jobs.iter().map(convert).collect()
        }
    };
    timings.paths_ms = elapsed_ms(paths_start);

    let assemble_start = Instant::now();
    let Walker {
        items,
        images,
        mut diagnostics,
        origin,
        ..
    } = walker;
    let shapes = assemble(items, converted, origin, &mut diagnostics);
    timings.assemble_ms = elapsed_ms(assemble_start);

    Ok((
        Extraction {
            shapes,
            images,
            diagnostics,
            view_box,
        },
        timings,
    ))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn build_id_map<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> HashMap<&'a str, Node<'a, 'input>> {
    let mut out = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if let Some(id) = node.attribute("id") {
            // First wins.
            out.entry(id).or_insert(node);
        }
    }
    out
}

struct Draft {
    source_id: Option<String>,
    kind: ShapeKind,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    rotation: f32,
    opacity: f32,
    style: ShapeStyle,
}

impl Draft {
    fn into_record(self, id: String) -> ShapeRecord {
        ShapeRecord {
            id,
            source_id: self.source_id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            opacity: self.opacity.clamp(0.0, 1.0),
            style: self.style,
        }
    }
}

struct PathJob {
    element: String,
    source_id: Option<String>,
    data: String,
    matrix: Matrix,
    has_context: bool,
    open_style: ShapeStyle,
    closed_style: ShapeStyle,
    opacity: f32,
}

impl PathJob {
    // Linear part onto the points, translation once onto the record origin.
    fn into_draft(self, segments: Vec<Segment>, origin: (f32, f32)) -> Result<Draft, Diagnostic> {
        let mut transformed: Vec<Segment> = segments
            .into_iter()
            .filter_map(|mut segment| {
                for p in &mut segment.points {
                    let (x, y) = self.matrix.apply_linear(p.x, p.y);
                    p.x = x;
                    p.y = y;
                }
                // Scaling can push huge coordinates past f32 range.
                segment.points.retain(|p| p.x.is_finite() && p.y.is_finite());
                (!segment.points.is_empty()).then_some(segment)
            })
            .collect();
        if self.matrix.determinant() < 0.0 {
            normalize_winding(&mut transformed);
        }

        let Some(bounds) = transformed
            .iter()
            .filter_map(Segment::bounds)
            .reduce(Bounds::union)
        else {
            return Err(Diagnostic {
                element: self.element,
                id: self.source_id,
                message: "path data produced no geometry".to_string(),
            });
        };

        for segment in &mut transformed {
            for p in &mut segment.points {
                *p = p.offset(-bounds.min_x, -bounds.min_y);
            }
        }
        let closed = transformed.iter().any(|s| s.closed);
        let (e, f) = self.matrix.translation();
        Ok(Draft {
            source_id: self.source_id,
            kind: ShapeKind::Freeform {
                segments: transformed,
                closed,
            },
            x: e + bounds.min_x - origin.0,
            y: f + bounds.min_y - origin.1,
            width: bounds.width(),
            height: bounds.height(),
            rotation: 0.0,
            opacity: self.opacity,
            style: if closed {
                self.closed_style
            } else {
                self.open_style
            },
        })
    }
}

enum Pending {
    Shape(Draft),
    Path(PathJob),
    GroupStart {
        source_id: Option<String>,
        opacity: f32,
    },
    GroupEnd,
}

struct OpenGroup {
    source_id: Option<String>,
    opacity: f32,
    children: Vec<String>,
    bounds: Option<Bounds>,
}

// Ids are assigned in document order; a group gets its id after its children.
fn assemble(
    items: Vec<Pending>,
    converted: Vec<Vec<Segment>>,
    origin: (f32, f32),
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ShapeRecord> {
    let mut shapes = Vec::new();
    let mut converted = converted.into_iter();
    let mut groups: Vec<OpenGroup> = Vec::new();

    for item in items {
        let draft = match item {
            Pending::Shape(draft) => draft,
            Pending::Path(job) => {
                let segments = converted.next().unwrap_or_default();
                match job.into_draft(segments, origin) {
                    Ok(draft) => draft,
                    Err(diagnostic) => {
                        diagnostics.push(diagnostic);
                        continue;
                    }
                }
            }
            Pending::GroupStart { source_id, opacity } => {
                groups.push(OpenGroup {
                    source_id,
                    opacity,
                    children: Vec::new(),
                    bounds: None,
                });
                continue;
            }
            Pending::GroupEnd => {
                let Some(group) = groups.pop() else { continue };
                let Some(bounds) = group.bounds else { continue };
                Draft {
                    source_id: group.source_id,
                    kind: ShapeKind::Group {
                        children: group.children,
                    },
                    x: bounds.min_x,
                    y: bounds.min_y,
                    width: bounds.width(),
                    height: bounds.height(),
                    rotation: 0.0,
                    opacity: group.opacity,
                    style: ShapeStyle::default(),
                }
            }
        };

        let record = draft.into_record(format!("shape:{}", shapes.len() + 1));
        if let Some(parent) = groups.last_mut() {
            parent.children.push(record.id.clone());
            let b = record.bounds();
            parent.bounds = Some(parent.bounds.map_or(b, |acc| acc.union(b)));
        }
        shapes.push(record);
    }

    shapes
}

struct Walker<'a, 'input> {
    options: &'a ExtractOptions,
    stylesheet: Stylesheet,
    gradients: GradientTable,
    ids: HashMap<&'a str, Node<'a, 'input>>,
    origin: (f32, f32),
    has_view_box: bool,
    items: Vec<Pending>,
    images: BTreeMap<String, ImagePayload>,
    // One payload per <image> element, however many times it is referenced.
    image_assets: HashMap<NodeId, (String, f32, f32)>,
    image_ordinal: usize,
    diagnostics: Vec<Diagnostic>,
    use_stack: Vec<NodeId>,
}

impl<'a, 'input> Walker<'a, 'input> {
    fn walk_root(&mut self, root: Node<'a, 'input>) {
        let style = ComputedStyle::compute(root, &ComputedStyle::default(), &self.stylesheet);
        if style.display_none {
            return;
        }
        let matrix = root
            .attribute("transform")
            .map(parse_transform)
            .unwrap_or(Matrix::IDENTITY);
        let opacity = style.opacity.clamp(0.0, 1.0);
        self.walk_children(root, &style, matrix, opacity);
    }

    fn walk_children(
        &mut self,
        node: Node<'a, 'input>,
        style: &ComputedStyle,
        matrix: Matrix,
        opacity: f32,
    ) {
        for child in node.children() {
            self.walk(child, style, matrix, opacity);
        }
    }

    fn walk(
        &mut self,
        node: Node<'a, 'input>,
        parent_style: &ComputedStyle,
        parent_matrix: Matrix,
        parent_opacity: f32,
    ) {
        if !node.is_element() {
            return;
        }
        let tag = node.tag_name().name();
        if NON_RENDERED.contains(&tag) {
            if tag == "defs" {
                self.register_defs_images(node);
            }
            return;
        }

        let style = ComputedStyle::compute(node, parent_style, &self.stylesheet);
        if style.display_none {
            return;
        }
        let local = node
            .attribute("transform")
            .map(parse_transform)
            .unwrap_or(Matrix::IDENTITY);
        let matrix = compose(local, parent_matrix);
        let opacity = (parent_opacity * style.opacity).clamp(0.0, 1.0);

        match tag {
            "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" | "path" | "text"
                if !style.visible => {}
            "rect" => self.rect(node, &style, matrix, opacity),
            "circle" | "ellipse" => self.ellipse(node, &style, matrix, opacity),
            "line" | "polyline" | "polygon" => self.poly(node, &style, matrix, opacity),
            "path" => match node.attribute("d").map(str::trim).filter(|d| !d.is_empty()) {
                Some(d) => self.push_path(node, d.to_string(), &style, matrix, opacity),
                None => self.skip(node, "missing path data"),
            },
            "image" => {
                if style.visible {
                    self.image(node, matrix, opacity);
                }
            }
            "text" => self.text(node, &style, matrix, opacity),
            "use" => self.use_element(node, &style, matrix, opacity),
            "svg" => {
                let offset = Matrix::translate(
                    attr_length(node, "x").unwrap_or(0.0),
                    attr_length(node, "y").unwrap_or(0.0),
                );
                self.walk_children(node, &style, compose(offset, matrix), opacity);
            }
            "g" if self.options.preserve_groups => {
                self.items.push(Pending::GroupStart {
                    source_id: source_id(node),
                    opacity,
                });
                self.walk_children(node, &style, matrix, opacity);
                self.items.push(Pending::GroupEnd);
            }
            _ => self.walk_children(node, &style, matrix, opacity),
        }
    }

    fn skip(&mut self, node: Node<'_, '_>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            element: node.tag_name().name().to_string(),
            id: source_id(node),
            message: message.into(),
        });
    }

    fn rect(&mut self, node: Node<'a, 'input>, style: &ComputedStyle, matrix: Matrix, opacity: f32) {
        let x = attr_length(node, "x").unwrap_or(0.0);
        let y = attr_length(node, "y").unwrap_or(0.0);
        let (Some(w), Some(h)) = (attr_length(node, "width"), attr_length(node, "height")) else {
            self.skip(node, "missing or unsupported width/height");
            return;
        };
        if w <= 0.0 || h <= 0.0 {
            self.skip(node, "zero or negative size");
            return;
        }
        self.push_geometry(node, GeoKind::Rectangle, (x, y, w, h), style, matrix, opacity);
    }

    fn ellipse(
        &mut self,
        node: Node<'a, 'input>,
        style: &ComputedStyle,
        matrix: Matrix,
        opacity: f32,
    ) {
        let cx = attr_length(node, "cx").unwrap_or(0.0);
        let cy = attr_length(node, "cy").unwrap_or(0.0);
        let (rx, ry) = if node.tag_name().name() == "circle" {
            let r = attr_length(node, "r");
            (r, r)
        } else {
            let rx = attr_length(node, "rx");
            let ry = attr_length(node, "ry");
            (rx.or(ry), ry.or(rx))
        };
        let (Some(rx), Some(ry)) = (rx, ry) else {
            self.skip(node, "missing radius");
            return;
        };
        if rx <= 0.0 || ry <= 0.0 {
            self.skip(node, "zero or negative radius");
            return;
        }
        self.push_geometry(
            node,
            GeoKind::Ellipse,
            (cx - rx, cy - ry, 2.0 * rx, 2.0 * ry),
            style,
            matrix,
            opacity,
        );
    }

    // Local box corners through the linear part, then the axis-aligned hull.
    fn push_geometry(
        &mut self,
        node: Node<'a, 'input>,
        geo: GeoKind,
        (x, y, w, h): (f32, f32, f32, f32),
        style: &ComputedStyle,
        matrix: Matrix,
        opacity: f32,
    ) {
        let Some(primary) = style.primary_paint(&self.gradients) else {
            self.skip(node, "fill and stroke are both none");
            return;
        };
        let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        let Some(bounds) =
            Bounds::from_points(corners.iter().map(|&(px, py)| matrix.apply_linear(px, py)))
        else {
            self.skip(node, "non-finite geometry");
            return;
        };
        let (e, f) = matrix.translation();
        let shape_style = style.shape_style(
            &primary,
            true,
            matrix.scale_factor(),
            self.options.color_mode,
            self.options.translucent_fills,
        );
        self.items.push(Pending::Shape(Draft {
            source_id: source_id(node),
            kind: ShapeKind::Geometry { geo },
            x: e + bounds.min_x - self.origin.0,
            y: f + bounds.min_y - self.origin.1,
            width: bounds.width(),
            height: bounds.height(),
            rotation: 0.0,
            opacity: opacity * primary.opacity,
            style: shape_style,
        }));
    }

    fn poly(&mut self, node: Node<'a, 'input>, style: &ComputedStyle, matrix: Matrix, opacity: f32) {
        let tag = node.tag_name().name();
        let points: Vec<(f32, f32)> = if tag == "line" {
            let coord = |name| attr_length(node, name).unwrap_or(0.0);
            vec![(coord("x1"), coord("y1")), (coord("x2"), coord("y2"))]
        } else {
            let nums = node
                .attribute("points")
                .map(parse_number_list)
                .unwrap_or_default();
            nums.chunks_exact(2).map(|c| (c[0], c[1])).collect()
        };
        let Some(((x0, y0), rest)) = points.split_first() else {
            self.skip(node, "no points");
            return;
        };

        let mut d = format!("M {} {}", x0, y0);
        for (x, y) in rest {
            d.push_str(&format!(" L {} {}", x, y));
        }
        if tag == "polygon" {
            d.push_str(" Z");
        }
        self.push_path(node, d, style, matrix, opacity);
    }

    fn push_path(
        &mut self,
        node: Node<'a, 'input>,
        data: String,
        style: &ComputedStyle,
        matrix: Matrix,
        opacity: f32,
    ) {
        let Some(primary) = style.primary_paint(&self.gradients) else {
            self.skip(node, "fill and stroke are both none");
            return;
        };
        let scale = matrix.scale_factor();
        let (mode, translucent) = (self.options.color_mode, self.options.translucent_fills);
        self.items.push(Pending::Path(PathJob {
            element: node.tag_name().name().to_string(),
            source_id: source_id(node),
            data,
            matrix,
            has_context: self.has_view_box || !matrix.is_identity(),
            open_style: style.shape_style(&primary, false, scale, mode, translucent),
            closed_style: style.shape_style(&primary, true, scale, mode, translucent),
            opacity: opacity * primary.opacity,
        }));
    }

    fn register_defs_images(&mut self, defs: Node<'a, 'input>) {
        for node in defs
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "image")
        {
            if let Err(message) = self.register_image(node, Matrix::IDENTITY) {
                self.skip(node, message);
            }
        }
    }

    fn register_image(
        &mut self,
        node: Node<'a, 'input>,
        matrix: Matrix,
    ) -> Result<(String, f32, f32), String> {
        if let Some(hit) = self.image_assets.get(&node.id()) {
            return Ok(hit.clone());
        }
        let href = href_value(node).ok_or_else(|| "missing href".to_string())?;
        let resolved = ResolvedImage::from_href(href)?;
        let intrinsic = resolved.intrinsic_size();
        let width = attr_length(node, "width").or(intrinsic.map(|(w, _)| w as f32));
        let height = attr_length(node, "height").or(intrinsic.map(|(_, h)| h as f32));
        let (Some(w), Some(h)) = (width, height) else {
            return Err("image size is unknown".to_string());
        };
        if w <= 0.0 || h <= 0.0 {
            return Err("zero or negative image size".to_string());
        }

        self.image_ordinal += 1;
        let key = asset_key(self.image_ordinal, &resolved);
        let (x, y) = matrix.apply(
            attr_length(node, "x").unwrap_or(0.0),
            attr_length(node, "y").unwrap_or(0.0),
        );
        self.images.insert(
            key.clone(),
            ImagePayload {
                asset_id: key.clone(),
                source: resolved.source,
                width: w,
                height: h,
                x: x - self.origin.0,
                y: y - self.origin.1,
            },
        );
        self.image_assets.insert(node.id(), (key.clone(), w, h));
        Ok((key, w, h))
    }

    fn image(&mut self, node: Node<'a, 'input>, matrix: Matrix, opacity: f32) {
        let (asset_id, w, h) = match self.register_image(node, matrix) {
            Ok(found) => found,
            Err(message) => {
                self.skip(node, message);
                return;
            }
        };
        let (x, y) = matrix.apply(
            attr_length(node, "x").unwrap_or(0.0),
            attr_length(node, "y").unwrap_or(0.0),
        );
        self.items.push(Pending::Shape(Draft {
            source_id: source_id(node),
            kind: ShapeKind::Image { asset_id },
            x: x - self.origin.0,
            y: y - self.origin.1,
            width: w * matrix.x_scale(),
            height: h * matrix.y_scale(),
            rotation: matrix.rotation(),
            opacity,
            style: ShapeStyle::default(),
        }));
    }

    fn text(&mut self, node: Node<'a, 'input>, style: &ComputedStyle, matrix: Matrix, opacity: f32) {
        let content = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if content.is_empty() {
            self.skip(node, "empty text");
            return;
        }
        let Some(primary) = style.primary_paint(&self.gradients) else {
            self.skip(node, "fill and stroke are both none");
            return;
        };

        let font_size = style.font_size.unwrap_or(DEFAULT_FONT_SIZE);
        let first = |name: &str| {
            node.attribute(name)
                .map(parse_number_list)
                .and_then(|v| v.first().copied())
                .unwrap_or(0.0)
        };
        // y is the baseline; the record box starts one font size above it.
        let (x, y) = matrix.apply(first("x"), first("y") - font_size);
        let scale = matrix.scale_factor();
        let glyphs = content.chars().count() as f32;
        self.items.push(Pending::Shape(Draft {
            source_id: source_id(node),
            kind: ShapeKind::Text {
                text: content,
                font_size: font_size * scale,
            },
            x: x - self.origin.0,
            y: y - self.origin.1,
            width: glyphs * font_size * GLYPH_ADVANCE * matrix.x_scale(),
            height: font_size * matrix.y_scale(),
            rotation: matrix.rotation(),
            opacity: opacity * primary.opacity,
            style: style.shape_style(
                &primary,
                false,
                scale,
                self.options.color_mode,
                self.options.translucent_fills,
            ),
        }));
    }

    fn use_element(
        &mut self,
        node: Node<'a, 'input>,
        style: &ComputedStyle,
        matrix: Matrix,
        opacity: f32,
    ) {
        let Some(id) = href_id(node) else {
            self.skip(node, "missing or external reference");
            return;
        };
        let Some(target) = self.ids.get(id.as_str()).copied() else {
            self.skip(node, format!("unresolved reference #{}", id));
            return;
        };
        let cyclic = self.use_stack.contains(&target.id())
            || node.ancestors().any(|a| a.id() == target.id());
        if cyclic {
            self.skip(node, format!("reference cycle through #{}", id));
            return;
        }
        if self.use_stack.len() >= MAX_USE_DEPTH {
            self.skip(node, "reference nesting too deep");
            return;
        }

        let offset = Matrix::translate(
            attr_length(node, "x").unwrap_or(0.0),
            attr_length(node, "y").unwrap_or(0.0),
        );
        let matrix = compose(offset, matrix);

        self.use_stack.push(target.id());
        match target.tag_name().name() {
            // Templates are only drawn through a reference.
            "symbol" => {
                let symbol_style = ComputedStyle::compute(target, style, &self.stylesheet);
                if !symbol_style.display_none {
                    let opacity = (opacity * symbol_style.opacity).clamp(0.0, 1.0);
                    self.walk_children(target, &symbol_style, matrix, opacity);
                }
            }
            _ => self.walk(target, style, matrix, opacity),
        }
        self.use_stack.pop();
    }
}

fn source_id(node: Node<'_, '_>) -> Option<String> {
    node.attribute("id").map(str::to_string)
}

fn attr_length(node: Node<'_, '_>, name: &str) -> Option<f32> {
    node.attribute(name).and_then(parse_length)
}
