use crate::color::{ColorMode, ShapeColor, css_color_to_rgba, parse_css_color};
use crate::stylesheet::Stylesheet;
use crate::types::Color;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::properties::display::{Display, DisplayKeyword, Visibility};
use lightningcss::properties::svg::{SVGPaint, SVGPaintFallback, StrokeDasharray};
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};
use lightningcss::traits::ToCss;
use lightningcss::values::alpha::AlphaValue;
use lightningcss::values::color::CssColor;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeSize {
    S,
    M,
    L,
    Xl,
}

impl StrokeSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeSize::S => "s",
            StrokeSize::M => "m",
            StrokeSize::L => "l",
            StrokeSize::Xl => "xl",
        }
    }

    /// Buckets an effective (already scaled) stroke width.
    pub fn from_width(width: f32) -> Self {
        if width <= 1.0 {
            StrokeSize::S
        } else if width <= 3.0 {
            StrokeSize::M
        } else if width <= 5.0 {
            StrokeSize::L
        } else {
            StrokeSize::Xl
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashStyle {
    Solid,
    Dashed,
    Dotted,
}

impl DashStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashStyle::Solid => "solid",
            DashStyle::Dashed => "dashed",
            DashStyle::Dotted => "dotted",
        }
    }

    /// Classifies a dash array by the dash/gap ratio of its first pair.
    pub fn from_pattern(pattern: &[f32]) -> Self {
        let Some(&dash) = pattern.first() else {
            return DashStyle::Solid;
        };
        if pattern.iter().all(|v| *v <= 0.0) {
            return DashStyle::Solid;
        }
        let gap = pattern.get(1).copied().unwrap_or(dash);
        if gap <= 0.0 {
            return DashStyle::Solid;
        }
        if dash / gap <= 0.5 {
            DashStyle::Dotted
        } else {
            DashStyle::Dashed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    None,
    Semi,
    Solid,
}

impl FillMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillMode::None => "none",
            FillMode::Semi => "semi",
            FillMode::Solid => "solid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub color: ShapeColor,
    pub fill: FillMode,
    pub size: StrokeSize,
    pub dash: DashStyle,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: ShapeColor::default(),
            fill: FillMode::None,
            size: StrokeSize::M,
            dash: DashStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Paint {
    None,
    Color { color: Color, alpha: f32 },
    CurrentColor,
    Reference {
        id: String,
        fallback: Option<(Color, f32)>,
    },
}

// First stop color per gradient id.
pub(crate) type GradientTable = HashMap<String, (Color, f32)>;

/// Cascaded style of one element. `opacity` and `display_none` apply to the
/// element only, everything else inherits.
#[derive(Debug, Clone)]
pub(crate) struct ComputedStyle {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<f32>,
    pub dash_array: Vec<f32>,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
    pub color: Option<(Color, f32)>,
    pub font_size: Option<f32>,
    pub visible: bool,
    pub opacity: f32,
    pub display_none: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: None,
            dash_array: Vec::new(),
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            color: None,
            font_size: None,
            visible: true,
            opacity: 1.0,
            display_none: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PrimaryPaint {
    pub color: Color,
    pub opacity: f32,
    pub from_fill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Importance {
    Normal,
    Important,
}

const PRESENTATION_ATTRIBUTES: [&str; 11] = [
    "fill",
    "stroke",
    "stroke-width",
    "stroke-dasharray",
    "opacity",
    "fill-opacity",
    "stroke-opacity",
    "color",
    "font-size",
    "display",
    "visibility",
];

impl ComputedStyle {
    fn inherit(&self) -> Self {
        Self {
            opacity: 1.0,
            display_none: false,
            ..self.clone()
        }
    }

    /// Cascade for `node`: inherited values, then presentation attributes,
    /// then stylesheet rules, then the inline `style` attribute, with
    /// `!important` declarations applied last in the same source order.
    pub fn compute(
        node: roxmltree::Node<'_, '_>,
        parent: &ComputedStyle,
        stylesheet: &Stylesheet,
    ) -> ComputedStyle {
        let mut style = parent.inherit();

        for name in PRESENTATION_ATTRIBUTES {
            if let Some(value) = node.attribute(name) {
                style.apply_named(name, value);
            }
        }

        let rules = stylesheet.matching(node);
        let inline = node.attribute("style");
        for importance in [Importance::Normal, Importance::Important] {
            for declarations in &rules {
                style.apply_block(declarations, importance);
            }
            if let Some(inline) = inline {
                style.apply_block(inline, importance);
            }
        }

        style
    }

    // The manual scan runs first so values lightningcss keeps unparsed
    // (unitless SVG lengths, for one) still land; typed properties then win.
    fn apply_block(&mut self, input: &str, importance: Importance) {
        for decl in split_declarations(input) {
            let wanted = match importance {
                Importance::Normal => !decl.important,
                Importance::Important => decl.important,
            };
            if wanted {
                self.apply_named(&decl.name, decl.value);
            }
        }

        if let Ok(parsed) = StyleAttribute::parse(input, ParserOptions::default()) {
            let props = match importance {
                Importance::Normal => &parsed.declarations.declarations,
                Importance::Important => &parsed.declarations.important_declarations,
            };
            for prop in props {
                self.apply_property(prop);
            }
        }
    }

    fn apply_property(&mut self, prop: &Property<'_>) {
        match prop {
            Property::Fill(paint) => {
                if let Some(paint) = paint_from_css(paint) {
                    self.fill = Some(paint);
                }
            }
            Property::Stroke(paint) => {
                if let Some(paint) = paint_from_css(paint) {
                    self.stroke = Some(paint);
                }
            }
            Property::StrokeWidth(value) => {
                if let Ok(raw) = value.to_css_string(PrinterOptions::default()) {
                    if let Some(v) = parse_length(&raw) {
                        self.stroke_width = Some(v.max(0.0));
                    }
                }
            }
            Property::StrokeDasharray(value) => match value {
                StrokeDasharray::None => self.dash_array.clear(),
                StrokeDasharray::Values(values) => {
                    let list = values
                        .iter()
                        .filter_map(|v| v.to_css_string(PrinterOptions::default()).ok())
                        .filter_map(|raw| parse_length(&raw))
                        .collect();
                    self.dash_array = repeat_odd(list);
                }
            },
            Property::Opacity(value) => self.opacity = alpha_value(value),
            Property::FillOpacity(value) => self.fill_opacity = alpha_value(value),
            Property::StrokeOpacity(value) => self.stroke_opacity = alpha_value(value),
            Property::Color(color) => {
                if let Some(rgba) = css_color_to_rgba(color) {
                    self.color = Some(rgba);
                }
            }
            Property::FontSize(size) => {
                if let Ok(raw) = size.to_css_string(PrinterOptions::default()) {
                    if let Some(v) = parse_length(&raw) {
                        self.font_size = Some(v.max(0.0));
                    }
                }
            }
            Property::Display(display) => {
                self.display_none = matches!(display, Display::Keyword(DisplayKeyword::None));
            }
            Property::Visibility(visibility) => {
                self.visible = matches!(visibility, Visibility::Visible);
            }
            _ => {}
        }
    }

    // Shared by presentation attributes and declarations lightningcss rejects.
    fn apply_named(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.eq_ignore_ascii_case("inherit") {
            return;
        }
        match name {
            "fill" => {
                if let Some(paint) = parse_paint(value) {
                    self.fill = Some(paint);
                }
            }
            "stroke" => {
                if let Some(paint) = parse_paint(value) {
                    self.stroke = Some(paint);
                }
            }
            "stroke-width" => {
                if let Some(v) = parse_length(value) {
                    self.stroke_width = Some(v.max(0.0));
                }
            }
            "stroke-dasharray" => {
                if value.eq_ignore_ascii_case("none") {
                    self.dash_array.clear();
                } else {
                    self.dash_array = repeat_odd(parse_length_list(value));
                }
            }
            "opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.opacity = v;
                }
            }
            "fill-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.fill_opacity = v;
                }
            }
            "stroke-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.stroke_opacity = v;
                }
            }
            "color" => {
                if let Some(rgba) = parse_css_color(value) {
                    self.color = Some(rgba);
                }
            }
            "font-size" => {
                if let Some(v) = parse_length(value) {
                    self.font_size = Some(v.max(0.0));
                }
            }
            "display" => self.display_none = value.eq_ignore_ascii_case("none"),
            "visibility" => {
                self.visible = !(value.eq_ignore_ascii_case("hidden")
                    || value.eq_ignore_ascii_case("collapse"));
            }
            _ => {}
        }
    }

    /// Picks the color that represents the element: an explicit fill, else an
    /// explicit stroke, else black. `None` when both are explicitly `none`.
    pub fn primary_paint(&self, gradients: &GradientTable) -> Option<PrimaryPaint> {
        if matches!(
            (&self.fill, &self.stroke),
            (Some(Paint::None), Some(Paint::None))
        ) {
            return None;
        }
        if let Some(paint) = self.fill.as_ref().filter(|p| **p != Paint::None) {
            let (color, alpha) = self.paint_color(paint, gradients);
            return Some(PrimaryPaint {
                color,
                opacity: (self.fill_opacity * alpha).clamp(0.0, 1.0),
                from_fill: true,
            });
        }
        if let Some(paint) = self.stroke.as_ref().filter(|p| **p != Paint::None) {
            let (color, alpha) = self.paint_color(paint, gradients);
            return Some(PrimaryPaint {
                color,
                opacity: (self.stroke_opacity * alpha).clamp(0.0, 1.0),
                from_fill: false,
            });
        }
        Some(PrimaryPaint {
            color: Color::BLACK,
            opacity: 1.0,
            from_fill: false,
        })
    }

    fn paint_color(&self, paint: &Paint, gradients: &GradientTable) -> (Color, f32) {
        match paint {
            Paint::Color { color, alpha } => (*color, *alpha),
            Paint::CurrentColor => self.color.unwrap_or((Color::BLACK, 1.0)),
            Paint::Reference { id, fallback } => gradients
                .get(id)
                .copied()
                .or(*fallback)
                .unwrap_or((Color::BLACK, 1.0)),
            Paint::None => (Color::BLACK, 0.0),
        }
    }

    /// Maps the cascaded style onto the host editor's discrete style axes.
    /// `scale` is the composed matrix scale factor.
    pub fn shape_style(
        &self,
        primary: &PrimaryPaint,
        closed: bool,
        scale: f32,
        color_mode: ColorMode,
        translucent_fills: bool,
    ) -> ShapeStyle {
        let size = match self.stroke_width {
            Some(width) => StrokeSize::from_width(width * scale),
            None => StrokeSize::M,
        };
        let fill = if primary.from_fill && closed {
            if translucent_fills {
                FillMode::Semi
            } else {
                FillMode::Solid
            }
        } else {
            FillMode::None
        };
        ShapeStyle {
            color: ShapeColor::resolve(primary.color, color_mode),
            fill,
            size,
            dash: DashStyle::from_pattern(&self.dash_array),
        }
    }
}

fn paint_from_css(paint: &SVGPaint<'_>) -> Option<Paint> {
    match paint {
        SVGPaint::None => Some(Paint::None),
        SVGPaint::Color(color) => paint_from_color(color),
        SVGPaint::Url { url, fallback } => {
            let fallback_color = match fallback {
                Some(SVGPaintFallback::Color(color)) => css_color_to_rgba(color),
                _ => None,
            };
            let raw = url.url.as_ref().trim();
            match raw.strip_prefix('#').filter(|id| !id.is_empty()) {
                Some(id) => Some(Paint::Reference {
                    id: id.to_string(),
                    fallback: fallback_color,
                }),
                None => match fallback {
                    Some(SVGPaintFallback::None) => Some(Paint::None),
                    _ => fallback_color.map(|(color, alpha)| Paint::Color { color, alpha }),
                },
            }
        }
        SVGPaint::ContextFill | SVGPaint::ContextStroke => None,
    }
}

fn paint_from_color(color: &CssColor) -> Option<Paint> {
    if matches!(color, CssColor::CurrentColor) {
        return Some(Paint::CurrentColor);
    }
    css_color_to_rgba(color).map(|(color, alpha)| Paint::Color { color, alpha })
}

pub(crate) fn parse_paint(input: &str) -> Option<Paint> {
    let v = input.trim();
    if v.eq_ignore_ascii_case("none") {
        return Some(Paint::None);
    }
    if v.eq_ignore_ascii_case("currentcolor") {
        return Some(Paint::CurrentColor);
    }
    if let Some((id, rest)) = parse_url_ref(v) {
        return Some(Paint::Reference {
            id,
            fallback: parse_css_color(rest),
        });
    }
    parse_css_color(v).map(|(color, alpha)| Paint::Color { color, alpha })
}

// `url(#id) fallback` -> (id, fallback text).
fn parse_url_ref(input: &str) -> Option<(String, &str)> {
    let s = input.trim();
    if !s.get(..4)?.eq_ignore_ascii_case("url(") {
        return None;
    }
    let close = s.find(')')?;
    let inner = s[4..close].trim().trim_matches('"').trim_matches('\'');
    let id = inner.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), s[close + 1..].trim()))
}

fn alpha_value(value: &AlphaValue) -> f32 {
    value.0.clamp(0.0, 1.0)
}

fn repeat_odd(mut list: Vec<f32>) -> Vec<f32> {
    if list.len() % 2 == 1 {
        let dup = list.clone();
        list.extend_from_slice(&dup);
    }
    list
}

pub(crate) fn parse_opacity(input: &str) -> Option<f32> {
    let s = input.trim();
    let v = match s.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => s.parse::<f32>().ok()?,
    };
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

/// Parses an SVG length in user units. Absolute units convert at 96dpi;
/// percentages and font-relative units are not resolved.
pub(crate) fn parse_length(input: &str) -> Option<f32> {
    let s = input.trim();
    let (number, scale) = [
        ("px", 1.0),
        ("pt", 96.0 / 72.0),
        ("pc", 16.0),
        ("mm", 96.0 / 25.4),
        ("cm", 96.0 / 2.54),
        ("in", 96.0),
    ]
    .iter()
    .find_map(|(unit, scale)| s.strip_suffix(unit).map(|n| (n, *scale)))
    .unwrap_or((s, 1.0));
    let v = number.trim().parse::<f32>().ok()? * scale;
    v.is_finite().then_some(v)
}

pub(crate) fn parse_length_list(input: &str) -> Vec<f32> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(parse_length)
        .collect()
}

pub(crate) struct Declaration<'a> {
    pub name: String,
    pub value: &'a str,
    pub important: bool,
}

pub(crate) fn split_declarations(input: &str) -> Vec<Declaration<'_>> {
    let mut out = Vec::new();
    for decl in input.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let mut value = value.trim();
        let mut important = false;
        if let Some(idx) = value.to_ascii_lowercase().rfind("!important") {
            value = value[..idx].trim();
            important = true;
        }
        out.push(Declaration {
            name,
            value,
            important,
        });
    }
    out
}

/// Resolves every `linearGradient`/`radialGradient` id to its first stop
/// color, following `href` chains for gradients without stops of their own.
pub(crate) fn collect_gradients(
    doc: &roxmltree::Document<'_>,
    stylesheet: &Stylesheet,
) -> GradientTable {
    let mut table = GradientTable::new();
    let mut pending: Vec<(String, String)> = Vec::new();

    for node in doc.descendants().filter(|n| {
        n.is_element()
            && matches!(
                n.tag_name().name(),
                "linearGradient" | "radialGradient"
            )
    }) {
        let Some(id) = node.attribute("id") else {
            continue;
        };
        let first_stop = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == "stop");
        match first_stop {
            Some(stop) => {
                table.insert(id.to_string(), stop_color(stop, stylesheet));
            }
            None => {
                if let Some(target) = crate::svg::href_id(node) {
                    pending.push((id.to_string(), target));
                }
            }
        }
    }

    // Bounded so href cycles terminate.
    for _ in 0..pending.len() {
        let mut progressed = false;
        for (id, target) in &pending {
            if table.contains_key(id) {
                continue;
            }
            if let Some(value) = table.get(target).copied() {
                table.insert(id.clone(), value);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    table
}

fn stop_color(node: roxmltree::Node<'_, '_>, stylesheet: &Stylesheet) -> (Color, f32) {
    let mut color = node.attribute("stop-color");
    let mut opacity = node.attribute("stop-opacity");

    let rules = stylesheet.matching(node);
    let inline = node.attribute("style");
    for important in [false, true] {
        for block in rules.iter().copied().chain(inline) {
            for decl in split_declarations(block) {
                if decl.important != important {
                    continue;
                }
                match decl.name.as_str() {
                    "stop-color" => color = Some(decl.value),
                    "stop-opacity" => opacity = Some(decl.value),
                    _ => {}
                }
            }
        }
    }

    let (color, alpha) = color
        .and_then(parse_css_color)
        .unwrap_or((Color::BLACK, 1.0));
    let opacity = opacity.and_then(parse_opacity).unwrap_or(1.0);
    (color, alpha * opacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(svg: &str, id: &str) -> ComputedStyle {
        let doc = roxmltree::Document::parse(svg).expect("test svg should parse");
        let sheet = Stylesheet::from_document(&doc);
        let mut style = ComputedStyle::default();
        let target = doc
            .descendants()
            .find(|n| n.attribute("id") == Some(id))
            .expect("target element exists");
        let mut chain: Vec<_> = target.ancestors().filter(|n| n.is_element()).collect();
        chain.reverse();
        for node in chain {
            style = ComputedStyle::compute(node, &style, &sheet);
        }
        style
    }

    #[test]
    fn inline_style_beats_stylesheet_beats_attribute() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <style>.a { fill: #00ff00; } #t { stroke-width: 4 }</style>
            <rect id="t" class="a" fill="#ff0000" stroke-width="1" style="fill: #0000ff"/>
        </svg>"##;
        let style = computed(svg, "t");
        assert_eq!(
            style.fill,
            Some(Paint::Color {
                color: Color::rgb(0.0, 0.0, 1.0),
                alpha: 1.0
            })
        );
        assert_eq!(style.stroke_width, Some(4.0));
    }

    #[test]
    fn important_stylesheet_rule_beats_inline() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <style>rect { fill: #ff0000 !important; }</style>
            <rect id="t" style="fill: #0000ff"/>
        </svg>"##;
        let style = computed(svg, "t");
        assert_eq!(
            style.fill,
            Some(Paint::Color {
                color: Color::rgb(1.0, 0.0, 0.0),
                alpha: 1.0
            })
        );
    }

    #[test]
    fn fill_and_stroke_inherit_but_opacity_does_not() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <g fill="red" stroke-width="6" opacity="0.5" fill-opacity="0.4">
                <path id="t" d="M0 0"/>
            </g>
        </svg>"##;
        let style = computed(svg, "t");
        assert!(matches!(style.fill, Some(Paint::Color { .. })));
        assert_eq!(style.stroke_width, Some(6.0));
        assert_eq!(style.opacity, 1.0);
        assert!((style.fill_opacity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn primary_paint_precedence() {
        let gradients = GradientTable::new();
        let mut style = ComputedStyle::default();
        let black = style.primary_paint(&gradients).expect("default is visible");
        assert_eq!(black.color, Color::BLACK);
        assert!(!black.from_fill);

        style.stroke = parse_paint("#ff0000");
        style.stroke_opacity = 0.5;
        let stroke = style.primary_paint(&gradients).expect("stroke is visible");
        assert!(!stroke.from_fill);
        assert_eq!(stroke.opacity, 0.5);

        style.fill = parse_paint("rgba(0, 0, 255, 0.5)");
        let fill = style.primary_paint(&gradients).expect("fill is visible");
        assert!(fill.from_fill);
        assert!((fill.opacity - 0.5).abs() < 0.01);

        style.fill = Some(Paint::None);
        style.stroke = Some(Paint::None);
        assert!(style.primary_paint(&gradients).is_none());
    }

    #[test]
    fn current_color_and_gradient_references_resolve() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
            <defs>
                <linearGradient id="g1"><stop offset="0" stop-color="#00ff00"/><stop offset="1" stop-color="#000"/></linearGradient>
                <linearGradient id="g2" xlink:href="#g1"/>
                <radialGradient id="g3"><stop style="stop-color: #ff0000; stop-opacity: 0.5"/></radialGradient>
            </defs>
            <g color="#0000ff"><rect id="t" fill="currentColor"/></g>
        </svg>"##;
        let doc = roxmltree::Document::parse(svg).expect("test svg should parse");
        let sheet = Stylesheet::from_document(&doc);
        let gradients = collect_gradients(&doc, &sheet);
        assert_eq!(gradients.get("g1").map(|g| g.0.to_hex()), Some("#00ff00".to_string()));
        assert_eq!(gradients.get("g2").map(|g| g.0.to_hex()), Some("#00ff00".to_string()));
        let (red, alpha) = gradients.get("g3").copied().expect("g3 resolved");
        assert_eq!(red.to_hex(), "#ff0000");
        assert!((alpha - 0.5).abs() < 1e-6);

        let style = computed(svg, "t");
        let primary = style.primary_paint(&gradients).expect("visible");
        assert_eq!(primary.color.to_hex(), "#0000ff");

        let mut by_ref = ComputedStyle::default();
        by_ref.fill = parse_paint("url(#g2)");
        let primary = by_ref.primary_paint(&gradients).expect("visible");
        assert_eq!(primary.color.to_hex(), "#00ff00");
        by_ref.fill = parse_paint("url(#missing) #ff0000");
        let primary = by_ref.primary_paint(&gradients).expect("visible");
        assert_eq!(primary.color.to_hex(), "#ff0000");
    }

    #[test]
    fn size_dash_and_fill_heuristics() {
        assert_eq!(StrokeSize::from_width(0.5), StrokeSize::S);
        assert_eq!(StrokeSize::from_width(1.0), StrokeSize::S);
        assert_eq!(StrokeSize::from_width(2.5), StrokeSize::M);
        assert_eq!(StrokeSize::from_width(5.0), StrokeSize::L);
        assert_eq!(StrokeSize::from_width(12.0), StrokeSize::Xl);

        assert_eq!(DashStyle::from_pattern(&[]), DashStyle::Solid);
        assert_eq!(DashStyle::from_pattern(&[0.0, 0.0]), DashStyle::Solid);
        assert_eq!(DashStyle::from_pattern(&[1.0, 4.0]), DashStyle::Dotted);
        assert_eq!(DashStyle::from_pattern(&[6.0, 3.0]), DashStyle::Dashed);
        assert_eq!(DashStyle::from_pattern(&[5.0]), DashStyle::Dashed);

        let mut style = ComputedStyle::default();
        style.fill = parse_paint("#ff0000");
        style.stroke_width = Some(2.0);
        let primary = style
            .primary_paint(&GradientTable::new())
            .expect("visible");
        let closed = style.shape_style(&primary, true, 3.0, ColorMode::Palette, true);
        assert_eq!(closed.fill, FillMode::Semi);
        assert_eq!(closed.size, StrokeSize::Xl);
        let solid = style.shape_style(&primary, true, 1.0, ColorMode::Palette, false);
        assert_eq!(solid.fill, FillMode::Solid);
        let open = style.shape_style(&primary, false, 1.0, ColorMode::Palette, true);
        assert_eq!(open.fill, FillMode::None);
        assert_eq!(open.size, StrokeSize::M);
    }

    #[test]
    fn legacy_declaration_split_handles_important() {
        let decls = split_declarations("fill: red; stroke:blue !important;;bogus");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "fill");
        assert!(!decls[0].important);
        assert_eq!(decls[1].value, "blue");
        assert!(decls[1].important);
    }

    #[test]
    fn lengths_and_opacities() {
        assert_eq!(parse_length("12px"), Some(12.0));
        assert_eq!(parse_length("1in"), Some(96.0));
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_opacity("50%"), Some(0.5));
        assert_eq!(parse_opacity("2"), Some(1.0));
        assert_eq!(parse_length_list("4, 2 1"), vec![4.0, 2.0, 1.0]);
    }
}
