use crate::types::Color;
use lightningcss::traits::Parse;
use lightningcss::values::color::{CssColor, SRGB};

/// The host editor's fixed color set. SVG colors snap to the nearest entry
/// unless [`ColorMode::PassThrough`] is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    Black,
    Grey,
    LightViolet,
    Violet,
    Blue,
    LightBlue,
    Yellow,
    Orange,
    Green,
    LightGreen,
    LightRed,
    Red,
    White,
}

impl PaletteColor {
    pub const ALL: [PaletteColor; 13] = [
        PaletteColor::Black,
        PaletteColor::Grey,
        PaletteColor::LightViolet,
        PaletteColor::Violet,
        PaletteColor::Blue,
        PaletteColor::LightBlue,
        PaletteColor::Yellow,
        PaletteColor::Orange,
        PaletteColor::Green,
        PaletteColor::LightGreen,
        PaletteColor::LightRed,
        PaletteColor::Red,
        PaletteColor::White,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteColor::Black => "black",
            PaletteColor::Grey => "grey",
            PaletteColor::LightViolet => "light-violet",
            PaletteColor::Violet => "violet",
            PaletteColor::Blue => "blue",
            PaletteColor::LightBlue => "light-blue",
            PaletteColor::Yellow => "yellow",
            PaletteColor::Orange => "orange",
            PaletteColor::Green => "green",
            PaletteColor::LightGreen => "light-green",
            PaletteColor::LightRed => "light-red",
            PaletteColor::Red => "red",
            PaletteColor::White => "white",
        }
    }

    // Light theme solid values.
    pub fn color(&self) -> Color {
        let (r, g, b) = match self {
            PaletteColor::Black => (0x1d, 0x1d, 0x1d),
            PaletteColor::Grey => (0x9f, 0xa8, 0xb2),
            PaletteColor::LightViolet => (0xe0, 0x85, 0xf4),
            PaletteColor::Violet => (0xae, 0x3e, 0xc9),
            PaletteColor::Blue => (0x44, 0x65, 0xe9),
            PaletteColor::LightBlue => (0x4b, 0xa1, 0xf1),
            PaletteColor::Yellow => (0xf1, 0xac, 0x4b),
            PaletteColor::Orange => (0xe1, 0x69, 0x19),
            PaletteColor::Green => (0x09, 0x92, 0x68),
            PaletteColor::LightGreen => (0x4c, 0xb0, 0x5e),
            PaletteColor::LightRed => (0xf8, 0x77, 0x77),
            PaletteColor::Red => (0xe0, 0x31, 0x31),
            PaletteColor::White => (0xff, 0xff, 0xff),
        };
        Color::from_rgb8(r, g, b)
    }

    /// Nearest palette entry by Euclidean RGB distance. Ties keep the earlier entry.
    pub fn nearest(color: Color) -> PaletteColor {
        let mut best = PaletteColor::Black;
        let mut best_distance = f32::INFINITY;
        for candidate in Self::ALL {
            let d = candidate.color().distance_sq(color);
            if d < best_distance {
                best = candidate;
                best_distance = d;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Palette,
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeColor {
    Palette(PaletteColor),
    Literal(Color),
}

impl ShapeColor {
    pub fn resolve(color: Color, mode: ColorMode) -> Self {
        match mode {
            ColorMode::Palette => ShapeColor::Palette(PaletteColor::nearest(color)),
            ColorMode::PassThrough => ShapeColor::Literal(color),
        }
    }

    pub fn palette(&self) -> Option<PaletteColor> {
        match self {
            ShapeColor::Palette(p) => Some(*p),
            ShapeColor::Literal(_) => None,
        }
    }

    pub fn to_hex(&self) -> String {
        match self {
            ShapeColor::Palette(p) => p.color().to_hex(),
            ShapeColor::Literal(c) => c.to_hex(),
        }
    }
}

impl Default for ShapeColor {
    fn default() -> Self {
        ShapeColor::Palette(PaletteColor::Black)
    }
}

/// Any CSS color syntax lightningcss understands: hex, rgb(), hsl(), names.
/// Returns the color and its alpha. `currentColor` and `none` yield `None`.
pub(crate) fn parse_css_color(input: &str) -> Option<(Color, f32)> {
    let v = input.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("none") {
        return None;
    }
    let parsed = CssColor::parse_string(v).ok()?;
    css_color_to_rgba(&parsed)
}

pub(crate) fn css_color_to_rgba(color: &CssColor) -> Option<(Color, f32)> {
    if matches!(color, CssColor::CurrentColor) {
        return None;
    }
    if let CssColor::RGBA(rgba) = color {
        let alpha = (rgba.alpha as f32 / 255.0).clamp(0.0, 1.0);
        return Some((Color::from_rgb8(rgba.red, rgba.green, rgba.blue), alpha));
    }
    if let Ok(srgb) = SRGB::try_from(color) {
        let alpha = if srgb.alpha.is_finite() {
            srgb.alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
        return Some((Color::rgb(srgb.r, srgb.g, srgb.b), alpha));
    }
    None
}
