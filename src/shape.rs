use crate::style::ShapeStyle;
use crate::types::{Bounds, Segment};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoKind {
    Rectangle,
    Ellipse,
}

impl GeoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoKind::Rectangle => "rectangle",
            GeoKind::Ellipse => "ellipse",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Flattened path; segment points are relative to the record's `x`/`y`.
    Freeform {
        segments: Vec<Segment>,
        closed: bool,
    },
    Geometry {
        geo: GeoKind,
    },
    Image {
        asset_id: String,
    },
    Text {
        text: String,
        font_size: f32,
    },
    /// Container emitted only when groups are preserved; lists direct children.
    Group {
        children: Vec<String>,
    },
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Freeform { .. } => "freeform",
            ShapeKind::Geometry { .. } => "geo",
            ShapeKind::Image { .. } => "image",
            ShapeKind::Text { .. } => "text",
            ShapeKind::Group { .. } => "group",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub id: String,
    // `id` attribute of the originating element, if any.
    pub source_id: Option<String>,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    // Radians.
    pub rotation: f32,
    pub opacity: f32,
    pub style: ShapeStyle,
}

impl ShapeRecord {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.width,
            max_y: self.y + self.height,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        match &self.kind {
            ShapeKind::Freeform { segments, .. } => segments,
            _ => &[],
        }
    }

    pub fn asset_id(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Image { asset_id } => Some(asset_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Embedded { mime_type: String, base64: String },
    Linked(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub asset_id: String,
    pub source: ImageSource,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

impl ImagePayload {
    pub fn mime_type(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Embedded { mime_type, .. } => Some(mime_type),
            ImageSource::Linked(_) => None,
        }
    }

    pub fn base64(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Embedded { base64, .. } => Some(base64),
            ImageSource::Linked(_) => None,
        }
    }
}

/// An element that was skipped or degraded during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub element: String,
    pub id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    pub fn parse(raw: &str) -> Option<Self> {
        let nums = crate::matrix::parse_number_list(raw);
        if nums.len() != 4 || nums.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if nums[2] <= 0.0 || nums[3] <= 0.0 {
            return None;
        }
        Some(Self {
            min_x: nums[0],
            min_y: nums[1],
            width: nums[2],
            height: nums[3],
        })
    }
}

/// Everything one extraction produced. Shapes are in document order with
/// group containers after their children.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub shapes: Vec<ShapeRecord>,
    pub images: BTreeMap<String, ImagePayload>,
    pub diagnostics: Vec<Diagnostic>,
    pub view_box: Option<ViewBox>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.images.is_empty()
    }

    pub fn image_reference_count(&self) -> usize {
        self.shapes
            .iter()
            .filter(|s| matches!(s.kind, ShapeKind::Image { .. }))
            .count()
    }

    pub fn shape_by_source_id(&self, source_id: &str) -> Option<&ShapeRecord> {
        self.shapes
            .iter()
            .find(|s| s.source_id.as_deref() == Some(source_id))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.shapes
            .iter()
            .filter(|s| !matches!(s.kind, ShapeKind::Group { .. }))
            .map(ShapeRecord::bounds)
            .reduce(Bounds::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn record(kind: ShapeKind, x: f32, y: f32) -> ShapeRecord {
        ShapeRecord {
            id: "shape:1".to_string(),
            source_id: Some("a".to_string()),
            kind,
            x,
            y,
            width: 10.0,
            height: 5.0,
            rotation: 0.0,
            opacity: 1.0,
            style: ShapeStyle::default(),
        }
    }

    #[test]
    fn record_accessors() {
        let seg = Segment::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], false);
        let free = record(
            ShapeKind::Freeform {
                segments: vec![seg],
                closed: false,
            },
            2.0,
            3.0,
        );
        assert_eq!(free.segments().len(), 1);
        assert_eq!(free.kind.as_str(), "freeform");
        let b = free.bounds();
        assert_eq!((b.max_x, b.max_y), (12.0, 8.0));

        let img = record(
            ShapeKind::Image {
                asset_id: "asset:1:abc".to_string(),
            },
            0.0,
            0.0,
        );
        assert_eq!(img.asset_id(), Some("asset:1:abc"));
        assert!(img.segments().is_empty());
    }

    #[test]
    fn extraction_counts_and_bounds() {
        let mut ex = Extraction::default();
        assert!(ex.is_empty());
        assert!(ex.bounds().is_none());
        ex.shapes.push(record(
            ShapeKind::Image {
                asset_id: "asset:1:abc".to_string(),
            },
            -5.0,
            0.0,
        ));
        ex.shapes.push(record(
            ShapeKind::Geometry {
                geo: GeoKind::Rectangle,
            },
            20.0,
            20.0,
        ));
        assert_eq!(ex.image_reference_count(), 1);
        let b = ex.bounds().expect("non-empty bounds");
        assert_eq!((b.min_x, b.max_x, b.max_y), (-5.0, 30.0, 25.0));
        assert!(ex.shape_by_source_id("a").is_some());
    }

    #[test]
    fn view_box_requires_positive_extent() {
        let vb = ViewBox::parse("50 50 200 100").expect("valid viewBox");
        assert_eq!((vb.min_x, vb.min_y), (50.0, 50.0));
        assert!(ViewBox::parse("0 0 0 10").is_none());
        assert!(ViewBox::parse("0,0,10").is_none());
    }
}
