use crate::shape::Extraction;
use inkport_format::{EmbeddedPayload, FormatError, is_payload_element};
use roxmltree::{Document, Node};

/// A drawing document recovered from the SVG's embedded payload.
#[derive(Debug, Clone)]
pub struct StructuredDocument {
    pub payload: EmbeddedPayload,
    pub fingerprint: String,
    pub shape_count: usize,
    pub image_reference_count: usize,
}

/// Why an import fell back to geometric extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoPayload,
    CorruptPayload(FormatError),
    // The payload listed no shapes while the SVG references several images.
    EmptyPayloadWithImages { images: usize },
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::NoPayload => "no_payload",
            FallbackReason::CorruptPayload(_) => "corrupt_payload",
            FallbackReason::EmptyPayloadWithImages { .. } => "empty_payload_with_images",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Structured(StructuredDocument),
    Geometric {
        extraction: Extraction,
        reason: FallbackReason,
    },
}

impl ImportOutcome {
    pub fn is_structured(&self) -> bool {
        matches!(self, ImportOutcome::Structured(_))
    }
}

/// Looks for the structured payload and decides whether it can be trusted.
pub(crate) fn resolve_structured(doc: &Document<'_>) -> Result<StructuredDocument, FallbackReason> {
    let payload = find_embedded_payload(doc)?;
    let shape_count = payload.shape_count();
    let image_reference_count = count_image_elements(doc);
    if shape_count == 0 && image_reference_count > 1 {
        return Err(FallbackReason::EmptyPayloadWithImages {
            images: image_reference_count,
        });
    }
    Ok(StructuredDocument {
        fingerprint: payload.fingerprint_sha256(),
        payload,
        shape_count,
        image_reference_count,
    })
}

/// Scans every `<metadata>` block: payload elements first, then a bare JSON
/// text node. The first valid payload wins; a corrupt one is reported only
/// when nothing valid follows.
pub(crate) fn find_embedded_payload(doc: &Document<'_>) -> Result<EmbeddedPayload, FallbackReason> {
    let mut corrupt = None;
    for metadata in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "metadata")
    {
        for candidate in payload_candidates(metadata) {
            match EmbeddedPayload::parse(&candidate) {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    corrupt.get_or_insert(err);
                }
            }
        }
    }
    Err(corrupt.map_or(FallbackReason::NoPayload, FallbackReason::CorruptPayload))
}

fn payload_candidates(metadata: Node<'_, '_>) -> Vec<String> {
    let mut out: Vec<String> = metadata
        .children()
        .filter(|c| c.is_element() && is_payload_element(c.tag_name().name()))
        .map(text_content)
        .filter(|text| !text.trim().is_empty())
        .collect();
    let direct: String = metadata
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    if direct.trim_start().starts_with('{') {
        out.push(direct);
    }
    out
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

pub(crate) fn count_image_elements(doc: &Document<'_>) -> usize {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "image")
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::parse_document;

    const PAYLOAD: &str = r#"{"meta":{"fileType":"inkDrawing","pluginVersion":"1.4.0"},"tldraw":{"store":{"shape:a":{"typeName":"shape"},"shape:b":{"typeName":"shape"},"page:1":{"typeName":"page"}}}}"#;
    const EMPTY_PAYLOAD: &str =
        r#"{"meta":{"fileType":"inkDrawing"},"tldraw":{"store":{"page:1":{"typeName":"page"}}}}"#;

    fn svg_with(metadata: &str, images: usize) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><metadata>{}</metadata>"#,
            metadata
        );
        for _ in 0..images {
            svg.push_str(r#"<image href="a.png" width="1" height="1"/>"#);
        }
        svg.push_str("</svg>");
        svg
    }

    #[test]
    fn finds_payload_in_named_element() {
        let svg = svg_with(&format!("<tldraw><![CDATA[{}]]></tldraw>", PAYLOAD), 0);
        let doc = parse_document(&svg).expect("svg parses");
        let structured = resolve_structured(&doc).expect("payload is valid");
        assert_eq!(structured.shape_count, 2);
        assert_eq!(structured.payload.plugin_version.as_deref(), Some("1.4.0"));
        assert_eq!(structured.fingerprint.len(), 64);
    }

    #[test]
    fn accepts_bare_json_under_metadata() {
        let svg = svg_with(PAYLOAD, 1);
        let doc = parse_document(&svg).expect("svg parses");
        let structured = resolve_structured(&doc).expect("bare payload is valid");
        assert_eq!(structured.image_reference_count, 1);
    }

    #[test]
    fn absent_and_corrupt_payloads_fall_back() {
        let svg = svg_with("<dc:title xmlns:dc=\"urn:dc\">x</dc:title>", 0);
        let doc = parse_document(&svg).expect("svg parses");
        assert_eq!(resolve_structured(&doc).err(), Some(FallbackReason::NoPayload));

        let svg = svg_with("<inkport>{\"meta\":</inkport>", 0);
        let doc = parse_document(&svg).expect("svg parses");
        match resolve_structured(&doc) {
            Err(FallbackReason::CorruptPayload(FormatError::InvalidJson(_))) => {}
            other => panic!("expected corrupt payload, got {:?}", other.map(|s| s.shape_count)),
        }
    }

    #[test]
    fn valid_payload_beats_an_earlier_corrupt_one() {
        let svg = svg_with(
            &format!("<inkport>not json</inkport><tldraw>{}</tldraw>", PAYLOAD),
            0,
        );
        let doc = parse_document(&svg).expect("svg parses");
        assert!(resolve_structured(&doc).is_ok());
    }

    #[test]
    fn empty_payload_with_several_images_is_rejected() {
        let one_svg = svg_with(&format!("<tldraw>{}</tldraw>", EMPTY_PAYLOAD), 1);
        let one = parse_document(&one_svg).expect("svg parses");
        assert!(resolve_structured(&one).is_ok(), "a single image keeps the payload");

        let three_svg = svg_with(&format!("<tldraw>{}</tldraw>", EMPTY_PAYLOAD), 3);
        let three = parse_document(&three_svg).expect("svg parses");
        assert_eq!(
            resolve_structured(&three).err(),
            Some(FallbackReason::EmptyPayloadWithImages { images: 3 })
        );
    }
}
