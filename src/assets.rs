use crate::shape::ImageSource;
use base64::Engine;
use image::ImageReader;
use inkport_format::sha256_hex;
use std::io::Cursor;

/// An `<image>` reference after decoding. `bytes` is empty for linked images.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedImage {
    pub source: ImageSource,
    pub bytes: Vec<u8>,
}

impl ResolvedImage {
    pub fn from_href(href: &str) -> Result<Self, String> {
        let href = href.trim();
        if href.is_empty() {
            return Err("empty image reference".to_string());
        }
        if !href.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
            return Ok(Self {
                source: ImageSource::Linked(href.to_string()),
                bytes: Vec::new(),
            });
        }
        let (mime_type, bytes) =
            parse_data_uri(href).ok_or_else(|| "undecodable data URI".to_string())?;
        if bytes.is_empty() {
            return Err("data URI has an empty payload".to_string());
        }
        let base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(Self {
            source: ImageSource::Embedded { mime_type, base64 },
            bytes,
        })
    }

    /// Hash input for the asset key: decoded bytes, or the URL for linked images.
    fn key_material(&self) -> &[u8] {
        match &self.source {
            ImageSource::Linked(url) => url.as_bytes(),
            ImageSource::Embedded { .. } => &self.bytes,
        }
    }

    /// Pixel size read from the image header, when the bytes are PNG or JPEG.
    /// Pixel data is never decoded.
    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        if self.bytes.is_empty() {
            return None;
        }
        ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.get(5..)?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_ascii_lowercase();
    let is_base64 = header
        .split(';')
        .skip(1)
        .any(|p| p.trim().eq_ignore_ascii_case("base64"));
    let data = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .ok()?
    } else {
        decode_percent_encoded(payload)?
    };
    Some((mime, data))
}

fn decode_percent_encoded(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// `asset:{ordinal}:{first 12 hex digits of sha256}`. The ordinal keeps keys
/// distinct for identical payloads on different elements.
pub(crate) fn asset_key(ordinal: usize, image: &ResolvedImage) -> String {
    let digest = sha256_hex(image.key_material());
    format!("asset:{}:{}", ordinal, &digest[..12])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // 1x1 transparent PNG.
    pub(crate) const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_base64_data_uri_and_probes_size() {
        let href = format!("data:image/png;base64,{}", PNG_1X1);
        let image = ResolvedImage::from_href(&href).expect("valid png data URI");
        assert_eq!(image.intrinsic_size(), Some((1, 1)));
        match &image.source {
            ImageSource::Embedded { mime_type, base64 } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(base64, PNG_1X1);
            }
            other => panic!("expected embedded image, got {:?}", other),
        }
    }

    #[test]
    fn tolerates_whitespace_in_base64_payload() {
        let wrapped = format!("data:image/png;base64,{}\n  {}", &PNG_1X1[..20], &PNG_1X1[20..]);
        let image = ResolvedImage::from_href(&wrapped).expect("wrapped payload decodes");
        assert_eq!(image.intrinsic_size(), Some((1, 1)));
    }

    #[test]
    fn size_comes_from_the_header_alone() {
        let full = base64::engine::general_purpose::STANDARD
            .decode(PNG_1X1)
            .expect("fixture decodes");
        // Signature, IHDR, then the IDAT chunk header and a few bytes of its data.
        let truncated = ResolvedImage {
            source: ImageSource::Embedded {
                mime_type: "image/png".to_string(),
                base64: String::new(),
            },
            bytes: full[..45].to_vec(),
        };
        assert!(image::load_from_memory(&truncated.bytes).is_err());
        assert_eq!(truncated.intrinsic_size(), Some((1, 1)));

        let text = ResolvedImage {
            bytes: b"not an image".to_vec(),
            ..truncated
        };
        assert!(text.intrinsic_size().is_none());
    }

    #[test]
    fn percent_encoded_and_linked_references() {
        let (mime, bytes) = parse_data_uri("data:image/svg+xml,%3Csvg%2F%3E").expect("percent URI");
        assert_eq!(mime, "image/svg+xml");
        assert_eq!(bytes, b"<svg/>");

        let linked = ResolvedImage::from_href("photos/cat.png").expect("linked reference");
        assert_eq!(linked.source, ImageSource::Linked("photos/cat.png".to_string()));
        assert!(linked.intrinsic_size().is_none());
    }

    #[test]
    fn rejects_broken_payloads() {
        assert!(ResolvedImage::from_href("data:image/png;base64,@@@").is_err());
        assert!(ResolvedImage::from_href("data:image/png;base64,").is_err());
        assert!(ResolvedImage::from_href("   ").is_err());
        assert!(parse_data_uri("data:text/plain,%ZZ").is_none());
    }

    #[test]
    fn asset_keys_are_distinct_per_ordinal() {
        let href = format!("data:image/png;base64,{}", PNG_1X1);
        let image = ResolvedImage::from_href(&href).expect("valid png data URI");
        let a = asset_key(1, &image);
        let b = asset_key(2, &image);
        assert_ne!(a, b);
        assert!(a.starts_with("asset:1:"));
        assert_eq!(a.len(), "asset:1:".len() + 12);
        assert_eq!(a[8..], b[8..], "same payload hashes the same");
        assert_eq!(a[8..], sha256_hex(image.key_material())[..12]);
    }
}
