use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

pub const CONTRACT_ID: &str = "inkport.embedded_document";
pub const CONTRACT_VERSION: &str = "1";

// Element names inside <metadata> that may carry the structured payload.
pub const PAYLOAD_ELEMENT_NAMES: [&str; 2] = ["tldraw", "inkport"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Drawing,
    Writing,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Drawing => "inkDrawing",
            FileType::Writing => "inkWriting",
        }
    }

    pub fn from_marker(raw: &str) -> Option<Self> {
        match raw.trim() {
            "inkDrawing" | "inkport/drawing" => Some(FileType::Drawing),
            "inkWriting" | "inkport/writing" => Some(FileType::Writing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    InvalidJson(String),
    NotAnObject,
    MissingFileType,
    UnknownFileType(String),
    MissingSnapshot,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidJson(message) => write!(f, "payload is not valid JSON: {}", message),
            FormatError::NotAnObject => write!(f, "payload root must be a JSON object"),
            FormatError::MissingFileType => write!(f, "payload has no meta.fileType marker"),
            FormatError::UnknownFileType(marker) => {
                write!(f, "unrecognized file type marker: {}", marker)
            }
            FormatError::MissingSnapshot => write!(f, "payload has no editor snapshot"),
        }
    }
}

impl std::error::Error for FormatError {}

// Structured drawing payload as embedded by the persistence layer:
// {"meta": {"fileType": "inkDrawing", "pluginVersion": "..."}, "tldraw": {...snapshot...}}
#[derive(Debug, Clone)]
pub struct EmbeddedPayload {
    pub file_type: FileType,
    pub plugin_version: Option<String>,
    pub snapshot: Value,
    raw: String,
}

impl EmbeddedPayload {
    pub fn parse(json: &str) -> Result<Self, FormatError> {
        let trimmed = json.trim();
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|err| FormatError::InvalidJson(err.to_string()))?;
        let Value::Object(mut root) = value else {
            return Err(FormatError::NotAnObject);
        };

        let meta = root.get("meta").and_then(Value::as_object);
        let marker = meta
            .and_then(|m| m.get("fileType"))
            .and_then(Value::as_str)
            .ok_or(FormatError::MissingFileType)?;
        let file_type = FileType::from_marker(marker)
            .ok_or_else(|| FormatError::UnknownFileType(marker.to_string()))?;
        let plugin_version = meta
            .and_then(|m| m.get("pluginVersion"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let snapshot = root
            .remove("tldraw")
            .filter(Value::is_object)
            .ok_or(FormatError::MissingSnapshot)?;

        Ok(Self {
            file_type,
            plugin_version,
            snapshot,
            raw: trimmed.to_string(),
        })
    }

    pub fn raw_json(&self) -> &str {
        &self.raw
    }

    // Counts shape records in either snapshot layout:
    // editor snapshots nest the store under "document", store snapshots do not.
    pub fn shape_count(&self) -> usize {
        let store = self
            .snapshot
            .get("document")
            .and_then(|doc| doc.get("store"))
            .or_else(|| self.snapshot.get("store"));
        let Some(Value::Object(records)) = store else {
            return 0;
        };
        records
            .iter()
            .filter(|(key, record)| {
                record.get("typeName").and_then(Value::as_str) == Some("shape")
                    || key.starts_with("shape:")
            })
            .count()
    }

    pub fn fingerprint_sha256(&self) -> String {
        hex_sha256(self.raw.as_bytes())
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_sha256(bytes)
}

static CONTRACT_FINGERPRINT: OnceLock<String> = OnceLock::new();

pub fn contract_fingerprint_sha256() -> String {
    CONTRACT_FINGERPRINT
        .get_or_init(|| {
            let mut joined = String::new();
            joined.push_str(CONTRACT_ID);
            joined.push('\n');
            joined.push_str(CONTRACT_VERSION);
            for name in PAYLOAD_ELEMENT_NAMES {
                joined.push('\n');
                joined.push_str(name);
            }
            for file_type in [FileType::Drawing, FileType::Writing] {
                joined.push('\n');
                joined.push_str(file_type.as_str());
            }
            hex_sha256(joined.as_bytes())
        })
        .clone()
}

pub fn is_payload_element(name: &str) -> bool {
    PAYLOAD_ELEMENT_NAMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}
