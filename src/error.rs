use inkport_format::FormatError;
use std::fmt;

#[derive(Debug)]
pub enum InkportError {
    Parse(String),
    MissingRoot,
    InvalidConfiguration(String),
    Format(FormatError),
    Io(std::io::Error),
}

impl fmt::Display for InkportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InkportError::Parse(message) => write!(f, "svg parse error: {}", message),
            InkportError::MissingRoot => write!(f, "document has no <svg> root element"),
            InkportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            InkportError::Format(err) => write!(f, "embedded document error: {}", err),
            InkportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for InkportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InkportError::Io(err) => Some(err),
            InkportError::Format(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InkportError {
    fn from(value: std::io::Error) -> Self {
        InkportError::Io(value)
    }
}

impl From<FormatError> for InkportError {
    fn from(value: FormatError) -> Self {
        InkportError::Format(value)
    }
}

impl From<roxmltree::Error> for InkportError {
    fn from(value: roxmltree::Error) -> Self {
        InkportError::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_and_source() {
        let io = InkportError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.to_string().contains("gone"));
        assert!(io.source().is_some());

        let format = InkportError::from(FormatError::MissingSnapshot);
        assert!(format.to_string().starts_with("embedded document error"));
        assert!(format.source().is_some());

        assert!(InkportError::MissingRoot.source().is_none());
    }

    #[test]
    fn xml_errors_map_to_parse() {
        let err = roxmltree::Document::parse("<svg>").expect_err("unclosed tag");
        assert!(matches!(InkportError::from(err), InkportError::Parse(_)));
    }
}
