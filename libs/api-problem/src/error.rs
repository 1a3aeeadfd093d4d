use thiserror::Error;

/// Errors produced while building, parsing or rendering a [`Problem`](crate::Problem).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProblemError {
    /// Input is not valid JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Input is not well-formed XML
    #[error("Malformed XML: {0}")]
    MalformedXml(#[from] quick_xml::Error),

    /// Document ended before the root element was closed, or had no root at all
    #[error("Truncated XML document: {0}")]
    TruncatedXml(&'static str),

    /// Top-level JSON value is not an object, or XML root is not `<problem>`
    #[error("Unexpected document root: expected {expected}, found {found}")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// Element, CDATA or non-whitespace text before or after the `<problem>` element
    #[error("Content outside the <problem> element: {0}")]
    ContentOutsideRoot(String),

    /// A fixed field carries a value that cannot be coerced to its type
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// Extension key cannot be written as an XML element name
    #[error("Extension key '{0}' is not a valid XML element name")]
    InvalidExtensionKey(String),

    /// Two sibling keys would be written as the same XML element
    #[error("Extension key '{key}' maps to XML element '{element}', which a sibling key already uses")]
    ElementNameCollision { key: String, element: String },

    /// Extension key collides with one of the fixed problem fields
    #[error("Extension key '{0}' is reserved for a problem field")]
    ReservedKey(String),

    /// Extension path with no segments
    #[error("Extension path must contain at least one key")]
    EmptyPath,

    /// An intermediate path segment holds a value that is not an object
    #[error("Extension '{key}' is not an object and cannot hold nested properties")]
    PathConflict { key: String },

    /// Writer failure while rendering XML
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Element or text content is not valid UTF-8
    #[error("Invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl ProblemError {
    /// True for failures caused by the input text itself (syntax or root shape).
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson(_)
                | Self::MalformedXml(_)
                | Self::TruncatedXml(_)
                | Self::UnexpectedRoot { .. }
                | Self::ContentOutsideRoot(_)
                | Self::Utf8(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProblemError>;
