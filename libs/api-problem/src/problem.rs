//! Problem Details data model (RFC 7807 / RFC 9457): fixed members plus extension bag

use std::ops::Index;

use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::{ProblemError, Result};

/// Content type for JSON Problem Details.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Content type for XML Problem Details.
pub const APPLICATION_PROBLEM_XML: &str = "application/problem+xml";

/// Problem type used when none is given.
pub const ABOUT_BLANK: &str = "about:blank";

/// Member names owned by the fixed fields; extensions may not use them at the top level.
pub const FIXED_FIELDS: [&str; 5] = ["type", "title", "status", "detail", "instance"];

/// A single problem details document.
///
/// The five standard members live in dedicated fields. Anything else is kept in an
/// insertion-ordered extension map whose values may nest arbitrarily.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Problem {
    type_url: String,
    title: Option<String>,
    status: Option<u16>,
    detail: Option<String>,
    instance: Option<String>,
    extensions: Map<String, Value>,
}

impl Default for Problem {
    fn default() -> Self {
        Self {
            type_url: ABOUT_BLANK.to_owned(),
            title: None,
            status: None,
            detail: None,
            instance: None,
            extensions: Map::new(),
        }
    }
}

/// Returns true when `key` is one of the standard problem members.
#[must_use]
pub fn is_fixed_field(key: &str) -> bool {
    FIXED_FIELDS.contains(&key)
}

impl Problem {
    /// Create an empty problem of type `about:blank`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a problem with a title and a type URI. An empty type falls back to `about:blank`.
    pub fn with_title_and_type(title: impl Into<String>, type_url: impl Into<String>) -> Self {
        Self::new().with_title(title).with_type(type_url)
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.set_type(type_url);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.set_status(status);
        self
    }

    pub fn with_status_code(mut self, status: StatusCode) -> Self {
        self.set_status_code(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.set_detail(detail);
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.set_instance(uri);
        self
    }

    /// Builder form of [`set`](Self::set).
    ///
    /// # Errors
    /// Same as [`set`](Self::set).
    pub fn with_extension(mut self, path: &[&str], value: impl Into<Value>) -> Result<Self> {
        self.set(path, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Set the problem type URI. An empty value resets it to `about:blank`.
    pub fn set_type(&mut self, type_url: impl Into<String>) {
        let type_url = type_url.into();
        self.type_url = if type_url.is_empty() {
            ABOUT_BLANK.to_owned()
        } else {
            type_url
        };
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn clear_title(&mut self) {
        self.title = None;
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// The status as an [`http::StatusCode`], if it is set and within the valid range.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status.and_then(|s| StatusCode::from_u16(s).ok())
    }

    pub fn set_status_code(&mut self, status: StatusCode) {
        self.status = Some(status.as_u16());
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn set_detail(&mut self, detail: impl Into<String>) {
        self.detail = Some(detail.into());
    }

    pub fn clear_detail(&mut self) {
        self.detail = None;
    }

    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    pub fn set_instance(&mut self, uri: impl Into<String>) {
        self.instance = Some(uri.into());
    }

    pub fn clear_instance(&mut self) {
        self.instance = None;
    }

    /// All extension members, in insertion order.
    #[must_use]
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Read the extension value at `path`, descending through nested objects.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter().try_fold(self.extensions.get(*first)?, |node, key| {
            node.as_object()?.get(*key)
        })
    }

    /// Store `value` at `path`, creating intermediate objects as needed.
    ///
    /// Writing over an existing value replaces it.
    ///
    /// # Errors
    /// - [`ProblemError::EmptyPath`] when `path` is empty
    /// - [`ProblemError::ReservedKey`] when the first key names a fixed member
    /// - [`ProblemError::PathConflict`] when an intermediate value is not an object
    pub fn set(&mut self, path: &[&str], value: impl Into<Value>) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(ProblemError::EmptyPath);
        };
        let top = parents.first().unwrap_or(last);
        if is_fixed_field(top) {
            return Err(ProblemError::ReservedKey((*top).to_owned()));
        }

        let mut node = &mut self.extensions;
        for key in parents {
            node = match node
                .entry((*key).to_owned())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(map) => map,
                _ => {
                    return Err(ProblemError::PathConflict {
                        key: (*key).to_owned(),
                    });
                }
            };
        }
        node.insert((*last).to_owned(), value.into());
        Ok(())
    }

    /// Remove the extension value at `path` and return it.
    pub fn unset(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut node = &mut self.extensions;
        for key in parents {
            node = node.get_mut(*key)?.as_object_mut()?;
        }
        node.shift_remove(*last)
    }

    /// True when a value (including an explicit `null`) is stored at `path`.
    #[must_use]
    pub fn has(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// Flat view of the document: fixed members that are set, followed by extensions.
    ///
    /// `type` always comes first; this is the shape written by the JSON serializer.
    #[must_use]
    pub fn as_array(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".to_owned(), Value::String(self.type_url.clone()));
        if let Some(title) = &self.title {
            map.insert("title".to_owned(), Value::String(title.clone()));
        }
        if let Some(status) = self.status {
            map.insert("status".to_owned(), Value::from(status));
        }
        if let Some(detail) = &self.detail {
            map.insert("detail".to_owned(), Value::String(detail.clone()));
        }
        if let Some(instance) = &self.instance {
            map.insert("instance".to_owned(), Value::String(instance.clone()));
        }
        map.extend(
            self.extensions
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        map
    }

    /// Build a problem from a decoded member map.
    ///
    /// Standard members are coerced into the fixed fields (`null` counts as absent);
    /// every other member becomes an extension with its structure intact.
    ///
    /// # Errors
    /// [`ProblemError::InvalidField`] when a standard member cannot be coerced.
    pub fn from_map(map: Map<String, Value>) -> Result<Self> {
        let mut problem = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "type" => {
                    if let Some(type_url) = coerce_text("type", value)? {
                        problem.set_type(type_url);
                    }
                }
                "title" => problem.title = coerce_text("title", value)?,
                "status" => problem.status = coerce_status(value)?,
                "detail" => problem.detail = coerce_text("detail", value)?,
                "instance" => problem.instance = coerce_text("instance", value)?,
                _ => {
                    problem.extensions.insert(key, value);
                }
            }
        }
        Ok(problem)
    }
}

/// Extension access by top-level key. Missing keys read as `null`, so lookups chain:
/// `problem["irken"]["invader"]`.
impl Index<&str> for Problem {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.extensions.get(key).unwrap_or(&NULL)
    }
}

fn coerce_text(field: &'static str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ProblemError::InvalidField {
            field,
            reason: "expected a string".to_owned(),
        }),
    }
}

fn coerce_status(value: Value) -> Result<Option<u16>> {
    match value {
        Value::Null => Ok(None),
        // Integral floats such as 403.0 print without a fraction, so they parse too.
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .or_else(|| n.as_f64().and_then(|f| f.to_string().parse::<u16>().ok()))
            .map(Some)
            .ok_or_else(|| ProblemError::InvalidField {
                field: "status",
                reason: format!("{n} is not an integer in 0..=65535"),
            }),
        Value::String(s) => parse_status(&s).map(Some),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(ProblemError::InvalidField {
            field: "status",
            reason: "expected an integer".to_owned(),
        }),
    }
}

fn parse_status(text: &str) -> Result<u16> {
    text.trim()
        .parse::<u16>()
        .map_err(|e| ProblemError::InvalidField {
            field: "status",
            reason: format!("'{text}': {e}"),
        })
}
