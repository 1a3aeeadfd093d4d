//! JSON codec (`application/problem+json`) and serde integration

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ProblemError, Result};
use crate::problem::Problem;

impl Problem {
    /// Serialize to JSON: `type` always, other standard members when set, then extensions
    /// merged at the top level.
    ///
    /// `pretty` selects two-space indented output; otherwise the result is a single line.
    ///
    /// # Errors
    /// Returns [`ProblemError::MalformedJson`] if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let map = self.as_array();
        let json = if pretty {
            serde_json::to_string_pretty(&map)?
        } else {
            serde_json::to_string(&map)?
        };
        Ok(json)
    }

    /// Parse a JSON problem document.
    ///
    /// # Errors
    /// - [`ProblemError::MalformedJson`] when the text is not valid JSON
    /// - [`ProblemError::UnexpectedRoot`] when the top-level value is not an object
    /// - [`ProblemError::InvalidField`] when a standard member has the wrong type
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Self::from_map(map),
            other => Err(ProblemError::UnexpectedRoot {
                expected: "JSON object",
                found: json_kind(&other).to_owned(),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for Problem {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Problem {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Problem::from_map(map).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Problem {
        let mut problem = Problem::with_title_and_type("Title", "URI")
            .with_status(403)
            .with_detail("Detail")
            .with_instance("Instance");
        problem.set(&["sir"], "Gir").unwrap();
        problem.set(&["irken", "invader"], "Zim").unwrap();
        problem
    }

    #[test]
    fn simple_json_omits_unset_fields() {
        let json = Problem::with_title_and_type("Title", "URI")
            .to_json(false)
            .unwrap();
        let result: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(result, json!({"type": "URI", "title": "Title"}));
        assert!(result.get("detail").is_none());
    }

    #[test]
    fn no_title_is_allowed_and_type_defaults() {
        let json = Problem::new().to_json(false).unwrap();
        assert_eq!(json, r#"{"type":"about:blank"}"#);
    }

    #[test]
    fn extensions_are_merged_at_top_level() {
        let json = sample().to_json(false).unwrap();
        let result: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(result["sir"], "Gir");
        assert_eq!(result["irken"]["invader"], "Zim");
        assert_eq!(result["status"], 403);
    }

    #[test]
    fn pretty_print_indents() {
        let pretty = sample().to_json(true).unwrap();
        assert!(pretty.contains("  "));
        assert!(pretty.contains('\n'));

        let compact = sample().to_json(false).unwrap();
        assert!(!compact.contains("  "));
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn parse_json_restores_all_values() {
        let result = Problem::from_json(&sample().to_json(false).unwrap()).unwrap();
        assert_eq!(result.title(), Some("Title"));
        assert_eq!(result.type_url(), "URI");
        assert_eq!(result.instance(), Some("Instance"));
        assert_eq!(result.detail(), Some("Detail"));
        assert_eq!(result.status(), Some(403));
        assert_eq!(result["sir"], "Gir");
        assert_eq!(result["irken"]["invader"], "Zim");
        assert_eq!(result, sample());
    }

    #[test]
    fn json_round_trip_keeps_scalar_types() {
        let mut problem = Problem::new();
        problem.set(&["balance"], 30).unwrap();
        problem.set(&["ratio"], 0.5).unwrap();
        problem.set(&["active"], true).unwrap();
        problem.set(&["nothing"], Value::Null).unwrap();
        problem
            .set(&["accounts"], json!(["/account/12345", "/account/67890"]))
            .unwrap();

        let parsed = Problem::from_json(&problem.to_json(false).unwrap()).unwrap();
        assert_eq!(parsed.extensions(), problem.extensions());
        assert!(parsed["balance"].is_u64());
        assert!(parsed["active"].is_boolean());
    }

    #[test]
    fn missing_type_defaults_when_parsing() {
        let problem = Problem::from_json(r#"{"title":"Not Found","status":404}"#).unwrap();
        assert_eq!(problem.type_url(), "about:blank");
        assert_eq!(problem.status(), Some(404));
    }

    #[test]
    fn integral_float_status_is_coerced() {
        let problem = Problem::from_json(r#"{"status":403.0}"#).unwrap();
        assert_eq!(problem.status(), Some(403));
        assert!(Problem::from_json(r#"{"status":403.5}"#).is_err());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = Problem::from_json("{\"title\": ").unwrap_err();
        assert!(matches!(err, ProblemError::MalformedJson(_)));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn non_object_root_is_rejected() {
        for (input, kind) in [("[1,2]", "array"), ("\"x\"", "string"), ("null", "null")] {
            let err = Problem::from_json(input).unwrap_err();
            match err {
                ProblemError::UnexpectedRoot { found, .. } => assert_eq!(found, kind),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn serde_embeds_problem_in_larger_documents() {
        let envelope = json!({ "error": sample() });
        assert_eq!(envelope["error"]["irken"]["invader"], "Zim");
        assert_eq!(envelope["error"]["type"], "URI");

        let back: Problem = serde_json::from_value(envelope["error"].clone()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn serde_reports_invalid_fields() {
        let result = serde_json::from_value::<Problem>(json!({"status": "teapot"}));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("status"));
    }
}
