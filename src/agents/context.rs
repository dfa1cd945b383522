//! Shared request context parsed from the end-user request.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Named values extracted from a natural-language request.
///
/// Accepts either a JSON object or `key: value` / `key=value` pairs separated
/// by newlines or commas. Keys are lower-cased; the first occurrence of a key
/// wins in both forms. Segments whose key contains whitespace are treated as
/// prose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    fields: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn parse(text: &str) -> Self {
        let fields = parse_json_object(text).unwrap_or_else(|| parse_pairs(text));
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

fn parse_json_object(text: &str) -> Option<BTreeMap<String, String>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<FirstWins>(trimmed).ok().map(|f| f.0)
}

/// Scalar members of a JSON object, keeping the first value seen per key.
/// `serde_json::Map` would keep the last.
struct FirstWins(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for FirstWins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = FirstWins;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FirstWins, A::Error> {
                let mut fields = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    let value = match value {
                        Value::String(s) => s.trim().to_string(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    let key = key.trim().to_lowercase();
                    if key.is_empty() || value.is_empty() {
                        continue;
                    }
                    fields.entry(key).or_insert(value);
                }
                Ok(FirstWins(fields))
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

fn parse_pairs(text: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for segment in text.split(['\n', ',']) {
        let Some(split_at) = segment.find([':', '=']) else {
            continue;
        };
        let key = segment[..split_at].trim().to_lowercase();
        let value = segment[split_at + 1..].trim();

        if key.is_empty() || value.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        fields.entry(key).or_insert_with(|| value.to_string());
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiline_request() {
        let ctx = RequestContext::parse(
            "
            env: prd-bo
            service: fsp-pay-gateway
            from_ts: 1702441545000
            to_ts: 1742441905000
            trace_id: 67db8cf2000000003f2339dd4b4e1398
            ",
        );

        assert_eq!(ctx.get("env"), Some("prd-bo"));
        assert_eq!(ctx.get("service"), Some("fsp-pay-gateway"));
        assert_eq!(ctx.get("from_ts"), Some("1702441545000"));
        assert_eq!(ctx.get("trace_id"), Some("67db8cf2000000003f2339dd4b4e1398"));
        assert_eq!(ctx.fields().len(), 5);
    }

    #[test]
    fn test_parse_json_request() {
        let ctx = RequestContext::parse(
            r#"{"service": "fsp-pay-gateway", "env": "prd-bo", "from_ts": 1702441545000}"#,
        );
        assert_eq!(ctx.get("from_ts"), Some("1702441545000"));
        assert_eq!(ctx.get("env"), Some("prd-bo"));
    }

    #[test]
    fn test_parse_inline_pairs_and_prose() {
        let ctx = RequestContext::parse("Please check this alert: now, Service=svc-a, env = stg");
        assert_eq!(ctx.get("service"), Some("svc-a"));
        assert_eq!(ctx.get("env"), Some("stg"));
        assert_eq!(ctx.get("please check this alert"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let ctx = RequestContext::parse("env: prd-bo\nenv: stg");
        assert_eq!(ctx.get("env"), Some("prd-bo"));
    }

    #[test]
    fn test_first_occurrence_wins_in_json() {
        let ctx = RequestContext::parse(r#"{"env": "prd-bo", "Env": "stg", "service": "a", "service": "b"}"#);
        assert_eq!(ctx.get("env"), Some("prd-bo"));
        assert_eq!(ctx.get("service"), Some("a"));
    }

    #[test]
    fn test_non_scalar_json_values_ignored() {
        let ctx = RequestContext::parse(r#"{"service": ["a"], "env": null, "trace_id": "t1"}"#);
        assert_eq!(ctx.fields().len(), 1);
        assert_eq!(ctx.get("trace_id"), Some("t1"));
    }
}
