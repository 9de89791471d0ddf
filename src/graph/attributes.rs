use crate::facts::{PackageMetrics, Repository};
use crate::workspace::PackageDescriptor;
use core::fmt::{Display, Formatter};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata keys that never make it onto a node unless configured otherwise.
pub const DEFAULT_DROPPED_ATTRIBUTES: &[&str] = &["get_python_setup_options"];

/// A flattened attribute value, ready for any export format.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Integer)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Node attributes keyed by name, in key order.
pub type NodeAttributes = BTreeMap<String, AttributeValue>;

/// Derive the flat attribute map of one package node.
///
/// Metadata comes first, then the derived `path` and `build_type`, then
/// repository provenance and line counts when they are available. Keys in
/// `dropped` are removed before enrichment, and values are normalized last.
#[must_use]
pub fn build_attributes(
    descriptor: &PackageDescriptor,
    repository: Option<&Repository>,
    metrics: Option<&PackageMetrics>,
    dropped: &[String],
) -> NodeAttributes {
    let mut raw: BTreeMap<String, Value> = descriptor.metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    let _ = raw.insert("path".to_string(), Value::String(descriptor.path.to_string()));
    let _ = raw.insert("build_type".to_string(), Value::String(descriptor.build_type.clone()));

    for key in dropped {
        let _ = raw.remove(key);
    }

    if let Some(repository) = repository {
        let _ = raw.insert("repo".to_string(), Value::String(repository.name()));
        if let Some(remote) = repository.primary_remote() {
            let _ = raw.insert("remote".to_string(), Value::String(remote.url.clone()));
        }
    }

    if let Some(metrics) = metrics {
        let _ = raw.insert("lines_of_code".to_string(), Value::from(metrics.lines_of_code));
        let _ = raw.insert("lines_of_comments".to_string(), Value::from(metrics.lines_of_comments));
        let _ = raw.insert("number_of_files".to_string(), Value::from(metrics.number_of_files));
    }

    raw.into_iter()
        .filter_map(|(key, value)| normalize(&value).map(|value| (key, value)))
        .collect()
}

/// Reduce a metadata value to a flat attribute value. `null` has no representation.
#[must_use]
pub fn normalize(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(AttributeValue::Boolean(*b)),
        Value::Number(n) => Some(number(n)),
        Value::String(s) => Some(AttributeValue::Text(s.clone())),
        Value::Array(items) => Some(AttributeValue::Text(
            items.iter().map(element_text).collect::<Vec<_>>().join(","),
        )),
        Value::Object(_) => Some(AttributeValue::Text(value.to_string())),
    }
}

fn number(n: &serde_json::Number) -> AttributeValue {
    if let Some(i) = n.as_i64() {
        AttributeValue::Integer(i)
    } else if let Some(u) = n.as_u64() {
        AttributeValue::from(u)
    } else {
        n.as_f64().map_or_else(|| AttributeValue::Text(n.to_string()), AttributeValue::Float)
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Remote;
    use camino::Utf8PathBuf;
    use serde_json::json;

    fn descriptor(metadata: Value) -> PackageDescriptor {
        let mut d = PackageDescriptor::new("nav_core", "/ws/src/nav_core", "ros.ament_cmake");
        if let Value::Object(map) = metadata {
            d.metadata = map;
        }
        d
    }

    fn default_dropped() -> Vec<String> {
        DEFAULT_DROPPED_ATTRIBUTES.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_derived_attributes() {
        let attrs = build_attributes(&descriptor(json!({})), None, None, &default_dropped());

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["path"], AttributeValue::from("/ws/src/nav_core"));
        assert_eq!(attrs["build_type"], AttributeValue::from("ros.ament_cmake"));
    }

    #[test]
    fn test_sequences_flatten_in_order() {
        let attrs = build_attributes(
            &descriptor(json!({
                "maintainers": ["Grace", "Ada"],
                "mixed": ["x", 1, true, null, [2, 3]],
                "empty": []
            })),
            None,
            None,
            &default_dropped(),
        );

        assert_eq!(attrs["maintainers"], AttributeValue::from("Grace,Ada"));
        assert_eq!(attrs["mixed"], AttributeValue::from("x,1,true,null,[2,3]"));
        assert_eq!(attrs["empty"], AttributeValue::from(""));
    }

    #[test]
    fn test_scalars_pass_through() {
        let attrs = build_attributes(
            &descriptor(json!({
                "version": "1.2.3",
                "priority": -4,
                "ratio": 0.5,
                "deprecated": false,
                "huge": u64::MAX,
                "nothing": null,
                "nested": {"b": 1, "a": "x"}
            })),
            None,
            None,
            &default_dropped(),
        );

        assert_eq!(attrs["version"], AttributeValue::from("1.2.3"));
        assert_eq!(attrs["priority"], AttributeValue::Integer(-4));
        assert_eq!(attrs["ratio"], AttributeValue::Float(0.5));
        assert_eq!(attrs["deprecated"], AttributeValue::Boolean(false));
        assert_eq!(attrs["huge"], AttributeValue::Text(u64::MAX.to_string()));
        assert_eq!(attrs["nested"], AttributeValue::from(r#"{"a":"x","b":1}"#));
        assert!(!attrs.contains_key("nothing"));
    }

    #[test]
    fn test_python_setup_options_dropped() {
        let attrs = build_attributes(
            &descriptor(json!({"get_python_setup_options": {"packages": ["x"]}, "kept": "yes"})),
            None,
            None,
            &default_dropped(),
        );

        assert!(!attrs.contains_key("get_python_setup_options"));
        assert_eq!(attrs["kept"], AttributeValue::from("yes"));
    }

    #[test]
    fn test_custom_dropped_keys() {
        let attrs = build_attributes(
            &descriptor(json!({"secret": "x", "get_python_setup_options": "kept now"})),
            None,
            None,
            &["secret".to_string()],
        );

        assert!(!attrs.contains_key("secret"));
        assert!(attrs.contains_key("get_python_setup_options"));
    }

    #[test]
    fn test_repository_with_remote() {
        let repository = Repository::new(
            Utf8PathBuf::from("/ws/src/checkout"),
            vec!["origin".to_string()],
            Some(Remote {
                name: "origin".to_string(),
                url: "git@github.com:acme/widgets.git".to_string(),
            }),
        );

        let attrs = build_attributes(&descriptor(json!({})), Some(&repository), None, &default_dropped());
        assert_eq!(attrs["repo"], AttributeValue::from("widgets"));
        assert_eq!(attrs["remote"], AttributeValue::from("git@github.com:acme/widgets.git"));
    }

    #[test]
    fn test_repository_without_remote() {
        let repository = Repository::new(Utf8PathBuf::from("/ws/src/checkout"), vec![], None);

        let attrs = build_attributes(&descriptor(json!({})), Some(&repository), None, &default_dropped());
        assert_eq!(attrs["repo"], AttributeValue::from("checkout"));
        assert!(!attrs.contains_key("remote"));
    }

    #[test]
    fn test_no_repository() {
        let attrs = build_attributes(&descriptor(json!({})), None, None, &default_dropped());
        assert!(!attrs.contains_key("repo"));
        assert!(!attrs.contains_key("remote"));
    }

    #[test]
    fn test_metrics_merged() {
        let metrics = PackageMetrics {
            lines_of_code: 15,
            lines_of_comments: 2,
            number_of_files: 2,
        };

        let attrs = build_attributes(&descriptor(json!({})), None, Some(&metrics), &default_dropped());
        assert_eq!(attrs["lines_of_code"], AttributeValue::Integer(15));
        assert_eq!(attrs["lines_of_comments"], AttributeValue::Integer(2));
        assert_eq!(attrs["number_of_files"], AttributeValue::Integer(2));
    }

    #[test]
    fn test_derived_attributes_override_metadata() {
        let attrs = build_attributes(&descriptor(json!({"path": "elsewhere"})), None, None, &default_dropped());
        assert_eq!(attrs["path"], AttributeValue::from("/ws/src/nav_core"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttributeValue::from("a,b").to_string(), "a,b");
        assert_eq!(AttributeValue::Integer(7).to_string(), "7");
        assert_eq!(AttributeValue::Float(1.0).to_string(), "1.0");
        assert_eq!(AttributeValue::Boolean(true).to_string(), "true");
    }
}
