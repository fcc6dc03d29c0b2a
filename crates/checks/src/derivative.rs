//! One-directional subset comparison between an expected spec template and a
//! live object's spec.
//!
//! Every field present in the expected tree must be present and equal
//! (recursively, by the same rule) in the actual tree; fields only the actual
//! tree carries are ignored. Sequences compare by equal length and positional
//! recursion, so element order matters. A `null` expected value matches
//! anything, which lets a template assert only that a parent exists.

use std::fmt;

use serde_json::Value;

/// A single point where the live object diverges from the template.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Slash-separated path from the spec root to the offending field.
    pub path: String,
    pub reason: MismatchReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// Field present in the template but absent from the live object.
    MissingField,
    /// Sequences differ in length; elements are not compared further.
    LengthMismatch { expected: usize, actual: usize },
    /// Leaf values differ, or the two sides have incompatible shapes.
    ValueMismatch { expected: Value, actual: Value },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            &self.path
        };
        match &self.reason {
            MismatchReason::MissingField => write!(f, "{path}: missing from live object"),
            MismatchReason::LengthMismatch { expected, actual } => {
                write!(f, "{path}: expected {expected} elements, found {actual}")
            }
            MismatchReason::ValueMismatch { expected, actual } => {
                write!(f, "{path}: expected {expected}, found {actual}")
            }
        }
    }
}

/// True when `actual` carries every field of `expected` with equal values.
///
/// Never panics; a shape conflict (template expects an object, live value is
/// a string) is just a mismatch.
#[must_use]
pub fn matches(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Null, _) => true,
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|live| matches(value, live))),
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected.iter().zip(actual).all(|(e, a)| matches(e, a))
        }
        (expected, actual) => expected == actual,
    }
}

/// Every point where `actual` diverges from `expected`, with paths.
///
/// `matches` is the short-circuiting equivalent of checking this for
/// emptiness; use this form when the caller wants to log what went wrong.
#[must_use]
pub fn mismatches(expected: &Value, actual: &Value) -> Vec<Mismatch> {
    let mut found = Vec::new();
    collect("", expected, actual, &mut found);
    found
}

fn collect(path: &str, expected: &Value, actual: &Value, found: &mut Vec<Mismatch>) {
    match (expected, actual) {
        (Value::Null, _) => {}
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, value) in expected {
                match actual.get(key) {
                    Some(live) => collect(&join(path, key), value, live, found),
                    None => found.push(Mismatch {
                        path: join(path, key),
                        reason: MismatchReason::MissingField,
                    }),
                }
            }
        }
        (Value::Array(expected), Value::Array(actual)) => {
            if expected.len() != actual.len() {
                found.push(Mismatch {
                    path: path.to_string(),
                    reason: MismatchReason::LengthMismatch {
                        expected: expected.len(),
                        actual: actual.len(),
                    },
                });
                return;
            }
            for (index, (value, live)) in expected.iter().zip(actual).enumerate() {
                collect(&join(path, &index.to_string()), value, live, found);
            }
        }
        (expected, actual) => {
            if expected != actual {
                found.push(Mismatch {
                    path: path.to_string(),
                    reason: MismatchReason::ValueMismatch {
                        expected: expected.clone(),
                        actual: actual.clone(),
                    },
                });
            }
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    format!("{path}/{segment}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_template_matches_anything() {
        let actual = json!({"replicas": 3, "paused": false});
        assert!(matches(&json!({}), &actual));
        assert!(mismatches(&json!({}), &actual).is_empty());
    }

    #[test]
    fn every_value_matches_itself() {
        let value = json!({
            "replicas": 1,
            "template": {"spec": {"containers": [{"name": "api", "ports": [24817]}]}}
        });
        assert!(matches(&value, &value));
    }

    #[test]
    fn extra_fields_in_the_live_object_are_ignored() {
        let expected = json!({"replicas": 1, "template": {"spec": {"containers": [{"name": "api"}]}}});
        let actual = json!({
            "replicas": 1,
            "paused": false,
            "template": {
                "metadata": {"labels": {"app": "pulp"}},
                "spec": {"containers": [{"name": "api", "imagePullPolicy": "IfNotPresent"}]}
            }
        });
        assert!(matches(&expected, &actual));
    }

    #[test]
    fn missing_field_is_reported_with_its_path() {
        let expected = json!({"template": {"spec": {"serviceAccountName": "pulp-operator-sa"}}});
        let actual = json!({"template": {"spec": {"containers": []}}});
        assert!(!matches(&expected, &actual));
        let found = mismatches(&expected, &actual);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "/template/spec/serviceAccountName");
        assert_eq!(found[0].reason, MismatchReason::MissingField);
    }

    #[test]
    fn sequences_are_order_sensitive() {
        assert!(matches(&json!(["a", "b"]), &json!(["a", "b"])));
        assert!(!matches(&json!(["a", "b"]), &json!(["b", "a"])));
    }

    #[test]
    fn sequences_must_have_equal_length() {
        assert!(!matches(&json!(["a", "b"]), &json!(["a"])));
        let found = mismatches(&json!({"args": ["a", "b"]}), &json!({"args": ["a", "b", "c"]}));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "/args");
        assert_eq!(
            found[0].reason,
            MismatchReason::LengthMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn null_template_value_matches_any_live_value() {
        let expected = json!({"selector": null});
        assert!(matches(&expected, &json!({"selector": {"app": "pulp"}})));
        assert!(matches(&expected, &json!({"selector": 7})));
    }

    #[test]
    fn shape_conflicts_mismatch_without_panicking() {
        let expected = json!({"template": {"spec": {}}});
        let actual = json!({"template": "not-an-object"});
        assert!(!matches(&expected, &actual));
        let found = mismatches(&expected, &actual);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "/template");
    }

    #[test]
    fn leaf_differences_carry_both_values() {
        let expected = json!({"ports": [{"containerPort": 24817}]});
        let actual = json!({"ports": [{"containerPort": 24816}]});
        let found = mismatches(&expected, &actual);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "/ports/0/containerPort");
        assert_eq!(
            found[0].reason,
            MismatchReason::ValueMismatch {
                expected: json!(24817),
                actual: json!(24816)
            }
        );
    }

    #[test]
    fn display_names_the_root_when_scalars_differ_at_top_level() {
        let found = mismatches(&json!("ClusterIP"), &json!("NodePort"));
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].to_string(),
            "(root): expected \"ClusterIP\", found \"NodePort\""
        );
    }
}
