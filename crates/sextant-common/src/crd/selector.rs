//! Label and namespace selectors shared by the monitoring CRDs

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Operator for label selector requirements
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum LabelSelectorOperator {
    /// Label value must be in the specified set
    In,
    /// Label value must not be in the specified set
    NotIn,
    /// Label must exist (value ignored)
    Exists,
    /// Label must not exist (value ignored)
    DoesNotExist,
    /// Any operator this version does not understand.
    ///
    /// Deserializes instead of failing so callers can skip it.
    #[serde(other)]
    Unknown,
}

impl LabelSelectorOperator {
    /// Check if a label value matches this requirement
    ///
    /// - `label_value`: The actual label value (None if label doesn't exist)
    /// - `values`: The values specified in the requirement
    pub fn matches(&self, label_value: Option<&str>, values: &[String]) -> bool {
        match self {
            Self::In => label_value.is_some_and(|v| values.iter().any(|req| req == v)),
            Self::NotIn => {
                label_value.is_none() || !values.iter().any(|req| Some(req.as_str()) == label_value)
            }
            Self::Exists => label_value.is_some(),
            Self::DoesNotExist => label_value.is_none(),
            Self::Unknown => false,
        }
    }
}

/// A label selector requirement (Kubernetes `LabelSelectorRequirement`)
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    /// The label key that the selector applies to
    pub key: String,

    /// Operator representing the relationship between label and values
    pub operator: LabelSelectorOperator,

    /// Values for `In` and `NotIn`; empty for `Exists` and `DoesNotExist`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl LabelSelectorRequirement {
    /// Check if a label set matches this requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key).map(|s| s.as_str());
        self.operator.matches(value, &self.values)
    }
}

/// Kubernetes-style label selector.
///
/// `match_labels` is a `BTreeMap` so anything derived from it iterates in a
/// stable key order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Map of label key-value pairs for exact matching
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,

    /// List of set-based requirements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    /// Check if a label set satisfies every label and expression
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
            && self.match_expressions.iter().all(|req| req.matches(labels))
    }

    /// Check if this selector is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

/// Which namespaces a ServiceMonitor discovers services in.
///
/// The zero value means "the monitor's own namespace". `match_names` wins
/// over `any` when both are set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    /// Select services in every namespace
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub any: bool,

    /// Explicit list of namespace names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_names: Vec<String>,
}

/// Resolved namespace scope of a [`NamespaceSelector`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceScope<'a> {
    /// Only the namespace the monitor lives in
    Own,
    /// Exactly these namespaces
    Names(&'a [String]),
    /// Every namespace
    Any,
}

impl NamespaceSelector {
    /// Resolve the selector with its precedence: names, then any, then own.
    pub fn scope(&self) -> NamespaceScope<'_> {
        if !self.match_names.is_empty() {
            NamespaceScope::Names(&self.match_names)
        } else if self.any {
            NamespaceScope::Any
        } else {
            NamespaceScope::Own
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn req(key: &str, operator: LabelSelectorOperator, values: &[&str]) -> LabelSelectorRequirement {
        LabelSelectorRequirement {
            key: key.to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    // =========================================================================
    // Operator semantics
    // =========================================================================

    #[test]
    fn in_and_not_in() {
        let set = labels(&[("tier", "a")]);
        assert!(req("tier", LabelSelectorOperator::In, &["a", "b"]).matches(&set));
        assert!(!req("tier", LabelSelectorOperator::NotIn, &["a", "b"]).matches(&set));
        assert!(req("tier", LabelSelectorOperator::NotIn, &["c"]).matches(&set));
        // NotIn is satisfied by a missing label
        assert!(req("zone", LabelSelectorOperator::NotIn, &["a"]).matches(&set));
    }

    #[test]
    fn exists_and_does_not_exist() {
        let set = labels(&[("tier", "a")]);
        assert!(req("tier", LabelSelectorOperator::Exists, &[]).matches(&set));
        assert!(req("zone", LabelSelectorOperator::DoesNotExist, &[]).matches(&set));
        assert!(!req("tier", LabelSelectorOperator::DoesNotExist, &[]).matches(&set));
    }

    #[test]
    fn unknown_operator_deserializes_and_never_matches() {
        let parsed: LabelSelectorRequirement =
            serde_json::from_value(serde_json::json!({"key": "tier", "operator": "Gt"})).unwrap();
        assert_eq!(parsed.operator, LabelSelectorOperator::Unknown);
        assert!(!parsed.matches(&labels(&[("tier", "a")])));
    }

    // =========================================================================
    // Selector evaluation
    // =========================================================================

    #[test]
    fn empty_selector_matches_everything() {
        let selector = LabelSelector::default();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("team", "x")])));
    }

    #[test]
    fn selector_requires_all_terms() {
        let selector = LabelSelector {
            match_labels: labels(&[("team", "x")]),
            match_expressions: vec![req("tier", LabelSelectorOperator::In, &["a"])],
        };
        assert!(selector.matches(&labels(&[("team", "x"), ("tier", "a")])));
        assert!(!selector.matches(&labels(&[("team", "x"), ("tier", "b")])));
        assert!(!selector.matches(&labels(&[("tier", "a")])));
    }

    // =========================================================================
    // Namespace scope precedence
    // =========================================================================

    #[test]
    fn namespace_scope_defaults_to_own() {
        assert_eq!(NamespaceSelector::default().scope(), NamespaceScope::Own);
    }

    #[test]
    fn namespace_scope_any() {
        let sel = NamespaceSelector {
            any: true,
            match_names: vec![],
        };
        assert_eq!(sel.scope(), NamespaceScope::Any);
    }

    #[test]
    fn explicit_names_win_over_any() {
        let names = vec!["ns1".to_string(), "ns2".to_string()];
        let sel = NamespaceSelector {
            any: true,
            match_names: names.clone(),
        };
        assert_eq!(sel.scope(), NamespaceScope::Names(&names));
    }

    #[test]
    fn namespace_selector_uses_camel_case() {
        let sel: NamespaceSelector =
            serde_json::from_value(serde_json::json!({"matchNames": ["a"]})).unwrap();
        assert_eq!(sel.match_names, vec!["a".to_string()]);
        assert!(!sel.any);
    }
}
