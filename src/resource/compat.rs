//! Legacy field compatibility
//!
//! Some adapters accept either a composite ID (`topic_id`) or the deprecated
//! discrete fields it replaces (`resource_group_name`, `namespace_name`,
//! `topic_name`). A non-empty composite ID always wins and any discrete
//! values are discarded; otherwise the discrete fields are used as given.

use super::id::{IdShape, MalformedIdentifierError, ResourceId};

/// Discrete fields describing the same entity as a composite ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscreteFields {
    pub resource_group_name: Option<String>,
    /// Scoped names, outermost first
    pub names: Vec<Option<String>>,
}

impl DiscreteFields {
    pub fn new(resource_group_name: Option<String>, names: Vec<Option<String>>) -> Self {
        Self {
            resource_group_name,
            names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_group_name.as_deref().unwrap_or_default().is_empty()
            && self
                .names
                .iter()
                .all(|n| n.as_deref().unwrap_or_default().is_empty())
    }
}

/// Which input mode produced a resolved ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    Composite,
    Discrete,
}

/// Resolve an ID from a composite string or discrete legacy fields
///
/// Discrete fields are scoped to `default_subscription`. Missing discrete
/// values surface as an empty-value error from ID construction.
pub fn resolve_id<S: IdShape>(
    composite: Option<&str>,
    default_subscription: &str,
    discrete: &DiscreteFields,
) -> Result<(ResourceId<S>, IdSource), MalformedIdentifierError> {
    if let Some(raw) = composite.filter(|v| !v.is_empty()) {
        if !discrete.is_empty() {
            tracing::debug!(
                "{} ID supplied alongside legacy fields, using the ID",
                S::DESCRIPTION
            );
        }
        return ResourceId::parse(raw).map(|id| (id, IdSource::Composite));
    }

    let resource_group = discrete.resource_group_name.clone().unwrap_or_default();
    let names = discrete
        .names
        .iter()
        .map(|n| n.clone().unwrap_or_default());
    ResourceId::new(default_subscription, resource_group, names).map(|id| (id, IdSource::Discrete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::id::{MalformedKind, TopicId};

    fn legacy(rg: &str, ns: &str, topic: &str) -> DiscreteFields {
        DiscreteFields::new(
            Some(rg.to_string()),
            vec![Some(ns.to_string()), Some(topic.to_string())],
        )
    }

    #[test]
    fn test_composite_wins_over_discrete() {
        let composite = "/subscriptions/sub-a/resourceGroups/rg-a/providers/Microsoft.ServiceBus/namespaces/ns-a/topics/t-a";
        let (id, source): (TopicId, _) =
            resolve_id(Some(composite), "sub-default", &legacy("rg-b", "ns-b", "t-b")).unwrap();

        assert_eq!(source, IdSource::Composite);
        assert_eq!(id.subscription_id(), "sub-a");
        assert_eq!(id.resource_group_name(), "rg-a");
        assert_eq!(id.namespace_name(), "ns-a");
        assert_eq!(id.topic_name(), "t-a");
    }

    #[test]
    fn test_discrete_used_when_composite_absent() {
        let (id, source): (TopicId, _) =
            resolve_id(None, "sub-default", &legacy("rg-b", "ns-b", "t-b")).unwrap();

        assert_eq!(source, IdSource::Discrete);
        assert_eq!(id.subscription_id(), "sub-default");
        assert_eq!(id.namespace_name(), "ns-b");
    }

    #[test]
    fn test_empty_composite_counts_as_absent() {
        let (_, source): (TopicId, _) =
            resolve_id(Some(""), "sub", &legacy("rg", "ns", "t")).unwrap();
        assert_eq!(source, IdSource::Discrete);
    }

    #[test]
    fn test_malformed_composite_is_not_rescued_by_discrete() {
        let result: Result<(TopicId, _), _> =
            resolve_id(Some("/not/a/topic"), "sub", &legacy("rg", "ns", "t"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_discrete_value() {
        let fields = DiscreteFields::new(Some("rg".to_string()), vec![None, Some("t".to_string())]);
        let err = resolve_id::<crate::resource::id::ServiceBusTopic>(None, "sub", &fields).unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::EmptyValue {
                segment: "namespace_name"
            }
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(DiscreteFields::default().is_empty());
        assert!(DiscreteFields::new(Some(String::new()), vec![None]).is_empty());
        assert!(!legacy("rg", "", "").is_empty());
    }
}
