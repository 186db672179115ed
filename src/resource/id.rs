//! Resource Identifier Codec
//!
//! Parses and formats hierarchical Azure Resource Manager IDs:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/{provider}/{type}/{name}[/{type}/{name}...]
//! ```
//!
//! Each resource type is described by an [`IdShape`] marker. Keyword segments
//! (`subscriptions`, `resourceGroups`, `providers`, the provider namespace and
//! the type names) match case-insensitively; value segments are kept verbatim.
//! Formatting always emits the canonical keyword casing.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;
use thiserror::Error;

/// Static description of an ID layout below the resource group
pub trait IdShape: fmt::Debug + Clone + Copy + PartialEq + Eq + Hash {
    /// Human-readable name used in error messages
    const DESCRIPTION: &'static str;
    /// Provider namespace, e.g. `Microsoft.ServiceBus`
    const PROVIDER: &'static str;
    /// Canonical type keywords, outermost first
    const TYPES: &'static [&'static str];
    /// Field names of the value segments paired with `TYPES`
    const NAMES: &'static [&'static str];
}

/// Why an identifier was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKind {
    #[error("expected the ID to start with '/'")]
    NotAbsolute,

    #[error("expected {expected} segments, found {found}")]
    SegmentCount { expected: usize, found: usize },

    #[error("expected segment {position} to be {expected:?}, found {found:?}")]
    Keyword {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("the value for {segment:?} is empty")]
    EmptyValue { segment: &'static str },

    #[error("the value {value:?} for {segment:?} is not a single path segment")]
    InvalidValue {
        segment: &'static str,
        value: String,
    },
}

/// Values must be exactly one path segment that `Url::join` leaves alone
fn check_value(segment: &'static str, value: &str) -> Result<(), MalformedKind> {
    if value.is_empty() {
        return Err(MalformedKind::EmptyValue { segment });
    }
    if value.contains('/') || value == "." || value == ".." {
        return Err(MalformedKind::InvalidValue {
            segment,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A structurally invalid resource ID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing {description} ID {input:?}: {kind}")]
pub struct MalformedIdentifierError {
    pub description: &'static str,
    pub input: String,
    pub kind: MalformedKind,
}

impl MalformedIdentifierError {
    fn new<S: IdShape>(input: &str, kind: MalformedKind) -> Self {
        Self {
            description: S::DESCRIPTION,
            input: input.to_string(),
            kind,
        }
    }
}

/// Expected content of one path segment
enum Segment {
    Keyword(&'static str),
    Value(&'static str),
}

fn template<S: IdShape>() -> Vec<Segment> {
    let mut segments = vec![
        Segment::Keyword("subscriptions"),
        Segment::Value("subscription_id"),
        Segment::Keyword("resourceGroups"),
        Segment::Value("resource_group_name"),
        Segment::Keyword("providers"),
        Segment::Keyword(S::PROVIDER),
    ];
    for (kind, name) in S::TYPES.iter().copied().zip(S::NAMES.iter().copied()) {
        segments.push(Segment::Keyword(kind));
        segments.push(Segment::Value(name));
    }
    segments
}

/// A parsed ARM resource ID of shape `S`
///
/// Fields are private: every value is non-empty and `names` has exactly one
/// entry per type in `S::TYPES`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId<S: IdShape> {
    subscription_id: String,
    resource_group_name: String,
    names: Vec<String>,
    shape: PhantomData<S>,
}

impl<S: IdShape> ResourceId<S> {
    /// Build an ID from its values, outermost name first
    pub fn new<I, N>(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        names: I,
    ) -> Result<Self, MalformedIdentifierError>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let id = Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            names: names.into_iter().map(Into::into).collect(),
            shape: PhantomData,
        };
        id.validate()?;
        Ok(id)
    }

    /// Parse an ID string, matching keywords case-insensitively
    pub fn parse(input: &str) -> Result<Self, MalformedIdentifierError> {
        let Some(rest) = input.strip_prefix('/') else {
            return Err(MalformedIdentifierError::new::<S>(
                input,
                MalformedKind::NotAbsolute,
            ));
        };

        let segments: Vec<&str> = rest.split('/').collect();
        let expected = template::<S>();
        if segments.len() != expected.len() {
            return Err(MalformedIdentifierError::new::<S>(
                input,
                MalformedKind::SegmentCount {
                    expected: expected.len(),
                    found: segments.len(),
                },
            ));
        }

        let mut values = Vec::with_capacity(2 + S::TYPES.len());
        for (position, (found, expect)) in segments.iter().zip(&expected).enumerate() {
            match expect {
                Segment::Keyword(keyword) => {
                    if !found.eq_ignore_ascii_case(keyword) {
                        return Err(MalformedIdentifierError::new::<S>(
                            input,
                            MalformedKind::Keyword {
                                position,
                                expected: *keyword,
                                found: found.to_string(),
                            },
                        ));
                    }
                }
                Segment::Value(segment) => {
                    check_value(*segment, found)
                        .map_err(|kind| MalformedIdentifierError::new::<S>(input, kind))?;
                    values.push(found.to_string());
                }
            }
        }

        let mut values = values.into_iter();
        let subscription_id = values.next().unwrap_or_default();
        let resource_group_name = values.next().unwrap_or_default();
        Ok(Self {
            subscription_id,
            resource_group_name,
            names: values.collect(),
            shape: PhantomData,
        })
    }

    fn validate(&self) -> Result<(), MalformedIdentifierError> {
        if self.names.len() != S::TYPES.len() {
            return Err(MalformedIdentifierError::new::<S>(
                &self.render(),
                MalformedKind::SegmentCount {
                    expected: 6 + 2 * S::TYPES.len(),
                    found: 6 + 2 * self.names.len(),
                },
            ));
        }

        let values = [
            ("subscription_id", self.subscription_id.as_str()),
            ("resource_group_name", self.resource_group_name.as_str()),
        ]
        .into_iter()
        .chain(S::NAMES.iter().copied().zip(self.names.iter().map(String::as_str)));

        for (segment, value) in values {
            check_value(segment, value)
                .map_err(|kind| MalformedIdentifierError::new::<S>(&self.render(), kind))?;
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id,
            self.resource_group_name,
            S::PROVIDER
        );
        for (kind, name) in S::TYPES.iter().zip(&self.names) {
            out.push('/');
            out.push_str(kind);
            out.push('/');
            out.push_str(name);
        }
        out
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> &str {
        &self.resource_group_name
    }

    /// All scoped names, outermost first
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names of the parent scopes (everything but the leaf)
    pub fn parent_names(&self) -> &[String] {
        let len = self.names.len().saturating_sub(1);
        &self.names[..len]
    }

    /// Leaf resource name
    pub fn name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }

    /// Canonical ID string
    pub fn id(&self) -> String {
        self.render()
    }

    fn segment(&self, index: usize) -> &str {
        self.names.get(index).map(String::as_str).unwrap_or_default()
    }
}

impl<S: IdShape> fmt::Display for ResourceId<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<S: IdShape> FromStr for ResourceId<S> {
    type Err = MalformedIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Service Bus
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceBusNamespace;

impl IdShape for ServiceBusNamespace {
    const DESCRIPTION: &'static str = "Service Bus Namespace";
    const PROVIDER: &'static str = "Microsoft.ServiceBus";
    const TYPES: &'static [&'static str] = &["namespaces"];
    const NAMES: &'static [&'static str] = &["namespace_name"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceBusTopic;

impl IdShape for ServiceBusTopic {
    const DESCRIPTION: &'static str = "Service Bus Topic";
    const PROVIDER: &'static str = "Microsoft.ServiceBus";
    const TYPES: &'static [&'static str] = &["namespaces", "topics"];
    const NAMES: &'static [&'static str] = &["namespace_name", "topic_name"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceBusSubscription;

impl IdShape for ServiceBusSubscription {
    const DESCRIPTION: &'static str = "Service Bus Subscription";
    const PROVIDER: &'static str = "Microsoft.ServiceBus";
    const TYPES: &'static [&'static str] = &["namespaces", "topics", "subscriptions"];
    const NAMES: &'static [&'static str] = &["namespace_name", "topic_name", "name"];
}

pub type NamespaceId = ResourceId<ServiceBusNamespace>;
pub type TopicId = ResourceId<ServiceBusTopic>;
pub type ServiceBusSubscriptionId = ResourceId<ServiceBusSubscription>;

impl NamespaceId {
    pub fn namespace_name(&self) -> &str {
        self.segment(0)
    }
}

impl TopicId {
    pub fn namespace_name(&self) -> &str {
        self.segment(0)
    }

    pub fn topic_name(&self) -> &str {
        self.segment(1)
    }

    pub fn namespace_id(&self) -> NamespaceId {
        ResourceId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            names: self.parent_names().to_vec(),
            shape: PhantomData,
        }
    }

    /// ID of a subscription on this topic
    pub fn child_subscription(
        &self,
        name: &str,
    ) -> Result<ServiceBusSubscriptionId, MalformedIdentifierError> {
        ResourceId::new(
            self.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.names.iter().cloned().chain(std::iter::once(name.to_string())),
        )
    }
}

impl ServiceBusSubscriptionId {
    pub fn namespace_name(&self) -> &str {
        self.segment(0)
    }

    pub fn topic_name(&self) -> &str {
        self.segment(1)
    }

    pub fn topic_id(&self) -> TopicId {
        ResourceId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            names: self.parent_names().to_vec(),
            shape: PhantomData,
        }
    }
}

// =============================================================================
// Purview
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PurviewAccount;

impl IdShape for PurviewAccount {
    const DESCRIPTION: &'static str = "Purview Account";
    const PROVIDER: &'static str = "Microsoft.Purview";
    const TYPES: &'static [&'static str] = &["accounts"];
    const NAMES: &'static [&'static str] = &["name"];
}

pub type PurviewAccountId = ResourceId<PurviewAccount>;

// =============================================================================
// App Service
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppServicePlan;

impl IdShape for AppServicePlan {
    const DESCRIPTION: &'static str = "App Service Plan";
    const PROVIDER: &'static str = "Microsoft.Web";
    const TYPES: &'static [&'static str] = &["serverFarms"];
    const NAMES: &'static [&'static str] = &["server_farm_name"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppService;

impl IdShape for AppService {
    const DESCRIPTION: &'static str = "App Service";
    const PROVIDER: &'static str = "Microsoft.Web";
    const TYPES: &'static [&'static str] = &["sites"];
    const NAMES: &'static [&'static str] = &["site_name"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppServiceSlot;

impl IdShape for AppServiceSlot {
    const DESCRIPTION: &'static str = "App Service Slot";
    const PROVIDER: &'static str = "Microsoft.Web";
    const TYPES: &'static [&'static str] = &["sites", "slots"];
    const NAMES: &'static [&'static str] = &["site_name", "slot_name"];
}

pub type AppServicePlanId = ResourceId<AppServicePlan>;
pub type AppServiceId = ResourceId<AppService>;
pub type AppServiceSlotId = ResourceId<AppServiceSlot>;

impl AppServicePlanId {
    pub fn server_farm_name(&self) -> &str {
        self.segment(0)
    }
}

impl AppServiceId {
    pub fn site_name(&self) -> &str {
        self.segment(0)
    }
}

impl AppServiceSlotId {
    pub fn site_name(&self) -> &str {
        self.segment(0)
    }

    pub fn slot_name(&self) -> &str {
        self.segment(1)
    }

    pub fn app_service_id(&self) -> AppServiceId {
        ResourceId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            names: self.parent_names().to_vec(),
            shape: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-rg/providers/Microsoft.ServiceBus/namespaces/ns-a/topics/orders";

    #[test]
    fn test_parse_topic_id() {
        let id = TopicId::parse(TOPIC).unwrap();
        assert_eq!(id.subscription_id(), "12345678-1234-9876-4563-123456789012");
        assert_eq!(id.resource_group_name(), "example-rg");
        assert_eq!(id.namespace_name(), "ns-a");
        assert_eq!(id.topic_name(), "orders");
        assert_eq!(id.name(), "orders");
        assert_eq!(id.parent_names(), ["ns-a".to_string()]);
    }

    #[test]
    fn test_format_round_trips() {
        let id: TopicId = TOPIC.parse().unwrap();
        assert_eq!(id.to_string(), TOPIC);
        assert_eq!(id.id(), TOPIC);
    }

    #[test]
    fn test_values_keep_their_case() {
        let input = "/subscriptions/sub/resourceGroups/My-RG/providers/Microsoft.Purview/accounts/MyAccount";
        let id = PurviewAccountId::parse(input).unwrap();
        assert_eq!(id.resource_group_name(), "My-RG");
        assert_eq!(id.name(), "MyAccount");
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let input = "/SUBSCRIPTIONS/sub/resourcegroups/rg/PROVIDERS/microsoft.web/serverfarms/plan1";
        let id = AppServicePlanId::parse(input).unwrap();
        assert_eq!(id.server_farm_name(), "plan1");
        assert_eq!(
            id.to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Web/serverFarms/plan1"
        );
    }

    #[test]
    fn test_rejects_relative_path() {
        let err = PurviewAccountId::parse("subscriptions/sub/resourceGroups/rg/providers/Microsoft.Purview/accounts/a")
            .unwrap_err();
        assert_eq!(err.kind, MalformedKind::NotAbsolute);
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        let err = TopicId::parse("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ServiceBus/namespaces/ns")
            .unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::SegmentCount {
                expected: 10,
                found: 8
            }
        );
        assert_eq!(err.description, "Service Bus Topic");
    }

    #[test]
    fn test_rejects_trailing_slash() {
        let input = format!("{}/", TOPIC);
        assert!(matches!(
            TopicId::parse(&input).unwrap_err().kind,
            MalformedKind::SegmentCount { .. }
        ));
    }

    #[test]
    fn test_rejects_wrong_keyword() {
        let err = TopicId::parse("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ServiceBus/namespaces/ns/queues/q")
            .unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::Keyword {
                position: 8,
                expected: "topics",
                found: "queues".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_wrong_provider() {
        let err = PurviewAccountId::parse("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/accounts/a")
            .unwrap_err();
        assert!(matches!(err.kind, MalformedKind::Keyword { position: 5, .. }));
    }

    #[test]
    fn test_rejects_empty_value() {
        let err = TopicId::parse("/subscriptions/sub/resourceGroups//providers/Microsoft.ServiceBus/namespaces/ns/topics/t")
            .unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::EmptyValue {
                segment: "resource_group_name"
            }
        );
    }

    #[test]
    fn test_new_rejects_empty_fields() {
        let err = TopicId::new("sub", "rg", ["", "topic"]).unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::EmptyValue {
                segment: "namespace_name"
            }
        );

        let err = TopicId::new("sub", "rg", ["ns"]).unwrap_err();
        assert!(matches!(err.kind, MalformedKind::SegmentCount { .. }));
    }

    #[test]
    fn test_new_rejects_multi_segment_values() {
        let err = TopicId::new("sub", "rg", ["ns", "a/b"]).unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::InvalidValue {
                segment: "topic_name",
                value: "a/b".to_string()
            }
        );

        for dots in [".", ".."] {
            let err = TopicId::new("sub", dots, ["ns", "t"]).unwrap_err();
            assert!(matches!(
                err.kind,
                MalformedKind::InvalidValue {
                    segment: "resource_group_name",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_parse_rejects_dot_segments() {
        let err = TopicId::parse("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ServiceBus/namespaces/../topics/t")
            .unwrap_err();
        assert_eq!(
            err.kind,
            MalformedKind::InvalidValue {
                segment: "namespace_name",
                value: "..".to_string()
            }
        );
    }

    #[test]
    fn test_child_subscription_rejects_dot_dot() {
        let topic = TopicId::parse(TOPIC).unwrap();
        let err = topic.child_subscription("..").unwrap_err();
        assert!(matches!(err.kind, MalformedKind::InvalidValue { segment: "name", .. }));
        assert!(topic.child_subscription("x/y").is_err());
    }

    #[test]
    fn test_subscription_derivations() {
        let topic = TopicId::parse(TOPIC).unwrap();
        let sub = topic.child_subscription("audit").unwrap();
        assert_eq!(sub.name(), "audit");
        assert_eq!(sub.topic_name(), "orders");
        assert_eq!(sub.topic_id(), topic);
        assert_eq!(sub.to_string(), format!("{}/subscriptions/audit", TOPIC));
        assert_eq!(topic.namespace_id().namespace_name(), "ns-a");
    }

    #[test]
    fn test_slot_id() {
        let id = AppServiceSlotId::new("sub", "rg", ["site1", "staging"]).unwrap();
        assert_eq!(
            id.to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Web/sites/site1/slots/staging"
        );
        assert_eq!(id.slot_name(), "staging");
        assert_eq!(id.app_service_id().site_name(), "site1");
    }

    #[test]
    fn test_error_message_names_the_shape() {
        let err = PurviewAccountId::parse("/nope").unwrap_err();
        assert!(err.to_string().starts_with("parsing Purview Account ID \"/nope\""));
    }
}
