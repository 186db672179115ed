//! Service Bus Subscription data source
//!
//! Looks up a topic subscription by name. The topic is given by `topic_id`,
//! or, while the legacy schema is active, by the deprecated `topic_name`,
//! `resource_group_name` and `namespace_name` fields.

use super::{with_timeout, Timeouts};
use crate::azure::ArmClient;
use crate::resource::{resolve_id, DiscreteFields, IdSource, ServiceBusSubscriptionId, TopicId};
use crate::state::ResourceData;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const API_VERSION: &str = "2024-01-01";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(5, 5, 5, 5);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProperties {
    pub auto_delete_on_idle: Option<String>,
    pub default_message_time_to_live: Option<String>,
    pub lock_duration: Option<String>,
    pub dead_lettering_on_message_expiration: Option<bool>,
    pub dead_lettering_on_filter_evaluation_exceptions: Option<bool>,
    pub enable_batched_operations: Option<bool>,
    pub max_delivery_count: Option<i64>,
    pub requires_session: Option<bool>,
    pub forward_to: Option<String>,
    pub forward_dead_lettered_messages_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionModel {
    #[serde(default)]
    pub properties: Option<SubscriptionProperties>,
}

/// Validate a Service Bus topic name
pub fn validate_topic_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '/'));
    let edges_alnum = name
        .chars()
        .next()
        .zip(name.chars().last())
        .map(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric())
        .unwrap_or(false);

    if name.is_empty() || name.len() > 260 || !valid_chars || !edges_alnum {
        bail!(
            "topic name {:?} must be 1-260 characters of letters, digits, '-', '.', '_', '~' or '/', starting and ending with a letter or digit",
            name
        );
    }
    Ok(())
}

/// Validate a Service Bus namespace name
pub fn validate_namespace_name(name: &str) -> Result<()> {
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let ends_alnum = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if name.len() < 6 || name.len() > 50 || !starts_with_letter || !ends_alnum || !valid_chars {
        bail!(
            "namespace name {:?} must be 6-50 characters of letters, digits and hyphens, starting with a letter and ending with a letter or digit",
            name
        );
    }
    Ok(())
}

/// Work out which topic the subscription lives on
fn resolve_topic(client: &ArmClient, data: &ResourceData, legacy_schema: bool) -> Result<TopicId> {
    let topic_id = data.get_opt_str("topic_id");

    if !legacy_schema {
        let Some(raw) = topic_id else {
            bail!("`topic_id` is required");
        };
        return TopicId::parse(&raw).with_context(|| format!("parsing topic ID {:?}", raw));
    }

    let discrete = DiscreteFields::new(
        data.get_opt_str("resource_group_name"),
        vec![data.get_opt_str("namespace_name"), data.get_opt_str("topic_name")],
    );
    if topic_id.is_none() && discrete.is_empty() {
        bail!("one of `topic_id`, `topic_name`, `resource_group_name` or `namespace_name` must be specified");
    }

    let (topic, source): (TopicId, _) =
        resolve_id(topic_id.as_deref(), &client.subscription_id, &discrete)
            .context("determining the topic")?;
    if source == IdSource::Discrete {
        validate_namespace_name(topic.namespace_name())?;
        validate_topic_name(topic.topic_name())?;
    }
    Ok(topic)
}

/// Read a Service Bus subscription into `data`
pub async fn read_subscription(
    client: &ArmClient,
    data: &mut ResourceData,
    legacy_schema: bool,
) -> Result<()> {
    with_timeout(TIMEOUTS.read, read_subscription_inner(client, data, legacy_schema)).await
}

async fn read_subscription_inner(
    client: &ArmClient,
    data: &mut ResourceData,
    legacy_schema: bool,
) -> Result<()> {
    let name = data.get_str("name").to_string();
    if name.is_empty() {
        bail!("`name` is required");
    }

    let topic = resolve_topic(client, data, legacy_schema)?;
    let id: ServiceBusSubscriptionId = topic.child_subscription(&name)?;

    let model: SubscriptionModel = match client.get_resource(&id.id(), API_VERSION).await {
        Ok(model) => model,
        Err(e) if e.is_not_found() => bail!("{} was not found", id),
        Err(e) => return Err(anyhow::Error::new(e).context(format!("retrieving {}", id))),
    };

    data.set_id(id.id());
    tracing::info!("read Service Bus subscription {}", id);

    let props = model.properties.unwrap_or_default();
    data.set("auto_delete_on_idle", &props.auto_delete_on_idle)?;
    data.set("default_message_ttl", &props.default_message_time_to_live)?;
    data.set("lock_duration", &props.lock_duration)?;
    data.set(
        "dead_lettering_on_message_expiration",
        props.dead_lettering_on_message_expiration.unwrap_or(false),
    )?;
    data.set(
        "dead_lettering_on_filter_evaluation_error",
        props.dead_lettering_on_filter_evaluation_exceptions.unwrap_or(false),
    )?;
    data.set(
        "batched_operations_enabled",
        props.enable_batched_operations.unwrap_or(false),
    )?;
    data.set("requires_session", props.requires_session.unwrap_or(false))?;
    data.set(
        "forward_dead_lettered_messages_to",
        &props.forward_dead_lettered_messages_to,
    )?;
    data.set("forward_to", &props.forward_to)?;
    data.set("max_delivery_count", props.max_delivery_count.unwrap_or(0))?;

    if legacy_schema {
        data.set(
            "enable_batched_operations",
            props.enable_batched_operations.unwrap_or(false),
        )?;
    }

    Ok(())
}
