//! Policy Enumerations
//!
//! Wire values of the Azure Policy API (2019-09-01).

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a policy effect is enforced during resource creation or update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnforcementMode {
    /// The policy effect is enforced during resource creation or update
    #[default]
    Default,
    /// The policy effect is not enforced during resource creation or update
    DoNotEnforce,
}

impl EnforcementMode {
    pub fn possible_values() -> &'static [EnforcementMode] {
        &[Self::Default, Self::DoNotEnforce]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::DoNotEnforce => "DoNotEnforce",
        }
    }
}

/// Data type of a policy parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    Array,
    Boolean,
    DateTime,
    Float,
    Integer,
    Object,
    String,
}

impl ParameterType {
    pub fn possible_values() -> &'static [ParameterType] {
        &[
            Self::Array,
            Self::Boolean,
            Self::DateTime,
            Self::Float,
            Self::Integer,
            Self::Object,
            Self::String,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Float => "Float",
            Self::Integer => "Integer",
            Self::Object => "Object",
            Self::String => "String",
        }
    }
}

/// Identity attached to a policy assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceIdentityType {
    /// No identity is associated with the resource, or the existing one should be removed
    None,
    /// A system assigned identity is associated with the resource
    SystemAssigned,
}

impl ResourceIdentityType {
    pub fn possible_values() -> &'static [ResourceIdentityType] {
        &[Self::None, Self::SystemAssigned]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::SystemAssigned => "SystemAssigned",
        }
    }
}

/// Origin of a policy definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    BuiltIn,
    Custom,
    NotSpecified,
    Static,
}

impl PolicyType {
    pub fn possible_values() -> &'static [PolicyType] {
        &[Self::BuiltIn, Self::Custom, Self::NotSpecified, Self::Static]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuiltIn => "BuiltIn",
            Self::Custom => "Custom",
            Self::NotSpecified => "NotSpecified",
            Self::Static => "Static",
        }
    }
}

/// Display and exact-match parsing for the enums above
macro_rules! wire_string {
    ($($ty:ident),+ $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::possible_values()
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let expected: Vec<&str> =
                            Self::possible_values().iter().map(|v| v.as_str()).collect();
                        anyhow!(
                            "invalid {} {:?}, expected one of: {}",
                            stringify!($ty),
                            s,
                            expected.join(", ")
                        )
                    })
            }
        }
    )+};
}

wire_string!(EnforcementMode, ParameterType, ResourceIdentityType, PolicyType);

/// Possible values of a policy enum by name, for the CLI
pub fn possible_values(name: &str) -> Option<Vec<&'static str>> {
    fn strs<T: Copy>(values: &'static [T], f: fn(&T) -> &'static str) -> Vec<&'static str> {
        values.iter().map(f).collect()
    }

    match name.to_lowercase().as_str() {
        "enforcement-mode" | "enforcementmode" => Some(strs(
            EnforcementMode::possible_values(),
            EnforcementMode::as_str,
        )),
        "parameter-type" | "parametertype" => Some(strs(
            ParameterType::possible_values(),
            ParameterType::as_str,
        )),
        "resource-identity-type" | "resourceidentitytype" => Some(strs(
            ResourceIdentityType::possible_values(),
            ResourceIdentityType::as_str,
        )),
        "type" | "policy-type" | "policytype" => {
            Some(strs(PolicyType::possible_values(), PolicyType::as_str))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_possible_values() {
        assert_eq!(EnforcementMode::possible_values().len(), 2);
        assert_eq!(ParameterType::possible_values().len(), 7);
        assert_eq!(ResourceIdentityType::possible_values().len(), 2);
        assert_eq!(PolicyType::possible_values().len(), 4);
    }

    #[test]
    fn test_from_str_is_exact() {
        assert_eq!(
            "DoNotEnforce".parse::<EnforcementMode>().unwrap(),
            EnforcementMode::DoNotEnforce
        );
        assert!("donotenforce".parse::<EnforcementMode>().is_err());
        let err = "Bogus".parse::<PolicyType>().unwrap_err();
        assert!(err.to_string().contains("BuiltIn, Custom, NotSpecified, Static"));
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&ResourceIdentityType::SystemAssigned).unwrap();
        assert_eq!(json, "\"SystemAssigned\"");
        let parsed: ParameterType = serde_json::from_str("\"DateTime\"").unwrap();
        assert_eq!(parsed, ParameterType::DateTime);
    }

    #[test]
    fn test_possible_values_by_name() {
        assert_eq!(
            possible_values("enforcement-mode"),
            Some(vec!["Default", "DoNotEnforce"])
        );
        assert_eq!(possible_values("type").map(|v| v.len()), Some(4));
        assert!(possible_values("nope").is_none());
    }
}
