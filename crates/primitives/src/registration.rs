use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// Membership of an operator in one operator set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RegistrationStatus {
    /// Never registered.
    #[default]
    Unregistered,
    Registered,
    /// Deregistered, but still slashable through `slashable_until` inclusive.
    #[serde(rename_all = "camelCase")]
    Deregistered { slashable_until: u32 },
}

impl RegistrationStatus {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }

    pub fn is_slashable(&self, block: u32) -> bool {
        match self {
            Self::Unregistered => false,
            Self::Registered => true,
            Self::Deregistered { slashable_until } => block <= *slashable_until,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterParams {
    pub avs: Address,
    pub operator_set_ids: Vec<u32>,
    /// Opaque payload forwarded to the AVS registrar.
    #[serde(default)]
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeregisterParams {
    pub operator: Address,
    pub avs: Address,
    pub operator_set_ids: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deregistered_operator_is_slashable_through_grace_window() {
        let status = RegistrationStatus::Deregistered { slashable_until: 3100 };
        assert!(!status.is_registered());
        assert!(status.is_slashable(3000));
        assert!(status.is_slashable(3100));
        assert!(!status.is_slashable(3101));
    }

    #[test]
    fn unregistered_operator_is_never_slashable() {
        assert!(!RegistrationStatus::Unregistered.is_slashable(0));
        assert!(RegistrationStatus::Registered.is_slashable(u32::MAX));
    }

    #[test]
    fn status_serializes_with_tag() {
        let json =
            serde_json::to_value(RegistrationStatus::Deregistered { slashable_until: 5 }).unwrap();
        assert_eq!(json["status"], "deregistered");
        assert_eq!(json["slashableUntil"], 5);
    }
}
