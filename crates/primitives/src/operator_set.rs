use std::fmt;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// An AVS-scoped group of operators. The id is unique per AVS only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorSet {
    pub avs: Address,
    pub id: u32,
}

impl OperatorSet {
    pub const fn new(avs: Address, id: u32) -> Self {
        Self { avs, id }
    }

    /// Packed 32 byte key: the AVS address in the high 20 bytes, the id in the low 4.
    pub fn key(&self) -> B256 {
        let mut key = [0u8; 32];
        key[..20].copy_from_slice(self.avs.as_slice());
        key[28..].copy_from_slice(&self.id.to_be_bytes());
        B256::from(key)
    }
}

impl fmt::Display for OperatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.avs, self.id)
    }
}

/// Input for creating one operator set together with its initial strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetParams {
    pub operator_set_id: u32,
    #[serde(default)]
    pub strategies: Vec<Address>,
}
