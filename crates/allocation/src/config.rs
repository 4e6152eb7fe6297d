use serde::{Deserialize, Serialize};

/// Blocks a slashable deallocation stays encumbered, and an operator stays slashable
/// after deregistering. Roughly 14 days of 12s blocks.
pub const DEFAULT_DEALLOCATION_DELAY: u32 = 100_800;

/// Blocks before a newly configured allocation delay takes effect.
pub const DEFAULT_ALLOCATION_CONFIGURATION_DELAY: u32 = 126_000;

pub const DEFAULT_MAX_OPERATOR_SET_STRATEGIES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocationConfig {
    pub deallocation_delay: u32,
    pub allocation_configuration_delay: u32,
    pub max_operator_set_strategies: usize,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            deallocation_delay: DEFAULT_DEALLOCATION_DELAY,
            allocation_configuration_delay: DEFAULT_ALLOCATION_CONFIGURATION_DELAY,
            max_operator_set_strategies: DEFAULT_MAX_OPERATOR_SET_STRATEGIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AllocationConfig =
            serde_json::from_str(r#"{ "deallocationDelay": 50 }"#).unwrap();
        assert_eq!(config.deallocation_delay, 50);
        assert_eq!(config.allocation_configuration_delay, DEFAULT_ALLOCATION_CONFIGURATION_DELAY);
        assert_eq!(config.max_operator_set_strategies, DEFAULT_MAX_OPERATOR_SET_STRATEGIES);
    }
}
