//! Engine configuration.
//!
//! # Responsibility
//! - Hold tunables shared by store, history and expression evaluation.
//! - Accept host-supplied JSON where every key is optional.
//!
//! # Invariants
//! - `normalized()` never yields a zero history depth or zero budgets.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HISTORY_DEPTH: usize = 100;
pub const DEFAULT_EXPRESSION_STEP_BUDGET: u32 = 10_000;
pub const DEFAULT_EXPRESSION_TIME_BUDGET_MS: u64 = 50;
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 20.0;
pub const DEFAULT_GRID_COLUMNS: u32 = 12;

/// Tunables for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of retained history snapshots.
    pub history_depth: usize,
    /// Maximum AST node visits per custom-expression evaluation.
    pub expression_step_budget: u32,
    /// Wall-clock budget per custom-expression evaluation.
    pub expression_time_budget_ms: u64,
    /// Offset applied on both axes when duplicating an element.
    pub duplicate_offset: f64,
    /// Column count of the grid layout mode.
    pub grid_columns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            expression_step_budget: DEFAULT_EXPRESSION_STEP_BUDGET,
            expression_time_budget_ms: DEFAULT_EXPRESSION_TIME_BUDGET_MS,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
            grid_columns: DEFAULT_GRID_COLUMNS,
        }
    }
}

impl EngineConfig {
    /// Parses configuration JSON; absent keys keep their defaults.
    pub fn from_json(payload: &str) -> Result<Self, String> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str::<Self>(trimmed)
            .map(Self::normalized)
            .map_err(|err| format!("invalid engine config: {err}"))
    }

    /// Clamps zero values up to their minimums.
    pub fn normalized(mut self) -> Self {
        self.history_depth = self.history_depth.max(1);
        self.expression_step_budget = self.expression_step_budget.max(1);
        self.expression_time_budget_ms = self.expression_time_budget_ms.max(1);
        self.grid_columns = self.grid_columns.max(1);
        if !self.duplicate_offset.is_finite() {
            self.duplicate_offset = DEFAULT_DUPLICATE_OFFSET;
        }
        self
    }

    pub fn expression_time_budget(&self) -> Duration {
        Duration::from_millis(self.expression_time_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, DEFAULT_HISTORY_DEPTH};

    #[test]
    fn empty_payload_yields_defaults() {
        let config = EngineConfig::from_json("  ").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.history_depth, DEFAULT_HISTORY_DEPTH);
    }

    #[test]
    fn partial_payload_keeps_other_defaults_and_clamps_zero() {
        let config = EngineConfig::from_json(r#"{"historyDepth":0,"gridColumns":6}"#).unwrap();
        assert_eq!(config.history_depth, 1);
        assert_eq!(config.grid_columns, 6);
        assert_eq!(config.duplicate_offset, 20.0);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = EngineConfig::from_json("{historyDepth").unwrap_err();
        assert!(err.contains("invalid engine config"));
    }
}
