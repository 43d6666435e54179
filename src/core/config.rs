//! Engine configuration with documented constants

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

/// Tunables for the trigger engine
///
/// These values control pacing of periodic dispatch. Changing them affects
/// how often reset scripts run, not dispatch semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Ticks between reset-trigger firings for a scheduled room
    ///
    /// Every qualifying room re-fires on this fixed interval once its first
    /// timer has gone off.
    pub reset_interval: Tick,

    /// Maximum extra delay added to a room's first reset firing
    ///
    /// A value in `0..=reset_jitter` is drawn per room when it is first
    /// scheduled, spreading the initial burst of reset work across the
    /// interval instead of firing every room on the same tick. Repeat
    /// firings use the bare interval.
    pub reset_jitter: Tick,

    /// Upper bound of the percentage-gate roll (inclusive)
    ///
    /// Rolls are drawn from `1..=percent_roll_max`; a trigger passes when
    /// the roll is <= its numeric argument. At 100, an argument of 0 can
    /// never fire and an argument of 100 always passes the gate.
    pub percent_roll_max: i32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            reset_interval: 1800,
            reset_jitter: 900,
            percent_roll_max: 100,
        }
    }
}

impl TriggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.reset_interval == 0 {
            return Err("reset_interval must be positive".into());
        }
        if self.reset_jitter > self.reset_interval {
            return Err(format!(
                "reset_jitter ({}) should be <= reset_interval ({})",
                self.reset_jitter, self.reset_interval
            ));
        }
        if self.percent_roll_max <= 0 {
            return Err("percent_roll_max must be positive".into());
        }
        Ok(())
    }
}
