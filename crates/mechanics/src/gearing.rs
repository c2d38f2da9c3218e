//! Fixed gear stage between a motor shaft and an output shaft.

use serde::{Deserialize, Serialize};
use simcore::ConfigError;
use simcore::error::{require_in_range, require_positive};

/// A fixed-ratio transmission.
///
/// `ratio` is output revolutions per motor revolution, so a conventional
/// "6.75:1" reduction has `ratio = 1.0 / 6.75`. Torque scales by the
/// inverse of velocity, minus a configurable efficiency loss. Purely
/// algebraic; holds no state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GearStage {
    ratio: f64,
    efficiency: f64,
}

impl GearStage {
    /// Builds a stage from its ratio (output revs per motor rev).
    pub fn new(ratio: f64) -> Result<Self, ConfigError> {
        require_positive("ratio", ratio)?;
        Ok(GearStage {
            ratio,
            efficiency: 1.0,
        })
    }

    /// Builds a stage from the usual reduction notation: a "6.75:1" module
    /// passes 6.75 here.
    pub fn reduction(motor_revs_per_output_rev: f64) -> Result<Self, ConfigError> {
        require_positive("reduction", motor_revs_per_output_rev)?;
        Self::new(1.0 / motor_revs_per_output_rev)
    }

    /// Sets the frictional efficiency factor applied to transmitted torque.
    pub fn with_efficiency(mut self, efficiency: f64) -> Result<Self, ConfigError> {
        self.efficiency = require_in_range("efficiency", efficiency, f64::MIN_POSITIVE, 1.0)?;
        Ok(self)
    }

    /// Output revolutions per motor revolution.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Motor revolutions per output revolution.
    pub fn reduction_value(&self) -> f64 {
        1.0 / self.ratio
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Torque at the output shaft for a given motor-shaft torque.
    pub fn motor_to_output_torque(&self, motor_torque_nm: f64) -> f64 {
        motor_torque_nm / self.ratio * self.efficiency
    }

    /// Output-shaft angular velocity for a given motor-shaft velocity.
    pub fn motor_to_output_velocity(&self, motor_omega_rad_per_sec: f64) -> f64 {
        motor_omega_rad_per_sec * self.ratio
    }

    /// Motor-shaft angular velocity for a given output-shaft velocity.
    pub fn output_to_motor_velocity(&self, output_omega_rad_per_sec: f64) -> f64 {
        output_omega_rad_per_sec / self.ratio
    }
}
