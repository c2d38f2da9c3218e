//! Wheel-to-ground traction limiting.

use serde::{Deserialize, Serialize};
use simcore::ConfigError;
use simcore::error::require_positive;

/// Grip parameters of a wheel, selected by wheel material at configuration
/// time. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelTractionProfile {
    grip_coefficient: f64,
    wheel_diameter_m: f64,
}

impl WheelTractionProfile {
    pub fn new(grip_coefficient: f64, wheel_diameter_m: f64) -> Result<Self, ConfigError> {
        require_positive("grip_coefficient", grip_coefficient)?;
        require_positive("wheel_diameter_m", wheel_diameter_m)?;
        Ok(WheelTractionProfile {
            grip_coefficient,
            wheel_diameter_m,
        })
    }

    pub fn grip_coefficient(&self) -> f64 {
        self.grip_coefficient
    }

    pub fn wheel_diameter_m(&self) -> f64 {
        self.wheel_diameter_m
    }

    pub fn wheel_radius_m(&self) -> f64 {
        self.wheel_diameter_m / 2.0
    }
}

/// Caps the force a wheel can put into the ground at `grip * normal_load`.
///
/// Excess force is dropped silently: the module under-accelerates the way a
/// slipping wheel does, and no error is raised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TractionLimiter {
    grip_coefficient: f64,
}

impl TractionLimiter {
    pub fn new(grip_coefficient: f64) -> Result<Self, ConfigError> {
        require_positive("grip_coefficient", grip_coefficient)?;
        Ok(TractionLimiter { grip_coefficient })
    }

    pub fn from_profile(profile: &WheelTractionProfile) -> Self {
        TractionLimiter {
            grip_coefficient: profile.grip_coefficient(),
        }
    }

    /// A limiter that never clamps. Useful for analysis runs where slip is
    /// deliberately ignored.
    pub fn unlimited() -> Self {
        TractionLimiter {
            grip_coefficient: f64::INFINITY,
        }
    }

    /// Largest transmissible force magnitude for a given normal load.
    pub fn max_force_newtons(&self, normal_load_newtons: f64) -> f64 {
        if self.grip_coefficient.is_infinite() {
            return f64::INFINITY;
        }
        self.grip_coefficient * normal_load_newtons.max(0.0)
    }

    /// Clamps a requested ground force to the transmissible range.
    pub fn limit(&self, requested_force_newtons: f64, normal_load_newtons: f64) -> f64 {
        let max = self.max_force_newtons(normal_load_newtons);
        requested_force_newtons.clamp(-max, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_clamps_at_grip_times_load() {
        let limiter = TractionLimiter::new(1.25).unwrap();
        // 50 kg robot, one quarter of the weight on this wheel.
        let load = 50.0 * 9.81 / 4.0;
        let max = 1.25 * load;
        assert!((limiter.limit(1e6, load) - max).abs() < 1e-9);
        assert!((limiter.limit(-1e6, load) + max).abs() < 1e-9);
    }

    #[test]
    fn test_force_below_limit_passes_through() {
        let limiter = TractionLimiter::new(1.15).unwrap();
        assert!((limiter.limit(30.0, 120.0) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_unlimited_never_clamps() {
        let limiter = TractionLimiter::unlimited();
        assert!((limiter.limit(1e9, 100.0) - 1e9).abs() < 1.0);
    }

    #[test]
    fn test_zero_load_transmits_nothing() {
        // An airborne wheel cannot push on the ground.
        let limiter = TractionLimiter::new(1.25).unwrap();
        assert_eq!(limiter.limit(100.0, 0.0), 0.0);
        assert_eq!(limiter.limit(100.0, -5.0), 0.0);
    }

    #[test]
    fn test_profile_validation() {
        assert!(WheelTractionProfile::new(1.25, 0.0508).is_ok());
        assert!(WheelTractionProfile::new(0.0, 0.0508).is_err());
        assert!(WheelTractionProfile::new(1.25, -0.05).is_err());
    }
}
