//! Simulated single-axis gyroscope.
//!
//! Integrates the chassis yaw rate into a heading estimate, injecting
//! measurement noise on every sample. A collision can knock the heading off
//! by a persistent offset, the way a physical impact disturbs a real MEMS
//! gyro; the offset never self-corrects.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use simcore::error::require_non_negative;
use simcore::{Angle, ConfigError, GyroIo};

/// Distribution family of the per-sample rate noise.
///
/// All variants are zero-mean. `None` makes the sensor bit-for-bit
/// deterministic, which is what the tests rely on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoiseModel {
    /// Ideal sensor, no perturbation.
    None,
    /// Gaussian rate noise with the given standard deviation in rad/s.
    Gaussian { std_dev_rad_per_sec: f64 },
    /// Uniform rate noise on [-half_width, +half_width] rad/s.
    Uniform { half_width_rad_per_sec: f64 },
}

impl NoiseModel {
    /// Rejects negative or non-finite spread parameters. Zero is valid and
    /// leaves the variant noiseless.
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            NoiseModel::None => Ok(()),
            NoiseModel::Gaussian { std_dev_rad_per_sec } => {
                require_non_negative("std_dev_rad_per_sec", std_dev_rad_per_sec).map(|_| ())
            }
            NoiseModel::Uniform { half_width_rad_per_sec } => {
                require_non_negative("half_width_rad_per_sec", half_width_rad_per_sec).map(|_| ())
            }
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match *self {
            NoiseModel::None => 0.0,
            NoiseModel::Gaussian { std_dev_rad_per_sec } => {
                if std_dev_rad_per_sec <= 0.0 {
                    return 0.0;
                }
                Normal::new(0.0, std_dev_rad_per_sec)
                    .map(|dist| dist.sample(rng))
                    .unwrap_or(0.0)
            }
            NoiseModel::Uniform { half_width_rad_per_sec } => {
                if half_width_rad_per_sec <= 0.0 {
                    return 0.0;
                }
                rng.gen_range(-half_width_rad_per_sec..=half_width_rad_per_sec)
            }
        }
    }
}

/// Simulated gyro state and noise source.
///
/// Owned by one simulation session and ticked in lockstep with the modules
/// that produce the chassis yaw rate it integrates.
#[derive(Debug, Clone)]
pub struct GyroSimulation {
    heading_rad: f64,
    angular_velocity_rad_per_sec: f64,
    drift_offset_rad: f64,
    noise: NoiseModel,
    rng: StdRng,
}

impl GyroSimulation {
    /// Creates a gyro with a fixed default seed. Runs with the same inputs
    /// reproduce the same readings. Fails if the noise model carries a
    /// negative or non-finite spread.
    pub fn new(noise: NoiseModel) -> Result<Self, ConfigError> {
        Self::with_seed(noise, 0)
    }

    pub fn with_seed(noise: NoiseModel, seed: u64) -> Result<Self, ConfigError> {
        noise.validate()?;
        Ok(GyroSimulation {
            heading_rad: 0.0,
            angular_velocity_rad_per_sec: 0.0,
            drift_offset_rad: 0.0,
            noise,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// An ideal, noiseless gyro.
    pub fn ideal() -> Self {
        GyroSimulation {
            heading_rad: 0.0,
            angular_velocity_rad_per_sec: 0.0,
            drift_offset_rad: 0.0,
            noise: NoiseModel::None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Integrates one step of chassis yaw rate into the heading estimate
    /// and latches the (noisy) rate reading.
    pub fn tick(&mut self, chassis_omega_rad_per_sec: f64, dt: f64) {
        let measured = chassis_omega_rad_per_sec + self.noise.sample(&mut self.rng);
        self.heading_rad += measured * dt;
        self.angular_velocity_rad_per_sec = measured;
    }

    /// Adds a one-shot heading offset from a physical impact. Offsets
    /// accumulate and persist for the rest of the session.
    pub fn apply_collision_drift(&mut self, offset: Angle) {
        self.drift_offset_rad += offset.radians();
    }

    /// Unwrapped heading estimate in radians, drift included.
    pub fn heading_rad(&self) -> f64 {
        self.heading_rad + self.drift_offset_rad
    }

    pub fn rotation(&self) -> Angle {
        Angle::from_radians(self.heading_rad()).wrapped()
    }

    pub fn angular_velocity_rad_per_sec(&self) -> f64 {
        self.angular_velocity_rad_per_sec
    }
}

impl GyroIo for GyroSimulation {
    fn rotation(&self) -> Angle {
        GyroSimulation::rotation(self)
    }

    fn angular_velocity_rad_per_sec(&self) -> f64 {
        GyroSimulation::angular_velocity_rad_per_sec(self)
    }
}
