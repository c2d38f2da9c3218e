//! Chassis-level aggregation of four modules plus the gyro.
//!
//! The drivetrain advances all four modules and the gyro in lockstep on a
//! single clock. Each module owns its state exclusively; the only shared
//! quantity is the normal-load snapshot, computed once per tick and handed
//! to every module unchanged.

use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use simcore::error::require_positive;
use simcore::{ConfigError, SimContext, SwerveModuleIo};

use sensors::GyroSimulation;

use crate::module::SwerveModuleSimulation;

const GRAVITY_M_PER_SEC2: f64 = 9.81;

/// Mounting corner of a module, viewed from above with +x forward and +y
/// to the robot's left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulePosition {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl ModulePosition {
    pub const ALL: [ModulePosition; 4] = [
        ModulePosition::FrontLeft,
        ModulePosition::FrontRight,
        ModulePosition::BackLeft,
        ModulePosition::BackRight,
    ];

    pub fn index(self) -> usize {
        match self {
            ModulePosition::FrontLeft => 0,
            ModulePosition::FrontRight => 1,
            ModulePosition::BackLeft => 2,
            ModulePosition::BackRight => 3,
        }
    }
}

/// Chassis geometry and mass distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwerveDriveConfig {
    /// Left-right distance between module axles, meters.
    pub track_width_m: f64,
    /// Front-back distance between module axles, meters.
    pub wheel_base_m: f64,
    /// Total robot mass, kg; assumed evenly distributed over the four
    /// wheels.
    pub robot_mass_kg: f64,
}

impl SwerveDriveConfig {
    pub fn new(
        track_width_m: f64,
        wheel_base_m: f64,
        robot_mass_kg: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("track_width_m", track_width_m)?;
        require_positive("wheel_base_m", wheel_base_m)?;
        require_positive("robot_mass_kg", robot_mass_kg)?;
        Ok(SwerveDriveConfig {
            track_width_m,
            wheel_base_m,
            robot_mass_kg,
        })
    }

    fn module_positions(&self) -> [Vector2<f64>; 4] {
        let half_wb = self.wheel_base_m / 2.0;
        let half_tw = self.track_width_m / 2.0;
        [
            Vector2::new(half_wb, half_tw),   // front left
            Vector2::new(half_wb, -half_tw),  // front right
            Vector2::new(-half_wb, half_tw),  // back left
            Vector2::new(-half_wb, -half_tw), // back right
        ]
    }
}

/// Four-module swerve drivetrain with an onboard gyro.
#[derive(Debug, Clone)]
pub struct SwerveDriveSimulation {
    config: SwerveDriveConfig,
    module_positions: [Vector2<f64>; 4],
    modules: [SwerveModuleSimulation; 4],
    gyro: GyroSimulation,
    time: f64,
}

impl SwerveDriveSimulation {
    pub fn new(
        config: SwerveDriveConfig,
        modules: [SwerveModuleSimulation; 4],
        gyro: GyroSimulation,
    ) -> Self {
        debug!(
            "swerve drivetrain: {:.2} m x {:.2} m, {:.1} kg",
            config.track_width_m, config.wheel_base_m, config.robot_mass_kg
        );
        SwerveDriveSimulation {
            module_positions: config.module_positions(),
            config,
            modules,
            gyro,
            time: 0.0,
        }
    }

    pub fn config(&self) -> &SwerveDriveConfig {
        &self.config
    }

    /// Weight carried by one wheel. All four modules observe this same
    /// value within a tick.
    pub fn normal_load_per_module_newtons(&self) -> f64 {
        self.config.robot_mass_kg * GRAVITY_M_PER_SEC2 / self.modules.len() as f64
    }

    /// Advances the whole drivetrain by one step: every module, then the
    /// gyro fed with the chassis yaw rate the modules produced.
    pub fn tick(&mut self, ctx: SimContext) {
        let normal_load = self.normal_load_per_module_newtons();
        for module in &mut self.modules {
            module.tick(ctx.dt, normal_load);
        }
        let omega = self.chassis_angular_velocity_rad_per_sec();
        self.gyro.tick(omega, ctx.dt);
        self.time = ctx.t + ctx.dt;
    }

    /// Chassis yaw rate implied by the modules' current ground velocities.
    ///
    /// Derived, never stored: recomputed from module state on demand and
    /// consumed immediately by the gyro.
    pub fn chassis_angular_velocity_rad_per_sec(&self) -> f64 {
        let mut velocities = [Vector2::zeros(); 4];
        for (velocity, module) in velocities.iter_mut().zip(&self.modules) {
            let facing = module.steer_absolute_facing();
            *velocity = Vector2::new(facing.cos(), facing.sin()) * module.ground_speed_m_per_sec();
        }
        estimate_yaw_rate(&self.module_positions, &velocities)
    }

    pub fn module(&self, position: ModulePosition) -> &SwerveModuleSimulation {
        &self.modules[position.index()]
    }

    pub fn module_mut(&mut self, position: ModulePosition) -> &mut SwerveModuleSimulation {
        &mut self.modules[position.index()]
    }

    pub fn modules(&self) -> &[SwerveModuleSimulation; 4] {
        &self.modules
    }

    pub fn gyro(&self) -> &GyroSimulation {
        &self.gyro
    }

    pub fn gyro_mut(&mut self) -> &mut GyroSimulation {
        &mut self.gyro
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

/// Least-squares yaw rate for a rigid body given wheel contact velocities.
///
/// For pure rotation every contact point satisfies v_i = omega x r_i; the
/// least-squares fit over all wheels is sum(r_i x v_i) / sum(|r_i|^2), which
/// also cancels any common translation for a symmetric wheel layout.
fn estimate_yaw_rate(positions: &[Vector2<f64>; 4], velocities: &[Vector2<f64>; 4]) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (r, v) in positions.iter().zip(velocities) {
        numerator += r.perp(v);
        denominator += r.norm_squared();
    }
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{DriveWheelType, Mk4GearRatio, SwerveModuleFactory};
    use electrical::DcMotor;

    fn test_drivetrain() -> SwerveDriveSimulation {
        let factory = SwerveModuleFactory::new(
            DcMotor::kraken_x60(),
            DcMotor::neo(),
            Mk4GearRatio::L2.reduction(),
            Some(60.0),
            DriveWheelType::Rubber,
        );
        let modules = [
            factory.mark4i().unwrap(),
            factory.mark4i().unwrap(),
            factory.mark4i().unwrap(),
            factory.mark4i().unwrap(),
        ];
        SwerveDriveSimulation::new(
            SwerveDriveConfig::new(0.6, 0.6, 50.0).unwrap(),
            modules,
            GyroSimulation::ideal(),
        )
    }

    #[test]
    fn test_normal_load_is_quarter_weight() {
        let drivetrain = test_drivetrain();
        let load = drivetrain.normal_load_per_module_newtons();
        assert!((load - 50.0 * 9.81 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_yaw_rate_from_tangential_velocities() {
        // Square chassis, every wheel moving tangentially at omega * |r|.
        let half = 0.3;
        let positions = [
            Vector2::new(half, half),
            Vector2::new(half, -half),
            Vector2::new(-half, half),
            Vector2::new(-half, -half),
        ];
        let omega = 1.5;
        let mut velocities = [Vector2::zeros(); 4];
        for (v, r) in velocities.iter_mut().zip(&positions) {
            // omega x r in 2D: (-omega * r.y, omega * r.x)
            *v = Vector2::new(-omega * r.y, omega * r.x);
        }
        assert!((estimate_yaw_rate(&positions, &velocities) - omega).abs() < 1e-12);
    }

    #[test]
    fn test_pure_translation_produces_no_yaw() {
        let positions = SwerveDriveConfig::new(0.6, 0.6, 50.0)
            .unwrap()
            .module_positions();
        let v = Vector2::new(1.2, -0.4);
        let velocities = [v, v, v, v];
        assert!(estimate_yaw_rate(&positions, &velocities).abs() < 1e-12);
    }

    #[test]
    fn test_straight_driving_leaves_gyro_at_zero() {
        let mut drivetrain = test_drivetrain();
        for position in ModulePosition::ALL {
            drivetrain
                .module_mut(position)
                .set_drive_output_voltage(6.0);
        }
        let dt = 0.02;
        for i in 0..100 {
            drivetrain.tick(SimContext::new(dt, i as f64 * dt));
        }
        assert!(drivetrain.module(ModulePosition::FrontLeft).ground_speed_m_per_sec() > 0.5);
        assert!(drivetrain.gyro().rotation().radians().abs() < 1e-9);
    }

    #[test]
    fn test_modules_stay_independent() {
        let mut drivetrain = test_drivetrain();
        drivetrain
            .module_mut(ModulePosition::FrontLeft)
            .set_drive_output_voltage(6.0);
        let dt = 0.02;
        for i in 0..50 {
            drivetrain.tick(SimContext::new(dt, i as f64 * dt));
        }
        assert!(
            drivetrain
                .module(ModulePosition::FrontLeft)
                .drive_encoder_position_rad()
                > 1.0
        );
        assert_eq!(
            drivetrain
                .module(ModulePosition::BackRight)
                .drive_encoder_position_rad(),
            0.0
        );
    }

    #[test]
    fn test_tank_turn_registers_on_gyro() {
        // Wheels all face +x; drive the left side backward and the right
        // side forward. With +y to the robot's left that is a
        // counter-clockwise (positive yaw) turn, and the gyro must see it.
        let mut drivetrain = test_drivetrain();
        drivetrain
            .module_mut(ModulePosition::FrontLeft)
            .set_drive_output_voltage(-6.0);
        drivetrain
            .module_mut(ModulePosition::BackLeft)
            .set_drive_output_voltage(-6.0);
        drivetrain
            .module_mut(ModulePosition::FrontRight)
            .set_drive_output_voltage(6.0);
        drivetrain
            .module_mut(ModulePosition::BackRight)
            .set_drive_output_voltage(6.0);
        let dt = 0.02;
        for i in 0..100 {
            drivetrain.tick(SimContext::new(dt, i as f64 * dt));
        }
        assert!(drivetrain.chassis_angular_velocity_rad_per_sec() > 0.1);
        // Two seconds at roughly 1.9 rad/s turns past half a revolution, so
        // the wrapped readout has rolled over; the unwrapped heading carries
        // the accumulated turn while the wrapped one must stay canonical.
        assert!(drivetrain.gyro().heading_rad() > std::f64::consts::PI);
        let wrapped = drivetrain.gyro().rotation().radians();
        assert!(wrapped > -std::f64::consts::PI && wrapped <= std::f64::consts::PI);
    }
}
