//! Single swerve module physics.
//!
//! Each module owns one drive actuation chain (motor, gear stage, wheel,
//! traction limit) and one steer chain (motor, gear stage, azimuth inertia).
//! The two chains integrate independently inside `tick`; between ticks the
//! controller reads positions and velocities and latches new voltage
//! commands through the [`SwerveModuleIo`] port.

use log::debug;
use serde::{Deserialize, Serialize};
use simcore::error::{require_non_negative, require_positive};
use simcore::{Angle, ConfigError, SwerveModuleIo, wrap_radians};

use electrical::DcMotor;

use crate::gearing::GearStage;
use crate::traction::{TractionLimiter, WheelTractionProfile};

/// Motor controller output saturation. Commands beyond this clamp silently.
pub const MAX_OUTPUT_VOLTAGE: f64 = 12.0;

/// Internal integration substeps per tick. The drive chain's electrical
/// time constant is of the same order as a 20 ms control period, so a
/// single Euler step per tick would visibly distort the transient.
const SUBSTEPS: u32 = 10;

/// Below this output-shaft speed the chain is treated as held by stiction.
const STICTION_OMEGA: f64 = 1e-3;

/// Static configuration of one module, resolved before construction
/// (typically through the factory).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwerveModuleConfig {
    pub drive_motor: DcMotor,
    pub steer_motor: DcMotor,
    pub drive_gearing: GearStage,
    pub steer_gearing: GearStage,
    /// Controller-side drive current limit; `None` leaves the motor
    /// unconstrained.
    pub drive_current_limit_amps: Option<f64>,
    pub wheel: WheelTractionProfile,
    /// Voltage equivalent of drive-chain friction, referenced to the motor.
    pub drive_friction_voltage: f64,
    /// Voltage equivalent of steer-chain friction, referenced to the motor.
    pub steer_friction_voltage: f64,
    /// Rotational inertia of the wheel about its axle, kg*m^2.
    pub wheel_inertia_kg_m2: f64,
    /// Rotational inertia of the steer mechanism about the azimuth axis,
    /// kg*m^2.
    pub steer_inertia_kg_m2: f64,
}

/// Mutable physics state of one module.
///
/// Owned exclusively by its [`SwerveModuleSimulation`]; mutated only inside
/// `tick`, read freely between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Wheel angular velocity about its axle, rad/s.
    pub drive_wheel_velocity_rad_per_sec: f64,
    /// Accumulated drive encoder position in motor-shaft radians. Never
    /// reset, never wrapped.
    pub drive_encoder_position_rad: f64,
    /// Steer (azimuth) angular velocity, rad/s.
    pub steer_velocity_rad_per_sec: f64,
    /// Steer position wrapped to (-pi, pi].
    pub steer_absolute_position_rad: f64,
    /// Steer position, unwrapped; accumulates without bound.
    pub steer_relative_position_rad: f64,
    /// Drive voltage currently latched for the next tick.
    pub applied_drive_voltage: f64,
    /// Steer voltage currently latched for the next tick.
    pub applied_steer_voltage: f64,
}

/// Simulation of one independently steerable and drivable wheel unit.
#[derive(Debug, Clone)]
pub struct SwerveModuleSimulation {
    config: SwerveModuleConfig,
    limiter: TractionLimiter,
    state: ModuleState,
}

impl SwerveModuleSimulation {
    pub fn new(config: SwerveModuleConfig) -> Result<Self, ConfigError> {
        require_positive("wheel_inertia_kg_m2", config.wheel_inertia_kg_m2)?;
        require_positive("steer_inertia_kg_m2", config.steer_inertia_kg_m2)?;
        if let Some(limit) = config.drive_current_limit_amps {
            require_positive("drive_current_limit_amps", limit)?;
        }
        require_non_negative("drive_friction_voltage", config.drive_friction_voltage)?;
        require_non_negative("steer_friction_voltage", config.steer_friction_voltage)?;
        debug!(
            "swerve module: drive reduction {:.2}:1, steer reduction {:.2}:1, wheel d={:.4} m",
            config.drive_gearing.reduction_value(),
            config.steer_gearing.reduction_value(),
            config.wheel.wheel_diameter_m()
        );
        Ok(SwerveModuleSimulation {
            limiter: TractionLimiter::from_profile(&config.wheel),
            config,
            state: ModuleState::default(),
        })
    }

    pub fn config(&self) -> &SwerveModuleConfig {
        &self.config
    }

    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    /// Advances both actuation chains by `dt` seconds.
    ///
    /// `normal_load_newtons` is this module's share of the chassis weight
    /// for the whole tick; the caller must hand all four modules the same
    /// snapshot within one tick.
    pub fn tick(&mut self, dt: f64, normal_load_newtons: f64) {
        let h = dt / SUBSTEPS as f64;
        for _ in 0..SUBSTEPS {
            self.step_drive(h, normal_load_newtons);
            self.step_steer(h);
        }
    }

    fn step_drive(&mut self, h: f64, normal_load_newtons: f64) {
        let cfg = &self.config;
        let wheel_radius = cfg.wheel.wheel_radius_m();
        let wheel_omega = self.state.drive_wheel_velocity_rad_per_sec;

        let motor_omega = cfg.drive_gearing.output_to_motor_velocity(wheel_omega);
        let motor_torque = cfg.drive_motor.torque(
            self.state.applied_drive_voltage,
            motor_omega,
            cfg.drive_current_limit_amps,
        );
        let wheel_torque = cfg.drive_gearing.motor_to_output_torque(motor_torque);

        // Grip caps the ground force; whatever the gearbox delivers beyond
        // it is lost to slip.
        let requested_force = wheel_torque / wheel_radius;
        let limited_force = self.limiter.limit(requested_force, normal_load_newtons);
        let propelling_torque = limited_force * wheel_radius;

        let friction_torque = cfg.drive_gearing.motor_to_output_torque(
            cfg.drive_motor.torque(cfg.drive_friction_voltage, 0.0, None),
        );
        let net_torque = apply_friction(propelling_torque, friction_torque.abs(), wheel_omega);

        let accel = net_torque / cfg.wheel_inertia_kg_m2;
        let max_wheel_omega = cfg
            .drive_gearing
            .motor_to_output_velocity(cfg.drive_motor.free_speed_rad_per_sec);
        self.state.drive_wheel_velocity_rad_per_sec =
            (wheel_omega + accel * h).clamp(-max_wheel_omega, max_wheel_omega);

        // The encoder readout is ungeared: it accumulates motor-shaft
        // radians at the wheel's geared rate. The motion it reflects is
        // downstream of the gearbox even though the units are not.
        self.state.drive_encoder_position_rad += cfg
            .drive_gearing
            .output_to_motor_velocity(self.state.drive_wheel_velocity_rad_per_sec)
            * h;
    }

    fn step_steer(&mut self, h: f64) {
        let cfg = &self.config;
        let steer_omega = self.state.steer_velocity_rad_per_sec;

        let motor_omega = cfg.steer_gearing.output_to_motor_velocity(steer_omega);
        let motor_torque =
            cfg.steer_motor
                .torque(self.state.applied_steer_voltage, motor_omega, None);
        let output_torque = cfg.steer_gearing.motor_to_output_torque(motor_torque);

        let friction_torque = cfg.steer_gearing.motor_to_output_torque(
            cfg.steer_motor.torque(cfg.steer_friction_voltage, 0.0, None),
        );
        let net_torque = apply_friction(output_torque, friction_torque.abs(), steer_omega);

        let accel = net_torque / cfg.steer_inertia_kg_m2;
        let max_steer_omega = cfg
            .steer_gearing
            .motor_to_output_velocity(cfg.steer_motor.free_speed_rad_per_sec);
        let new_omega = (steer_omega + accel * h).clamp(-max_steer_omega, max_steer_omega);

        self.state.steer_velocity_rad_per_sec = new_omega;
        self.state.steer_relative_position_rad += new_omega * h;
        self.state.steer_absolute_position_rad =
            wrap_radians(self.state.steer_absolute_position_rad + new_omega * h);
    }

    /// Wheel angular velocity, rad/s.
    pub fn drive_wheel_velocity_rad_per_sec(&self) -> f64 {
        self.state.drive_wheel_velocity_rad_per_sec
    }

    /// Drive motor shaft velocity, rad/s (wheel velocity through the
    /// reduction).
    pub fn drive_encoder_velocity_rad_per_sec(&self) -> f64 {
        self.config
            .drive_gearing
            .output_to_motor_velocity(self.state.drive_wheel_velocity_rad_per_sec)
    }

    /// Steer (azimuth) angular velocity, rad/s.
    pub fn steer_velocity_rad_per_sec(&self) -> f64 {
        self.state.steer_velocity_rad_per_sec
    }

    /// Ground-contact speed of the wheel, m/s, signed along the wheel
    /// heading.
    pub fn ground_speed_m_per_sec(&self) -> f64 {
        self.state.drive_wheel_velocity_rad_per_sec * self.config.wheel.wheel_radius_m()
    }
}

/// Combines a propelling torque with chain friction.
///
/// At speed, friction is kinetic and opposes motion. Near zero speed it is
/// stiction: it cancels the propelling torque up to its own magnitude, so a
/// command below the friction threshold leaves the chain parked instead of
/// creeping.
fn apply_friction(propelling_torque: f64, friction_magnitude: f64, omega: f64) -> f64 {
    if omega.abs() < STICTION_OMEGA {
        propelling_torque - propelling_torque.clamp(-friction_magnitude, friction_magnitude)
    } else {
        propelling_torque - friction_magnitude * omega.signum()
    }
}

impl SwerveModuleIo for SwerveModuleSimulation {
    fn set_drive_output_voltage(&mut self, volts: f64) {
        self.state.applied_drive_voltage = volts.clamp(-MAX_OUTPUT_VOLTAGE, MAX_OUTPUT_VOLTAGE);
    }

    fn set_steer_output_voltage(&mut self, volts: f64) {
        self.state.applied_steer_voltage = volts.clamp(-MAX_OUTPUT_VOLTAGE, MAX_OUTPUT_VOLTAGE);
    }

    fn steer_absolute_facing(&self) -> Angle {
        Angle::from_radians(self.state.steer_absolute_position_rad)
    }

    fn steer_relative_position_rad(&self) -> f64 {
        self.state.steer_relative_position_rad
    }

    fn drive_encoder_position_rad(&self) -> f64 {
        self.state.drive_encoder_position_rad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn frictionless_module(
        drive_reduction: f64,
        current_limit: Option<f64>,
        grip: f64,
    ) -> SwerveModuleSimulation {
        SwerveModuleSimulation::new(SwerveModuleConfig {
            drive_motor: DcMotor::kraken_x60(),
            steer_motor: DcMotor::neo(),
            drive_gearing: GearStage::reduction(drive_reduction).unwrap(),
            steer_gearing: GearStage::reduction(12.8).unwrap(),
            drive_current_limit_amps: current_limit,
            wheel: WheelTractionProfile::new(grip, 0.0508).unwrap(),
            drive_friction_voltage: 0.0,
            steer_friction_voltage: 0.0,
            wheel_inertia_kg_m2: 0.025,
            steer_inertia_kg_m2: 0.03,
        })
        .unwrap()
    }

    #[test]
    fn test_voltage_commands_saturate() {
        let mut module = frictionless_module(6.75, None, 1.25);
        module.set_drive_output_voltage(20.0);
        module.set_steer_output_voltage(-37.5);
        assert_eq!(module.state().applied_drive_voltage, 12.0);
        assert_eq!(module.state().applied_steer_voltage, -12.0);
    }

    #[test]
    fn test_drive_encoder_matches_analytic_response() {
        // 6.75:1 Kraken module, no current limit, grip high enough that the
        // wheel never slips, 6 V for one second at the 20 ms control rate.
        let mut module = frictionless_module(6.75, None, 1e9);
        module.set_drive_output_voltage(6.0);
        for _ in 0..50 {
            module.tick(0.02, 120.0);
        }

        // First-order response of the motor shaft: the wheel inertia
        // reflected through the reduction sets the time constant.
        let motor = DcMotor::kraken_x60();
        let reflected_inertia = 0.025 / 6.75_f64.powi(2);
        let tau = reflected_inertia * motor.resistance_ohms
            / (motor.kt_nm_per_amp * motor.ke_v_per_rad_per_sec);
        let omega_ss = 6.0 / motor.ke_v_per_rad_per_sec;
        let expected = omega_ss * (1.0 - tau * (1.0 - (-1.0_f64 / tau).exp()));

        assert_relative_eq!(
            module.drive_encoder_position_rad(),
            expected,
            max_relative = 0.01
        );
    }

    #[test]
    fn test_wheel_speed_never_exceeds_geared_free_speed() {
        let mut module = frictionless_module(6.75, None, 1e9);
        module.set_drive_output_voltage(12.0);
        for _ in 0..500 {
            module.tick(0.02, 120.0);
        }
        let max_wheel = DcMotor::kraken_x60().free_speed_rad_per_sec / 6.75;
        assert!(module.drive_wheel_velocity_rad_per_sec() <= max_wheel + 1e-9);
        // And it actually gets close to it unloaded.
        assert_relative_eq!(
            module.drive_wheel_velocity_rad_per_sec(),
            max_wheel,
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_traction_limit_bounds_acceleration() {
        // Full stall voltage on a gripping wheel: the ground force, and with
        // it the wheel acceleration, must stay at mu * N no matter how much
        // torque the gearbox can deliver.
        let grip = 1.25;
        let load = 50.0 * 9.81 / 4.0;
        let mut module = frictionless_module(6.75, None, grip);
        module.set_drive_output_voltage(12.0);

        let radius = 0.0508 / 2.0;
        let max_accel = grip * load * radius / 0.025;

        let mut previous = 0.0;
        for _ in 0..10 {
            module.tick(0.02, load);
            let omega = module.drive_wheel_velocity_rad_per_sec();
            assert!(omega - previous <= max_accel * 0.02 * (1.0 + 1e-9));
            previous = omega;
        }
        // The clamp is actually active: stall torque through the gearbox
        // would accelerate far faster than grip allows.
        let stall_force = DcMotor::kraken_x60().stall_torque_nm * 6.75 / radius;
        assert!(stall_force > grip * load);
    }

    #[test]
    fn test_current_limit_slows_spinup() {
        let load = 1e6; // grip never binds
        let mut unlimited = frictionless_module(6.75, None, 1e9);
        let mut limited = frictionless_module(6.75, Some(40.0), 1e9);
        unlimited.set_drive_output_voltage(12.0);
        limited.set_drive_output_voltage(12.0);
        unlimited.tick(0.02, load);
        limited.tick(0.02, load);
        assert!(
            limited.drive_wheel_velocity_rad_per_sec()
                < unlimited.drive_wheel_velocity_rad_per_sec()
        );
    }

    #[test]
    fn test_steer_facing_stays_wrapped() {
        let mut module = frictionless_module(6.75, None, 1.25);
        module.set_steer_output_voltage(6.0);
        for _ in 0..2000 {
            module.tick(0.02, 120.0);
            let facing = module.steer_absolute_facing().radians();
            assert!(facing > -PI && facing <= PI);
        }
        // Many net rotations must have accumulated on the relative readout.
        assert!(module.steer_relative_position_rad() > 2.0 * PI * 4.0);
    }

    #[test]
    fn test_absolute_facing_is_wrapped_relative_position() {
        let mut module = frictionless_module(6.75, None, 1.25);
        module.set_steer_output_voltage(4.0);
        for _ in 0..500 {
            module.tick(0.02, 120.0);
        }
        module.set_steer_output_voltage(-7.0);
        for _ in 0..300 {
            module.tick(0.02, 120.0);
        }
        assert_relative_eq!(
            module.steer_absolute_facing().radians(),
            wrap_radians(module.steer_relative_position_rad()),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_friction_voltage_parks_small_commands() {
        let mut config = frictionless_module(6.75, None, 1.25).config;
        config.drive_friction_voltage = 0.25;
        let mut module = SwerveModuleSimulation::new(config).unwrap();
        module.set_drive_output_voltage(0.2);
        for _ in 0..100 {
            module.tick(0.02, 120.0);
        }
        assert!(module.drive_wheel_velocity_rad_per_sec().abs() < 1e-9);
        assert!(module.drive_encoder_position_rad().abs() < 1e-9);
    }

    #[test]
    fn test_reverse_drive_accumulates_negative_encoder() {
        let mut module = frictionless_module(6.75, None, 1e9);
        module.set_drive_output_voltage(-6.0);
        for _ in 0..50 {
            module.tick(0.02, 120.0);
        }
        assert!(module.drive_encoder_position_rad() < -10.0);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let good = frictionless_module(6.75, None, 1.25).config;

        let mut bad = good;
        bad.wheel_inertia_kg_m2 = 0.0;
        assert!(SwerveModuleSimulation::new(bad).is_err());

        let mut bad = good;
        bad.drive_current_limit_amps = Some(-20.0);
        assert!(SwerveModuleSimulation::new(bad).is_err());

        let mut bad = good;
        bad.steer_friction_voltage = -0.5;
        assert!(SwerveModuleSimulation::new(bad).is_err());
    }
}
