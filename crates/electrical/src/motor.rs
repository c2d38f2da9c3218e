//! DC motor response model.
//!
//! Converts an applied voltage and the present shaft speed into an
//! instantaneous torque through the standard permanent-magnet motor
//! equations: back-EMF proportional to speed, current set by the winding
//! resistance, torque proportional to current. An optional current limit
//! models controller-side limiting, not a fault.

use log::debug;
use serde::{Deserialize, Serialize};
use simcore::ConfigError;
use simcore::error::require_positive;

/// Bus voltage all datasheet figures are referenced to.
pub const NOMINAL_VOLTAGE: f64 = 12.0;

/// Electrical constants of a DC motor, referenced to the motor shaft.
///
/// Immutable after construction; one value is shared by every module that
/// uses the same motor type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcMotor {
    /// Winding resistance in ohms.
    pub resistance_ohms: f64,
    /// Torque constant in N*m per amp.
    pub kt_nm_per_amp: f64,
    /// Back-EMF constant in volts per rad/s.
    pub ke_v_per_rad_per_sec: f64,
    /// Free speed at nominal voltage in rad/s.
    pub free_speed_rad_per_sec: f64,
    /// Stall torque at nominal voltage in N*m.
    pub stall_torque_nm: f64,
}

impl DcMotor {
    /// Builds a motor model from its electrical constants. Free speed and
    /// stall torque are derived at the nominal bus voltage.
    pub fn new(
        resistance_ohms: f64,
        kt_nm_per_amp: f64,
        ke_v_per_rad_per_sec: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("resistance_ohms", resistance_ohms)?;
        require_positive("kt_nm_per_amp", kt_nm_per_amp)?;
        require_positive("ke_v_per_rad_per_sec", ke_v_per_rad_per_sec)?;
        Ok(DcMotor {
            resistance_ohms,
            kt_nm_per_amp,
            ke_v_per_rad_per_sec,
            free_speed_rad_per_sec: NOMINAL_VOLTAGE / ke_v_per_rad_per_sec,
            stall_torque_nm: NOMINAL_VOLTAGE / resistance_ohms * kt_nm_per_amp,
        })
    }

    /// Builds a motor model from the figures vendors publish: free speed in
    /// RPM plus stall current and stall torque at 12 V.
    pub fn from_datasheet(
        free_speed_rpm: f64,
        stall_current_amps: f64,
        stall_torque_nm: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("free_speed_rpm", free_speed_rpm)?;
        require_positive("stall_current_amps", stall_current_amps)?;
        require_positive("stall_torque_nm", stall_torque_nm)?;
        let motor =
            Self::from_datasheet_unchecked(free_speed_rpm, stall_current_amps, stall_torque_nm);
        debug!(
            "motor from datasheet: R={:.4} ohm, kt={:.4} N*m/A, ke={:.4} V/(rad/s)",
            motor.resistance_ohms, motor.kt_nm_per_amp, motor.ke_v_per_rad_per_sec
        );
        Ok(motor)
    }

    fn from_datasheet_unchecked(
        free_speed_rpm: f64,
        stall_current_amps: f64,
        stall_torque_nm: f64,
    ) -> Self {
        let free_speed_rad_per_sec = free_speed_rpm * std::f64::consts::PI / 30.0;
        DcMotor {
            resistance_ohms: NOMINAL_VOLTAGE / stall_current_amps,
            kt_nm_per_amp: stall_torque_nm / stall_current_amps,
            ke_v_per_rad_per_sec: NOMINAL_VOLTAGE / free_speed_rad_per_sec,
            free_speed_rad_per_sec,
            stall_torque_nm,
        }
    }

    /// WCP Kraken X60 (6000 RPM, 366 A / 7.09 N*m at stall).
    pub fn kraken_x60() -> Self {
        Self::from_datasheet_unchecked(6000.0, 366.0, 7.09)
    }

    /// REV NEO v1.1 (5676 RPM, 105 A / 2.6 N*m at stall).
    pub fn neo() -> Self {
        Self::from_datasheet_unchecked(5676.0, 105.0, 2.6)
    }

    /// CTRE Falcon 500 (6380 RPM, 257 A / 4.69 N*m at stall).
    pub fn falcon_500() -> Self {
        Self::from_datasheet_unchecked(6380.0, 257.0, 4.69)
    }

    /// Winding current drawn at `applied_voltage` while spinning at
    /// `omega_rad_per_sec`, before any current limiting.
    pub fn current_at(&self, applied_voltage: f64, omega_rad_per_sec: f64) -> f64 {
        let back_emf = omega_rad_per_sec * self.ke_v_per_rad_per_sec;
        (applied_voltage - back_emf) / self.resistance_ohms
    }

    /// Instantaneous shaft torque for an applied voltage at the present
    /// shaft speed. When a current limit is configured the current is
    /// clamped to [-limit, +limit] before conversion to torque.
    pub fn torque(
        &self,
        applied_voltage: f64,
        omega_rad_per_sec: f64,
        current_limit_amps: Option<f64>,
    ) -> f64 {
        let current = self.current_at(applied_voltage, omega_rad_per_sec);
        let current = match current_limit_amps {
            Some(limit) => current.clamp(-limit, limit),
            None => current,
        };
        current * self.kt_nm_per_amp
    }

    /// Voltage that produces `torque_nm` at `omega_rad_per_sec`. Used to
    /// turn friction-voltage figures into friction torques.
    pub fn voltage_for_torque(&self, torque_nm: f64, omega_rad_per_sec: f64) -> f64 {
        torque_nm / self.kt_nm_per_amp * self.resistance_ohms
            + omega_rad_per_sec * self.ke_v_per_rad_per_sec
    }
}
