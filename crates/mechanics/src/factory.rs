//! Preconfigured parameter bundles for commercial swerve module kits.
//!
//! Pure lookup tables: pick the motors, a gear-ratio tier and a wheel
//! material, and get back ready-to-run [`SwerveModuleSimulation`]s for the
//! SDS Mark4 family. No physics lives here.

use serde::{Deserialize, Serialize};
use simcore::ConfigError;

use electrical::DcMotor;

use crate::gearing::GearStage;
use crate::module::{SwerveModuleConfig, SwerveModuleSimulation};
use crate::traction::WheelTractionProfile;

/// Material of the driving wheel's contact surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveWheelType {
    Rubber,
    Tire,
}

impl DriveWheelType {
    pub fn grip_coefficient(self) -> f64 {
        match self {
            DriveWheelType::Rubber => 1.25,
            DriveWheelType::Tire => 1.15,
        }
    }
}

/// Drive gear tiers of the SDS Mark4 and Mark4i modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mk4GearRatio {
    L1,
    L2,
    L3,
    L4,
}

impl Mk4GearRatio {
    pub fn reduction(self) -> f64 {
        match self {
            Mk4GearRatio::L1 => 8.14,
            Mk4GearRatio::L2 => 6.75,
            Mk4GearRatio::L3 => 6.12,
            Mk4GearRatio::L4 => 5.14,
        }
    }
}

/// Drive gear tiers of the SDS Mark4n module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mk4nGearRatio {
    L1,
    L2,
    L3,
}

impl Mk4nGearRatio {
    pub fn reduction(self) -> f64 {
        match self {
            Mk4nGearRatio::L1 => 7.13,
            Mk4nGearRatio::L2 => 5.9,
            Mk4nGearRatio::L3 => 5.36,
        }
    }
}

const MK4_STEER_REDUCTION: f64 = 12.8;
const MK4I_STEER_REDUCTION: f64 = 150.0 / 70.0;
const MK4N_STEER_REDUCTION: f64 = 18.75;

/// All Mark4-family modules run a 2 inch wheel.
const WHEEL_DIAMETER_M: f64 = 0.0508;

const WHEEL_INERTIA_KG_M2: f64 = 0.025;

/// Builds swerve module simulations for the SDS Mark4 family.
///
/// This is the configuration entry point of the whole core: motors, drive
/// reduction, current limit and wheel material are chosen once here, and
/// the per-family constants (steer reduction, friction voltages, inertias)
/// come from the tables below.
#[derive(Debug, Clone, Copy)]
pub struct SwerveModuleFactory {
    drive_motor: DcMotor,
    steer_motor: DcMotor,
    drive_reduction: f64,
    drive_current_limit_amps: Option<f64>,
    wheel_type: DriveWheelType,
}

impl SwerveModuleFactory {
    /// `drive_current_limit_amps: None` leaves the drive motor
    /// unconstrained.
    pub fn new(
        drive_motor: DcMotor,
        steer_motor: DcMotor,
        drive_reduction: f64,
        drive_current_limit_amps: Option<f64>,
        wheel_type: DriveWheelType,
    ) -> Self {
        SwerveModuleFactory {
            drive_motor,
            steer_motor,
            drive_reduction,
            drive_current_limit_amps,
            wheel_type,
        }
    }

    fn build(
        &self,
        steer_reduction: f64,
        drive_friction_voltage: f64,
        steer_friction_voltage: f64,
        steer_inertia_kg_m2: f64,
    ) -> Result<SwerveModuleSimulation, ConfigError> {
        SwerveModuleSimulation::new(SwerveModuleConfig {
            drive_motor: self.drive_motor,
            steer_motor: self.steer_motor,
            drive_gearing: GearStage::reduction(self.drive_reduction)?,
            steer_gearing: GearStage::reduction(steer_reduction)?,
            drive_current_limit_amps: self.drive_current_limit_amps,
            wheel: WheelTractionProfile::new(self.wheel_type.grip_coefficient(), WHEEL_DIAMETER_M)?,
            drive_friction_voltage,
            steer_friction_voltage,
            wheel_inertia_kg_m2: WHEEL_INERTIA_KG_M2,
            steer_inertia_kg_m2,
        })
    }

    /// SDS Mark4 module.
    pub fn mark4(&self) -> Result<SwerveModuleSimulation, ConfigError> {
        self.build(MK4_STEER_REDUCTION, 0.2, 0.3, 0.03)
    }

    /// SDS Mark4i module.
    pub fn mark4i(&self) -> Result<SwerveModuleSimulation, ConfigError> {
        self.build(MK4I_STEER_REDUCTION, 0.2, 1.0, 0.025)
    }

    /// SDS Mark4n module.
    pub fn mark4n(&self) -> Result<SwerveModuleSimulation, ConfigError> {
        self.build(MK4N_STEER_REDUCTION, 0.25, 1.0, 0.025)
    }
}
