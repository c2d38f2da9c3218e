pub mod drivetrain;
pub mod factory;
pub mod gearing;
pub mod module;
pub mod traction;

pub use drivetrain::{ModulePosition, SwerveDriveConfig, SwerveDriveSimulation};
pub use factory::{DriveWheelType, Mk4GearRatio, Mk4nGearRatio, SwerveModuleFactory};
pub use gearing::GearStage;
pub use module::{ModuleState, SwerveModuleConfig, SwerveModuleSimulation};
pub use traction::{TractionLimiter, WheelTractionProfile};
