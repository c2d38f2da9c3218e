//! Controller-facing hardware ports.
//!
//! Robot control code talks to a module or a gyro through these traits only.
//! The simulation crates implement them here; a real robot implements them
//! over CAN or whatever bus the hardware uses. Which implementation backs
//! the trait is chosen once, at construction time.

use crate::Angle;

/// One independently steerable and drivable wheel unit.
pub trait SwerveModuleIo {
    /// Commands the drive motor output. Saturates at the supported bus
    /// voltage; takes effect on the next tick.
    fn set_drive_output_voltage(&mut self, volts: f64);

    /// Commands the steer motor output. Saturates like the drive command.
    fn set_steer_output_voltage(&mut self, volts: f64);

    /// Wheel heading wrapped to (-pi, pi].
    fn steer_absolute_facing(&self) -> Angle;

    /// Unwrapped steer position in radians; accumulates without bound.
    fn steer_relative_position_rad(&self) -> f64;

    /// Accumulated drive encoder position in motor-shaft radians.
    ///
    /// The readout is ungeared even though the motion it integrates is
    /// downstream of the gearbox. This mirrors how the real encoder sits on
    /// the motor shaft; it is never reset by the simulation.
    fn drive_encoder_position_rad(&self) -> f64;
}

/// An onboard orientation sensor.
pub trait GyroIo {
    /// Heading estimate wrapped to (-pi, pi], drift included.
    fn rotation(&self) -> Angle;

    /// Most recent angular velocity estimate in rad/s. Reading does not
    /// re-sample noise.
    fn angular_velocity_rad_per_sec(&self) -> f64;
}
