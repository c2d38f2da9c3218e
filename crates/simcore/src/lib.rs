pub mod angle;
pub mod error;
pub mod io;

pub use angle::{Angle, wrap_radians};
pub use error::ConfigError;
pub use io::{GyroIo, SwerveModuleIo};

/// Timing context handed to every model on a simulation step.
#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    /// Step length in seconds.
    pub dt: f64,
    /// Simulation time at the start of the step, in seconds.
    pub t: f64,
}

impl SimContext {
    pub fn new(dt: f64, t: f64) -> Self {
        SimContext { dt, t }
    }
}
