pub mod gyro;

pub use gyro::{GyroSimulation, NoiseModel};
