pub mod motor;

pub use motor::{DcMotor, NOMINAL_VOLTAGE};
