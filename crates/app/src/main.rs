//! Demo harness: a four-module Mark4i drivetrain driven open-loop.
//!
//! Accelerates straight for two seconds, then tank-turns for two seconds,
//! logging the gyro and module readings along the way and dumping the final
//! module states as JSON.

use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use electrical::DcMotor;
use mechanics::{
    DriveWheelType, Mk4GearRatio, ModulePosition, SwerveDriveConfig, SwerveDriveSimulation,
    SwerveModuleFactory,
};
use sensors::{GyroSimulation, NoiseModel};
use simcore::{Angle, SimContext, SwerveModuleIo};

const DT: f64 = 0.02;

fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("logger init");

    let factory = SwerveModuleFactory::new(
        DcMotor::kraken_x60(),
        DcMotor::neo(),
        Mk4GearRatio::L2.reduction(),
        Some(60.0),
        DriveWheelType::Rubber,
    );
    let modules = [
        factory.mark4i().expect("module config"),
        factory.mark4i().expect("module config"),
        factory.mark4i().expect("module config"),
        factory.mark4i().expect("module config"),
    ];
    let gyro = GyroSimulation::with_seed(
        NoiseModel::Gaussian {
            std_dev_rad_per_sec: 0.002,
        },
        1,
    )
    .expect("gyro config");
    let mut drivetrain = SwerveDriveSimulation::new(
        SwerveDriveConfig::new(0.6, 0.6, 50.0).expect("chassis config"),
        modules,
        gyro,
    );

    info!("driving straight at 6 V");
    for position in ModulePosition::ALL {
        drivetrain.module_mut(position).set_drive_output_voltage(6.0);
    }
    run(&mut drivetrain, 2.0);

    info!("tank turn: left side -6 V, right side +6 V");
    for position in [ModulePosition::FrontLeft, ModulePosition::BackLeft] {
        drivetrain
            .module_mut(position)
            .set_drive_output_voltage(-6.0);
    }
    for position in [ModulePosition::FrontRight, ModulePosition::BackRight] {
        drivetrain.module_mut(position).set_drive_output_voltage(6.0);
    }
    run(&mut drivetrain, 2.0);

    info!("simulating a collision: 5 degree heading drift");
    drivetrain
        .gyro_mut()
        .apply_collision_drift(Angle::from_degrees(5.0));
    run(&mut drivetrain, 1.0);

    let states: Vec<_> = drivetrain.modules().iter().map(|m| *m.state()).collect();
    match serde_json::to_string_pretty(&states) {
        Ok(json) => println!("{json}"),
        Err(err) => info!("could not serialize final state: {err}"),
    }
}

fn run(drivetrain: &mut SwerveDriveSimulation, seconds: f64) {
    let steps = (seconds / DT).round() as usize;
    for _ in 0..steps {
        drivetrain.tick(SimContext::new(DT, drivetrain.time()));
    }
    let front_left = drivetrain.module(ModulePosition::FrontLeft);
    info!(
        "t={:6.2}s heading={:7.2} deg yaw={:6.3} rad/s fl_speed={:5.2} m/s fl_encoder={:8.1} rad",
        drivetrain.time(),
        drivetrain.gyro().rotation().degrees(),
        drivetrain.gyro().angular_velocity_rad_per_sec(),
        front_left.ground_speed_m_per_sec(),
        front_left.drive_encoder_position_rad(),
    );
}
