use clap::Parser;
use tracing_subscriber::EnvFilter;

use couch_drive_runtime::config::{self, Address, Baudrate, ConfigError, DriveConfig};

/// Differential drive runtime for a Sabertooth-powered platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port of the motor driver
    #[arg(long, default_value = config::DEFAULT_PORT)]
    port: String,

    /// Packetized-serial address (128-135)
    #[arg(long, default_value_t = config::DEFAULT_ADDRESS)]
    address: u8,

    /// Serial baud rate (2400/9600/19200/38400/115200)
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Speed ceiling, percent of full scale
    #[arg(long, default_value_t = config::DEFAULT_MAX_SPEED)]
    max_speed: f32,

    /// Ramp acceleration, percent per second
    #[arg(long, default_value_t = config::DEFAULT_ACCELERATION)]
    acceleration: f32,

    /// Seconds to ramp from max speed to zero in a fast stop
    #[arg(long, default_value_t = config::DEFAULT_STOP_DECELERATION_TIME)]
    stop_decel_time: f32,

    /// Scheduler tick interval, seconds
    #[arg(long, default_value_t = config::DEFAULT_TICK_INTERVAL)]
    tick_interval: f32,

    /// Stick magnitude treated as centered, percent
    #[arg(long, default_value_t = config::DEFAULT_STICK_DEADBAND)]
    deadband: f32,

    /// Consecutive send failures before the link is disabled
    #[arg(long, default_value_t = config::DEFAULT_RETRY_BUDGET)]
    retry_budget: u32,
}

fn build_config(args: Args) -> Result<DriveConfig, ConfigError> {
    let config = DriveConfig {
        port: args.port,
        address: Address::new(args.address)?,
        baudrate: Baudrate::from_u32(args.baud)?,
        max_speed: args.max_speed,
        acceleration: args.acceleration,
        stop_deceleration_time: args.stop_decel_time,
        tick_interval: args.tick_interval,
        stick_deadband: args.deadband,
        link_retry_budget: args.retry_budget,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let config = match build_config(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = couch_drive_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
