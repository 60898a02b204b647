// Drive parameters, serial settings, Zenoh topics

use std::time::Duration;

// Zenoh topics
pub const TOPIC_CMD_INPUT: &str = "couch/cmd/input"; // input events
pub const TOPIC_RT_DRIVE: &str = "couch/rt/drive"; // transmitted outputs
pub const TOPIC_HEALTH: &str = "couch/state/health"; // health status

/// Serial port for the motor driver (Pi UART header)
pub const DEFAULT_PORT: &str = "/dev/ttyS0";

/// Bounded serial write timeout
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Settle interval after the wake sequence and after a baud change
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(200);

// Drive defaults
pub const DEFAULT_ADDRESS: u8 = 128;
pub const DEFAULT_MAX_SPEED: f32 = 90.0; // percent of full scale
pub const DEFAULT_ACCELERATION: f32 = 30.0; // percent per second
pub const DEFAULT_STOP_DECELERATION_TIME: f32 = 0.5; // seconds from max speed to zero
pub const DEFAULT_TICK_INTERVAL: f32 = 0.1; // seconds
pub const DEFAULT_STICK_DEADBAND: f32 = 5.0; // percent
pub const DEFAULT_RETRY_BUDGET: u32 = 5;

/// Configuration errors are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid motor driver address {0}, must be in 128..=135")]
    InvalidAddress(u8),

    #[error("invalid baud rate {0}, must be 2400, 9600, 19200, 38400 or 115200")]
    InvalidBaudRate(u32),

    #[error("invalid max speed {0}, must be in (0, 100]")]
    InvalidMaxSpeed(f32),

    #[error("invalid acceleration {0}, must be positive")]
    InvalidAcceleration(f32),

    #[error("invalid stop deceleration time {0}, must be positive")]
    InvalidStopDecelerationTime(f32),

    #[error("invalid tick interval {0}, must be positive")]
    InvalidTickInterval(f32),

    #[error("invalid stick deadband {0}, must be in [0, 100)")]
    InvalidStickDeadband(f32),

    #[error("invalid retry budget {0}, must be at least 1")]
    InvalidRetryBudget(u32),
}

/// Packetized-serial address of one motor driver on the shared bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(u8);

impl Address {
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if (128..=135).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidAddress(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self(DEFAULT_ADDRESS)
    }
}

/// Baud rates accepted by the motor driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baudrate {
    B2400,
    B9600,
    B19200,
    B38400,
    B115200,
}

impl Baudrate {
    pub fn from_u32(rate: u32) -> Result<Self, ConfigError> {
        match rate {
            2400 => Ok(Self::B2400),
            9600 => Ok(Self::B9600),
            19200 => Ok(Self::B19200),
            38400 => Ok(Self::B38400),
            115200 => Ok(Self::B115200),
            other => Err(ConfigError::InvalidBaudRate(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::B2400 => 2400,
            Self::B9600 => 9600,
            Self::B19200 => 19200,
            Self::B38400 => 38400,
            Self::B115200 => 115200,
        }
    }

    /// Value byte of the baud-rate configuration command
    pub fn code(self) -> u8 {
        match self {
            Self::B2400 => 1,
            Self::B9600 => 2,
            Self::B19200 => 3,
            Self::B38400 => 4,
            Self::B115200 => 5,
        }
    }
}

/// Validated runtime configuration; one instance per physical link
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub port: String,
    pub address: Address,
    pub baudrate: Baudrate,
    /// Speed ceiling, percent of full scale
    pub max_speed: f32,
    /// Ramp acceleration, percent per second
    pub acceleration: f32,
    /// Seconds to ramp from max speed to zero in a fast stop
    pub stop_deceleration_time: f32,
    /// Scheduler tick interval, seconds
    pub tick_interval: f32,
    /// Stick magnitude treated as centered, percent
    pub stick_deadband: f32,
    /// Consecutive send failures before the link is disabled
    pub link_retry_budget: u32,
}

impl DriveConfig {
    /// Check the numeric parameters; address and baud rate are already
    /// validated by construction
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_speed > 0.0 && self.max_speed <= 100.0) {
            return Err(ConfigError::InvalidMaxSpeed(self.max_speed));
        }
        if !(self.acceleration > 0.0) {
            return Err(ConfigError::InvalidAcceleration(self.acceleration));
        }
        if !(self.stop_deceleration_time > 0.0) {
            return Err(ConfigError::InvalidStopDecelerationTime(
                self.stop_deceleration_time,
            ));
        }
        if !(self.tick_interval > 0.0) {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval));
        }
        if !(self.stick_deadband >= 0.0 && self.stick_deadband < 100.0) {
            return Err(ConfigError::InvalidStickDeadband(self.stick_deadband));
        }
        if self.link_retry_budget == 0 {
            return Err(ConfigError::InvalidRetryBudget(self.link_retry_budget));
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f32(self.tick_interval)
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            address: Address::default(),
            baudrate: Baudrate::B9600,
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            stop_deceleration_time: DEFAULT_STOP_DECELERATION_TIME,
            tick_interval: DEFAULT_TICK_INTERVAL,
            stick_deadband: DEFAULT_STICK_DEADBAND,
            link_retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}
