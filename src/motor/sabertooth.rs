// Sabertooth 2x32 packetized serial protocol (DIP switches 1,2 low)
//
// Command frame: [address, opcode, value, checksum]
// checksum = (address + opcode + value) & 0x7F (page 23 of the datasheet)

use crate::config::{Address, Baudrate};

/// Full-scale magnitude of a speed command
const FULL_SCALE: u8 = 127;

/// Command opcodes; each reverse variant is its forward opcode plus one
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Forward1 = 0x00,
    Reverse1 = 0x01,
    Forward2 = 0x04,
    Reverse2 = 0x05,
    ForwardMixed = 0x08,
    ReverseMixed = 0x09,
    RightMixed = 0x0A,
    LeftMixed = 0x0B,
    SetBaudRate = 0x0F,
}

/// Logical motor output of one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motor {
    One,
    Two,
}

/// Precondition violations in command construction; upstream clamping means
/// these never fire in normal operation, but independent writers make the
/// check mandatory
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("speed {0} out of range, must be in [-100, 100]")]
    SpeedOutOfRange(f32),
}

/// An encoded command frame, ready for transmission. Built fresh per send and
/// never mutated, so the checksum can never go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    address: u8,
    opcode: Opcode,
    value: u8,
    checksum: u8,
}

impl Command {
    fn new(address: Address, opcode: Opcode, value: u8) -> Self {
        let address = address.get();
        Self {
            address,
            opcode,
            value,
            checksum: checksum(address, opcode as u8, value),
        }
    }

    /// Drive one motor at a signed speed in [-100, 100]
    pub fn motor(address: Address, motor: Motor, speed: f32) -> Result<Self, CommandError> {
        let opcode = match (motor, speed < 0.0) {
            (Motor::One, false) => Opcode::Forward1,
            (Motor::One, true) => Opcode::Reverse1,
            (Motor::Two, false) => Opcode::Forward2,
            (Motor::Two, true) => Opcode::Reverse2,
        };
        Ok(Self::new(address, opcode, magnitude(speed)?))
    }

    /// Mixed mode: drive both wheels from a single signed speed
    pub fn mixed_drive(address: Address, speed: f32) -> Result<Self, CommandError> {
        let opcode = if speed < 0.0 {
            Opcode::ReverseMixed
        } else {
            Opcode::ForwardMixed
        };
        Ok(Self::new(address, opcode, magnitude(speed)?))
    }

    /// Mixed mode: turn from a single signed rate (positive = right)
    pub fn mixed_turn(address: Address, rate: f32) -> Result<Self, CommandError> {
        let opcode = if rate < 0.0 {
            Opcode::LeftMixed
        } else {
            Opcode::RightMixed
        };
        Ok(Self::new(address, opcode, magnitude(rate)?))
    }

    /// Switch the driver to a new serial baud rate
    pub fn baud_rate(address: Address, rate: Baudrate) -> Self {
        Self::new(address, Opcode::SetBaudRate, rate.code())
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// The 4-byte frame as written to the wire
    pub fn as_bytes(&self) -> [u8; 4] {
        [self.address, self.opcode as u8, self.value, self.checksum]
    }
}

fn checksum(address: u8, opcode: u8, value: u8) -> u8 {
    ((address as u16 + opcode as u16 + value as u16) & 0x7F) as u8
}

/// Scale a signed percent speed to the 7-bit command magnitude
fn magnitude(speed: f32) -> Result<u8, CommandError> {
    // the negated comparison also rejects NaN
    if !(speed.abs() <= 100.0) {
        return Err(CommandError::SpeedOutOfRange(speed));
    }
    let scaled = (FULL_SCALE as f32 * speed.abs() / 100.0).round() as u8;
    Ok(scaled.min(FULL_SCALE))
}
