// Sabertooth motor control
//
// Provides:
// - Packetized serial protocol codec (command frames + checksum)
// - Serial link with wake sequence and fail-safe stop

pub mod link;
pub mod sabertooth;

pub use link::{LinkError, SabertoothLink};
pub use sabertooth::{Command, CommandError, Motor, Opcode};
