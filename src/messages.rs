// Message types exchanged between the input adapter and the runtime

use serde::{Deserialize, Serialize};

/// One physical motor output of the drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    pub fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

/// Discrete safety-relevant inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyInput {
    LeftGuard,
    RightGuard,
    Panic,
}

// Input adapter -> runtime, one discrete event per message
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Normalized stick position in [-1, 1] for one channel
    Axis { channel: Channel, value: f32 },
    /// Level state of a safety input (true while held/triggered)
    Button { input: SafetyInput, pressed: bool },
}

// Runtime -> observers: the outputs last handed to the motor link, percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DriveOutputs {
    pub left: f32,
    pub right: f32,
}

/// Health status published by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DriveHealth {
    Ok,
    FastStop,
    LinkDegraded,
    LinkDisabled,
}
