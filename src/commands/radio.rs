//! Transmission and calibration commands
//!
//! This module contains the commands involved in the two-phase transmission
//! workflow:
//! - Staging a message payload in the coprocessor (opcode 0x07, issued as a
//!   raw frame by [`crate::device::Device::write_message`] because its length
//!   varies)
//! - Crystal calibration, which must complete immediately before every
//!   transmission
//! - Triggering the staged transmission, with or without a downlink window
//! - Reading the fixed-size downlink frame after a successful receive-mode
//!   transmission
//!
//! # Important Notes
//! - Staging a message does not transmit anything; the radio only keys up
//!   once a trigger command is issued
//! - Calibration is a hardware ordering requirement, not an optimization:
//!   skipping it before a trigger produces off-frequency transmissions
//! - Trigger and calibration commands answer through the event line, never
//!   in-band

use core::convert::Infallible;

use regiface::{Command, FromByteArray, NoParameters, ToByteArray};

/// Maximum payload length of one uplink message. Longer payloads are
/// truncated silently when staged.
pub const MAX_MESSAGE_LEN: usize = 12;

/// Fixed length of a downlink response frame.
pub const RECEIVED_FRAME_LEN: usize = 8;

/// Opcode of the variable-length message staging frame.
pub(crate) const STAGE_MESSAGE_OPCODE: u8 = 0x07;

/// Single-bit payload value.
#[derive(Debug, Clone, Copy)]
pub struct BitValue(pub bool);

impl ToByteArray for BitValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.0 as u8])
    }
}

/// SendBit command (0x0B)
///
/// Transmits a single bit without staging a message first.
///
/// # Important Notes
/// - Shorter air time than a full message; the engine budgets a 7 second
///   completion wait instead of 10
/// - No downlink window is available on this path
#[derive(Debug, Clone)]
pub struct SendBit {
    /// The bit to transmit.
    pub value: bool,
}

impl Command for SendBit {
    type IdType = u8;
    type CommandParameters = BitValue;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x0B
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        BitValue(self.value)
    }
}

/// TriggerSend command (0x0D)
///
/// Starts radio transmission of the staged message.
///
/// # Important Notes
/// - The message must have been staged and the crystal calibrated first
/// - Completion is signalled on the event line after several seconds
#[derive(Debug, Clone)]
pub struct TriggerSend;

impl Command for TriggerSend {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x0D
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// TriggerSendReceive command (0x0E)
///
/// Starts radio transmission of the staged message and opens a downlink
/// receive window after the uplink completes.
///
/// # Important Notes
/// - The downlink window extends the completion wait to up to 60 seconds
/// - On success the received frame must be fetched with [`ReadReceivedFrame`]
#[derive(Debug, Clone)]
pub struct TriggerSendReceive;

impl Command for TriggerSendReceive {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x0E
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// CalibrateCrystal command (0x14)
///
/// Starts a crystal calibration cycle.
///
/// # Important Notes
/// - Required immediately before every transmission trigger
/// - Also latches a fresh voltage/temperature measurement that can be read
///   back with [`super::GetVoltageTemperature`]
/// - Completion is signalled on the event line; a full cycle can take close
///   to a minute
#[derive(Debug, Clone)]
pub struct CalibrateCrystal;

impl Command for CalibrateCrystal {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x14
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// Requested downlink frame length parameter.
#[derive(Debug, Clone, Copy)]
pub struct FrameLength(pub u8);

impl ToByteArray for FrameLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.0])
    }
}

/// A downlink response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceivedFrame {
    pub bytes: [u8; RECEIVED_FRAME_LEN],
}

impl FromByteArray for ReceivedFrame {
    type Error = Infallible;
    type Array = [u8; RECEIVED_FRAME_LEN];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { bytes })
    }
}

/// ReadReceivedFrame command (0x10)
///
/// Fetches the downlink frame received during the last receive-mode
/// transmission.
///
/// # Important Notes
/// - Only valid after a receive-mode transmission reported status 0
/// - Always transfers exactly [`RECEIVED_FRAME_LEN`] bytes
#[derive(Debug, Clone)]
pub struct ReadReceivedFrame;

impl Command for ReadReceivedFrame {
    type IdType = u8;
    type CommandParameters = FrameLength;
    type ResponseParameters = ReceivedFrame;

    fn id() -> Self::IdType {
        0x10
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        FrameLength(RECEIVED_FRAME_LEN as u8)
    }
}
