//! Status and identity commands
//!
//! This module contains commands for monitoring module state and reading its
//! factory identity:
//! - Status register readout (state machine, firmware, radio outcome)
//! - Firmware version
//! - Device ID and PAC (porting authorization code)
//!
//! The status readout is the workhorse of the driver: it is issued before
//! every operation to clear stale completion state and after every completion
//! wait to fetch the result of the operation that just finished.

use core::convert::Infallible;
use core::fmt;

use bitflags::bitflags;
use regiface::{Command, FromByteArray};

use super::Padding;

/// Outcome of the most recent radio operation.
///
/// The module reports codes 0 through 15; anything above that range is kept
/// as [`RadioStatus::Unknown`] and rendered as a generic controller
/// communication error. Decoding is deliberately permissive and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioStatus {
    /// Operation completed successfully.
    #[default]
    Ok,
    /// Manufacturer error.
    ManufacturerError,
    /// ID or key error.
    IdOrKeyError,
    /// State machine error.
    StateMachineError,
    /// Frame size error.
    FrameSizeError,
    /// Manufacturer send error.
    ManufacturerSendError,
    /// Voltage or temperature readout error.
    VoltageTemperatureError,
    /// Issues encountered while closing the link.
    CloseIssues,
    /// API error indication.
    ApiError,
    /// Error fetching the PN9 sequence.
    GetPn9Error,
    /// Error fetching the frequency.
    GetFrequencyError,
    /// Error building the frame.
    BuildFrameError,
    /// Error in the delay routine.
    DelayRoutineError,
    /// Callback error. The module reports this as code 13; the driver reuses
    /// the same code as its local timeout sentinel, see
    /// [`RadioStatus::TIMEOUT`].
    CallbackError,
    /// Timing error.
    TimingError,
    /// Frequency error.
    FrequencyError,
    /// Any code above the documented table; the raw value is retained.
    Unknown(u8),
}

const RADIO_STATUS_MESSAGES: [&str; 16] = [
    "OK",
    "Manufacturer error",
    "ID or key error",
    "State machine error",
    "Frame size error",
    "Manufacturer send error",
    "Get voltage/temperature error",
    "Close issues encountered",
    "API error indication",
    "Error getting PN9",
    "Error getting frequency",
    "Error building frame",
    "Error in delay routine",
    "Callback causes error",
    "Timing error",
    "Frequency error",
];

impl RadioStatus {
    /// Code reported when the event line never asserted within the
    /// operation's timeout budget. No separate code exists for this locally
    /// detected condition; callers treat it exactly like a module-reported
    /// error.
    pub const TIMEOUT: Self = Self::CallbackError;

    /// Decodes a raw status byte. Never fails; out-of-table codes are
    /// retained as [`RadioStatus::Unknown`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::ManufacturerError,
            2 => Self::IdOrKeyError,
            3 => Self::StateMachineError,
            4 => Self::FrameSizeError,
            5 => Self::ManufacturerSendError,
            6 => Self::VoltageTemperatureError,
            7 => Self::CloseIssues,
            8 => Self::ApiError,
            9 => Self::GetPn9Error,
            10 => Self::GetFrequencyError,
            11 => Self::BuildFrameError,
            12 => Self::DelayRoutineError,
            13 => Self::CallbackError,
            14 => Self::TimingError,
            15 => Self::FrequencyError,
            other => Self::Unknown(other),
        }
    }

    /// The raw status code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::ManufacturerError => 1,
            Self::IdOrKeyError => 2,
            Self::StateMachineError => 3,
            Self::FrameSizeError => 4,
            Self::ManufacturerSendError => 5,
            Self::VoltageTemperatureError => 6,
            Self::CloseIssues => 7,
            Self::ApiError => 8,
            Self::GetPn9Error => 9,
            Self::GetFrequencyError => 10,
            Self::BuildFrameError => 11,
            Self::DelayRoutineError => 12,
            Self::CallbackError => 13,
            Self::TimingError => 14,
            Self::FrequencyError => 15,
            Self::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for RadioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Controller comm. error: {}", code),
            other => f.write_str(RADIO_STATUS_MESSAGES[other.code() as usize]),
        }
    }
}

bitflags! {
    /// Firmware status byte.
    ///
    /// # Byte Format
    /// - Bit 6: System ready
    /// - Bit 5: Frame sent
    /// - Bits 4:1: Firmware error code
    /// - Bit 0: Power amplifier enabled
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FirmwareStatus: u8 {
        /// Power amplifier is enabled.
        const PA_ON = 1;
        /// The last frame was sent.
        const FRAME_SENT = 1 << 5;
        /// The system is ready to accept commands.
        const SYSTEM_READY = 1 << 6;
    }
}

impl FirmwareStatus {
    /// The 4-bit firmware error code. Zero means no error.
    pub fn error_code(&self) -> u8 {
        (self.bits() >> 1) & 0x0F
    }
}

impl fmt::Display for FirmwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pa = if self.contains(Self::PA_ON) {
            "PA ON"
        } else {
            "PA OFF"
        };
        if self.error_code() > 0 {
            write!(f, "Error code: {}", self.error_code())
        } else if self.contains(Self::FRAME_SENT) {
            f.write_str("Frame sent")
        } else if self.contains(Self::SYSTEM_READY) {
            write!(f, "{} . System ready", pa)
        } else {
            f.write_str(pa)
        }
    }
}

/// Snapshot of the module's three status registers.
///
/// The three registers are refreshed as a group by a single
/// [`GetStatus`] round trip and are never updated individually. A stale
/// snapshot is detectable only by issuing another readout.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    /// State machine status byte.
    pub state_machine: u8,
    /// Firmware status byte.
    pub firmware: FirmwareStatus,
    /// Outcome of the most recent radio operation.
    pub radio: RadioStatus,
    /// Secondary radio status byte; reported by the module but unused by
    /// higher layers.
    pub radio_secondary: u8,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            state_machine: 0,
            firmware: FirmwareStatus::empty(),
            radio: RadioStatus::Ok,
            radio_secondary: 0,
        }
    }
}

impl FromByteArray for DeviceStatus {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            state_machine: bytes[0],
            firmware: FirmwareStatus::from_bits_retain(bytes[1]),
            radio: RadioStatus::from_code(bytes[2]),
            radio_secondary: bytes[3],
        })
    }
}

/// GetStatus command (0x0A)
///
/// Reads the three status registers in one round trip.
///
/// # Important Notes
/// - Issuing this command also clears the module's pending event condition
/// - The radio status is only meaningful after a completed radio operation
/// - Always a single fixed-latency transaction; this command never waits
#[derive(Debug, Clone)]
pub struct GetStatus;

impl Command for GetStatus {
    type IdType = u8;
    type CommandParameters = Padding<1>;
    type ResponseParameters = DeviceStatus;

    fn id() -> Self::IdType {
        0x0A
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        Padding
    }
}

/// Firmware version reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    /// Whether a functioning module answered the version query.
    ///
    /// An absent or unpowered module leaves the bus floating, which reads
    /// back as all-zero or all-ones.
    pub fn is_present(&self) -> bool {
        !(self.major == 0x00 && self.minor == 0x00) && !(self.major == 0xFF && self.minor == 0xFF)
    }
}

impl FromByteArray for FirmwareVersion {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            major: bytes[0],
            minor: bytes[1],
        })
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// GetFirmwareVersion command (0x06)
///
/// Returns the module's firmware version as major/minor bytes.
///
/// # Important Notes
/// - Used by the engine's initialization to detect a missing module
/// - An all-zero or all-0xFF version means no functioning device
#[derive(Debug, Clone)]
pub struct GetFirmwareVersion;

impl Command for GetFirmwareVersion {
    type IdType = u8;
    type CommandParameters = Padding<1>;
    type ResponseParameters = FirmwareVersion;

    fn id() -> Self::IdType {
        0x06
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        Padding
    }
}

/// The module's 4-byte Sigfox device ID.
///
/// The bytes arrive most significant last; [`fmt::Display`] renders the ID in
/// the conventional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub [u8; 4]);

impl FromByteArray for DeviceId {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self(bytes))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// GetDeviceId command (0x12)
#[derive(Debug, Clone)]
pub struct GetDeviceId;

impl Command for GetDeviceId {
    type IdType = u8;
    type CommandParameters = Padding<1>;
    type ResponseParameters = DeviceId;

    fn id() -> Self::IdType {
        0x12
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        Padding
    }
}

/// The module's porting authorization code.
///
/// The module clocks out sixteen bytes; only the first eight carry the PAC,
/// and [`fmt::Display`] renders exactly those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pac(pub [u8; 16]);

impl FromByteArray for Pac {
    type Error = Infallible;
    type Array = [u8; 16];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self(bytes))
    }
}

impl fmt::Display for Pac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// GetPac command (0x0F)
#[derive(Debug, Clone)]
pub struct GetPac;

impl Command for GetPac {
    type IdType = u8;
    type CommandParameters = Padding<1>;
    type ResponseParameters = Pac;

    fn id() -> Self::IdType {
        0x0F
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        Padding
    }
}

#[cfg(test)]
mod tests {
    use regiface::ToByteArray;

    use super::*;

    #[test]
    fn status_query_frame_layout() {
        assert_eq!(GetStatus::id(), 0x0A);
        assert_eq!(GetStatus.invoking_parameters().to_bytes().unwrap(), [0x00]);
    }

    #[test]
    fn status_decode_maps_register_offsets() {
        let status = DeviceStatus::from_bytes([0x01, 0x41, 0x03, 0x07]).unwrap();
        assert_eq!(status.state_machine, 0x01);
        assert_eq!(status.firmware.bits(), 0x41);
        assert_eq!(status.radio, RadioStatus::StateMachineError);
        assert_eq!(status.radio.code(), 3);
        assert_eq!(status.radio_secondary, 0x07);
    }

    #[test]
    fn radio_status_round_trips_all_table_codes() {
        for code in 0..=15 {
            assert_eq!(RadioStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn radio_status_messages_match_table() {
        assert_eq!(RadioStatus::Ok.to_string(), "OK");
        assert_eq!(
            RadioStatus::from_code(4).to_string(),
            "Frame size error"
        );
        assert_eq!(
            RadioStatus::TIMEOUT.to_string(),
            "Callback causes error"
        );
        assert_eq!(
            RadioStatus::FrequencyError.to_string(),
            "Frequency error"
        );
    }

    #[test]
    fn out_of_table_codes_saturate_to_generic_message() {
        let status = RadioStatus::from_code(20);
        assert_eq!(status, RadioStatus::Unknown(20));
        assert_eq!(status.code(), 20);
        assert_eq!(status.to_string(), "Controller comm. error: 20");
    }

    #[test]
    fn firmware_status_rendering() {
        let ready = FirmwareStatus::SYSTEM_READY | FirmwareStatus::PA_ON;
        assert_eq!(ready.to_string(), "PA ON . System ready");

        let sent = FirmwareStatus::FRAME_SENT;
        assert_eq!(sent.to_string(), "Frame sent");

        let errored = FirmwareStatus::from_bits_retain(0b0000_0110);
        assert_eq!(errored.error_code(), 3);
        assert_eq!(errored.to_string(), "Error code: 3");

        assert_eq!(FirmwareStatus::empty().to_string(), "PA OFF");
    }

    #[test]
    fn firmware_version_presence() {
        assert!(FirmwareVersion { major: 1, minor: 2 }.is_present());
        assert!(!FirmwareVersion { major: 0, minor: 0 }.is_present());
        assert!(!FirmwareVersion {
            major: 0xFF,
            minor: 0xFF
        }
        .is_present());
        assert_eq!(FirmwareVersion { major: 1, minor: 2 }.to_string(), "1.2");
    }

    #[test]
    fn device_id_renders_most_significant_first() {
        let id = DeviceId([0x44, 0x33, 0x22, 0x11]);
        assert_eq!(id.to_string(), "11223344");
    }

    #[test]
    fn pac_renders_first_eight_bytes() {
        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(Pac(raw).to_string(), "DEADBEEF01020304");
    }
}
