//! System control commands
//!
//! This module contains commands for module lifecycle and configuration:
//! - Soft reset and power-down
//! - Region and TX/RX mode configuration
//! - Factory test mode
//! - EEPROM configuration readout
//! - Supply voltage and temperature measurement
//!
//! These commands are issued rarely, typically once during provisioning or
//! bring-up; none of them participate in the transmission hot path.

use core::convert::Infallible;

use bitflags::bitflags;
use regiface::{Command, FromByteArray, NoParameters, ToByteArray};

use super::Padding;

/// ResetModule command (0x01)
///
/// Performs a soft reset of the coprocessor's internal state machine.
#[derive(Debug, Clone)]
pub struct ResetModule;

impl Command for ResetModule {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x01
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// SetOffMode command (0x05)
///
/// Sends the module into its low-power off mode.
///
/// # Important Notes
/// - Also issued to commit a region configuration write
/// - The module must be power cycled or reset to accept commands again
#[derive(Debug, Clone)]
pub struct SetOffMode;

impl Command for SetOffMode {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x05
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

bitflags! {
    /// Region and link-direction configuration.
    ///
    /// The remaining bits of the configuration byte carry a fixed pattern
    /// applied at serialization time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionConfig: u8 {
        /// ETSI (European) band plan; clear for FCC.
        const EU = 1 << 2;
        /// Enable the downlink receive path in addition to uplink.
        const BIDIRECTIONAL = 1 << 1;
    }
}

/// Fixed bits of the region configuration byte.
const REGION_CONFIG_BASE: u8 = (0x3 << 4) | (1 << 3) | 1;

/// Serialized parameters of [`ConfigureRegion`]: register address prelude
/// plus the configuration byte.
#[derive(Debug, Clone, Copy)]
pub struct RegionParameters(pub RegionConfig);

impl ToByteArray for RegionParameters {
    type Error = Infallible;
    type Array = [u8; 4];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([0x00, 0x01, 0x02, REGION_CONFIG_BASE | self.0.bits()])
    }
}

/// ConfigureRegion command (0x11)
///
/// Writes the region and link-direction configuration to the module.
///
/// # Important Notes
/// - Completion is signalled on the event line within a few seconds
/// - The write must be committed with [`SetOffMode`] afterwards
#[derive(Debug, Clone)]
pub struct ConfigureRegion {
    pub config: RegionConfig,
}

impl Command for ConfigureRegion {
    type IdType = u8;
    type CommandParameters = RegionParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x11
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        RegionParameters(self.config)
    }
}

/// Test mode switch parameter.
#[derive(Debug, Clone, Copy)]
pub struct TestModeConfig(pub bool);

impl ToByteArray for TestModeConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([if self.0 { 0x11 } else { 0x00 }])
    }
}

/// TestMode command (0x17)
///
/// Enables or disables the module's factory test mode.
#[derive(Debug, Clone)]
pub struct TestMode {
    pub enabled: bool,
}

impl Command for TestMode {
    type IdType = u8;
    type CommandParameters = TestModeConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x17
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        TestModeConfig(self.enabled)
    }
}

/// PrepareConfigRead command (0x1F)
///
/// Latches the EEPROM configuration for readout with [`ReadConfig`].
#[derive(Debug, Clone)]
pub struct PrepareConfigRead;

impl Command for PrepareConfigRead {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x1F
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// EEPROM configuration snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleConfig {
    /// Uplink carrier frequency in Hz.
    pub tx_frequency: u32,
    /// Downlink carrier frequency in Hz.
    pub rx_frequency: u32,
    /// Number of frame repetitions per transmission.
    pub repeats: u8,
    /// Raw configuration byte.
    pub configuration: u8,
}

impl FromByteArray for ModuleConfig {
    type Error = Infallible;
    type Array = [u8; 10];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            tx_frequency: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            rx_frequency: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            repeats: bytes[8],
            configuration: bytes[9],
        })
    }
}

/// ReadConfig command (0x20)
///
/// Reads the configuration latched by [`PrepareConfigRead`].
#[derive(Debug, Clone)]
pub struct ReadConfig;

impl Command for ReadConfig {
    type IdType = u8;
    type CommandParameters = Padding<1>;
    type ResponseParameters = ModuleConfig;

    fn id() -> Self::IdType {
        0x20
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        Padding
    }
}

/// Supply voltage and die temperature measurement.
///
/// Latched by a [`super::CalibrateCrystal`] cycle and read back afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltageTemperature {
    /// Supply voltage sampled while idle, in millivolts.
    pub idle_voltage: u16,
    /// Supply voltage sampled while the PA was active, in millivolts.
    pub active_voltage: u16,
    /// Raw temperature reading in tenths of a degree, offset by 50.
    pub temperature: i16,
}

impl VoltageTemperature {
    /// Die temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        (self.temperature as f32 - 50.0) / 10.0
    }
}

impl FromByteArray for VoltageTemperature {
    type Error = Infallible;
    type Array = [u8; 7];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            idle_voltage: u16::from_le_bytes([bytes[1], bytes[2]]),
            active_voltage: u16::from_le_bytes([bytes[3], bytes[4]]),
            temperature: i16::from_le_bytes([bytes[5], bytes[6]]),
        })
    }
}

/// GetVoltageTemperature command (0x13)
///
/// Reads the voltage/temperature frame latched by the last calibration.
#[derive(Debug, Clone)]
pub struct GetVoltageTemperature;

impl Command for GetVoltageTemperature {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = VoltageTemperature;

    fn id() -> Self::IdType {
        0x13
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}
