//! Coprocessor command implementations
//!
//! This module contains the implementation of the ATA8520 opcode command set.
//! Commands are organized into functional categories:
//!
//! # Command Categories
//! - [`radio`]: Transmission and calibration commands
//!   - Stage and trigger uplink messages
//!   - Single-bit transmission
//!   - Crystal calibration
//!   - Downlink frame readout
//!
//! - [`status`]: Status and identity queries
//!   - Status register readout (state machine, firmware, radio)
//!   - Firmware version, device ID, and PAC
//!
//! - [`system`]: System control commands
//!   - Reset and power-down
//!   - Region and TX/RX mode configuration
//!   - Test mode and EEPROM configuration readout
//!   - Voltage/temperature measurement
//!
//! # Command Execution
//! Every command is one SPI transaction: the opcode byte, the command's
//! parameter bytes, then the response bytes clocked back while the master
//! sends zeros. Commands that start a radio operation (transmission,
//! calibration, region configuration) do not answer in the same transaction;
//! the module asserts its event line when the result is ready, and the result
//! must then be fetched with a status readout.
//!
//! The EVENT line indicates when a pending operation has finished:
//! - High = Operation still running, result not available
//! - Low  = Result ready, fetch it with a status readout
//!
//! # Common Patterns
//! 1. Read the status registers to clear any stale completion state
//! 2. Issue the command
//! 3. Wait for EVENT to go low (bounded by the operation's timeout)
//! 4. Read the status registers to fetch the outcome
//!
//! # Important Notes
//! - Radio operations take multiple seconds; waits must be bounded
//! - The module never answers a query in the transaction that requests it
//!   without at least one padding byte of latency
//! - Out-of-range radio status codes are decoded permissively, never rejected

use core::convert::Infallible;

use regiface::ToByteArray;

pub mod radio;
pub mod status;
pub mod system;

pub use radio::*;
pub use status::*;
pub use system::*;

/// Zero padding clocked out after an opcode while the module prepares its
/// reply.
///
/// Query commands do not answer in the byte slot immediately following the
/// opcode; one throwaway byte must be shifted first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Padding<const N: usize>;

impl<const N: usize> ToByteArray for Padding<N> {
    type Error = Infallible;
    type Array = [u8; N];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([0u8; N])
    }
}
