#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]
//! ATA8520 Sigfox Coprocessor Driver
//!
//! This crate provides a type-safe interface for the Atmel ATA8520 Sigfox network
//! coprocessor. The ATA8520 is a fully integrated Sigfox uplink/downlink transmitter
//! that is driven over SPI with short opcode commands and signals completion of its
//! multi-second radio operations on a dedicated, active-low event line.
//!
//! # Features
//! - Uplink messages up to 12 bytes, with optional 8-byte downlink response
//! - Single-bit transmissions over a dedicated short command
//! - Crystal calibration sequencing required before every transmission
//! - Streaming packet accumulation and a FIFO for received bytes
//! - Identity and configuration queries (ID, PAC, firmware version, region config)
//! - Blocking (polling) and async (yielding) completion-wait strategies
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`engine`]: The protocol engine and main entry point
//!   - Sequences the calibrate-then-send transmission workflow
//!   - Drives the bounded completion waits and status refreshes
//!   - Owns the transmit accumulator and receive queue
//!
//! - [`device`]: Low-level bus interface
//!   - Executes opcode commands as single SPI transactions
//!   - Stages variable-length message frames
//!
//! - [`commands`]: Command definitions for the module's opcode set
//!   - [`commands::radio`]: Transmission, calibration, and downlink readout
//!   - [`commands::status`]: Status, version, and identity queries
//!   - [`commands::system`]: Reset, power, region, and configuration control
//!
//! - [`wait`]: Completion-line wait strategies
//!   - Level-sampling polling loop at a fixed cadence
//!   - Async variant that yields to the executor between samples
//!
//! # Usage
//! The driver uses the `regiface` crate to provide a type-safe interface for
//! command encoding and response decoding. The main entry point is the
//! [`Ata8520`] struct, which combines an SPI interface with a completion line
//! and a delay provider.
//!
//! A transmission follows a fixed hardware sequence:
//!
//! 1. Refresh the status registers to clear any stale completion state
//! 2. Stage the message payload in the coprocessor
//! 3. Calibrate the crystal (mandatory before every transmission)
//! 4. Trigger the radio transmission
//! 5. Wait for the event line, then fetch the resulting status
//!
//! All of this is handled by [`Ata8520::send`].
//!
//! # Important Notes
//! - Payloads longer than 12 bytes are silently truncated; this mirrors the
//!   module's frame contract and is a documented policy, not a failure
//! - The module reports the outcome of every radio operation as a status code
//!   in the 0-15 range; code 13 is also used by this driver as the local
//!   timeout sentinel when the event line never asserts
//! - The engine executes one operation to completion before accepting the
//!   next; wrap it in a mutual-exclusion primitive if multiple callers share
//!   one physical device
//! - Board bring-up (pin directions, power-on reset pulse, SPI clocking) must
//!   have completed before [`Ata8520::begin`] is invoked
//!
//! # Example
//! ```no_run
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::InputPin;
//! use embedded_hal::spi::SpiDevice;
//! use ata8520::{Ata8520, Error, PollingLine, RadioStatus};
//!
//! fn send_reading<SPI, P, D1, D2>(
//!     spi: SPI,
//!     event_pin: P,
//!     poll_delay: D1,
//!     delay: D2,
//! ) -> Result<RadioStatus, Error>
//! where
//!     SPI: SpiDevice,
//!     P: InputPin,
//!     D1: DelayNs,
//!     D2: DelayNs,
//! {
//!     let mut sigfox = Ata8520::new(spi, PollingLine::new(event_pin, poll_delay), delay);
//!
//!     if !sigfox.begin()? {
//!         return Err(Error::Bus);
//!     }
//!
//!     sigfox.send(b"HELLO", false)
//! }
//! ```

mod buffer;
pub mod commands;
pub mod device;
pub mod engine;
pub mod wait;

pub use commands::*;
pub use device::Device;
pub use engine::Ata8520;
pub use wait::{CompletionLine, CompletionLineAsync, PollingLine, POLL_INTERVAL};

/// Unified error type for all driver operations.
///
/// Coprocessor-reported outcomes are never surfaced here; they arrive as
/// [`RadioStatus`] codes. This type covers bus faults and the driver's local
/// precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI or completion-line access failed.
    Bus,
    /// A command response could not be parsed.
    Response,
    /// [`Ata8520::send`] was invoked with an empty payload. Nothing was
    /// clocked onto the bus.
    EmptyFrame,
    /// [`Ata8520::read`] or [`Ata8520::peek`] was invoked on an empty
    /// receive queue.
    QueueEmpty,
}
