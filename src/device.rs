//! ATA8520 Bus Interface
//!
//! This module provides the low-level interface for exchanging command frames
//! with the coprocessor over SPI. It supports both synchronous and
//! asynchronous operation.
//!
//! The interface is built around the [`Device<SPI>`] struct, which wraps an
//! SPI interface and provides methods for:
//! - Executing opcode commands and decoding their fixed-size responses
//! - Staging variable-length message frames
//!
//! Each method issues exactly one SPI transaction; chip-select assertion and
//! inter-byte timing are the responsibility of the [`SpiDevice`]
//! implementation. Nothing here waits on the event line; completion handling
//! lives in [`crate::engine`].
//!
//! [`SpiDevice`]: embedded_hal::spi::SpiDevice

use core::convert::Infallible;

use regiface::{ByteArray, Command, FromByteArray, ToByteArray};

use crate::commands::radio::{MAX_MESSAGE_LEN, STAGE_MESSAGE_OPCODE};
use crate::Error;

/// Low-level bus interface for the ATA8520.
///
/// This struct wraps an SPI interface and provides frame-level access to the
/// module. It supports both synchronous operations through the embedded-hal
/// traits and asynchronous operations through embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    ///
    /// This method consumes the Device instance and returns the wrapped SPI
    /// interface.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Executes a command on the module.
    ///
    /// The opcode, the command's parameter bytes, and the response readout
    /// are clocked as one bus transaction.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Response` - Failed to parse the command response
    pub fn execute_command<C>(&mut self, command: C) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
    {
        let opcode = [C::id()];
        let request = command.invoking_parameters().to_bytes().unwrap();
        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&opcode),
                embedded_hal::spi::Operation::Write(request.as_ref()),
                embedded_hal::spi::Operation::Read(raw_response.as_mut()),
            ])
            .map_err(|_| Error::Bus)?;

        C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Response)
    }

    /// Stages a message payload in the module's transmit buffer.
    ///
    /// This only loads the payload; transmission starts when a trigger
    /// command is issued. Payloads longer than [`MAX_MESSAGE_LEN`] bytes are
    /// truncated silently, per the module's frame contract.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_message(&mut self, payload: &[u8]) -> Result<(), Error> {
        let payload = &payload[..payload.len().min(MAX_MESSAGE_LEN)];
        let header = [STAGE_MESSAGE_OPCODE, payload.len() as u8];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&header),
                embedded_hal::spi::Operation::Write(payload),
            ])
            .map_err(|_| Error::Bus)
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously executes a command on the module.
    ///
    /// This is the async version of [`execute_command`](Device::execute_command).
    pub async fn execute_command_async<C>(
        &mut self,
        command: C,
    ) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
    {
        let opcode = [C::id()];
        let request = command.invoking_parameters().to_bytes().unwrap();
        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&opcode),
                embedded_hal_async::spi::Operation::Write(request.as_ref()),
                embedded_hal_async::spi::Operation::Read(raw_response.as_mut()),
            ])
            .await
            .map_err(|_| Error::Bus)?;

        C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Response)
    }

    /// Asynchronously stages a message payload in the module's transmit buffer.
    ///
    /// This is the async version of [`write_message`](Device::write_message).
    pub async fn write_message_async(&mut self, payload: &[u8]) -> Result<(), Error> {
        let payload = &payload[..payload.len().min(MAX_MESSAGE_LEN)];
        let header = [STAGE_MESSAGE_OPCODE, payload.len() as u8];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::Write(payload),
            ])
            .await
            .map_err(|_| Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use super::*;
    use crate::commands::{GetStatus, RadioStatus};

    #[test]
    fn command_transaction_shape() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x0A]),
            SpiTransaction::write_vec(vec![0x00]),
            SpiTransaction::read_vec(vec![0x01, 0x40, 0x00, 0x00]),
            SpiTransaction::transaction_end(),
        ];
        let mut device = Device::new(SpiMock::new(&expectations));

        let status = device.execute_command(GetStatus).unwrap();
        assert_eq!(status.state_machine, 0x01);
        assert_eq!(status.radio, RadioStatus::Ok);

        device.release().done();
    }

    #[test]
    fn message_staging_truncates_to_twelve_bytes() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x07, 12]),
            SpiTransaction::write_vec(b"ABCDEFGHIJKL".to_vec()),
            SpiTransaction::transaction_end(),
        ];
        let mut device = Device::new(SpiMock::new(&expectations));

        device.write_message(b"ABCDEFGHIJKLMNOP").unwrap();

        device.release().done();
    }

    #[test]
    fn short_messages_stage_untruncated() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x07, 5]),
            SpiTransaction::write_vec(b"HELLO".to_vec()),
            SpiTransaction::transaction_end(),
        ];
        let mut device = Device::new(SpiMock::new(&expectations));

        device.write_message(b"HELLO").unwrap();

        device.release().done();
    }
}
