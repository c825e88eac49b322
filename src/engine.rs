//! ATA8520 Protocol Engine
//!
//! This module sequences the coprocessor's multi-step workflows on top of the
//! frame-level [`Device`] interface. It owns the status snapshot, the
//! transmit accumulator, and the receive queue, and it drives every bounded
//! completion wait.
//!
//! # Transmission workflow
//! A transmission is a fixed five-phase sequence; the phases are enforced by
//! control flow, and each operation runs to completion before the engine
//! accepts the next:
//!
//! 1. Refresh the status registers, clearing any stale completion state
//! 2. Stage the payload in the coprocessor (no radio activity yet)
//! 3. Run a crystal calibration cycle and wait for it to complete
//! 4. Issue the transmission trigger
//! 5. Wait for the event line, then fetch the resulting status
//!
//! The calibration in step 3 is a hardware precondition of every
//! transmission, never skipped. If the event line stays deasserted for an
//! entire wait budget, the radio status is forced to
//! [`RadioStatus::TIMEOUT`] locally, without a bus read.
//!
//! # Failure semantics
//! Nothing is retried. Timeouts and module-reported errors surface as status
//! codes for the caller to act on; local precondition failures surface as
//! [`Error`] variants before any bus activity. Every operation leaves the
//! engine in a well-defined state, and the next operation's opening status
//! refresh clears whatever the previous one left behind.
//!
//! # Concurrency
//! One engine instance per physical device. The engine has no internal
//! locking; callers that share an instance must serialize access externally.

use core::time::Duration;

use crate::buffer::{RxQueue, TxBuffer, TX_BUFFER_CAPACITY};
use crate::commands::{
    CalibrateCrystal, ConfigureRegion, DeviceId, DeviceStatus, FirmwareVersion, GetDeviceId,
    GetFirmwareVersion, GetPac, GetStatus, GetVoltageTemperature, ModuleConfig, Pac,
    PrepareConfigRead, RadioStatus, ReadConfig, ReadReceivedFrame, RegionConfig, ResetModule,
    SendBit, SetOffMode, TestMode, TriggerSend, TriggerSendReceive, VoltageTemperature,
};
use crate::device::Device;
use crate::wait::{CompletionLine, CompletionLineAsync};
use crate::Error;

/// Completion budget for a crystal calibration cycle.
const CALIBRATION_TIMEOUT: Duration = Duration::from_secs(60);
/// Completion budget for an uplink-only transmission.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Completion budget for a transmission with a downlink window.
const SEND_RECEIVE_TIMEOUT: Duration = Duration::from_secs(60);
/// Completion budget for a single-bit transmission.
const SEND_BIT_TIMEOUT: Duration = Duration::from_secs(7);
/// Completion budget for a region configuration write.
const REGION_TIMEOUT: Duration = Duration::from_secs(3);
/// Completion budget for a voltage/temperature measurement.
const MEASURE_TIMEOUT: Duration = Duration::from_millis(100);

/// Settle time between staging, calibration, and trigger frames.
const SETTLE_MS: u32 = 5;

/// Protocol engine for the ATA8520 Sigfox coprocessor.
///
/// Combines the SPI bus interface with a completion line and a delay
/// provider. See the [module documentation](self) for the workflow this
/// engine sequences.
pub struct Ata8520<SPI, LINE, D> {
    device: Device<SPI>,
    line: LINE,
    delay: D,
    status: DeviceStatus,
    tx: TxBuffer,
    rx: RxQueue,
}

impl<SPI, LINE, D> Ata8520<SPI, LINE, D> {
    /// Creates a new engine from an SPI interface, a completion line, and a
    /// delay provider.
    ///
    /// Board bring-up (pin configuration, power-on reset pulse) must have
    /// completed before any method is invoked.
    pub fn new(spi: SPI, line: LINE, delay: D) -> Self {
        Self {
            device: Device::new(spi),
            line,
            delay,
            status: DeviceStatus::default(),
            tx: TxBuffer::new(),
            rx: RxQueue::new(),
        }
    }

    /// Releases the underlying SPI interface, completion line, and delay
    /// provider.
    pub fn release(self) -> (SPI, LINE, D) {
        (self.device.release(), self.line, self.delay)
    }

    /// The most recently fetched status snapshot.
    ///
    /// The three registers are only ever refreshed together; this snapshot
    /// is as fresh as the last completed operation.
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    /// Outcome of the most recent radio operation.
    pub fn radio_status(&self) -> RadioStatus {
        self.status.radio
    }

    /// Opens a streaming packet. Returns false if one was already open; the
    /// accumulator is rewound either way.
    pub fn begin_packet(&mut self) -> bool {
        self.tx.open()
    }

    /// Appends one byte to the open packet. Returns the number of bytes
    /// written (0 when no packet is open or the accumulator is full).
    pub fn write(&mut self, byte: u8) -> usize {
        self.tx.push(byte)
    }

    /// Appends bytes to the open packet, truncating to the remaining
    /// capacity. Returns the number of bytes written.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        self.tx.push_slice(bytes)
    }

    /// Number of received bytes waiting in the queue.
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Pops the oldest received byte.
    ///
    /// # Errors
    /// * `Error::QueueEmpty` - the receive queue holds no bytes
    pub fn read(&mut self) -> Result<u8, Error> {
        self.rx.pop().ok_or(Error::QueueEmpty)
    }

    /// Returns the oldest received byte without removing it.
    ///
    /// # Errors
    /// * `Error::QueueEmpty` - the receive queue holds no bytes
    pub fn peek(&self) -> Result<u8, Error> {
        self.rx.peek().ok_or(Error::QueueEmpty)
    }
}

impl<SPI, LINE, D> Ata8520<SPI, LINE, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    LINE: CompletionLine,
    D: embedded_hal::delay::DelayNs,
{
    /// Checks that a functioning module is present.
    ///
    /// Returns `Ok(false)` when the firmware version reads back all-zero or
    /// all-ones, which is what a floating bus produces when the module is
    /// absent or unpowered.
    pub fn begin(&mut self) -> Result<bool, Error> {
        let version = self.device.execute_command(GetFirmwareVersion)?;
        Ok(version.is_present())
    }

    /// Refreshes the status snapshot with a single round trip.
    ///
    /// Issued at the start of every higher-level operation to clear stale
    /// completion state, and at the end of every wait to fetch the result.
    pub fn refresh_status(&mut self) -> Result<DeviceStatus, Error> {
        self.status = self.device.execute_command(GetStatus)?;
        Ok(self.status)
    }

    /// Runs one crystal calibration cycle.
    ///
    /// Waits up to 60 seconds for completion. On timeout the radio status is
    /// forced to [`RadioStatus::TIMEOUT`] without a bus read. Exactly one
    /// status mutation happens per call.
    pub fn calibrate_crystal(&mut self) -> Result<RadioStatus, Error> {
        self.device.execute_command(CalibrateCrystal)?;
        if self.line.wait_asserted(CALIBRATION_TIMEOUT)? {
            self.refresh_status()?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }
        Ok(self.status.radio)
    }

    /// Transmits a message, optionally opening a downlink window.
    ///
    /// Payloads longer than 12 bytes are truncated silently. A payload of
    /// exactly one bit-valued byte with no downlink window takes the
    /// [`send_bit`](Self::send_bit) shortcut. The returned status code is
    /// also the engine's externally visible [`radio_status`](Self::radio_status).
    ///
    /// # Errors
    /// * `Error::EmptyFrame` - `payload` is empty; the bus was not touched
    /// * `Error::Bus` / `Error::Response` - communication failed
    pub fn send(&mut self, payload: &[u8], expect_response: bool) -> Result<RadioStatus, Error> {
        if payload.is_empty() {
            return Err(Error::EmptyFrame);
        }
        if !expect_response && payload.len() == 1 && payload[0] < 2 {
            return self.send_bit(payload[0] != 0);
        }

        self.refresh_status()?;
        self.device.write_message(payload)?;

        // Hardware ordering requirement: fresh calibration before every
        // transmission. The calibration's own status outcome is not
        // inspected; the transmission reports its result regardless.
        self.delay.delay_ms(SETTLE_MS);
        self.calibrate_crystal()?;
        self.delay.delay_ms(SETTLE_MS);

        if expect_response {
            self.device.execute_command(TriggerSendReceive)?;
        } else {
            self.device.execute_command(TriggerSend)?;
        }

        let timeout = if expect_response {
            SEND_RECEIVE_TIMEOUT
        } else {
            SEND_TIMEOUT
        };
        if self.line.wait_asserted(timeout)? {
            self.refresh_status()?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }

        if expect_response && self.status.radio == RadioStatus::Ok {
            let frame = self.device.execute_command(ReadReceivedFrame)?;
            self.rx.fill(frame.bytes);
        }

        Ok(self.status.radio)
    }

    /// Transmits a single bit over the short command path.
    ///
    /// Same external contract as [`send`](Self::send), with a 7 second
    /// completion budget and no downlink window.
    pub fn send_bit(&mut self, value: bool) -> Result<RadioStatus, Error> {
        self.refresh_status()?;
        self.device.execute_command(SendBit { value })?;
        if self.line.wait_asserted(SEND_BIT_TIMEOUT)? {
            self.refresh_status()?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }
        Ok(self.status.radio)
    }

    /// Closes the open packet and transmits its contents.
    ///
    /// The accumulator is invalidated unconditionally, success or not; a
    /// packet may not be reused or extended after closing.
    pub fn end_packet(&mut self, expect_response: bool) -> Result<RadioStatus, Error> {
        let mut frame = [0u8; TX_BUFFER_CAPACITY];
        let len = self.tx.close(&mut frame);
        self.send(&frame[..len], expect_response)
    }

    /// Reads the module's firmware version.
    pub fn firmware_version(&mut self) -> Result<FirmwareVersion, Error> {
        self.device.execute_command(GetFirmwareVersion)
    }

    /// Reads the module's Sigfox device ID.
    pub fn device_id(&mut self) -> Result<DeviceId, Error> {
        self.device.execute_command(GetDeviceId)
    }

    /// Reads the module's porting authorization code.
    pub fn pac(&mut self) -> Result<Pac, Error> {
        self.device.execute_command(GetPac)
    }

    /// Soft-resets the module's internal state machine.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.device.execute_command(ResetModule)?;
        Ok(())
    }

    /// Sends the module into its low-power off mode.
    pub fn end(&mut self) -> Result<(), Error> {
        self.device.execute_command(SetOffMode)?;
        Ok(())
    }

    /// Enables or disables the module's factory test mode.
    pub fn test_mode(&mut self, enabled: bool) -> Result<(), Error> {
        self.device.execute_command(TestMode { enabled })?;
        Ok(())
    }

    /// Writes the region and link-direction configuration and commits it.
    ///
    /// Waits up to 3 seconds for the write to complete, then commits with an
    /// off-mode cycle. Returns the resulting status code;
    /// [`RadioStatus::TIMEOUT`] means the module never acknowledged.
    pub fn set_region(&mut self, config: RegionConfig) -> Result<RadioStatus, Error> {
        self.device.execute_command(ConfigureRegion { config })?;
        if self.line.wait_asserted(REGION_TIMEOUT)? {
            self.refresh_status()?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }
        self.device.execute_command(SetOffMode)?;
        self.delay.delay_ms(100);
        Ok(self.status.radio)
    }

    /// Measures supply voltage and die temperature.
    ///
    /// Triggers a calibration cycle (which latches the measurement), waits
    /// briefly for it, and reads the result back.
    pub fn measure_voltage_temperature(&mut self) -> Result<VoltageTemperature, Error> {
        self.device.execute_command(CalibrateCrystal)?;
        if self.line.wait_asserted(MEASURE_TIMEOUT)? {
            self.refresh_status()?;
        }
        self.device.execute_command(GetVoltageTemperature)
    }

    /// Reads the module's EEPROM configuration.
    pub fn read_config(&mut self) -> Result<ModuleConfig, Error> {
        self.device.execute_command(PrepareConfigRead)?;
        self.delay.delay_ms(SETTLE_MS);
        self.device.execute_command(ReadConfig)
    }
}

impl<SPI, LINE, D> Ata8520<SPI, LINE, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    LINE: CompletionLineAsync,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Asynchronously checks that a functioning module is present.
    ///
    /// This is the async version of [`begin`](Self::begin).
    pub async fn begin_async(&mut self) -> Result<bool, Error> {
        let version = self.device.execute_command_async(GetFirmwareVersion).await?;
        Ok(version.is_present())
    }

    /// Asynchronously refreshes the status snapshot.
    ///
    /// This is the async version of [`refresh_status`](Self::refresh_status).
    pub async fn refresh_status_async(&mut self) -> Result<DeviceStatus, Error> {
        self.status = self.device.execute_command_async(GetStatus).await?;
        Ok(self.status)
    }

    /// Asynchronously runs one crystal calibration cycle.
    ///
    /// This is the async version of [`calibrate_crystal`](Self::calibrate_crystal).
    pub async fn calibrate_crystal_async(&mut self) -> Result<RadioStatus, Error> {
        self.device.execute_command_async(CalibrateCrystal).await?;
        if self.line.wait_asserted(CALIBRATION_TIMEOUT).await? {
            self.refresh_status_async().await?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }
        Ok(self.status.radio)
    }

    /// Asynchronously transmits a message, optionally opening a downlink
    /// window.
    ///
    /// This is the async version of [`send`](Self::send).
    pub async fn send_async(
        &mut self,
        payload: &[u8],
        expect_response: bool,
    ) -> Result<RadioStatus, Error> {
        if payload.is_empty() {
            return Err(Error::EmptyFrame);
        }
        if !expect_response && payload.len() == 1 && payload[0] < 2 {
            return self.send_bit_async(payload[0] != 0).await;
        }

        self.refresh_status_async().await?;
        self.device.write_message_async(payload).await?;

        self.delay.delay_ms(SETTLE_MS).await;
        self.calibrate_crystal_async().await?;
        self.delay.delay_ms(SETTLE_MS).await;

        if expect_response {
            self.device.execute_command_async(TriggerSendReceive).await?;
        } else {
            self.device.execute_command_async(TriggerSend).await?;
        }

        let timeout = if expect_response {
            SEND_RECEIVE_TIMEOUT
        } else {
            SEND_TIMEOUT
        };
        if self.line.wait_asserted(timeout).await? {
            self.refresh_status_async().await?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }

        if expect_response && self.status.radio == RadioStatus::Ok {
            let frame = self.device.execute_command_async(ReadReceivedFrame).await?;
            self.rx.fill(frame.bytes);
        }

        Ok(self.status.radio)
    }

    /// Asynchronously transmits a single bit over the short command path.
    ///
    /// This is the async version of [`send_bit`](Self::send_bit).
    pub async fn send_bit_async(&mut self, value: bool) -> Result<RadioStatus, Error> {
        self.refresh_status_async().await?;
        self.device.execute_command_async(SendBit { value }).await?;
        if self.line.wait_asserted(SEND_BIT_TIMEOUT).await? {
            self.refresh_status_async().await?;
        } else {
            self.status.radio = RadioStatus::TIMEOUT;
        }
        Ok(self.status.radio)
    }

    /// Asynchronously closes the open packet and transmits its contents.
    ///
    /// This is the async version of [`end_packet`](Self::end_packet).
    pub async fn end_packet_async(&mut self, expect_response: bool) -> Result<RadioStatus, Error> {
        let mut frame = [0u8; TX_BUFFER_CAPACITY];
        let len = self.tx.close(&mut frame);
        self.send_async(&frame[..len], expect_response).await
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use super::*;

    /// Completion line double: one scripted outcome per wait, with the
    /// requested budgets recorded for inspection.
    struct ScriptedLine {
        script: Vec<bool>,
        waits: Vec<Duration>,
    }

    impl ScriptedLine {
        fn new(script: &[bool]) -> Self {
            Self {
                script: script.to_vec(),
                waits: Vec::new(),
            }
        }
    }

    impl CompletionLine for ScriptedLine {
        fn is_asserted(&mut self) -> Result<bool, Error> {
            Ok(false)
        }

        fn wait_asserted(&mut self, timeout: Duration) -> Result<bool, Error> {
            self.waits.push(timeout);
            Ok(self.script.remove(0))
        }
    }

    fn status_readout(bytes: [u8; 4]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x0A]),
            SpiTransaction::write_vec(vec![0x00]),
            SpiTransaction::read_vec(bytes.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn bare_command(opcode: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![opcode]),
            SpiTransaction::write_vec(vec![]),
            SpiTransaction::read_vec(vec![]),
            SpiTransaction::transaction_end(),
        ]
    }

    fn staged_message(payload: &[u8]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x07, payload.len() as u8]),
            SpiTransaction::write_vec(payload.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn engine(
        expectations: &[SpiTransaction<u8>],
        script: &[bool],
    ) -> Ata8520<SpiMock<u8>, ScriptedLine, NoopDelay> {
        Ata8520::new(SpiMock::new(expectations), ScriptedLine::new(script), NoopDelay)
    }

    fn finish(engine: Ata8520<SpiMock<u8>, ScriptedLine, NoopDelay>) -> ScriptedLine {
        let (mut spi, line, _) = engine.release();
        spi.done();
        line
    }

    #[test]
    fn empty_send_touches_no_bus() {
        let mut sigfox = engine(&[], &[]);

        assert_eq!(sigfox.send(&[], false), Err(Error::EmptyFrame));
        assert_eq!(sigfox.send(&[], true), Err(Error::EmptyFrame));

        finish(sigfox);
    }

    #[test]
    fn send_sequences_stage_calibrate_trigger() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"HELLO"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0x40, 0, 0]));
        expectations.extend(bare_command(0x0D));
        expectations.extend(status_readout([0, 0x20, 0, 0]));
        // Completion on both waits: calibration, then transmission.
        let mut sigfox = engine(&expectations, &[true, true]);

        assert_eq!(sigfox.send(b"HELLO", false), Ok(RadioStatus::Ok));
        assert_eq!(sigfox.available(), 0);

        let line = finish(sigfox);
        assert_eq!(
            line.waits,
            vec![Duration::from_secs(60), Duration::from_secs(10)]
        );
    }

    #[test]
    fn oversized_payload_stages_first_twelve_bytes() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"ABCDEFGHIJKL"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(bare_command(0x0D));
        expectations.extend(status_readout([0, 0x20, 0, 0]));
        let mut sigfox = engine(&expectations, &[true, true]);

        assert_eq!(
            sigfox.send(b"ABCDEFGHIJKLMNOPQRST", false),
            Ok(RadioStatus::Ok)
        );

        finish(sigfox);
    }

    #[test]
    fn send_timeout_forces_code_13_without_status_read() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"HI"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(bare_command(0x0D));
        // No trailing status readout: the timeout path writes the code
        // locally.
        let mut sigfox = engine(&expectations, &[true, false]);

        assert_eq!(sigfox.send(b"HI", false), Ok(RadioStatus::TIMEOUT));
        assert_eq!(sigfox.radio_status().code(), 13);

        finish(sigfox);
    }

    #[test]
    fn calibration_timeout_forces_code_13_without_status_read() {
        let mut sigfox = engine(&bare_command(0x14), &[false]);

        assert_eq!(sigfox.calibrate_crystal(), Ok(RadioStatus::TIMEOUT));
        assert_eq!(sigfox.status().radio, RadioStatus::TIMEOUT);

        finish(sigfox);
    }

    #[test]
    fn single_bit_payload_takes_send_bit_path() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        // The bit frame is opcode plus value, two bytes on the wire.
        expectations.extend(vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x0B]),
            SpiTransaction::write_vec(vec![0x01]),
            SpiTransaction::read_vec(vec![]),
            SpiTransaction::transaction_end(),
        ]);
        expectations.extend(status_readout([0, 0x20, 0, 0]));
        let mut sigfox = engine(&expectations, &[true]);

        assert_eq!(sigfox.send(&[1], false), Ok(RadioStatus::Ok));

        let line = finish(sigfox);
        assert_eq!(line.waits, vec![Duration::from_secs(7)]);
    }

    #[test]
    fn downlink_success_fills_receive_queue() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"AB"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(bare_command(0x0E));
        expectations.extend(status_readout([0, 0x20, 0, 0]));
        expectations.extend(vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x10]),
            SpiTransaction::write_vec(vec![8]),
            SpiTransaction::read_vec(vec![11, 12, 13, 14, 15, 16, 17, 18]),
            SpiTransaction::transaction_end(),
        ]);
        let mut sigfox = engine(&expectations, &[true, true]);

        assert_eq!(sigfox.send(b"AB", true), Ok(RadioStatus::Ok));
        assert_eq!(sigfox.available(), 8);
        assert_eq!(sigfox.read(), Ok(11));
        assert_eq!(sigfox.peek(), Ok(12));
        assert_eq!(sigfox.read(), Ok(12));
        assert_eq!(sigfox.available(), 6);

        let line = finish(sigfox);
        assert_eq!(
            line.waits,
            vec![Duration::from_secs(60), Duration::from_secs(60)]
        );
    }

    #[test]
    fn downlink_failure_leaves_queue_untouched() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"AB"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(bare_command(0x0E));
        // Module reports a manufacturer send error; no frame readout follows.
        expectations.extend(status_readout([0, 0, 5, 0]));
        let mut sigfox = engine(&expectations, &[true, true]);

        assert_eq!(
            sigfox.send(b"AB", true),
            Ok(RadioStatus::ManufacturerSendError)
        );
        assert_eq!(sigfox.available(), 0);
        assert_eq!(sigfox.read(), Err(Error::QueueEmpty));

        finish(sigfox);
    }

    #[test]
    fn begin_detects_missing_module() {
        for (version, present) in [
            ([0x00, 0x00], false),
            ([0xFF, 0xFF], false),
            ([0x01, 0x02], true),
        ] {
            let expectations = vec![
                SpiTransaction::transaction_start(),
                SpiTransaction::write_vec(vec![0x06]),
                SpiTransaction::write_vec(vec![0x00]),
                SpiTransaction::read_vec(version.to_vec()),
                SpiTransaction::transaction_end(),
            ];
            let mut sigfox = engine(&expectations, &[]);

            assert_eq!(sigfox.begin(), Ok(present));

            finish(sigfox);
        }
    }

    #[test]
    fn closing_an_empty_packet_fails_locally_and_invalidates() {
        let mut sigfox = engine(&[], &[]);

        assert!(sigfox.begin_packet());
        assert_eq!(sigfox.end_packet(false), Err(Error::EmptyFrame));
        // The accumulator was invalidated despite the failure.
        assert!(sigfox.begin_packet());

        finish(sigfox);
    }

    #[test]
    fn streamed_packet_is_forwarded_to_send() {
        let mut expectations = Vec::new();
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(staged_message(b"HI"));
        expectations.extend(bare_command(0x14));
        expectations.extend(status_readout([0, 0, 0, 0]));
        expectations.extend(bare_command(0x0D));
        expectations.extend(status_readout([0, 0x20, 0, 0]));
        let mut sigfox = engine(&expectations, &[true, true]);

        assert!(sigfox.begin_packet());
        assert_eq!(sigfox.write_bytes(b"HI"), 2);
        assert_eq!(sigfox.end_packet(false), Ok(RadioStatus::Ok));
        // Closed packets may not be extended.
        assert_eq!(sigfox.write(b'X'), 0);

        finish(sigfox);
    }

    #[test]
    fn region_write_commits_with_off_mode() {
        let mut expectations = Vec::new();
        expectations.extend(vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x11]),
            SpiTransaction::write_vec(vec![0x00, 0x01, 0x02, 0x3F]),
            SpiTransaction::read_vec(vec![]),
            SpiTransaction::transaction_end(),
        ]);
        expectations.extend(status_readout([0, 0x40, 0, 0]));
        expectations.extend(bare_command(0x05));
        let mut sigfox = engine(&expectations, &[true]);

        assert_eq!(
            sigfox.set_region(RegionConfig::EU | RegionConfig::BIDIRECTIONAL),
            Ok(RadioStatus::Ok)
        );

        let line = finish(sigfox);
        assert_eq!(line.waits, vec![Duration::from_secs(3)]);
    }
}
