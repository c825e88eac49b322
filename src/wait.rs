//! Completion-line wait strategies
//!
//! The coprocessor signals completion of a pending radio operation by pulling
//! its event line low. The line is a level, not an edge: a waiter samples it
//! at points in time and may not assume it saw the falling transition.
//!
//! Waits are expressed as wall-clock timeouts rather than iteration counts,
//! so the behavioral contract (maximum wait time) is independent of the
//! per-sample latency. Two interchangeable strategies are provided behind the
//! [`CompletionLine`] / [`CompletionLineAsync`] traits:
//!
//! - [`PollingLine`] samples the pin at a fixed [`POLL_INTERVAL`] cadence,
//!   blocking the calling thread between samples (or yielding to the
//!   executor, in its async form)
//! - An edge-triggered wakeup source can be supplied by implementing the
//!   traits directly; it must preserve the same observable semantics
//!
//! There is no cancellation: once a wait begins it runs until the line
//! asserts or the timeout budget is exhausted.

use core::time::Duration;

use embedded_hal::digital::InputPin;

use crate::Error;

/// Cadence at which [`PollingLine`] samples the event line.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A source of the coprocessor's completion signal.
pub trait CompletionLine {
    /// Samples the line. Returns true when a pending result is ready.
    fn is_asserted(&mut self) -> Result<bool, Error>;

    /// Blocks until the line asserts or `timeout` elapses.
    ///
    /// Returns true if the line asserted within the budget.
    fn wait_asserted(&mut self, timeout: Duration) -> Result<bool, Error>;
}

/// Async counterpart of [`CompletionLine`].
pub trait CompletionLineAsync {
    /// Samples the line. Returns true when a pending result is ready.
    fn is_asserted(&mut self) -> Result<bool, Error>;

    /// Waits until the line asserts or `timeout` elapses, yielding to the
    /// executor in between.
    async fn wait_asserted(&mut self, timeout: Duration) -> Result<bool, Error>;
}

/// Level-sampling wait strategy.
///
/// Samples the event line once per [`POLL_INTERVAL`], sleeping on the delay
/// provider between samples. A 60 second budget therefore costs exactly 6000
/// samples. The sample happens before the sleep, so an already-asserted line
/// is detected without any delay.
pub struct PollingLine<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> PollingLine<P, D> {
    /// Creates a polling strategy from an event pin and a delay provider.
    ///
    /// The pin must be configured as an input with a pull-up before this
    /// driver sees it; the line idles high and asserts low.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Releases the wrapped pin and delay provider.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D> CompletionLine for PollingLine<P, D>
where
    P: InputPin,
    D: embedded_hal::delay::DelayNs,
{
    fn is_asserted(&mut self) -> Result<bool, Error> {
        self.pin.is_low().map_err(|_| Error::Bus)
    }

    fn wait_asserted(&mut self, timeout: Duration) -> Result<bool, Error> {
        let samples = (timeout.as_millis() / POLL_INTERVAL.as_millis()) as u32;
        for _ in 0..samples {
            if self.is_asserted()? {
                return Ok(true);
            }
            self.delay.delay_ms(POLL_INTERVAL.as_millis() as u32);
        }
        Ok(false)
    }
}

impl<P, D> CompletionLineAsync for PollingLine<P, D>
where
    P: InputPin,
    D: embedded_hal_async::delay::DelayNs,
{
    fn is_asserted(&mut self) -> Result<bool, Error> {
        self.pin.is_low().map_err(|_| Error::Bus)
    }

    async fn wait_asserted(&mut self, timeout: Duration) -> Result<bool, Error> {
        let samples = (timeout.as_millis() / POLL_INTERVAL.as_millis()) as u32;
        for _ in 0..samples {
            if CompletionLineAsync::is_asserted(self)? {
                return Ok(true);
            }
            self.delay.delay_ms(POLL_INTERVAL.as_millis() as u32).await;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    use super::*;

    #[test]
    fn detects_assertion_on_third_sample() {
        let expectations = [
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::Low),
        ];
        let mut line = PollingLine::new(PinMock::new(&expectations), NoopDelay);

        assert!(CompletionLine::wait_asserted(&mut line, Duration::from_secs(10)).unwrap());

        let (mut pin, _) = line.release();
        pin.done();
    }

    #[test]
    fn calibration_budget_is_exactly_6000_samples() {
        let expectations = vec![PinTransaction::get(PinState::High); 6000];
        let mut line = PollingLine::new(PinMock::new(&expectations), NoopDelay);

        assert!(!CompletionLine::wait_asserted(&mut line, Duration::from_secs(60)).unwrap());

        // done() panics if any of the 6000 expectations went unconsumed.
        let (mut pin, _) = line.release();
        pin.done();
    }

    #[test]
    fn already_asserted_line_returns_immediately() {
        let expectations = [PinTransaction::get(PinState::Low)];
        let mut line = PollingLine::new(PinMock::new(&expectations), NoopDelay);

        assert!(CompletionLine::wait_asserted(&mut line, Duration::from_secs(60)).unwrap());

        let (mut pin, _) = line.release();
        pin.done();
    }

    #[test]
    fn level_sample_is_active_low() {
        let expectations = [
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ];
        let mut line = PollingLine::new(PinMock::new(&expectations), NoopDelay);

        assert!(CompletionLine::is_asserted(&mut line).unwrap());
        assert!(!CompletionLine::is_asserted(&mut line).unwrap());

        let (mut pin, _) = line.release();
        pin.done();
    }
}
