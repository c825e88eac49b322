//! Transmit accumulator and receive queue.
//!
//! Both buffers are plain value state owned by the engine; nothing here
//! touches the bus. The accumulator backs the streaming packet API
//! (open/append/close), the queue holds the single downlink frame fetched
//! after a successful receive-mode transmission.

use crate::commands::radio::RECEIVED_FRAME_LEN;

/// Capacity of the transmit accumulator.
///
/// One byte larger than the radio's 12-byte message limit; staging truncates
/// to the limit, the extra slot keeps the streaming API tolerant of one
/// overlong append.
pub const TX_BUFFER_CAPACITY: usize = 13;

/// Append-only accumulator for the streaming packet API.
///
/// `index == None` means no packet is open; `Some(n)` means `n` bytes have
/// been accumulated and the buffer is accepting writes.
#[derive(Debug)]
pub(crate) struct TxBuffer {
    data: [u8; TX_BUFFER_CAPACITY],
    index: Option<usize>,
}

impl TxBuffer {
    pub(crate) fn new() -> Self {
        Self {
            data: [0; TX_BUFFER_CAPACITY],
            index: None,
        }
    }

    /// Opens a packet. Returns false if one was already open.
    ///
    /// The write index is rewound to 0 in either case; a caller that ignores
    /// the return value silently restarts the packet.
    pub(crate) fn open(&mut self) -> bool {
        let was_closed = self.index.is_none();
        self.index = Some(0);
        was_closed
    }

    /// Appends one byte. Returns the number of bytes written: 0 when no
    /// packet is open or the buffer is full.
    pub(crate) fn push(&mut self, byte: u8) -> usize {
        match self.index {
            Some(index) if index < TX_BUFFER_CAPACITY => {
                self.data[index] = byte;
                self.index = Some(index + 1);
                1
            }
            _ => 0,
        }
    }

    /// Appends a slice, truncating to the remaining capacity.
    ///
    /// Returns the number of bytes actually written: 0 when no packet is
    /// open, `capacity - index` when the slice would overflow. Truncation is
    /// not a failure.
    pub(crate) fn push_slice(&mut self, bytes: &[u8]) -> usize {
        let Some(index) = self.index else {
            return 0;
        };
        let writable = (TX_BUFFER_CAPACITY - index).min(bytes.len());
        self.data[index..index + writable].copy_from_slice(&bytes[..writable]);
        self.index = Some(index + writable);
        writable
    }

    /// Closes the packet, copying the accumulated bytes into `out` and
    /// invalidating the buffer. Returns the accumulated length; 0 when no
    /// packet was open.
    ///
    /// A packet may not be reused or extended after closing.
    pub(crate) fn close(&mut self, out: &mut [u8; TX_BUFFER_CAPACITY]) -> usize {
        let len = self.index.take().unwrap_or(0);
        out[..len].copy_from_slice(&self.data[..len]);
        len
    }
}

/// Fixed-capacity FIFO for one downlink frame.
#[derive(Debug)]
pub(crate) struct RxQueue {
    data: [u8; RECEIVED_FRAME_LEN],
    len: usize,
}

impl RxQueue {
    pub(crate) fn new() -> Self {
        Self {
            data: [0; RECEIVED_FRAME_LEN],
            len: 0,
        }
    }

    /// Replaces the queue contents with a full received frame.
    pub(crate) fn fill(&mut self, frame: [u8; RECEIVED_FRAME_LEN]) {
        self.data = frame;
        self.len = RECEIVED_FRAME_LEN;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Pops the oldest byte, shifting the remainder down.
    pub(crate) fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let byte = self.data[0];
        self.data.copy_within(1..self.len, 0);
        self.len -= 1;
        Some(byte)
    }

    /// Returns the oldest byte without removing it.
    pub(crate) fn peek(&self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        Some(self.data[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_open_reports_failure_but_rewinds() {
        let mut buffer = TxBuffer::new();
        assert!(buffer.open());
        assert_eq!(buffer.push_slice(b"AB"), 2);

        // Second open fails but still rewinds the index.
        assert!(!buffer.open());
        assert_eq!(buffer.push(b'C'), 1);

        let mut out = [0u8; TX_BUFFER_CAPACITY];
        assert_eq!(buffer.close(&mut out), 1);
        assert_eq!(out[0], b'C');
        // The untouched remainder of the old packet is still in place.
    }

    #[test]
    fn appends_without_open_packet_write_nothing() {
        let mut buffer = TxBuffer::new();
        assert_eq!(buffer.push(0xAA), 0);
        assert_eq!(buffer.push_slice(b"HELLO"), 0);

        let mut out = [0u8; TX_BUFFER_CAPACITY];
        assert_eq!(buffer.close(&mut out), 0);
    }

    #[test]
    fn overlong_append_truncates_to_remaining_capacity() {
        let mut buffer = TxBuffer::new();
        buffer.open();
        assert_eq!(buffer.push_slice(&[0x55; 5]), 5);
        // 8 slots remain; a 20-byte append writes exactly 8.
        assert_eq!(buffer.push_slice(&[0xAA; 20]), 8);
        assert_eq!(buffer.push(0x01), 0);

        let mut out = [0u8; TX_BUFFER_CAPACITY];
        assert_eq!(buffer.close(&mut out), TX_BUFFER_CAPACITY);
        assert_eq!(&out[..5], &[0x55; 5]);
        assert_eq!(&out[5..], &[0xAA; 8]);
    }

    #[test]
    fn close_invalidates_even_an_empty_packet() {
        let mut buffer = TxBuffer::new();
        buffer.open();

        let mut out = [0u8; TX_BUFFER_CAPACITY];
        assert_eq!(buffer.close(&mut out), 0);

        // Closed means closed: a new packet can be opened cleanly.
        assert!(buffer.open());
    }

    #[test]
    fn queue_drains_in_fifo_order() {
        let mut queue = RxQueue::new();
        queue.fill([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(queue.len(), 8);

        assert_eq!(queue.peek(), Some(1));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.peek(), Some(2));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.len(), 6);

        for expected in 3..=8 {
            assert_eq!(queue.pop(), Some(expected));
        }
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.peek(), None);
    }
}
