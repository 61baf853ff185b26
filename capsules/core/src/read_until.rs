// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Resumable delimiter scan over the receive buffer of a
//! [`BufferedUart`](crate::buffered_uart::BufferedUart).
//!
//! A [`ReadUntil`] owns the caller's destination buffer together with the
//! scan cursor. Each call to
//! [`BufferedUart::get_bytes_until`](crate::buffered_uart::BufferedUart::get_bytes_until)
//! moves at most one byte from the receive buffer into the destination, so a
//! line can be assembled across many polls without blocking:
//!
//! ```rust,ignore
//! let mut line = [0u8; 32];
//! let mut scan = ReadUntil::new(&mut line, b'\n');
//! loop {
//!     match uart.get_bytes_until(&mut scan) {
//!         Ok(end) => {
//!             handle(scan.data(end));
//!         }
//!         Err(ErrorCode::NOTAVAIL) => { /* do other work */ }
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```
//!
//! The delimiter itself is consumed but never stored. If the driver is
//! reinstalled while a scan is in progress, the next poll starts over at the
//! beginning of the destination buffer.

use kernel::collections::isr_ring_buffer::IsrRingBuffer;
use kernel::ErrorCode;

/// How a completed scan ended. Both variants carry the number of bytes
/// written to the destination buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Terminated {
    /// The delimiter was received. It is not part of the stored bytes.
    Delimiter(usize),
    /// The destination buffer filled up before a delimiter arrived.
    BufferFull(usize),
}

impl Terminated {
    pub fn len(self) -> usize {
        match self {
            Terminated::Delimiter(len) | Terminated::BufferFull(len) => len,
        }
    }

    pub fn found_delimiter(self) -> bool {
        matches!(self, Terminated::Delimiter(_))
    }
}

pub struct ReadUntil<'b> {
    buffer: &'b mut [u8],
    delimiter: u8,
    offset: usize,
    /// Install epoch of the driver the cursor belongs to.
    epoch: usize,
}

impl<'b> ReadUntil<'b> {
    pub fn new(buffer: &'b mut [u8], delimiter: u8) -> ReadUntil<'b> {
        ReadUntil {
            buffer,
            delimiter,
            offset: 0,
            epoch: 0,
        }
    }

    /// Bytes collected so far by a scan that has not finished yet.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[..self.offset]
    }

    /// The bytes stored by the scan that ended with `end`.
    ///
    /// Valid until the next poll overwrites the destination buffer.
    pub fn data(&self, end: Terminated) -> &[u8] {
        &self.buffer[..end.len().min(self.buffer.len())]
    }

    /// Abandon the scan in progress. The destination buffer is left as is.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Advance the scan by at most one byte taken from `rx`.
    ///
    /// Emptiness is checked before fullness: a scan whose buffer is already
    /// full only reports `BufferFull` once another byte is waiting, and that
    /// byte stays in `rx`.
    pub(crate) fn step(&mut self, epoch: usize, rx: &IsrRingBuffer) -> Result<Terminated, ErrorCode> {
        if self.epoch != epoch {
            self.epoch = epoch;
            self.offset = 0;
        }

        if rx.len() == 0 {
            return Err(ErrorCode::NOTAVAIL);
        }

        if self.offset == self.buffer.len() {
            return Ok(self.finish(Terminated::BufferFull));
        }

        // The caller is the only consumer, so a non-empty ring stays
        // non-empty until this dequeue.
        let byte = rx.dequeue().ok_or(ErrorCode::NOTAVAIL)?;
        if byte == self.delimiter {
            Ok(self.finish(Terminated::Delimiter))
        } else {
            self.buffer[self.offset] = byte;
            self.offset += 1;
            Err(ErrorCode::NOTAVAIL)
        }
    }

    fn finish(&mut self, end: fn(usize) -> Terminated) -> Terminated {
        let len = self.offset;
        self.offset = 0;
        end(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec;

    fn rx_with(capacity: usize, bytes: &[u8]) -> IsrRingBuffer {
        let rx = IsrRingBuffer::new();
        rx.attach(vec![0u8; capacity].into_boxed_slice());
        for byte in bytes {
            rx.enqueue(*byte);
        }
        rx
    }

    fn poll_all(scan: &mut ReadUntil<'_>, rx: &IsrRingBuffer) -> Result<Terminated, ErrorCode> {
        loop {
            match scan.step(1, rx) {
                Err(ErrorCode::NOTAVAIL) if rx.len() > 0 => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn delimiter_is_consumed_not_stored() {
        let rx = rx_with(8, b"ok\nrest");
        let mut line = [0u8; 8];
        let mut scan = ReadUntil::new(&mut line, b'\n');

        let end = poll_all(&mut scan, &rx).unwrap();
        assert_eq!(end, Terminated::Delimiter(2));
        assert!(end.found_delimiter());
        assert_eq!(scan.data(end), b"ok");
        assert_eq!(rx.len(), 4);
    }

    #[test]
    fn scan_resumes_across_polls() {
        let rx = rx_with(8, b"ab");
        let mut line = [0u8; 8];
        let mut scan = ReadUntil::new(&mut line, b'\n');

        assert_eq!(poll_all(&mut scan, &rx), Err(ErrorCode::NOTAVAIL));
        assert_eq!(scan.pending(), b"ab");

        rx.enqueue(b'c');
        rx.enqueue(b'\n');
        let end = poll_all(&mut scan, &rx).unwrap();
        assert_eq!(end, Terminated::Delimiter(3));
        assert_eq!(scan.data(end), b"abc");
        assert!(scan.pending().is_empty());
    }

    #[test]
    fn full_buffer_waits_for_another_byte() {
        let rx = rx_with(8, b"xyz");
        let mut line = [0u8; 3];
        let mut scan = ReadUntil::new(&mut line, b'\n');

        assert_eq!(poll_all(&mut scan, &rx), Err(ErrorCode::NOTAVAIL));
        assert_eq!(scan.pending(), b"xyz");

        rx.enqueue(b'w');
        assert_eq!(scan.step(1, &rx), Ok(Terminated::BufferFull(3)));
        // The byte that revealed the full buffer is still waiting.
        assert_eq!(rx.dequeue(), Some(b'w'));
    }

    #[test]
    fn new_epoch_restarts_scan() {
        let rx = rx_with(8, b"stale");
        let mut line = [0u8; 8];
        let mut scan = ReadUntil::new(&mut line, b'\n');
        assert_eq!(poll_all(&mut scan, &rx), Err(ErrorCode::NOTAVAIL));
        assert_eq!(scan.pending().len(), 5);

        rx.enqueue(b'n');
        rx.enqueue(b'\n');
        assert_eq!(scan.step(2, &rx), Err(ErrorCode::NOTAVAIL));
        assert_eq!(scan.pending(), b"n");
        assert_eq!(scan.step(2, &rx), Ok(Terminated::Delimiter(1)));
    }

    #[test]
    fn empty_line() {
        let rx = rx_with(4, b"\n");
        let mut line = [0u8; 4];
        let mut scan = ReadUntil::new(&mut line, b'\n');
        assert_eq!(scan.step(1, &rx), Ok(Terminated::Delimiter(0)));
        assert_eq!(scan.data(Terminated::Delimiter(0)), b"");
    }

    #[test]
    fn zero_length_destination() {
        let rx = rx_with(4, b"q");
        let mut line = [0u8; 0];
        let mut scan = ReadUntil::new(&mut line, b'\n');
        assert_eq!(scan.step(1, &rx), Ok(Terminated::BufferFull(0)));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn reset_abandons_partial_line() {
        let rx = rx_with(8, b"junk");
        let mut line = [0u8; 8];
        let mut scan = ReadUntil::new(&mut line, b'\n');
        assert_eq!(poll_all(&mut scan, &rx), Err(ErrorCode::NOTAVAIL));
        assert_eq!(scan.pending(), b"junk");

        scan.reset();
        assert!(scan.pending().is_empty());

        rx.enqueue(b'y');
        rx.enqueue(b'\n');
        let end = poll_all(&mut scan, &rx).unwrap();
        assert_eq!(scan.data(end), b"y");
    }
}
