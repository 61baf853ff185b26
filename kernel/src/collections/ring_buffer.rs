// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Implementation of a fixed-capacity byte ring buffer.
//!
//! Occupancy is tracked with an explicit counter rather than by sacrificing
//! one slot, so a ring allocated with `n` bytes holds exactly `n` bytes.
//! Bytes are written at `head` and read at `tail`.

use alloc::boxed::Box;

pub struct RingBuffer {
    ring: Box<[u8]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl RingBuffer {
    pub fn new(ring: Box<[u8]>) -> RingBuffer {
        RingBuffer {
            ring,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    /// Returns how many bytes are in the ring.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn has_elements(&self) -> bool {
        self.count != 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.ring.len()
    }

    /// Index the next byte will be written to.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index the next byte will be read from.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Append `byte` unless the ring is full. Returns whether it was stored.
    pub fn enqueue(&mut self, byte: u8) -> bool {
        if self.count < self.ring.len() {
            self.ring[self.head] = byte;
            self.head = (self.head + 1) % self.ring.len();
            self.count += 1;
            true
        } else {
            false
        }
    }

    /// Remove the oldest byte.
    pub fn dequeue(&mut self) -> Option<u8> {
        if self.has_elements() {
            let byte = self.ring[self.tail];
            self.tail = (self.tail + 1) % self.ring.len();
            self.count -= 1;
            Some(byte)
        } else {
            None
        }
    }

    /// Remove exactly `out.len()` bytes, or nothing if fewer are buffered.
    pub fn dequeue_exact(&mut self, out: &mut [u8]) -> bool {
        if self.count < out.len() {
            return false;
        }
        for slot in out.iter_mut() {
            *slot = self.ring[self.tail];
            self.tail = (self.tail + 1) % self.ring.len();
        }
        self.count -= out.len();
        true
    }

    /// Discard all buffered bytes and rewind both indices.
    pub fn empty(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Give back the backing storage.
    pub fn into_inner(self) -> Box<[u8]> {
        self.ring
    }
}

#[cfg(test)]
mod test {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::RingBuffer;

    fn ring(len: usize) -> RingBuffer {
        RingBuffer::new(vec![0; len].into_boxed_slice())
    }

    #[test]
    fn test_enqueue_dequeue() {
        const LEN: usize = 10;
        let mut buf = ring(LEN);

        for i in 0..2 * LEN as u8 {
            assert!(buf.enqueue(i));
            assert_eq!(buf.len(), 1);
            assert!(buf.has_elements());

            assert_eq!(buf.dequeue(), Some(i));
            assert_eq!(buf.len(), 0);
            assert!(!buf.has_elements());
        }
    }

    #[test]
    fn test_full_ring_uses_every_slot() {
        const LEN: usize = 4;
        let mut buf = ring(LEN);

        for i in 0..LEN as u8 {
            assert!(!buf.is_full());
            assert!(buf.enqueue(i));
        }
        assert!(buf.is_full());
        assert_eq!(buf.len(), LEN);
        assert!(!buf.enqueue(99));
        assert_eq!(buf.head(), 0);

        for i in 0..LEN as u8 {
            assert_eq!(buf.dequeue(), Some(i));
        }
        assert_eq!(buf.dequeue(), None);
    }

    #[test]
    fn test_indices_wrap() {
        let mut buf = ring(3);
        for i in 0..7u8 {
            assert!(buf.enqueue(i));
            assert_eq!(buf.dequeue(), Some(i));
            assert!(buf.head() < 3);
            assert!(buf.tail() < 3);
            assert_eq!(buf.head(), buf.tail());
        }
        assert_eq!(buf.head(), 7 % 3);
    }

    #[test]
    fn test_dequeue_exact_is_all_or_nothing() {
        let mut buf = ring(5);
        // Start the contents mid-ring so the read wraps.
        for _ in 0..3 {
            assert!(buf.enqueue(0));
            assert_eq!(buf.dequeue(), Some(0));
        }
        for b in b"abcd" {
            assert!(buf.enqueue(*b));
        }

        let mut out = [0; 5];
        assert!(!buf.dequeue_exact(&mut out));
        assert_eq!(buf.len(), 4);
        assert_eq!((buf.head(), buf.tail()), (2, 3));

        assert!(buf.dequeue_exact(&mut out[..3]));
        assert_eq!(&out[..3], b"abc");
        assert_eq!(buf.dequeue(), Some(b'd'));
    }

    #[test]
    fn test_empty_rewinds() {
        let mut buf = ring(4);
        for b in b"xyz" {
            assert!(buf.enqueue(*b));
        }
        assert_eq!(buf.dequeue(), Some(b'x'));
        buf.empty();
        assert_eq!((buf.head(), buf.tail(), buf.len()), (0, 0, 0));
        assert_eq!(buf.dequeue(), None);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut buf = RingBuffer::new(Box::default());
        assert!(buf.is_full());
        assert!(!buf.enqueue(1));
        assert_eq!(buf.dequeue(), None);
        assert!(buf.dequeue_exact(&mut []));
    }
}
