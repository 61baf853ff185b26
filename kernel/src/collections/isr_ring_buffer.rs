// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Byte ring shared between an interrupt handler and the foreground task.
//!
//! The interrupt handler is the only producer ([`IsrRingBuffer::enqueue`]),
//! the foreground task the only consumer. Every access to the ring runs
//! inside `critical_section::with`, so the occupancy counter and both
//! indices are always updated together, whether the target is a single
//! core that masks interrupts or a host where the critical section is a
//! lock.
//!
//! Backing storage is attached and detached at run time, which lets a
//! driver pick the capacity when the port is opened.

use alloc::boxed::Box;
use core::cell::RefCell;

use critical_section::Mutex;

use crate::collections::ring_buffer::RingBuffer;

struct Receiver {
    ring: Option<RingBuffer>,
    /// Saturates rather than wrapping back to zero.
    overflows: u32,
}

pub struct IsrRingBuffer {
    state: Mutex<RefCell<Receiver>>,
}

impl IsrRingBuffer {
    pub const fn new() -> IsrRingBuffer {
        IsrRingBuffer {
            state: Mutex::new(RefCell::new(Receiver {
                ring: None,
                overflows: 0,
            })),
        }
    }

    /// Install `storage` as the ring, empty, and clear the overflow counter.
    ///
    /// Returns the storage that was attached before, if any.
    pub fn attach(&self, storage: Box<[u8]>) -> Option<Box<[u8]>> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.overflows = 0;
            state
                .ring
                .replace(RingBuffer::new(storage))
                .map(RingBuffer::into_inner)
        })
    }

    /// Remove the storage and clear the overflow counter.
    pub fn detach(&self) -> Option<Box<[u8]>> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.overflows = 0;
            state.ring.take().map(RingBuffer::into_inner)
        })
    }

    /// Run `closure` on the ring, if storage is attached, with interrupts
    /// masked.
    pub fn map<F, R>(&self, closure: F) -> Option<R>
    where
        F: FnOnce(&mut RingBuffer) -> R,
    {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).ring.as_mut().map(closure))
    }

    /// Producer side. Stores `byte`, or drops it and counts an overflow if
    /// the ring is full. Returns whether the byte was stored.
    ///
    /// Does nothing when no storage is attached.
    pub fn enqueue(&self, byte: u8) -> bool {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let Receiver { ring, overflows } = &mut *state;
            match ring {
                Some(ring) => {
                    let stored = ring.enqueue(byte);
                    if !stored {
                        *overflows = overflows.saturating_add(1);
                    }
                    stored
                }
                None => false,
            }
        })
    }

    /// Consumer side. Removes the oldest byte.
    pub fn dequeue(&self) -> Option<u8> {
        self.map(RingBuffer::dequeue).flatten()
    }

    /// Consumer side. Fills `out` completely or leaves the ring untouched.
    pub fn dequeue_exact(&self, out: &mut [u8]) -> bool {
        self.map(|ring| ring.dequeue_exact(out)).unwrap_or(false)
    }

    /// Discard buffered bytes. The overflow counter is kept.
    pub fn empty(&self) {
        self.map(RingBuffer::empty);
    }

    pub fn len(&self) -> usize {
        self.map(|ring| ring.len()).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.map(|ring| ring.capacity()).unwrap_or(0)
    }

    /// Bytes dropped because the ring was full since storage was attached.
    pub fn overflows(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).overflows)
    }
}

#[cfg(test)]
mod test {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::IsrRingBuffer;

    fn storage(len: usize) -> alloc::boxed::Box<[u8]> {
        vec![0; len].into_boxed_slice()
    }

    #[test]
    fn detached_ring_is_inert() {
        let ring = IsrRingBuffer::new();
        assert!(!ring.enqueue(1));
        assert_eq!(ring.dequeue(), None);
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 0);
        assert_eq!(ring.overflows(), 0);
        assert!(ring.detach().is_none());
    }

    #[test]
    fn round_trip_in_order() {
        let ring = IsrRingBuffer::new();
        assert!(ring.attach(storage(8)).is_none());

        for b in b"serial" {
            assert!(ring.enqueue(*b));
        }
        let drained: Vec<u8> = core::iter::from_fn(|| ring.dequeue()).collect();
        assert_eq!(drained, b"serial");
    }

    #[test]
    fn overflow_keeps_earliest_bytes() {
        const CAPACITY: usize = 4;
        const EXTRA: usize = 3;
        let ring = IsrRingBuffer::new();
        ring.attach(storage(CAPACITY));

        for i in 0..(CAPACITY + EXTRA) as u8 {
            ring.enqueue(i);
        }
        assert_eq!(ring.len(), CAPACITY);
        assert_eq!(ring.overflows(), EXTRA as u32);
        for i in 0..CAPACITY as u8 {
            assert_eq!(ring.dequeue(), Some(i));
        }
        assert_eq!(ring.dequeue(), None);
    }

    #[test]
    fn empty_keeps_overflow_count() {
        let ring = IsrRingBuffer::new();
        ring.attach(storage(1));
        ring.enqueue(1);
        ring.enqueue(2);
        ring.empty();
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.overflows(), 1);
        assert_eq!(ring.map(|r| (r.head(), r.tail())), Some((0, 0)));
    }

    #[test]
    fn reattach_returns_old_storage_and_resets() {
        let ring = IsrRingBuffer::new();
        ring.attach(storage(2));
        ring.enqueue(1);
        ring.enqueue(2);
        ring.enqueue(3);

        let old = ring.attach(storage(5)).unwrap();
        assert_eq!(old.len(), 2);
        assert_eq!(ring.capacity(), 5);
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.overflows(), 0);

        assert_eq!(ring.detach().map(|s| s.len()), Some(5));
        assert_eq!(ring.capacity(), 0);
    }

    #[test]
    fn overflow_count_saturates() {
        let ring = IsrRingBuffer::new();
        ring.attach(storage(0));
        critical_section::with(|cs| ring.state.borrow_ref_mut(cs).overflows = u32::MAX - 1);

        ring.enqueue(1);
        assert_eq!(ring.overflows(), u32::MAX);
        ring.enqueue(2);
        assert_eq!(ring.overflows(), u32::MAX);
    }

    #[test]
    fn producer_thread_races_consumer() {
        const CAPACITY: usize = 7;
        const BYTES: usize = 200_000;
        let ring = IsrRingBuffer::new();
        ring.attach(storage(CAPACITY));

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..BYTES {
                    // Only this thread adds bytes, so room seen here stays.
                    while ring.len() == CAPACITY {
                        std::hint::spin_loop();
                    }
                    assert!(ring.enqueue((i % 251) as u8));
                }
            });

            let mut next = 0;
            while next < BYTES {
                if let Some(byte) = ring.dequeue() {
                    assert_eq!(byte, (next % 251) as u8);
                    next += 1;
                }
                let (len, head, tail) = ring.map(|r| (r.len(), r.head(), r.tail())).unwrap();
                assert!(len <= CAPACITY);
                assert!(head < CAPACITY && tail < CAPACITY);
            }
        });

        assert_eq!(ring.len(), 0);
        assert_eq!(ring.overflows(), 0);
    }
}
