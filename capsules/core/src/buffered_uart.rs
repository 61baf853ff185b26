// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interrupt-buffered UART driver.
//!
//! `BufferedUart` sits on top of a chip's [`hil::uart::Uart`]. Bytes that the
//! receive interrupt delivers are queued in a ring buffer allocated at
//! install time, and the foreground drains them with non-blocking reads.
//! Transmission is synchronous.
//!
//! When the ring is full, newly received bytes are dropped and counted; the
//! bytes already buffered are never overwritten.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! # use capsules_core::buffered_uart::{BufferedUart, Config};
//! let usart = static_init!(Usart<'static>, Usart::new(USART0_BASE, CLOCK));
//! let uart = static_init!(
//!     BufferedUart<'static, Usart<'static>>,
//!     BufferedUart::new(usart)
//! );
//! usart.set_receive_client(uart);
//!
//! uart.install(Config::default().baud_rate(115200))?;
//! uart.println(b"ready")?;
//! ```
//!
//! The receive interrupt handler of the chip must end up calling
//! [`ReceiveClient::received_byte`](hil::uart::ReceiveClient::received_byte)
//! on the driver.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kernel::collections::isr_ring_buffer::IsrRingBuffer;
use kernel::debug;
use kernel::hil;
use kernel::hil::uart::{Parameters, Parity, StopBits, Width};
use kernel::ErrorCode;

use crate::read_until::{ReadUntil, Terminated};

/// Largest receive buffer `install` accepts, in bytes.
pub const MAX_RX_CAPACITY: usize = 200;

/// Line settings and receive buffer size for [`BufferedUart::install`].
///
/// The frame is always 8 data bits without flow control.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub rx_capacity: usize,
}

impl Default for Config {
    /// 9600 baud, 8N1, 64 byte receive buffer.
    fn default() -> Config {
        Config {
            baud_rate: 9600,
            parity: Parity::None,
            stop_bits: StopBits::One,
            rx_capacity: 64,
        }
    }
}

impl Config {
    /// Build a configuration from the compact line encoding: parity as
    /// `b'N'`, `b'E'` or `b'O'` and the stop bit count as a number.
    ///
    /// An unknown parity is `INVAL`. A stop bit count other than 1 or 2
    /// selects one stop bit.
    pub fn from_encoding(
        baud_rate: u32,
        parity: u8,
        stop_bits: u8,
        rx_capacity: usize,
    ) -> Result<Config, ErrorCode> {
        Ok(Config {
            baud_rate,
            parity: Parity::try_from(parity)?,
            stop_bits: StopBits::from_count(stop_bits),
            rx_capacity,
        })
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Config {
        self.baud_rate = baud_rate;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Config {
        self.parity = parity;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Config {
        self.stop_bits = stop_bits;
        self
    }

    pub fn rx_capacity(mut self, rx_capacity: usize) -> Config {
        self.rx_capacity = rx_capacity;
        self
    }

    fn parameters(&self) -> Parameters {
        Parameters {
            baud_rate: self.baud_rate,
            width: Width::Eight,
            parity: self.parity,
            stop_bits: self.stop_bits,
            hw_flow_control: false,
        }
    }
}

pub struct BufferedUart<'a, U: hil::uart::Uart<'a>> {
    uart: &'a U,
    installed: AtomicBool,
    /// Bumped on every successful install so that scans started against an
    /// earlier installation restart.
    epoch: AtomicUsize,
    rx: IsrRingBuffer,
}

impl<'a, U: hil::uart::Uart<'a>> BufferedUart<'a, U> {
    pub const fn new(uart: &'a U) -> BufferedUart<'a, U> {
        BufferedUart {
            uart,
            installed: AtomicBool::new(false),
            epoch: AtomicUsize::new(0),
            rx: IsrRingBuffer::new(),
        }
    }

    /// Allocate the receive buffer, program the line settings and enable
    /// the receive interrupt.
    ///
    /// Installing an installed driver first uninstalls it, so the previous
    /// buffer is released before the new one is allocated.
    ///
    /// Errors:
    /// - `INVAL` if `rx_capacity` exceeds [`MAX_RX_CAPACITY`] or the UART
    ///   rejects the line settings.
    /// - `NOMEM` if the receive buffer cannot be allocated.
    ///
    /// On error the driver is left uninstalled and holds no buffer.
    pub fn install(&self, config: Config) -> Result<(), ErrorCode> {
        self.uninstall()?;

        if config.rx_capacity > MAX_RX_CAPACITY {
            debug!(
                "uart: rx capacity {} exceeds {}",
                config.rx_capacity, MAX_RX_CAPACITY
            );
            return Err(ErrorCode::INVAL);
        }

        let storage = allocate(config.rx_capacity).inspect_err(|_| {
            debug!("uart: no memory for {} byte rx buffer", config.rx_capacity);
        })?;

        // `storage` is dropped on the way out if the settings are refused.
        self.uart.configure(config.parameters()).inspect_err(|e| {
            debug!("uart: line settings {:?} rejected: {:?}", config, e);
        })?;

        // The receive interrupt is still off, nothing races the attach.
        drop(self.rx.attach(storage));
        let epoch = self.epoch.load(Ordering::Relaxed);
        self.epoch.store(epoch.wrapping_add(1), Ordering::Relaxed);
        self.installed.store(true, Ordering::Release);
        self.uart.enable();

        debug!(
            "uart: installed at {} baud, parity {:?}, stop bits {:?}, {} byte rx buffer",
            config.baud_rate, config.parity, config.stop_bits, config.rx_capacity
        );
        Ok(())
    }

    /// Disable the UART and free the receive buffer. Buffered bytes and the
    /// overflow count are discarded. Does nothing if not installed.
    pub fn uninstall(&self) -> Result<(), ErrorCode> {
        if self.installed.load(Ordering::Acquire) {
            self.uart.disable();
            self.installed.store(false, Ordering::Release);
            drop(self.rx.detach());
            debug!("uart: uninstalled");
        }
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    fn check_installed(&self) -> Result<(), ErrorCode> {
        if self.is_installed() {
            Ok(())
        } else {
            Err(ErrorCode::FAIL)
        }
    }

    /// Transmit one byte, waiting until the transmitter accepts it.
    pub fn write(&self, byte: u8) -> Result<(), ErrorCode> {
        self.check_installed()?;
        self.uart.transmit_sync(byte);
        Ok(())
    }

    /// Transmit every byte of `bytes` in order.
    ///
    /// An empty `bytes` on an installed port sends nothing and returns
    /// `Ok`, not `FAIL`.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), ErrorCode> {
        self.check_installed()?;
        bytes.iter().try_for_each(|byte| self.write(*byte))
    }

    /// Transmit `bytes` followed by a line feed.
    pub fn write_bytes_nl(&self, bytes: &[u8]) -> Result<(), ErrorCode> {
        self.write_bytes(bytes)?;
        self.write(b'\n')
    }

    /// Transmit `text` up to, not including, its first NUL byte.
    ///
    /// Text that is empty or starts with NUL sends nothing and returns `Ok`
    /// on an installed port.
    pub fn print(&self, text: &[u8]) -> Result<(), ErrorCode> {
        self.check_installed()?;
        text.iter()
            .take_while(|byte| **byte != 0)
            .try_for_each(|byte| self.write(*byte))
    }

    /// [`print`](Self::print) followed by a line feed.
    pub fn println(&self, text: &[u8]) -> Result<(), ErrorCode> {
        self.print(text)?;
        self.write(b'\n')
    }

    /// A [`fmt::Write`] adapter for `write!` formatting straight to the line.
    pub fn writer(&self) -> UartWriter<'_, 'a, U> {
        UartWriter { uart: self }
    }

    /// Take the oldest received byte. `NOTAVAIL` if none is buffered.
    pub fn get_byte(&self) -> Result<u8, ErrorCode> {
        self.check_installed()?;
        self.rx.dequeue().ok_or(ErrorCode::NOTAVAIL)
    }

    /// Take exactly `length` bytes into the front of `out`.
    ///
    /// Nothing is consumed unless `length` bytes are buffered, in which case
    /// the call returns `NOTAVAIL`. `INVAL` if `out` is shorter than
    /// `length`.
    pub fn get_bytes_exact(&self, out: &mut [u8], length: usize) -> Result<(), ErrorCode> {
        self.check_installed()?;
        let out = out.get_mut(..length).ok_or(ErrorCode::INVAL)?;
        if self.rx.dequeue_exact(out) {
            Ok(())
        } else {
            Err(ErrorCode::NOTAVAIL)
        }
    }

    /// Advance `scan` by at most one received byte.
    ///
    /// Returns `NOTAVAIL` while the scan is still in progress. A finished
    /// scan reports how it ended and how many bytes it stored, and the
    /// scanner is ready for the next line.
    pub fn get_bytes_until(&self, scan: &mut ReadUntil<'_>) -> Result<Terminated, ErrorCode> {
        self.check_installed()?;
        scan.step(self.epoch.load(Ordering::Relaxed), &self.rx)
    }

    /// Discard every buffered byte. A scan in progress keeps the bytes it
    /// already collected.
    pub fn flush(&self) {
        self.rx.empty();
    }

    /// Bytes dropped because the receive buffer was full, since install.
    pub fn overflow_count(&self) -> u32 {
        self.rx.overflows()
    }

    /// Bytes waiting in the receive buffer.
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Size of the receive buffer, 0 when not installed.
    pub fn capacity(&self) -> usize {
        self.rx.capacity()
    }
}

impl<'a, U: hil::uart::Uart<'a>> hil::uart::ReceiveClient for BufferedUart<'a, U> {
    fn received_byte(&self, byte: u8) {
        if self.installed.load(Ordering::Acquire) {
            self.rx.enqueue(byte);
        }
    }
}

fn allocate(len: usize) -> Result<Box<[u8]>, ErrorCode> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|_| ErrorCode::NOMEM)?;
    storage.resize(len, 0);
    Ok(storage.into_boxed_slice())
}

pub struct UartWriter<'d, 'a, U: hil::uart::Uart<'a>> {
    uart: &'d BufferedUart<'a, U>,
}

impl<'a, U: hil::uart::Uart<'a>> fmt::Write for UartWriter<'_, 'a, U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
