// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Hardware interface layer (HIL) traits for UART communication.
//!
//! A chip implements [`Uart`]: it can be configured, can push single bytes
//! out synchronously, and forwards every received byte from its receive
//! interrupt handler to a registered [`ReceiveClient`].

use crate::ErrorCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 1,
    Two = 2,
}

impl StopBits {
    /// Map a raw stop bit count onto [`StopBits`].
    ///
    /// Counts other than 1 or 2 select a single stop bit. Unlike
    /// [`Parity`], an unknown value is not an error.
    pub fn from_count(count: u8) -> StopBits {
        match count {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => {
                debug!("uart: {} stop bits unsupported, using 1", other);
                StopBits::One
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

/// Parse the single-character parity encoding (`N`, `E` or `O`).
impl TryFrom<u8> for Parity {
    type Error = ErrorCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'N' => Ok(Parity::None),
            b'E' => Ok(Parity::Even),
            b'O' => Ok(Parity::Odd),
            _ => Err(ErrorCode::INVAL),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Six = 6,
    Seven = 7,
    Eight = 8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub baud_rate: u32, // baud rate in bit/s
    pub width: Width,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub hw_flow_control: bool,
}

/// Apply line settings to the peripheral.
pub trait Configure {
    /// Returns `Ok(())`, or
    /// - `INVAL` if a parameter cannot be expressed by the hardware, for
    ///   instance a baud rate outside the prescaler range, an unsupported
    ///   width, or hardware flow control on a port without it.
    fn configure(&self, params: Parameters) -> Result<(), ErrorCode>;
}

/// Blocking, byte-at-a-time transmission.
pub trait Transmit {
    /// Wait until the transmit data register is free, then load `byte`.
    fn transmit_sync(&self, byte: u8);
}

/// Interrupt-driven reception.
pub trait Receive<'a> {
    fn set_receive_client(&self, client: &'a dyn ReceiveClient);
}

/// Implement to receive bytes from a UART receive interrupt.
///
/// Called from interrupt context: implementations must run in bounded time
/// and must not block.
pub trait ReceiveClient {
    fn received_byte(&self, byte: u8);
}

pub trait Uart<'a>: Configure + Transmit + Receive<'a> {
    /// Enable the transmitter, the receiver and the receive-complete
    /// interrupt, and unmask interrupts globally.
    fn enable(&self);

    /// Disable the transmitter, the receiver and the receive-complete
    /// interrupt. Global interrupt masking is left untouched.
    fn disable(&self);
}
