// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! USART0 driver for the ATmega328P.
//!
//! Asynchronous mode only, 8-bit frames. Transmission is synchronous: each
//! byte busy-waits on the data register empty flag. Reception is interrupt
//! driven: the board routes the `USART_RX` vector to
//! [`Usart::handle_interrupt`], which forwards the received byte to the
//! registered [`hil::uart::ReceiveClient`].

use kernel::hil;
use kernel::hil::uart::{Parameters, Parity, StopBits, Width};
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite};
use kernel::utilities::cells::OptionalCell;
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::support;

register_structs! {
    pub UsartRegisters {
        /// Control and status register A
        (0x00 => ucsr0a: ReadWrite<u8, UCSR0A::Register>),
        /// Control and status register B
        (0x01 => ucsr0b: ReadWrite<u8, UCSR0B::Register>),
        /// Control and status register C
        (0x02 => ucsr0c: ReadWrite<u8, UCSR0C::Register>),
        (0x03 => _reserved0),
        /// Baud rate register, low byte
        (0x04 => ubrr0l: ReadWrite<u8>),
        /// Baud rate register, high nibble
        (0x05 => ubrr0h: ReadWrite<u8, UBRR0H::Register>),
        /// I/O data register
        (0x06 => udr0: ReadWrite<u8>),
        (0x07 => @END),
    }
}

register_bitfields![u8,
    UCSR0A [
        RXC0 OFFSET(7) NUMBITS(1) [],
        TXC0 OFFSET(6) NUMBITS(1) [],
        UDRE0 OFFSET(5) NUMBITS(1) [],
        FE0 OFFSET(4) NUMBITS(1) [],
        DOR0 OFFSET(3) NUMBITS(1) [],
        UPE0 OFFSET(2) NUMBITS(1) [],
        U2X0 OFFSET(1) NUMBITS(1) [],
        MPCM0 OFFSET(0) NUMBITS(1) []
    ],
    UCSR0B [
        RXCIE0 OFFSET(7) NUMBITS(1) [],
        TXCIE0 OFFSET(6) NUMBITS(1) [],
        UDRIE0 OFFSET(5) NUMBITS(1) [],
        RXEN0 OFFSET(4) NUMBITS(1) [],
        TXEN0 OFFSET(3) NUMBITS(1) [],
        UCSZ02 OFFSET(2) NUMBITS(1) [],
        RXB80 OFFSET(1) NUMBITS(1) [],
        TXB80 OFFSET(0) NUMBITS(1) []
    ],
    UCSR0C [
        UMSEL0 OFFSET(6) NUMBITS(2) [
            Asynchronous = 0,
            Synchronous = 1,
            MasterSpi = 3
        ],
        UPM0 OFFSET(4) NUMBITS(2) [
            Disabled = 0,
            Even = 2,
            Odd = 3
        ],
        USBS0 OFFSET(3) NUMBITS(1) [
            OneStopBit = 0,
            TwoStopBits = 1
        ],
        UCSZ0 OFFSET(1) NUMBITS(2) [
            FiveBit = 0,
            SixBit = 1,
            SevenBit = 2,
            EightBit = 3
        ],
        UCPOL0 OFFSET(0) NUMBITS(1) []
    ],
    UBRR0H [
        UBRR OFFSET(0) NUMBITS(4) []
    ]
];

/// USART0 sits at data address 0xC0.
pub const USART0_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(0xC0 as *const UsartRegisters) };

/// Largest value the 12-bit UBRR0 register can hold.
const MAX_PRESCALER: u32 = 0x0FFF;

/// Compute the UBRR0 value for `baud_rate` in normal (16x oversampling)
/// asynchronous mode: `clock / (baud * 16) - 1`, truncated.
///
/// Returns `INVAL` for a zero baud rate or a result that does not fit the
/// 12-bit register.
pub fn baud_prescaler(clock_frequency: u32, baud_rate: u32) -> Result<u16, ErrorCode> {
    let divisor = baud_rate
        .checked_mul(16)
        .filter(|divisor| *divisor != 0)
        .ok_or(ErrorCode::INVAL)?;
    let prescaler = (clock_frequency / divisor)
        .checked_sub(1)
        .ok_or(ErrorCode::INVAL)?;
    if prescaler > MAX_PRESCALER {
        return Err(ErrorCode::INVAL);
    }
    Ok(prescaler as u16)
}

pub struct Usart<'a> {
    registers: StaticRef<UsartRegisters>,
    clock_frequency: u32,
    rx_client: OptionalCell<&'a dyn hil::uart::ReceiveClient>,
}

impl<'a> Usart<'a> {
    pub const fn new(base: StaticRef<UsartRegisters>, clock_frequency: u32) -> Usart<'a> {
        Usart {
            registers: base,
            clock_frequency,
            rx_client: OptionalCell::empty(),
        }
    }

    /// Receive-complete interrupt handler.
    ///
    /// Reading UDR0 clears RXC0. Frame, overrun and parity flags are not
    /// reported.
    pub fn handle_interrupt(&self) {
        let regs = self.registers;

        if regs.ucsr0a.is_set(UCSR0A::RXC0) {
            let byte = regs.udr0.get();
            self.rx_client.map(|client| client.received_byte(byte));
        }
    }
}

impl hil::uart::Configure for Usart<'_> {
    fn configure(&self, params: Parameters) -> Result<(), ErrorCode> {
        let regs = self.registers;

        // No RTS/CTS lines on this USART, and frames are fixed at 8 bits.
        if params.hw_flow_control || params.width != Width::Eight {
            return Err(ErrorCode::INVAL);
        }
        let prescaler = baud_prescaler(self.clock_frequency, params.baud_rate)?;

        let parity = match params.parity {
            Parity::None => UCSR0C::UPM0::Disabled,
            Parity::Even => UCSR0C::UPM0::Even,
            Parity::Odd => UCSR0C::UPM0::Odd,
        };
        let stop_bits = match params.stop_bits {
            StopBits::One => UCSR0C::USBS0::OneStopBit,
            StopBits::Two => UCSR0C::USBS0::TwoStopBits,
        };

        regs.ucsr0b.modify(UCSR0B::UCSZ02::CLEAR);
        regs.ucsr0c.write(
            UCSR0C::UMSEL0::Asynchronous + parity + stop_bits + UCSR0C::UCSZ0::EightBit,
        );

        // Writing UBRR0L latches the new prescaler, so the high nibble goes
        // first.
        regs.ubrr0h.write(UBRR0H::UBRR.val((prescaler >> 8) as u8));
        regs.ubrr0l.set((prescaler & 0xFF) as u8);

        Ok(())
    }
}

impl hil::uart::Transmit for Usart<'_> {
    fn transmit_sync(&self, byte: u8) {
        let regs = self.registers;
        while !regs.ucsr0a.is_set(UCSR0A::UDRE0) {}
        regs.udr0.set(byte);
    }
}

impl<'a> hil::uart::Receive<'a> for Usart<'a> {
    fn set_receive_client(&self, client: &'a dyn hil::uart::ReceiveClient) {
        self.rx_client.set(client);
    }
}

impl<'a> hil::uart::Uart<'a> for Usart<'a> {
    fn enable(&self) {
        let regs = self.registers;
        regs.ucsr0b
            .modify(UCSR0B::RXEN0::SET + UCSR0B::TXEN0::SET + UCSR0B::RXCIE0::SET);
        unsafe {
            support::enable_interrupts();
        }
    }

    fn disable(&self) {
        let regs = self.registers;
        regs.ucsr0b
            .modify(UCSR0B::RXEN0::CLEAR + UCSR0B::TXEN0::CLEAR + UCSR0B::RXCIE0::CLEAR);
    }
}
