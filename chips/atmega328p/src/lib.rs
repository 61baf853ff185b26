// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral implementations for the ATmega328P MCU.

#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]
#![no_std]
#![crate_name = "atmega328p"]
#![crate_type = "rlib"]

pub mod support;
pub mod usart;

/// Core clock of the common 16 MHz crystal boards.
pub const CLOCK_FREQUENCY_16MHZ: u32 = 16_000_000;
