// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core serial HAL kernel
//!
//! The kernel crate holds the pieces shared by chips and capsules: the
//! standard error type, the Hardware Interface Layer (HIL) definitions for
//! UART peripherals, the interrupt-safe receive ring and the `debug!`
//! logging facility.
//!
//! Most `unsafe` code is in this kernel crate and the chip crates.

#![warn(unreachable_pub)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

#[macro_use]
pub mod debug;
pub mod collections;
pub mod errorcode;
pub mod hil;
pub mod utilities;

pub use crate::errorcode::ErrorCode;
