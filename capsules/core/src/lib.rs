// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Serial drivers built on the kernel's UART HIL.

#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;

pub mod buffered_uart;
pub mod read_until;
