// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Support for debug messages from the HAL and drivers.
//!
//! Messages are formatted directly into a sink registered by the board with
//! [`set_debug_writer`], typically a second UART or a semihosting channel.
//! Until a sink is registered every message is discarded, so drivers can log
//! unconditionally.
//!
//! ```ignore
//! debug!("installed at {} baud", baud_rate);
//! debug_verbose!("buffer size {}", len);
//! ```
//!
//! `debug!` must not be used from interrupt context: formatting is unbounded
//! in time and the sink may block.

use core::cell::Cell;
use core::fmt::{write, Arguments, Result, Write};

use critical_section::Mutex;

/// A byte sink for debug output.
pub trait IoWrite {
    /// Write `buf` to the sink, returning the number of bytes accepted.
    fn write(&self, buf: &[u8]) -> usize;
}

static DEBUG_WRITER: Mutex<Cell<Option<&'static (dyn IoWrite + Sync)>>> =
    Mutex::new(Cell::new(None));

/// Register the sink that receives all subsequent debug output.
pub fn set_debug_writer(writer: &'static (dyn IoWrite + Sync)) {
    critical_section::with(|cs| DEBUG_WRITER.borrow(cs).set(Some(writer)));
}

/// Stop emitting debug output.
pub fn clear_debug_writer() {
    critical_section::with(|cs| DEBUG_WRITER.borrow(cs).set(None));
}

fn debug_writer() -> Option<&'static (dyn IoWrite + Sync)> {
    critical_section::with(|cs| DEBUG_WRITER.borrow(cs).get())
}

struct DebugWriter {
    sink: &'static (dyn IoWrite + Sync),
}

impl Write for DebugWriter {
    fn write_str(&mut self, s: &str) -> Result {
        let bytes = s.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            let accepted = self.sink.write(&bytes[written..]);
            if accepted == 0 {
                // Sink is full, drop the rest of the message.
                break;
            }
            written += accepted;
        }
        Ok(())
    }
}

#[doc(hidden)]
pub fn debug_println(args: Arguments) {
    if let Some(sink) = debug_writer() {
        let mut writer = DebugWriter { sink };
        let _ = write(&mut writer, args);
        let _ = writer.write_str("\r\n");
    }
}

#[doc(hidden)]
pub fn debug_verbose_println(args: Arguments, file_line: &(&'static str, u32)) {
    if let Some(sink) = debug_writer() {
        let mut writer = DebugWriter { sink };
        let (file, line) = *file_line;
        let _ = writer.write_fmt(format_args!("{}:{}: ", file, line));
        let _ = write(&mut writer, args);
        let _ = writer.write_str("\r\n");
    }
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        // Allow an empty debug!() to print the location when hit
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_println(format_args!("{}", $msg))
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_println(format_args!($fmt, $($arg)+))
    });
}

/// In-kernel `println()` debugging with filename and line numbers.
#[macro_export]
macro_rules! debug_verbose {
    () => ({
        // Allow an empty debug_verbose!() to print the location when hit
        $crate::debug_verbose!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_verbose_println(format_args!("{}", $msg), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_verbose_println(format_args!($fmt, $($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}
