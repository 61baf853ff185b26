// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Helper functions for the AVR core: global interrupt masking and the
//! `critical-section` implementation used by the kernel's shared state.

/// Global interrupt enable bit of SREG.
#[cfg(target_arch = "avr")]
const SREG_I: u8 = 1 << 7;

/// SEI instruction
#[cfg(target_arch = "avr")]
#[inline(always)]
pub unsafe fn enable_interrupts() {
    use core::arch::asm;
    asm!("sei", options(nomem, nostack));
}

/// CLI instruction
#[cfg(target_arch = "avr")]
#[inline(always)]
pub unsafe fn disable_interrupts() {
    use core::arch::asm;
    asm!("cli", options(nomem, nostack));
}

#[cfg(target_arch = "avr")]
#[inline(always)]
fn read_sreg() -> u8 {
    use core::arch::asm;
    let sreg: u8;
    unsafe {
        // SREG lives at I/O address 0x3F.
        asm!("in {0}, 0x3F", out(reg) sreg, options(nomem, nostack, preserves_flags));
    }
    sreg
}

// Host builds (unit tests) have no interrupt controller to drive.
#[cfg(not(target_arch = "avr"))]
pub unsafe fn enable_interrupts() {}

#[cfg(not(target_arch = "avr"))]
pub unsafe fn disable_interrupts() {}

/// Masks interrupts for the duration of a critical section and restores the
/// previous I bit afterwards, so nested sections and sections entered from
/// an interrupt handler leave the mask as they found it.
#[cfg(target_arch = "avr")]
struct SingleCoreCriticalSection;

#[cfg(target_arch = "avr")]
critical_section::set_impl!(SingleCoreCriticalSection);

#[cfg(target_arch = "avr")]
unsafe impl critical_section::Impl for SingleCoreCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let sreg = read_sreg();
        disable_interrupts();
        sreg
    }

    unsafe fn release(sreg: critical_section::RawRestoreState) {
        if sreg & SREG_I != 0 {
            enable_interrupts();
        }
    }
}
