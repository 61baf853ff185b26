// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for invoking operations

/// Standard errors of the serial HAL.
///
/// Success is expressed as `Ok(..)` of a `Result`, so this type only carries
/// failure cases. The discriminants match the status codes reported by
/// [`into_statuscode`], where `0` means success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// The driver is not installed
    FAIL = 1,
    /// An invalid parameter was passed
    INVAL = 2,
    /// No data yet, not enough data, or an incomplete scan; retry
    NOTAVAIL = 3,
    /// Memory required not available
    NOMEM = 4,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

impl TryFrom<usize> for ErrorCode {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ErrorCode::FAIL),
            2 => Ok(ErrorCode::INVAL),
            3 => Ok(ErrorCode::NOTAVAIL),
            4 => Ok(ErrorCode::NOMEM),
            _ => Err(()),
        }
    }
}

/// Convert a `Result<(), ErrorCode>` to a numeric status code.
///
/// `Ok(())` maps to `0`, errors map to their discriminant.
pub fn into_statuscode(r: Result<(), ErrorCode>) -> usize {
    match r {
        Ok(()) => 0,
        Err(e) => e as usize,
    }
}
