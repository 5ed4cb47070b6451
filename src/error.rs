// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Fatal conditions encountered while running a command
///
/// The `Display` text is the one-line diagnostic printed after `Error: `.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not open file `{path}': {source}")]
    Open { path: String, source: io::Error },

    #[error("Could not get the adapter functionality matrix: {}", .0.desc())]
    Functionality(#[source] Errno),

    #[error("Adapter does not have {0} capability")]
    MissingCapability(&'static str),

    #[error("Chip address 0x{0:02x} out of range (0x00-0x7f)")]
    AddressOutOfRange(u16),

    #[error("Could not set address to 0x{address:02x}: {}", .source.desc())]
    Address {
        address: u16,
        #[source]
        source: Errno,
    },

    #[error("Could not set PEC: {}", .0.desc())]
    SetPec(#[source] Errno),

    #[error("Could not clear PEC: {}", .0.desc())]
    ClearPec(#[source] Errno),

    #[error("Write failed")]
    WriteFailed(#[source] Errno),

    #[error("Read failed")]
    ReadFailed(#[source] Errno),

    #[error("Block of {0} bytes exceeds the SMBus limit of 32")]
    BlockTooLong(usize),

    #[error("{0}")]
    Usage(String),

    #[error("Could not write output: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    /// Operating system error behind this failure, if any
    pub fn errno(&self) -> Option<Errno> {
        match *self {
            Error::Functionality(e)
            | Error::Address { source: e, .. }
            | Error::SetPec(e)
            | Error::ClearPec(e)
            | Error::WriteFailed(e)
            | Error::ReadFailed(e) => Some(e),
            Error::Open { ref source, .. } => source.raw_os_error().map(Errno::from_i32),
            _ => None,
        }
    }

    /// Signed status code in the `-errno` convention, `-1` when no
    /// system error is involved
    pub fn code(&self) -> i32 {
        match self.errno() {
            Some(e) => -(e as i32),
            None => -1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_text() {
        let e = Error::Address {
            address: 0x20,
            source: Errno::EBUSY,
        };
        assert_eq!(
            e.to_string(),
            "Could not set address to 0x20: Device or resource busy"
        );

        let e = Error::MissingCapability("SMBus read byte");
        assert_eq!(e.to_string(), "Adapter does not have SMBus read byte capability");
    }

    #[test]
    fn test_negative_errno_code() {
        assert_eq!(Error::WriteFailed(Errno::EIO).code(), -5);
        assert_eq!(Error::MissingCapability("SMBus write byte").code(), -1);
        assert_eq!(Error::WriteFailed(Errno::EIO).errno(), Some(Errno::EIO));
    }
}
