// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BUS: u32 = 0;
pub const DEFAULT_ADDRESS: u16 = 0x20;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Where the value compared after a write comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackMode {
    /// The status returned by the write call itself
    WriteStatus,
    /// A separate read transaction of the same register
    Transaction,
}

impl Default for ReadbackMode {
    fn default() -> ReadbackMode {
        ReadbackMode::WriteStatus
    }
}

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bus device node
    pub device: PathBuf,
    /// 7-bit peripheral address
    pub address: u16,
    /// Bind the address even if a kernel driver already claims it
    pub force: bool,
    /// Request packet error checking
    pub pec: bool,
    pub readback: ReadbackMode,
    /// Pause between the writes of the demo sequence
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config::for_bus(DEFAULT_BUS)
    }
}

impl Config {
    pub fn for_bus(bus: u32) -> Config {
        Config {
            device: bus_path(bus),
            address: DEFAULT_ADDRESS,
            force: false,
            pec: false,
            readback: ReadbackMode::default(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Device node of bus number `bus`
pub fn bus_path(bus: u32) -> PathBuf {
    PathBuf::from(format!("/dev/i2c-{}", bus))
}

/// Parse an unsigned number the way `strtol` does with base 0
///
/// `0x` selects hexadecimal, any other leading `0` octal, else decimal.
pub fn parse_number(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u32::from_str_radix(&s[1..], 8)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| Error::Usage(format!("Invalid number `{}'", s)))
}

/// Parse a register or data byte, naming `what` in the error
pub fn parse_u8(s: &str, what: &str) -> Result<u8> {
    let n = parse_number(s)?;
    if n > 0xFF {
        return Err(Error::Usage(format!("{} 0x{:x} out of range (0x00-0xff)", what, n)));
    }
    Ok(n as u8)
}

/// Parse a peripheral address
///
/// The 7-bit range is enforced when the address is bound, not here.
pub fn parse_address(s: &str) -> Result<u16> {
    let n = parse_number(s)?;
    if n > u32::from(u16::MAX) {
        return Err(Error::Usage(format!("Chip address 0x{:x} out of range (0x00-0x7f)", n)));
    }
    Ok(n as u16)
}
