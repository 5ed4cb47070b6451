// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Adapter functionality checks run before any transaction

use std::fmt;

use crate::core::{Functionality, SmbusAdapter, TransactionSize};
use crate::error::{Error, Result};

/// Non-fatal findings of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// PEC was requested but the adapter does not advertise it
    PecUnsupported,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Warning::PecUnsupported => write!(f, "Adapter does not seem to support PEC"),
        }
    }
}

fn require(funcs: Functionality, flag: Functionality, name: &'static str) -> Result<()> {
    if funcs.contains(flag) {
        Ok(())
    } else {
        Err(Error::MissingCapability(name))
    }
}

fn fetch<A: SmbusAdapter + ?Sized>(adapter: &mut A) -> Result<Functionality> {
    adapter.functionality().map_err(Error::Functionality)
}

fn pec_warning(funcs: Functionality, pec: bool) -> Option<Warning> {
    if pec && !funcs.intersects(Functionality::SMBUS_PEC | Functionality::I2C) {
        warn!("{}", Warning::PecUnsupported);
        Some(Warning::PecUnsupported)
    } else {
        None
    }
}

/// Check that the adapter can perform a read of `size`
///
/// `register` is the data address the read will use, if any.  A plain
/// byte read with a register needs a send-byte first to select it, so
/// that capability is checked as well.
pub fn check_read<A>(
    adapter: &mut A,
    size: TransactionSize,
    register: Option<u8>,
    pec: bool,
) -> Result<Option<Warning>>
where
    A: SmbusAdapter + ?Sized,
{
    let funcs = fetch(adapter)?;

    match size {
        TransactionSize::Quick => require(funcs, Functionality::SMBUS_QUICK, "SMBus quick command")?,
        TransactionSize::Byte => {
            require(funcs, Functionality::SMBUS_READ_BYTE, "SMBus receive byte")?;
            if register.is_some() {
                require(funcs, Functionality::SMBUS_WRITE_BYTE, "SMBus send byte")?;
            }
        }
        TransactionSize::ByteData => {
            require(funcs, Functionality::SMBUS_READ_BYTE_DATA, "SMBus read byte")?
        }
        TransactionSize::WordData => {
            require(funcs, Functionality::SMBUS_READ_WORD_DATA, "SMBus read word")?
        }
        TransactionSize::ProcCall => {
            require(funcs, Functionality::SMBUS_PROC_CALL, "SMBus process call")?
        }
        TransactionSize::BlockData => {
            require(funcs, Functionality::SMBUS_READ_BLOCK_DATA, "SMBus block read")?
        }
        TransactionSize::I2cBlockData => {
            require(funcs, Functionality::SMBUS_READ_I2C_BLOCK, "I2C block read")?
        }
    }

    Ok(pec_warning(funcs, pec))
}

/// Check that the adapter can perform a write of `size`
pub fn check_write<A>(adapter: &mut A, size: TransactionSize, pec: bool) -> Result<Option<Warning>>
where
    A: SmbusAdapter + ?Sized,
{
    let funcs = fetch(adapter)?;

    match size {
        TransactionSize::Quick => require(funcs, Functionality::SMBUS_QUICK, "SMBus quick command")?,
        TransactionSize::Byte => require(funcs, Functionality::SMBUS_WRITE_BYTE, "SMBus send byte")?,
        TransactionSize::ByteData => {
            require(funcs, Functionality::SMBUS_WRITE_BYTE_DATA, "SMBus write byte")?
        }
        TransactionSize::WordData => {
            require(funcs, Functionality::SMBUS_WRITE_WORD_DATA, "SMBus write word")?
        }
        TransactionSize::ProcCall => {
            require(funcs, Functionality::SMBUS_PROC_CALL, "SMBus process call")?
        }
        TransactionSize::BlockData => {
            require(funcs, Functionality::SMBUS_WRITE_BLOCK_DATA, "SMBus block write")?
        }
        TransactionSize::I2cBlockData => {
            require(funcs, Functionality::SMBUS_WRITE_I2C_BLOCK, "I2C block write")?
        }
    }

    Ok(pec_warning(funcs, pec))
}
