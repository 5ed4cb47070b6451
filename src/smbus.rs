// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Transaction primitive and the byte-data helpers built on it
//!
//! Nothing here retries: a failed call hands its `Errno` straight back.
//! `Error::code()` turns it into the `-errno` form when needed.

use nix::errno::Errno;

use crate::core::{SmbusAdapter, SmbusData, Transaction, TransactionSize};

/// Issue one SMBus transaction on `adapter`
pub fn access<A>(adapter: &mut A, transaction: &mut Transaction) -> Result<i32, Errno>
where
    A: SmbusAdapter + ?Sized,
{
    debug!(
        "I2C_SMBUS {:?} command={:#04x} size={:?}",
        transaction.read_write, transaction.command, transaction.size
    );
    let result = adapter.smbus_access(transaction);
    if let Err(e) = result {
        debug!("I2C_SMBUS failed: {}", e.desc());
    }
    result
}

/// Write a single byte to a specific register on a device
///
/// The register is specified through the Comm byte.  Returns the raw
/// status of the call.
pub fn write_byte_data<A>(adapter: &mut A, register: u8, value: u8) -> Result<i32, Errno>
where
    A: SmbusAdapter + ?Sized,
{
    let mut transaction = Transaction::write(
        register,
        TransactionSize::ByteData,
        SmbusData::from_byte(value),
    );
    access(adapter, &mut transaction)
}

/// Read a single byte from a device, from a designated register
///
/// The register is specified through the Comm byte.
pub fn read_byte_data<A>(adapter: &mut A, register: u8) -> Result<u8, Errno>
where
    A: SmbusAdapter + ?Sized,
{
    let mut transaction = Transaction::read(register, TransactionSize::ByteData);
    access(adapter, &mut transaction)?;
    Ok(transaction.data.byte())
}
