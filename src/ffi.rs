// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

#![allow(non_camel_case_types)]

use nix::errno::Errno;
use std::cmp;
use std::os::unix::prelude::*;
use std::ptr;

use crate::core::{Functionality, ReadWrite, SmbusData, Transaction, TransactionSize};
use crate::core::SMBUS_BLOCK_MAX;

// In C, this is a union, but the largest item is clearly
// the largest.
//
// union i2c_smbus_data {
//     __u8 byte;
//     __u16 word;
//     __u8 block[I2C_SMBUS_BLOCK_MAX + 2]; /* block[0] is used for length */
//                            /* and one more for user-space compatibility */
// };
#[repr(C)]
struct i2c_smbus_data {
    block: [u8; SMBUS_BLOCK_MAX + 2],
}

impl i2c_smbus_data {
    fn empty() -> i2c_smbus_data {
        i2c_smbus_data {
            block: [0; SMBUS_BLOCK_MAX + 2],
        }
    }

    /// Lay a payload out the way the kernel reads it for `size`
    fn from_transaction(transaction: &Transaction) -> i2c_smbus_data {
        let mut raw = i2c_smbus_data::empty();
        let payload = transaction.data.as_slice();
        match transaction.size {
            TransactionSize::BlockData | TransactionSize::I2cBlockData => {
                raw.block[0] = payload.len() as u8;
                raw.block[1..=payload.len()].copy_from_slice(payload);
            }
            _ => raw.block[..payload.len()].copy_from_slice(payload),
        }
        raw
    }

    /// Decode what the kernel left in the union after a transfer
    fn to_payload(&self, size: TransactionSize) -> SmbusData {
        match size {
            TransactionSize::Quick => SmbusData::empty(),
            TransactionSize::Byte | TransactionSize::ByteData => SmbusData::from_byte(self.block[0]),
            TransactionSize::WordData | TransactionSize::ProcCall => {
                let mut word = [0u8; 2];
                word.copy_from_slice(&self.block[..2]);
                SmbusData::from_word(u16::from_ne_bytes(word))
            }
            TransactionSize::BlockData | TransactionSize::I2cBlockData => {
                // create the payload from the data in the block starting at
                // byte 1 and ending after count bytes after that
                let count = cmp::min(self.block[0] as usize, SMBUS_BLOCK_MAX);
                match SmbusData::from_block(&self.block[1..=count]) {
                    Ok(data) => data,
                    Err(_) => SmbusData::empty(),
                }
            }
        }
    }
}

// from include/uapi/linux/i2c-dev.h
const I2C_SLAVE: u16 = 0x0703;
const I2C_SLAVE_FORCE: u16 = 0x0706;
const I2C_FUNCS: u16 = 0x0705;
const I2C_PEC: u16 = 0x0708;
const I2C_SMBUS: u16 = 0x0720;

/// This is the structure as used in the I2C_SMBUS ioctl call
#[repr(C)]
pub struct i2c_smbus_ioctl_data {
    // __u8 read_write;
    read_write: u8,
    // __u8 command;
    command: u8,
    // __u32 size;
    size: u32,
    // union i2c_smbus_data __user *data;
    data: *mut i2c_smbus_data,
}

mod ioctl {
    pub use super::i2c_smbus_ioctl_data;
    use super::{I2C_FUNCS, I2C_PEC, I2C_SLAVE, I2C_SLAVE_FORCE, I2C_SMBUS};

    ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);
    ioctl_write_int_bad!(set_i2c_slave_address_force, I2C_SLAVE_FORCE);
    ioctl_write_int_bad!(set_smbus_pec, I2C_PEC);
    ioctl_read_bad!(get_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, i2c_smbus_ioctl_data);
}

pub fn i2c_set_slave_address(fd: RawFd, slave_address: u16) -> Result<(), Errno> {
    unsafe {
        ioctl::set_i2c_slave_address(fd, i32::from(slave_address))?;
    }
    Ok(())
}

pub fn i2c_set_slave_address_force(fd: RawFd, slave_address: u16) -> Result<(), Errno> {
    unsafe {
        ioctl::set_i2c_slave_address_force(fd, i32::from(slave_address))?;
    }
    Ok(())
}

pub fn i2c_set_smbus_pec(fd: RawFd, enable: bool) -> Result<(), Errno> {
    unsafe {
        ioctl::set_smbus_pec(fd, i32::from(enable))?;
    }
    Ok(())
}

pub fn i2c_get_functionality(fd: RawFd) -> Result<Functionality, Errno> {
    let mut funcs: libc::c_ulong = 0;
    unsafe {
        ioctl::get_funcs(fd, &mut funcs)?;
    }
    // bits above the 32 the kernel defines are dropped
    Ok(Functionality::from_bits_truncate(funcs as u32))
}

pub fn i2c_smbus_access(fd: RawFd, transaction: &mut Transaction) -> Result<i32, Errno> {
    let mut data = i2c_smbus_data::from_transaction(transaction);
    let data_ptr = match transaction.size {
        TransactionSize::Quick => ptr::null_mut(),
        _ => &mut data as *mut i2c_smbus_data,
    };
    let args = i2c_smbus_ioctl_data {
        read_write: transaction.read_write as u8,
        command: transaction.command,
        size: transaction.size as u32,
        data: data_ptr,
    };

    let status = unsafe { ioctl::i2c_smbus(fd, &args)? };

    if transaction.read_write == ReadWrite::Read || transaction.size == TransactionSize::ProcCall {
        transaction.data = data.to_payload(transaction.size);
    }
    Ok(status)
}
