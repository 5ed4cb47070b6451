// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, NativeEndian};
use nix::errno::Errno;

use crate::error::{Error, Result};

/// As specified in SMBus standard
pub const SMBUS_BLOCK_MAX: usize = 32;

bitflags! {
    /// Functionality matrix reported by an adapter (`I2C_FUNCS`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Functionality: u32 {
        const I2C = 0x0000_0001;
        const TENBIT_ADDR = 0x0000_0002;
        const PROTOCOL_MANGLING = 0x0000_0004; /* I2C_M_IGNORE_NAK etc. */
        const SMBUS_PEC = 0x0000_0008;
        const NOSTART = 0x0000_0010; /* I2C_M_NOSTART */
        const SMBUS_BLOCK_PROC_CALL = 0x0000_8000; /* SMBus 2.0 */
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const SMBUS_PROC_CALL = 0x0080_0000;
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000; /* I2C-like block xfer  */
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000; /* w/ 1-byte reg. addr. */

        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        const SMBUS_BYTE_DATA = Self::SMBUS_READ_BYTE_DATA.bits()
            | Self::SMBUS_WRITE_BYTE_DATA.bits();
        const SMBUS_WORD_DATA = Self::SMBUS_READ_WORD_DATA.bits()
            | Self::SMBUS_WRITE_WORD_DATA.bits();
        const SMBUS_BLOCK_DATA = Self::SMBUS_READ_BLOCK_DATA.bits()
            | Self::SMBUS_WRITE_BLOCK_DATA.bits();
        const SMBUS_I2C_BLOCK = Self::SMBUS_READ_I2C_BLOCK.bits()
            | Self::SMBUS_WRITE_I2C_BLOCK.bits();
    }
}

/// Direction of a single SMBus transaction
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWrite {
    Read = 1,
    Write = 0,
}

/// Size class of a transaction, numbered as the kernel expects
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSize {
    Quick = 0,
    Byte = 1,
    ByteData = 2,
    WordData = 3,
    ProcCall = 4,
    BlockData = 5,
    I2cBlockData = 8,
}

impl TransactionSize {
    /// Number of hex digits used when printing a value of this size
    pub fn hex_width(self) -> usize {
        match self {
            TransactionSize::WordData | TransactionSize::ProcCall => 4,
            _ => 2,
        }
    }
}

/// Payload of an SMBus transaction
///
/// Holds at most `SMBUS_BLOCK_MAX` bytes.  Byte transfers use the first
/// byte, word transfers the first two (in host order, as the kernel
/// union does) and block transfers the first `len()` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbusData {
    block: [u8; SMBUS_BLOCK_MAX],
    len: usize,
}

impl SmbusData {
    pub fn empty() -> SmbusData {
        SmbusData {
            block: [0; SMBUS_BLOCK_MAX],
            len: 0,
        }
    }

    pub fn from_byte(value: u8) -> SmbusData {
        let mut data = SmbusData::empty();
        data.block[0] = value;
        data.len = 1;
        data
    }

    pub fn from_word(value: u16) -> SmbusData {
        let mut data = SmbusData::empty();
        NativeEndian::write_u16(&mut data.block[..2], value);
        data.len = 2;
        data
    }

    /// Build a block payload, refusing anything over the SMBus limit
    pub fn from_block(values: &[u8]) -> Result<SmbusData> {
        if values.len() > SMBUS_BLOCK_MAX {
            return Err(Error::BlockTooLong(values.len()));
        }
        let mut data = SmbusData::empty();
        data.block[..values.len()].copy_from_slice(values);
        data.len = values.len();
        Ok(data)
    }

    pub fn byte(&self) -> u8 {
        self.block[0]
    }

    pub fn word(&self) -> u16 {
        NativeEndian::read_u16(&self.block[..2])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.block[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One SMBus request: direction, command (register) byte, size and payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub read_write: ReadWrite,
    pub command: u8,
    pub size: TransactionSize,
    pub data: SmbusData,
}

impl Transaction {
    /// A read of `size`
    ///
    /// I2C block reads ask for the full `SMBUS_BLOCK_MAX` bytes; use
    /// `read_i2c_block` for a shorter one.
    pub fn read(command: u8, size: TransactionSize) -> Transaction {
        let data = match size {
            TransactionSize::I2cBlockData => SmbusData {
                block: [0; SMBUS_BLOCK_MAX],
                len: SMBUS_BLOCK_MAX,
            },
            _ => SmbusData::empty(),
        };
        Transaction {
            read_write: ReadWrite::Read,
            command,
            size,
            data,
        }
    }

    /// An I2C block read of `len` bytes, 1 to `SMBUS_BLOCK_MAX`
    ///
    /// The kernel takes the requested length from the payload length.
    pub fn read_i2c_block(command: u8, len: usize) -> Result<Transaction> {
        if len == 0 {
            return Err(Error::Usage("I2C block read length must be at least 1".to_string()));
        }
        if len > SMBUS_BLOCK_MAX {
            return Err(Error::BlockTooLong(len));
        }
        let mut transaction = Transaction::read(command, TransactionSize::I2cBlockData);
        transaction.data.len = len;
        Ok(transaction)
    }

    pub fn write(command: u8, size: TransactionSize, data: SmbusData) -> Transaction {
        Transaction {
            read_write: ReadWrite::Write,
            command,
            size,
            data,
        }
    }
}

/// Control surface of an SMBus adapter
///
/// This is the set of operations the kernel i2c-dev driver exposes
/// through ioctls.  `linux::LinuxSmbusBus` talks to the real driver,
/// `mock::MockSmbusAdapter` simulates one in memory.
pub trait SmbusAdapter {
    /// Fetch the adapter functionality matrix
    fn functionality(&mut self) -> std::result::Result<Functionality, Errno>;

    /// Select the peripheral that subsequent transactions address
    ///
    /// With `force` set the address is bound even when a kernel driver
    /// already claims it.
    fn set_peripheral_address(&mut self, address: u16, force: bool)
        -> std::result::Result<(), Errno>;

    /// Turn packet error checking on or off
    fn set_pec(&mut self, enable: bool) -> std::result::Result<(), Errno>;

    /// Perform exactly one SMBus transaction
    ///
    /// On success the raw status of the call is returned and, for reads,
    /// `transaction.data` holds the received payload.
    fn smbus_access(&mut self, transaction: &mut Transaction)
        -> std::result::Result<i32, Errno>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_limit() {
        let ok = SmbusData::from_block(&[0xAA; SMBUS_BLOCK_MAX]).unwrap();
        assert_eq!(ok.len(), SMBUS_BLOCK_MAX);

        match SmbusData::from_block(&[0; SMBUS_BLOCK_MAX + 1]) {
            Err(Error::BlockTooLong(33)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_payload_views() {
        let byte = SmbusData::from_byte(0x7F);
        assert_eq!(byte.byte(), 0x7F);
        assert_eq!(byte.as_slice(), &[0x7F]);

        let word = SmbusData::from_word(0xBEEF);
        assert_eq!(word.word(), 0xBEEF);
        assert_eq!(word.len(), 2);

        assert!(SmbusData::empty().is_empty());
    }

    #[test]
    fn test_composite_functionality() {
        assert_eq!(
            Functionality::SMBUS_BYTE_DATA,
            Functionality::SMBUS_READ_BYTE_DATA | Functionality::SMBUS_WRITE_BYTE_DATA
        );
        assert_eq!(Functionality::SMBUS_BYTE_DATA.bits(), 0x0018_0000);
    }

    #[test]
    fn test_i2c_block_read_requests_a_length() {
        let full = Transaction::read(0x10, TransactionSize::I2cBlockData);
        assert_eq!(full.data.len(), SMBUS_BLOCK_MAX);

        let short = Transaction::read_i2c_block(0x10, 6).unwrap();
        assert_eq!(short.data.len(), 6);
        assert_eq!(short.read_write, ReadWrite::Read);

        assert!(Transaction::read_i2c_block(0x10, 0).is_err());
        match Transaction::read_i2c_block(0x10, SMBUS_BLOCK_MAX + 1) {
            Err(Error::BlockTooLong(33)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(Transaction::read(0x10, TransactionSize::ByteData).data.is_empty());
    }

    #[test]
    fn test_hex_width() {
        assert_eq!(TransactionSize::ByteData.hex_width(), 2);
        assert_eq!(TransactionSize::WordData.hex_width(), 4);
    }
}
