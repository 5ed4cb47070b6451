// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory SMBus adapter used to exercise commands without hardware

use nix::errno::Errno;
use std::collections::HashMap;

use crate::core::{Functionality, ReadWrite, SmbusAdapter, SmbusData, Transaction, TransactionSize};

/// The 256 byte-wide registers of one simulated peripheral
pub struct I2CRegisterMap {
    registers: [u8; 0x100],
    offset: u8,
}

impl Default for I2CRegisterMap {
    fn default() -> I2CRegisterMap {
        I2CRegisterMap::new()
    }
}

impl I2CRegisterMap {
    pub fn new() -> I2CRegisterMap {
        I2CRegisterMap {
            registers: [0x00; 0x100],
            offset: 0,
        }
    }

    /// Preload consecutive registers starting at `offset`, wrapping at 0xFF
    pub fn write_regs(&mut self, offset: u8, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.registers[offset.wrapping_add(i as u8) as usize] = *byte;
        }
    }

    pub fn read_reg(&self, offset: u8) -> u8 {
        self.registers[offset as usize]
    }
}

/// What a simulated write transaction reports back as its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// `0`, like the kernel driver
    Zero,
    /// The byte that was written
    EchoValue,
}

/// A simulated adapter with one register map per peripheral address
///
/// By default every SMBus function (including PEC) is advertised, any
/// 7-bit address can be bound and writes report a zero status.  Every
/// transaction that reaches the adapter is recorded, failed ones too.
pub struct MockSmbusAdapter {
    functionality: Functionality,
    peripherals: HashMap<u16, I2CRegisterMap>,
    address: Option<u16>,
    forced: bool,
    pec: bool,
    pec_history: Vec<bool>,
    rejected: Vec<(u16, Errno)>,
    functionality_error: Option<Errno>,
    pec_error: Option<Errno>,
    pec_clear_error: Option<Errno>,
    transaction_error: Option<Errno>,
    read_error: Option<Errno>,
    write_status: WriteStatus,
    transactions: Vec<Transaction>,
    pec_during: Vec<bool>,
}

impl Default for MockSmbusAdapter {
    fn default() -> MockSmbusAdapter {
        MockSmbusAdapter::new()
    }
}

impl MockSmbusAdapter {
    pub fn new() -> MockSmbusAdapter {
        MockSmbusAdapter {
            functionality: Functionality::I2C
                | Functionality::SMBUS_PEC
                | Functionality::SMBUS_QUICK
                | Functionality::SMBUS_BYTE
                | Functionality::SMBUS_BYTE_DATA
                | Functionality::SMBUS_WORD_DATA
                | Functionality::SMBUS_PROC_CALL
                | Functionality::SMBUS_BLOCK_DATA
                | Functionality::SMBUS_I2C_BLOCK,
            peripherals: HashMap::new(),
            address: None,
            forced: false,
            pec: false,
            pec_history: Vec::new(),
            rejected: Vec::new(),
            functionality_error: None,
            pec_error: None,
            pec_clear_error: None,
            transaction_error: None,
            read_error: None,
            write_status: WriteStatus::Zero,
            transactions: Vec::new(),
            pec_during: Vec::new(),
        }
    }

    /// Advertise exactly `functionality`
    pub fn with_functionality(mut self, functionality: Functionality) -> MockSmbusAdapter {
        self.functionality = functionality;
        self
    }

    pub fn with_write_status(mut self, write_status: WriteStatus) -> MockSmbusAdapter {
        self.write_status = write_status;
        self
    }

    /// Make binding `address` fail with `errno`
    pub fn reject_address(&mut self, address: u16, errno: Errno) {
        self.rejected.push((address, errno));
    }

    pub fn fail_functionality(&mut self, errno: Errno) {
        self.functionality_error = Some(errno);
    }

    /// Fail every PEC toggle
    pub fn fail_pec(&mut self, errno: Errno) {
        self.pec_error = Some(errno);
    }

    /// Fail only requests to turn PEC off
    pub fn fail_pec_clear(&mut self, errno: Errno) {
        self.pec_clear_error = Some(errno);
    }

    pub fn fail_transactions(&mut self, errno: Errno) {
        self.transaction_error = Some(errno);
    }

    /// Fail only read transactions, letting writes through
    pub fn fail_reads(&mut self, errno: Errno) {
        self.read_error = Some(errno);
    }

    pub fn regmap_mut(&mut self, address: u16) -> &mut I2CRegisterMap {
        self.peripherals.entry(address).or_default()
    }

    pub fn register(&self, address: u16, register: u8) -> u8 {
        self.peripherals
            .get(&address)
            .map_or(0, |regmap| regmap.read_reg(register))
    }

    pub fn address(&self) -> Option<u16> {
        self.address
    }

    pub fn forced(&self) -> bool {
        self.forced
    }

    pub fn pec_enabled(&self) -> bool {
        self.pec
    }

    /// Every PEC toggle requested, in order
    pub fn pec_history(&self) -> &[bool] {
        &self.pec_history
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// PEC state at the time of each recorded transaction
    pub fn pec_during_transactions(&self) -> &[bool] {
        &self.pec_during
    }
}

impl SmbusAdapter for MockSmbusAdapter {
    fn functionality(&mut self) -> Result<Functionality, Errno> {
        match self.functionality_error {
            Some(e) => Err(e),
            None => Ok(self.functionality),
        }
    }

    fn set_peripheral_address(&mut self, address: u16, force: bool) -> Result<(), Errno> {
        if address > 0x7F {
            return Err(Errno::EINVAL);
        }
        if let Some(&(_, e)) = self.rejected.iter().find(|&&(a, _)| a == address) {
            return Err(e);
        }
        self.address = Some(address);
        self.forced = force;
        Ok(())
    }

    fn set_pec(&mut self, enable: bool) -> Result<(), Errno> {
        if let Some(e) = self.pec_error {
            return Err(e);
        }
        if let (false, Some(e)) = (enable, self.pec_clear_error) {
            return Err(e);
        }
        self.pec_history.push(enable);
        self.pec = enable;
        Ok(())
    }

    fn smbus_access(&mut self, transaction: &mut Transaction) -> Result<i32, Errno> {
        self.transactions.push(*transaction);
        self.pec_during.push(self.pec);
        if let Some(e) = self.transaction_error {
            return Err(e);
        }
        if let (ReadWrite::Read, Some(e)) = (transaction.read_write, self.read_error) {
            return Err(e);
        }
        let address = self.address.ok_or(Errno::ENXIO)?;
        let write_status = self.write_status;
        let regmap = self.peripherals.entry(address).or_default();

        match (transaction.size, transaction.read_write) {
            (TransactionSize::Quick, _) => Ok(0),
            (TransactionSize::Byte, ReadWrite::Read) => {
                transaction.data = SmbusData::from_byte(regmap.read_reg(regmap.offset));
                Ok(0)
            }
            (TransactionSize::Byte, ReadWrite::Write) => {
                regmap.offset = transaction.command;
                Ok(0)
            }
            (TransactionSize::ByteData, ReadWrite::Read) => {
                transaction.data = SmbusData::from_byte(regmap.read_reg(transaction.command));
                Ok(0)
            }
            (TransactionSize::ByteData, ReadWrite::Write) => {
                let value = transaction.data.byte();
                regmap.write_regs(transaction.command, &[value]);
                match write_status {
                    WriteStatus::Zero => Ok(0),
                    WriteStatus::EchoValue => Ok(i32::from(value)),
                }
            }
            (TransactionSize::WordData, ReadWrite::Read) => {
                // SMBus words travel low byte first
                let lo = regmap.read_reg(transaction.command);
                let hi = regmap.read_reg(transaction.command.wrapping_add(1));
                transaction.data = SmbusData::from_word(u16::from_le_bytes([lo, hi]));
                Ok(0)
            }
            (TransactionSize::WordData, ReadWrite::Write) => {
                let word = transaction.data.word();
                regmap.write_regs(transaction.command, &word.to_le_bytes());
                Ok(0)
            }
            _ => Err(Errno::EOPNOTSUPP),
        }
    }
}
