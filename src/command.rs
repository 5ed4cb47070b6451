// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! The `get`, `set` and `demo` commands
//!
//! Each command runs the capability check, binds the peripheral
//! address and then issues its transaction.  The first fatal error is
//! returned as is; nothing after it runs.

use std::fmt;
use std::io::Write;
use std::thread;

use crate::capability::{self, Warning};
use crate::config::{Config, ReadbackMode};
use crate::core::{SmbusAdapter, TransactionSize};
use crate::error::{Error, Result};
use crate::smbus;

/// Register read by the demo sequence
pub const DEMO_READ_REGISTER: u8 = 0x00;
/// Register written by the demo sequence
pub const DEMO_WRITE_REGISTER: u8 = 0x02;
/// Values written, in order, by the demo sequence
pub const DEMO_VALUES: [u8; 3] = [0xDC, 0xFC, 0xDC];

/// Result of a `get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReport {
    pub value: u8,
    pub warnings: Vec<Warning>,
}

impl fmt::Display for GetReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}", self.value)
    }
}

/// How the value observed after a write compares to the one written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    ReadbackFailed,
    Mismatch { read: i32 },
    Matched,
}

/// Result of a `set`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetReport {
    pub value: u8,
    pub size: TransactionSize,
    pub outcome: SetOutcome,
    pub warnings: Vec<Warning>,
}

impl fmt::Display for SetReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self.size.hex_width();
        match self.outcome {
            SetOutcome::ReadbackFailed => write!(f, "Warning - readback failed"),
            SetOutcome::Mismatch { read } => write!(
                f,
                "Warning - data mismatch - wrote 0x{:0w$x}, read back 0x{:0w$x}",
                self.value,
                read,
                w = width
            ),
            SetOutcome::Matched => {
                write!(f, "Value 0x{:0w$x} written, readback matched", self.value, w = width)
            }
        }
    }
}

/// Open the bus named by `config`
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn open(config: &Config) -> Result<crate::linux::LinuxSmbusBus> {
    crate::linux::LinuxSmbusBus::open(&config.device)
}

/// Print warnings the way every command reports them on stderr
pub fn write_warnings<W: Write>(err: &mut W, warnings: &[Warning]) -> Result<()> {
    for warning in warnings {
        writeln!(err, "Warning: {}", warning)?;
    }
    Ok(())
}

fn bind_address<A: SmbusAdapter + ?Sized>(adapter: &mut A, config: &Config) -> Result<()> {
    if config.address > 0x7F {
        return Err(Error::AddressOutOfRange(config.address));
    }
    adapter
        .set_peripheral_address(config.address, config.force)
        .map_err(|source| Error::Address {
            address: config.address,
            source,
        })
}

/// Turn PEC on when it was asked for and the adapter has it
///
/// Returns whether PEC ended up enabled.
fn enable_pec<A>(adapter: &mut A, config: &Config, warning: Option<Warning>) -> Result<bool>
where
    A: SmbusAdapter + ?Sized,
{
    if !config.pec || warning == Some(Warning::PecUnsupported) {
        return Ok(false);
    }
    adapter.set_pec(true).map_err(Error::SetPec)?;
    Ok(true)
}

/// Read one byte from `register` of the configured peripheral
pub fn get<A>(adapter: &mut A, config: &Config, register: u8) -> Result<GetReport>
where
    A: SmbusAdapter + ?Sized,
{
    let size = TransactionSize::ByteData;
    let warning = capability::check_read(adapter, size, Some(register), config.pec)?;
    bind_address(adapter, config)?;
    enable_pec(adapter, config, warning)?;

    let value = smbus::read_byte_data(adapter, register).map_err(Error::ReadFailed)?;
    info!(
        "read 0x{:02x} from register 0x{:02x} of 0x{:02x}",
        value, register, config.address
    );

    Ok(GetReport {
        value,
        warnings: warning.into_iter().collect(),
    })
}

/// Write `value` to `register` of the configured peripheral
///
/// With `ReadbackMode::WriteStatus` the status of the write call is what
/// gets compared against `value`.  A mismatch is reported, not returned
/// as an error.
pub fn set<A>(adapter: &mut A, config: &Config, register: u8, value: u8) -> Result<SetReport>
where
    A: SmbusAdapter + ?Sized,
{
    let size = TransactionSize::ByteData;
    let warning = capability::check_write(adapter, size, config.pec)?;
    if config.readback == ReadbackMode::Transaction {
        capability::check_read(adapter, size, Some(register), false)?;
    }
    bind_address(adapter, config)?;
    let pec = enable_pec(adapter, config, warning)?;

    let status = smbus::write_byte_data(adapter, register, value).map_err(Error::WriteFailed)?;
    info!(
        "wrote 0x{:02x} to register 0x{:02x} of 0x{:02x}",
        value, register, config.address
    );

    // the verify read runs under the same PEC setting as the write
    let readback = match config.readback {
        ReadbackMode::WriteStatus => Ok(status),
        ReadbackMode::Transaction => smbus::read_byte_data(adapter, register).map(i32::from),
    };

    if pec {
        adapter.set_pec(false).map_err(Error::ClearPec)?;
    }
    let outcome = match readback {
        Err(e) => {
            warn!("readback of register 0x{:02x} failed: {}", register, e.desc());
            SetOutcome::ReadbackFailed
        }
        Ok(read) if read != i32::from(value) => SetOutcome::Mismatch { read },
        Ok(_) => SetOutcome::Matched,
    };

    Ok(SetReport {
        value,
        size,
        outcome,
        warnings: warning.into_iter().collect(),
    })
}

/// Run the sample sequence: read one register, then write three values
/// to another with `config.interval` between the writes
pub fn demo<A, W, E>(adapter: &mut A, config: &Config, out: &mut W, err: &mut E) -> Result<()>
where
    A: SmbusAdapter + ?Sized,
    W: Write,
    E: Write,
{
    let report = get(adapter, config, DEMO_READ_REGISTER)?;
    write_warnings(err, &report.warnings)?;
    writeln!(out, "{}", report)?;

    for (i, &value) in DEMO_VALUES.iter().enumerate() {
        if i > 0 {
            thread::sleep(config.interval);
        }
        let report = set(adapter, config, DEMO_WRITE_REGISTER, value)?;
        write_warnings(err, &report.warnings)?;
        writeln!(out, "{}", report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Functionality, ReadWrite};
    use crate::mock::{MockSmbusAdapter, WriteStatus};
    use nix::errno::Errno;
    use std::time::Duration;

    const ADDR: u16 = 0x20;

    fn config() -> Config {
        Config {
            address: ADDR,
            interval: Duration::from_millis(0),
            ..Config::default()
        }
    }

    #[test]
    fn test_get_prints_preloaded_byte() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.regmap_mut(ADDR).write_regs(0x00, &[0x7F]);

        let report = get(&mut adapter, &config(), 0x00).unwrap();
        assert_eq!(report.value, 0x7F);
        assert_eq!(report.to_string(), "0x7f");
        assert!(report.warnings.is_empty());
        assert_eq!(adapter.address(), Some(ADDR));
    }

    #[test]
    fn test_set_matched_when_write_echoes_value() {
        let mut adapter = MockSmbusAdapter::new().with_write_status(WriteStatus::EchoValue);

        let report = set(&mut adapter, &config(), 0x02, 0xDC).unwrap();
        assert_eq!(report.outcome, SetOutcome::Matched);
        assert_eq!(report.to_string(), "Value 0xdc written, readback matched");
        assert_eq!(adapter.register(ADDR, 0x02), 0xDC);
    }

    #[test]
    fn test_set_compares_write_status_by_default() {
        // a kernel-like write status of zero never matches a non-zero value
        let mut adapter = MockSmbusAdapter::new();

        let report = set(&mut adapter, &config(), 0x02, 0xDC).unwrap();
        assert_eq!(report.outcome, SetOutcome::Mismatch { read: 0 });
        assert_eq!(
            report.to_string(),
            "Warning - data mismatch - wrote 0xdc, read back 0x00"
        );
        assert_eq!(adapter.transactions().len(), 1);
    }

    #[test]
    fn test_verified_write_reads_back_every_byte() {
        let mut adapter = MockSmbusAdapter::new();
        let config = Config {
            readback: ReadbackMode::Transaction,
            ..config()
        };

        for value in 0..=255u8 {
            let report = set(&mut adapter, &config, 0x02, value).unwrap();
            assert_eq!(report.outcome, SetOutcome::Matched, "value 0x{:02x}", value);
            assert_eq!(get(&mut adapter, &config, 0x02).unwrap().value, value);
        }

        let last = &adapter.transactions()[adapter.transactions().len() - 2];
        assert_eq!(last.read_write, ReadWrite::Read);
    }

    #[test]
    fn test_verified_write_reports_failed_readback() {
        let config = Config {
            readback: ReadbackMode::Transaction,
            ..config()
        };

        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_reads(Errno::EIO);
        let report = set(&mut adapter, &config, 0x02, 0x01).unwrap();
        assert_eq!(report.outcome, SetOutcome::ReadbackFailed);
        assert_eq!(report.to_string(), "Warning - readback failed");
        assert_eq!(adapter.register(ADDR, 0x02), 0x01);

        // the verify read needs a read capability the adapter lacks
        let mut adapter =
            MockSmbusAdapter::new().with_functionality(Functionality::SMBUS_WRITE_BYTE_DATA);
        match set(&mut adapter, &config, 0x02, 0x01) {
            Err(Error::MissingCapability(name)) => assert_eq!(name, "SMBus read byte"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_missing_capability_dispatches_nothing() {
        let mut adapter =
            MockSmbusAdapter::new().with_functionality(Functionality::SMBUS_READ_BYTE_DATA);

        match set(&mut adapter, &config(), 0x02, 0xDC) {
            Err(Error::MissingCapability(name)) => assert_eq!(name, "SMBus write byte"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(adapter.transactions().is_empty());
        assert_eq!(adapter.address(), None);

        let mut adapter =
            MockSmbusAdapter::new().with_functionality(Functionality::SMBUS_WRITE_BYTE_DATA);
        assert!(get(&mut adapter, &config(), 0x00).is_err());
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_unsupported_pec_only_warns() {
        let mut adapter =
            MockSmbusAdapter::new().with_functionality(Functionality::SMBUS_BYTE_DATA);
        let config = Config {
            pec: true,
            ..config()
        };

        let report = get(&mut adapter, &config, 0x00).unwrap();
        assert_eq!(report.warnings, vec![Warning::PecUnsupported]);
        let report = set(&mut adapter, &config, 0x02, 0x55).unwrap();
        assert_eq!(report.warnings, vec![Warning::PecUnsupported]);

        assert_eq!(adapter.transactions().len(), 2);
        assert!(adapter.pec_history().is_empty());

        let mut err = Vec::new();
        write_warnings(&mut err, &report.warnings).unwrap();
        assert_eq!(err, b"Warning: Adapter does not seem to support PEC\n");
    }

    #[test]
    fn test_pec_is_toggled_around_write() {
        let mut adapter = MockSmbusAdapter::new();
        let config = Config {
            pec: true,
            ..config()
        };

        set(&mut adapter, &config, 0x02, 0x55).unwrap();
        assert_eq!(adapter.pec_history(), &[true, false]);
        assert!(!adapter.pec_enabled());

        get(&mut adapter, &config, 0x02).unwrap();
        assert!(adapter.pec_enabled());
    }

    #[test]
    fn test_pec_enable_failure_is_fatal() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_pec(Errno::EINVAL);
        let config = Config {
            pec: true,
            ..config()
        };

        match get(&mut adapter, &config, 0x00) {
            Err(Error::SetPec(Errno::EINVAL)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_pec_clear_failure_is_fatal_after_write() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_pec_clear(Errno::EIO);
        let config = Config {
            pec: true,
            ..config()
        };

        match set(&mut adapter, &config, 0x02, 0xDC) {
            Err(e @ Error::ClearPec(_)) => {
                assert_eq!(e.to_string(), "Could not clear PEC: I/O error");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(adapter.transactions().len(), 1);
        assert_eq!(adapter.transactions()[0].read_write, ReadWrite::Write);
        assert_eq!(adapter.register(ADDR, 0x02), 0xDC);
    }

    #[test]
    fn test_verify_read_runs_with_pec() {
        let mut adapter = MockSmbusAdapter::new();
        let config = Config {
            pec: true,
            readback: ReadbackMode::Transaction,
            ..config()
        };

        let report = set(&mut adapter, &config, 0x02, 0x5A).unwrap();
        assert_eq!(report.outcome, SetOutcome::Matched);
        assert_eq!(adapter.transactions().len(), 2);
        assert_eq!(adapter.transactions()[1].read_write, ReadWrite::Read);
        assert_eq!(adapter.pec_during_transactions(), &[true, true]);
        assert_eq!(adapter.pec_history(), &[true, false]);
    }

    #[test]
    fn test_functionality_query_failure_stops_get() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_functionality(Errno::ENOTTY);

        match get(&mut adapter, &config(), 0x00) {
            Err(Error::Functionality(Errno::ENOTTY)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(adapter.address(), None);
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_functionality_query_failure_stops_set() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_functionality(Errno::ENOTTY);

        match set(&mut adapter, &config(), 0x02, 0xDC) {
            Err(Error::Functionality(Errno::ENOTTY)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(adapter.address(), None);
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_rejected_address_prevents_transaction() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.reject_address(ADDR, Errno::EBUSY);

        let e = set(&mut adapter, &config(), 0x02, 0xDC).unwrap_err();
        assert_eq!(e.to_string(), "Could not set address to 0x20: Device or resource busy");
        assert!(get(&mut adapter, &config(), 0x00).is_err());
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_address_out_of_range() {
        let mut adapter = MockSmbusAdapter::new();
        let config = Config {
            address: 0x80,
            ..config()
        };

        match get(&mut adapter, &config, 0x00) {
            Err(Error::AddressOutOfRange(0x80)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(adapter.transactions().is_empty());
    }

    #[test]
    fn test_force_binds_with_override() {
        let mut adapter = MockSmbusAdapter::new();
        let config = Config {
            force: true,
            ..config()
        };

        get(&mut adapter, &config, 0x00).unwrap();
        assert!(adapter.forced());
    }

    #[test]
    fn test_failed_write_is_fatal() {
        let mut adapter = MockSmbusAdapter::new();
        adapter.fail_transactions(Errno::EREMOTEIO);

        match set(&mut adapter, &config(), 0x02, 0xDC) {
            Err(e @ Error::WriteFailed(_)) => {
                assert_eq!(e.to_string(), "Write failed");
                assert_eq!(e.code(), -(Errno::EREMOTEIO as i32));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(adapter.transactions().len(), 1);
    }

    #[test]
    fn test_demo_sequence() {
        let mut adapter = MockSmbusAdapter::new().with_write_status(WriteStatus::EchoValue);
        adapter.regmap_mut(ADDR).write_regs(DEMO_READ_REGISTER, &[0x7F]);
        let mut out = Vec::new();
        let mut err = Vec::new();

        demo(&mut adapter, &config(), &mut out, &mut err).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x7f\n\
             Value 0xdc written, readback matched\n\
             Value 0xfc written, readback matched\n\
             Value 0xdc written, readback matched\n"
        );
        assert!(err.is_empty());
        assert_eq!(adapter.register(ADDR, DEMO_WRITE_REGISTER), 0xDC);
        assert_eq!(adapter.transactions().len(), 4);
    }
}
