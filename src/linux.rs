// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use nix::errno::Errno;
use std::fs::File;
use std::fs::OpenOptions;
use std::os::unix::prelude::*;
use std::path::Path;

use crate::core::{Functionality, SmbusAdapter, Transaction};
use crate::error::{Error, Result};
use crate::ffi;

/// An open i2c-dev character device (e.g. `/dev/i2c-1`)
///
/// The kernel exposes one device per bus.  The file is held for as long
/// as the value lives and closed on drop.
pub struct LinuxSmbusBus {
    devfile: File,
}

impl AsRawFd for LinuxSmbusBus {
    fn as_raw_fd(&self) -> RawFd {
        self.devfile.as_raw_fd()
    }
}

impl LinuxSmbusBus {
    /// Open the bus device node read-write
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LinuxSmbusBus> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::Open {
                path: path.display().to_string(),
                source,
            })?;
        debug!("opened {}", path.display());
        Ok(LinuxSmbusBus { devfile: file })
    }
}

impl SmbusAdapter for LinuxSmbusBus {
    fn functionality(&mut self) -> std::result::Result<Functionality, Errno> {
        let funcs = ffi::i2c_get_functionality(self.as_raw_fd())?;
        debug!("I2C_FUNCS -> {:#010x}", funcs.bits());
        Ok(funcs)
    }

    /// Typically the address is expected to be 7-bits but 10-bit addresses
    /// may be supported by the kernel driver in some cases.  Little validation
    /// is done here as the kernel is good at making sure things are valid.
    fn set_peripheral_address(
        &mut self,
        address: u16,
        force: bool,
    ) -> std::result::Result<(), Errno> {
        debug!("I2C_SLAVE{} {:#04x}", if force { "_FORCE" } else { "" }, address);
        if force {
            ffi::i2c_set_slave_address_force(self.as_raw_fd(), address)
        } else {
            ffi::i2c_set_slave_address(self.as_raw_fd(), address)
        }
    }

    fn set_pec(&mut self, enable: bool) -> std::result::Result<(), Errno> {
        debug!("I2C_PEC {}", enable);
        ffi::i2c_set_smbus_pec(self.as_raw_fd(), enable)
    }

    fn smbus_access(&mut self, transaction: &mut Transaction) -> std::result::Result<i32, Errno> {
        ffi::i2c_smbus_access(self.as_raw_fd(), transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        match LinuxSmbusBus::open("/dev/i2c-does-not-exist") {
            Err(ref e @ Error::Open { .. }) => {
                assert_eq!(e.errno(), Some(Errno::ENOENT));
                assert!(e.to_string().starts_with("Could not open file `/dev/i2c-does-not-exist'"));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("opened a device that should not exist"),
        }
    }
}
