// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! # smbus-access
//!
//! Single byte register access on SMBus peripherals.  The crate wraps
//! the Linux kernel interface for SMBus transactions from userspace:
//! https://www.kernel.org/doc/Documentation/i2c/dev-interface
//!
//! Every command follows the same path: open the bus, check the
//! adapter functionality, bind the peripheral address, run one
//! transaction and report the outcome.

#[macro_use]
extern crate nix;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod capability;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod ffi;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod linux;
pub mod mock;
pub mod smbus;

pub use crate::error::{Error, Result};
