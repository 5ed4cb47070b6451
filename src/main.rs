// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Reads or writes one register byte of an SMBus peripheral

use docopt::{ArgvMap, Docopt};
use std::env::args;
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[cfg(any(target_os = "linux", target_os = "android"))]
use smbus_access::command;
use smbus_access::config::{self, Config, ReadbackMode};
use smbus_access::Result;

const USAGE: &str = "
Reads or writes a single register byte of an SMBus peripheral via
Linux i2c-dev.

Usage:
  smbus-access [options] get <address> <register>
  smbus-access [options] set <address> <register> <value>
  smbus-access [options] demo
  smbus-access (-h | --help)
  smbus-access --version

Commands:
  get          Read <register> and print its value.
  set          Write <value> to <register> and report the readback.
  demo         Read register 0x00 of 0x20, then write 0xdc, 0xfc, 0xdc
               to its register 0x02.

Options:
  -h --help          Show this help text.
  --version          Show version.
  -b --bus=<n>       I2C bus number [default: 0].
  -d --device=<dev>  Device node to open instead of /dev/i2c-<n>.
  -f --force         Bind the address even if a driver already uses it.
  -p --pec           Enable packet error checking.
  --verify           Check writes with a separate read transaction.
  --interval=<ms>    Pause between demo writes [default: 1000].
";

fn config_from_args(args: &ArgvMap) -> Result<Config> {
    let mut config = Config::for_bus(config::parse_number(args.get_str("--bus"))?);
    match args.get_str("--device") {
        "" => {}
        device => config.device = PathBuf::from(device),
    }
    match args.get_str("<address>") {
        "" => {}
        address => config.address = config::parse_address(address)?,
    }
    config.force = args.get_bool("--force");
    config.pec = args.get_bool("--pec");
    if args.get_bool("--verify") {
        config.readback = ReadbackMode::Transaction;
    }
    config.interval = Duration::from_millis(u64::from(config::parse_number(
        args.get_str("--interval"),
    )?));
    Ok(config)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn run(args: &ArgvMap) -> Result<()> {
    let config = config_from_args(args)?;
    let mut bus = command::open(&config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();

    if args.get_bool("get") {
        let register = config::parse_u8(args.get_str("<register>"), "Data address")?;
        let report = command::get(&mut bus, &config, register)?;
        command::write_warnings(&mut err, &report.warnings)?;
        writeln!(out, "{}", report)?;
    } else if args.get_bool("set") {
        let register = config::parse_u8(args.get_str("<register>"), "Data address")?;
        let value = config::parse_u8(args.get_str("<value>"), "Data value")?;
        let report = command::set(&mut bus, &config, register, value)?;
        command::write_warnings(&mut err, &report.warnings)?;
        writeln!(out, "{}", report)?;
    } else if args.get_bool("demo") {
        command::demo(&mut bus, &config, &mut out, &mut err)?;
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn run(args: &ArgvMap) -> Result<()> {
    config_from_args(args)?;
    Err(smbus_access::Error::Usage(
        "i2c-dev is only available on Linux".to_string(),
    ))
}

fn main() {
    env_logger::init();

    let args = Docopt::new(USAGE)
        .and_then(|d| {
            d.argv(args())
                .version(Some(env!("CARGO_PKG_VERSION").to_string()))
                .parse()
        })
        .unwrap_or_else(|e| e.exit());

    if let Err(e) = run(&args) {
        log::debug!("exiting with status code {}", e.code());
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
