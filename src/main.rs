// ttfautohint/src/main.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use log::{debug, LevelFilter};
use std::env;
use std::process;

use ttfautohint::cli::{self, Invocation};
use ttfautohint::{validate_options, Config, EngineError, Error, DEFAULT_SCHEMA};

fn main() {
    let mut invocation = match cli::parse(env::args_os()) {
        Ok(invocation) => invocation,
        Err(error) => error.exit(),
    };
    init_logger(invocation.verbose, invocation.debug);
    invocation.resolve_epoch();

    if let Err(error) = run(invocation) {
        eprintln!("ttfautohint: {}", error);
        process::exit(exit_code(&error));
    }
}

fn init_logger(verbose: bool, debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_default_env().filter_level(level).init();
}

fn run(invocation: Invocation) -> Result<(), Error> {
    let config = Config::from_env()?;
    debug!("{:?}", config);

    if invocation.version {
        println!("ttfautohint bindings {}", env!("CARGO_PKG_VERSION"));
        match config.open_backend().and_then(|backend| backend.version()) {
            Ok(version) => println!("ttfautohint engine {}", version),
            Err(error) => println!("ttfautohint engine unavailable: {}", error),
        }
        return Ok(());
    }

    let request = validate_options(&DEFAULT_SCHEMA, invocation.into_kwargs())?;
    let backend = config.open_backend()?;
    let output = backend.hint(&DEFAULT_SCHEMA, request)?;
    debug!("wrote {} bytes", output.len());
    Ok(())
}

fn exit_code(error: &Error) -> i32 {
    match *error {
        Error::Validation(_) | Error::InvalidConfig { .. } => 2,
        Error::Engine(EngineError::Process { status: Some(status), .. }) if status != 0 => status,
        _ => 1,
    }
}
