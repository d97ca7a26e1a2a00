// ttfautohint/src/lib.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `ttfautohint` hints TrueType fonts with the ttfautohint engine.
//!
//! The engine runs either in-process, through `libttfautohint` loaded at runtime
//! (`backends::Library`), or as a `ttfautohint` child process (`backends::Executable`). Both take
//! the same options, passed as keyword arguments:
//!
//! ```no_run
//! use ttfautohint::{ttfautohint, Kwargs};
//!
//! let font = std::fs::read("MyFont-Regular.ttf")?;
//! let hinted = ttfautohint(Kwargs::new().set("in_buffer", font)
//!                                       .set("family_suffix", " Hinted")
//!                                       .set("detailed_info", true))?;
//! std::fs::write("MyFontHinted-Regular.ttf", hinted.into_bytes().unwrap_or_default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Besides hinting, the library edits the `name` table as the engine reports it: version strings
//! get a description of the hinting parameters, and family names can get a suffix.

pub mod backend;
pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod info;
pub mod marshal;
pub mod memory;
pub mod options;

pub use crate::backend::{Backend, Output};
pub use crate::config::{Config, DEFAULT_SCHEMA};
pub use crate::error::{EngineError, Error, NativeError, ValidationError};
pub use crate::options::{validate_options, Kwargs, OptionSchema, Options, StemWidthMode, Value};

/// Hints a font with the default options schema and the backend chosen by the environment.
///
/// Options are validated before any backend is loaded, so invalid options are reported even
/// when the engine is not installed.
pub fn ttfautohint(kwargs: Kwargs) -> Result<Output, Error> {
    let config = Config::from_env()?;
    let request = validate_options(&DEFAULT_SCHEMA, kwargs)?;
    let backend = config.open_backend()?;
    backend.hint(&DEFAULT_SCHEMA, request)
}
