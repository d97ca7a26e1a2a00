// ttfautohint/src/backend.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Provides a common interface to the ways of running the hinting engine.

use crate::error::Error;
use crate::options::{validate_options, Kwargs, OptionSchema, OutFile, Request};

/// The result of a successful hinting call.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// The hinted font, when no `out_file` was given.
    Bytes(Vec<u8>),
    /// The number of bytes written to `out_file`.
    Written(usize),
}

impl Output {
    /// Returns the hinted font if it was not written out.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Output::Bytes(bytes) => Some(bytes),
            Output::Written(_) => None,
        }
    }

    /// The size of the hinted font in bytes.
    pub fn len(&self) -> usize {
        match *self {
            Output::Bytes(ref bytes) => bytes.len(),
            Output::Written(len) => len,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provides a common interface to the in-process library and the external executable.
pub trait Backend {
    /// Returns the engine's version, such as `1.8.4`.
    fn version(&self) -> Result<String, Error>;

    /// Hints the font described by a validated request.
    fn hint(&self, schema: &OptionSchema, request: Request) -> Result<Output, Error>;

    /// Validates keyword arguments against `schema` and hints the font they describe.
    fn hint_kwargs(&self, schema: &OptionSchema, kwargs: Kwargs) -> Result<Output, Error> {
        let request = validate_options(schema, kwargs)?;
        self.hint(schema, request)
    }
}

/// Hands the hinted font to the caller, or writes it to `out_file`.
pub(crate) fn deliver(out_file: Option<OutFile>, font: Vec<u8>) -> Result<Output, Error> {
    match out_file {
        None => Ok(Output::Bytes(font)),
        Some(out_file) => Ok(Output::Written(out_file.write_font(&font)?)),
    }
}
