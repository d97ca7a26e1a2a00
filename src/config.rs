// ttfautohint/src/config.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Backend selection.
//!
//! | Variable              | Meaning                                              |
//! |-----------------------|------------------------------------------------------|
//! | `TTFAUTOHINT_BACKEND` | `library` or `executable`; unset tries both in order |
//! | `TTFAUTOHINT_LIBRARY` | path of `libttfautohint`                             |
//! | `TTFAUTOHINT_PATH`    | path of the `ttfautohint` executable                 |

use lazy_static::lazy_static;
use log::debug;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::backend::Backend;
use crate::backends::{Executable, Library};
use crate::error::Error;
use crate::options::OptionSchema;

pub const BACKEND_VAR: &str = "TTFAUTOHINT_BACKEND";
pub const LIBRARY_VAR: &str = "TTFAUTOHINT_LIBRARY";
pub const EXECUTABLE_VAR: &str = "TTFAUTOHINT_PATH";

lazy_static! {
    /// The option names and defaults documented by the engine.
    pub static ref DEFAULT_SCHEMA: OptionSchema = OptionSchema::new();
}

/// Which way to run the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process, through the shared library.
    Library,
    /// As a child process.
    Executable,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<BackendKind, Error> {
        match &*value.to_ascii_lowercase() {
            "library" | "lib" => Ok(BackendKind::Library),
            "executable" | "exe" => Ok(BackendKind::Executable),
            _ => Err(Error::InvalidConfig { variable: BACKEND_VAR, value: value.to_owned() }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// The backend to use. `None` prefers the library and falls back to the executable.
    pub backend: Option<BackendKind>,
    pub library_path: Option<PathBuf>,
    pub executable_path: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config, Error> {
        Config::from_vars(|name| env::var_os(name))
    }

    /// Reads the configuration through `var`, which looks up one variable.
    pub fn from_vars<F>(var: F) -> Result<Config, Error> where F: Fn(&str) -> Option<OsString> {
        let non_empty = |name: &str| var(name).filter(|value| !value.is_empty());

        let backend = match non_empty(BACKEND_VAR) {
            None => None,
            Some(value) => {
                let value = value.into_string().map_err(|value| Error::InvalidConfig {
                    variable: BACKEND_VAR,
                    value: value.to_string_lossy().into_owned(),
                })?;
                Some(value.parse()?)
            }
        };

        Ok(Config {
            backend,
            library_path: non_empty(LIBRARY_VAR).map(PathBuf::from),
            executable_path: non_empty(EXECUTABLE_VAR).map(PathBuf::from),
        })
    }

    /// Opens the configured backend.
    ///
    /// Without an explicit choice, a library that fails to load is reported only if no
    /// executable can be found either.
    pub fn open_backend(&self) -> Result<Box<dyn Backend>, Error> {
        let library_path = self.library_path.as_deref();
        let executable_path = self.executable_path.as_deref();
        match self.backend {
            Some(BackendKind::Library) => Ok(Box::new(open_library(library_path)?)),
            Some(BackendKind::Executable) => Ok(Box::new(Executable::find(executable_path)?)),
            None => {
                match open_library(library_path) {
                    Ok(library) => Ok(Box::new(library)),
                    Err(library_error) => {
                        debug!("falling back to the executable: {}", library_error);
                        match Executable::find(executable_path) {
                            Ok(executable) => Ok(Box::new(executable)),
                            Err(_) => Err(library_error),
                        }
                    }
                }
            }
        }
    }
}

fn open_library(path: Option<&Path>) -> Result<Library, Error> {
    let library = Library::open(path)?;
    debug!("using {}", library.path().display());
    Ok(library)
}
