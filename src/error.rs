// ttfautohint/src/error.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Various types of errors that `ttfautohint` can return.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::memory::MAX_STRING_LENGTH;
use crate::options::CONTROL_NAME_PLACEHOLDER;

/// Reasons why a hinting call might fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The options were rejected before the engine was invoked.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine ran and reported a failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The shared library could not be loaded, or it lacks one of the expected entry points.
    #[error("cannot load '{path}': {reason}", path = .path.display())]
    LibraryNotFound {
        /// The path or library name that was tried.
        path: PathBuf,
        /// What the dynamic loader reported.
        reason: String,
    },

    /// No `ttfautohint` executable was found in any of the searched locations.
    #[error("cannot find '{0}' executable")]
    ExecutableNotFound(String),

    /// The engine reported success but handed back no data.
    #[error("the engine returned an empty font")]
    EmptyOutput,

    /// An environment variable holds a value that is not understood.
    #[error("invalid value '{value}' for {variable}")]
    InvalidConfig {
        variable: &'static str,
        value: String,
    },

    /// More options were marshalled than the variadic call can carry.
    #[error("too many options for the native call ({0})")]
    TooManyArguments(usize),

    /// A disk or pipe I/O error occurred while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reasons why a set of options might be rejected.
///
/// These are always reported before any native call is made.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// One or more option names are not recognized.
    #[error("unknown keyword argument{}: {}", plural(.0), quoted(.0))]
    UnknownOptions(Vec<String>),

    /// Two options were given that cannot be used together.
    #[error("{0} and {1} are mutually exclusive")]
    MutuallyExclusive(&'static str, &'static str),

    /// Neither `in_file` nor `in_buffer` was given.
    #[error("No input file or buffer provided")]
    NoInput,

    /// An option was given a value of the wrong kind.
    #[error("{key} type must be {expected}, not {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A stem width mode was not one of the known modes.
    #[error("{value} is not a valid StemWidthMode for {key}")]
    InvalidStemWidthMode { key: String, value: i64 },

    /// An integer option was outside the range the engine accepts.
    #[error("{key} value {value} is out of range")]
    OutOfRange { key: String, value: i64 },

    /// A text option that must be ASCII contained other characters.
    #[error("{key} must be ASCII text")]
    NonAscii { key: String },

    /// A text option was given as bytes that are not valid UTF-8.
    #[error("{key} must be valid UTF-8 text")]
    InvalidText { key: String },
}

fn plural(keys: &[String]) -> &'static str {
    if keys.len() > 1 {
        "s"
    } else {
        ""
    }
}

fn quoted(keys: &[String]) -> String {
    keys.iter()
        .map(|key| format!("'{}'", key))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A failure reported by the hinting engine itself.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// The in-process call returned a nonzero error code.
    #[error("{0}")]
    Native(NativeError),

    /// The `ttfautohint` process exited unsuccessfully.
    #[error("ttfautohint exited with {}: {}", exit_status(.status), .stderr.trim_end())]
    Process {
        /// The exit code, if the process was not killed by a signal.
        status: Option<i32>,
        /// Everything the process wrote to standard error.
        stderr: String,
    },
}

fn exit_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_owned(),
    }
}

/// An error code and message returned by `TTF_autohint`, along with the location of the
/// offending text when the error came from parsing an option string or a control file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeError {
    /// The engine's error code.
    pub code: i32,
    /// The engine's error string; may be empty.
    pub message: String,
    /// The 1-based line number in the control file, or 0.
    pub line_number: u32,
    /// The text of the offending line, if known.
    pub line: Option<String>,
    /// The 1-based column of the offending character within `line`, if known.
    pub column: Option<usize>,
    /// Display name of the control instructions, used in control file errors.
    pub control_name: Option<String>,
    /// Display name of the reference font, used in reference font errors.
    pub reference_name: Option<String>,
}

impl NativeError {
    /// Returns true if the error came from parsing the argument of an option such as
    /// `x_height_snapping_exceptions`.
    pub fn is_option_argument_error(&self) -> bool {
        self.code >= 0x100 && self.code < 0x200
    }

    /// Returns true if the error came from parsing the control instructions.
    pub fn is_control_file_error(&self) -> bool {
        self.code >= 0x200 && self.code < 0x300
    }

    /// Returns true if the error came from loading the reference font.
    pub fn is_reference_font_error(&self) -> bool {
        self.code >= 0x300 && self.code < 0x400
    }

    fn fmt_caret(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(ref line) = self.line {
            write!(f, "\n  {}", line)?;
            if let Some(column) = self.column {
                write!(f, "\n  {:>1$}", "^", column)?;
            }
        }
        Ok(())
    }
}

impl Display for NativeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_option_argument_error() {
            write!(f,
                   "An error with code 0x{:03x} occurred while parsing the argument of option `-X'",
                   self.code)?;
            if self.line.is_some() {
                f.write_str(":")?;
                self.fmt_caret(f)
            } else {
                f.write_str(".")
            }
        } else if self.is_control_file_error() {
            write!(f,
                   "{}:",
                   self.control_name.as_deref().unwrap_or(CONTROL_NAME_PLACEHOLDER))?;
            if self.line_number > 0 {
                write!(f, "{}:", self.line_number)?;
            }
            if self.line.is_some() {
                if let Some(column) = self.column {
                    write!(f, "{}:", column)?;
                }
            }
            if !self.message.is_empty() {
                write!(f, " {}", self.message)?;
            }
            write!(f, " (0x{:02X})", self.code)?;
            self.fmt_caret(f)
        } else if self.is_reference_font_error() {
            write!(f,
                   "error while loading reference font `{}'",
                   self.reference_name.as_deref().unwrap_or(""))?;
            if !self.message.is_empty() {
                write!(f, ": {}", self.message)?;
            }
            write!(f, " (0x{:02X})", self.code - 0x300)
        } else {
            write!(f, "0x{:02X}", self.code)?;
            if !self.message.is_empty() {
                write!(f, ": {}", self.message)?;
            }
            Ok(())
        }
    }
}

/// Returned when replacing a native string would exceed the 16-bit length field of a name
/// record. The string is left unchanged.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("a string of {len} bytes exceeds the maximum of {} bytes", MAX_STRING_LENGTH)]
pub struct Overflow {
    /// The length that was requested.
    pub len: usize,
}
