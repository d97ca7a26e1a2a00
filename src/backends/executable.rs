// ttfautohint/src/backends/executable.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runs the engine as a `ttfautohint` child process.
//!
//! The font is piped through standard input and output. Control instructions and reference
//! fonts that were given as buffers are written to temporary files first, since the executable
//! only accepts them by path. Each temporary file is named after the input's display name, so
//! that the executable's detailed info string names it the same way the library would.

use log::{debug, info};
use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tempfile::TempDir;

use crate::backend::{deliver, Backend, Output};
use crate::error::{EngineError, Error};
use crate::marshal::format_args;
use crate::options::{Auxiliary, OptionSchema, Request};

/// The name of the executable, without any platform suffix.
pub const EXECUTABLE_NAME: &str = "ttfautohint";

/// A `ttfautohint` executable.
#[derive(Clone, Debug, PartialEq)]
pub struct Executable {
    path: PathBuf,
}

impl Executable {
    /// Uses the executable at `path` without checking it.
    pub fn new<P>(path: P) -> Executable where P: Into<PathBuf> {
        Executable { path: path.into() }
    }

    /// Finds the executable.
    ///
    /// An explicit path is used as is. Otherwise the directory of the running program is
    /// searched, then `PATH`. This program itself is never picked.
    pub fn find(path: Option<&Path>) -> Result<Executable, Error> {
        if let Some(path) = path {
            return Ok(Executable::new(path));
        }

        let file_name = format!("{}{}", EXECUTABLE_NAME, env::consts::EXE_SUFFIX);
        let current_exe = env::current_exe().ok().and_then(|exe| fs::canonicalize(exe).ok());

        let mut dirs = vec![];
        if let Some(dir) = current_exe.as_ref().and_then(|exe| exe.parent()) {
            dirs.push(dir.to_owned());
        }
        if let Some(paths) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&paths));
        }

        for dir in dirs {
            let candidate = dir.join(&file_name);
            if !candidate.is_file() {
                continue;
            }
            if current_exe.is_some() && fs::canonicalize(&candidate).ok() == current_exe {
                debug!("skipping {}, which is this program", candidate.display());
                continue;
            }
            debug!("found {}", candidate.display());
            return Ok(Executable::new(candidate));
        }
        Err(Error::ExecutableNotFound(file_name))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command(&self) -> Command {
        Command::new(&self.path)
    }
}

impl Backend for Executable {
    fn version(&self) -> Result<String, Error> {
        let output = self.command().arg("--version").stdin(Stdio::null()).output()?;
        if !output.status.success() {
            return Err(EngineError::Process {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }.into());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or("");
        Ok(first_line.split_whitespace().last().unwrap_or("").to_owned())
    }

    fn hint(&self, schema: &OptionSchema, request: Request) -> Result<Output, Error> {
        let Request { mut options, out_file } = request;

        // Kept alive until the child has exited.
        let _control_dir = materialize(&mut options.control, "control-instructions.txt")?;
        let _reference_dir = materialize(&mut options.reference, "reference.ttf")?;

        let args: Vec<OsString> = format_args(schema, &options);
        debug!("running {} {:?}", self.path.display(), args);

        let mut child = self.command()
                            .args(&args)
                            .stdin(Stdio::piped())
                            .stdout(Stdio::piped())
                            .stderr(Stdio::piped())
                            .spawn()?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "child process has no standard input")
        })?;
        let input = options.in_buffer;
        let writer = thread::spawn(move || -> io::Result<()> {
            stdin.write_all(&input)?;
            stdin.flush()
        });

        let output = child.wait_with_output()?;
        let written = writer.join().map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "writing to the child process panicked")
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(EngineError::Process { status: output.status.code(), stderr }.into());
        }
        written?;
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            info!("{}", line);
        }

        if output.stdout.is_empty() {
            return Err(Error::EmptyOutput);
        }
        deliver(out_file, output.stdout)
    }
}

// Writes a buffer without a backing file into a temporary directory and points the input at
// it. The file takes the last component of the display name, or `fallback_name`.
fn materialize(auxiliary: &mut Option<Auxiliary>, fallback_name: &str)
               -> Result<Option<TempDir>, Error> {
    let auxiliary = match auxiliary.as_mut() {
        Some(auxiliary) if auxiliary.path.is_none() => auxiliary,
        _ => return Ok(None),
    };
    let dir = tempfile::tempdir()?;
    let file_name = auxiliary.name
                             .as_deref()
                             .and_then(|name| Path::new(name).file_name())
                             .map(ToOwned::to_owned);

    let path = match file_name {
        Some(file_name) => {
            let path = dir.path().join(file_name);
            match write_file(&path, &auxiliary.buffer) {
                Ok(()) => path,
                Err(error) => {
                    debug!("cannot write {}, using {}: {}", path.display(), fallback_name, error);
                    let path = dir.path().join(fallback_name);
                    write_file(&path, &auxiliary.buffer)?;
                    path
                }
            }
        }
        None => {
            let path = dir.path().join(fallback_name);
            write_file(&path, &auxiliary.buffer)?;
            path
        }
    };
    auxiliary.path = Some(path);
    Ok(Some(dir))
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()
}
