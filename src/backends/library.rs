// ttfautohint/src/backends/library.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runs the engine in-process, through `libttfautohint` loaded at runtime.

#[cfg(not(target_pointer_width = "64"))]
compile_error!("the in-process backend passes variadic arguments as 64-bit words");

use libc::{c_char, c_int, c_long, c_uint, c_void, size_t};
use libloading::Symbol;
use log::{debug, info};
use std::env;
use std::ffi::{CStr, CString};
use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};
use std::ptr;

use crate::backend::{deliver, Backend, Output};
use crate::error::{EngineError, Error, NativeError, ValidationError};
use crate::info::{build_info_string, info_callback, info_post_callback, InfoData};
use crate::marshal::{format_varargs, Arg};
use crate::memory::{Allocator, NativeBuffer, SystemAllocator};
use crate::options::{OptionSchema, Request};

/// The most variadic arguments a single `TTF_autohint` call carries.
pub const MAX_ARGS: usize = 64;

/// The signature of the `error-callback` option.
pub type ErrorFunc = extern "C" fn(error: c_int,
                                   error_string: *const c_char,
                                   line_number: c_uint,
                                   line: *const c_char,
                                   position: *const c_char,
                                   user: *mut c_void);

/// The signature of the `progress-callback` option.
pub type ProgressFunc = extern "C" fn(current_glyph: c_long,
                                      glyph_count: c_long,
                                      current_font: c_long,
                                      font_count: c_long,
                                      user: *mut c_void)
                                      -> c_int;

type VersionFn = unsafe extern "C" fn(major: *mut c_int, minor: *mut c_int, revision: *mut c_int);
type VersionStringFn = unsafe extern "C" fn() -> *const c_char;
type AutohintFn = unsafe extern "C" fn(options: *const c_char, ...) -> c_int;

#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &["libttfautohint.1.dylib", "libttfautohint.dylib"];
#[cfg(target_family = "windows")]
const LIBRARY_NAMES: &[&str] = &["libttfautohint.dll", "ttfautohint.dll"];
#[cfg(not(any(target_os = "macos", target_family = "windows")))]
const LIBRARY_NAMES: &[&str] = &["libttfautohint.so.1", "libttfautohint.so"];

/// The entry points of the engine used by a hinting call.
///
/// `Library` implements this over the real shared library; anything else that speaks the same
/// calling convention (for example a stand-in used in tests) can be driven by `hint_with_entry`.
pub trait Entry {
    /// The value of `TTF_autohint_version_string`.
    fn version_string(&self) -> Result<String, Error>;

    /// Calls `TTF_autohint` with an option string and one argument per option.
    ///
    /// # Safety
    ///
    /// Every pointer in `args` must be valid for the use the engine makes of the option it is
    /// paired with, for the duration of the call.
    unsafe fn autohint(&self, format: &CStr, args: &[Arg]) -> Result<c_int, Error>;
}

// Passes every word, padding the unused ones with zeroes. The engine reads only as many
// arguments as the option string names.
macro_rules! call_padded {
    ($function:expr, $format:expr, $words:ident, [$($index:tt)*]) => {
        ($function)($format, $($words[$index]),*)
    };
}

/// A loaded `libttfautohint`.
pub struct Library {
    #[allow(dead_code)]
    library: libloading::Library,
    path: PathBuf,
    version_fn: VersionFn,
    version_string_fn: VersionStringFn,
    autohint_fn: AutohintFn,
    allocator: SystemAllocator,
}

impl Library {
    /// Loads the library from `path`, or from the default locations if `path` is `None`.
    ///
    /// The default locations are the directory of the running executable, then the dynamic
    /// loader's search path.
    pub fn open(path: Option<&Path>) -> Result<Library, Error> {
        if let Some(path) = path {
            return Library::open_path(path);
        }

        let mut last_error = None;
        for candidate in default_candidates() {
            match Library::open_path(&candidate) {
                Ok(library) => return Ok(library),
                Err(error) => {
                    debug!("{}", error);
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::LibraryNotFound {
            path: PathBuf::from(LIBRARY_NAMES[0]),
            reason: "no candidate locations".to_owned(),
        }))
    }

    fn open_path(path: &Path) -> Result<Library, Error> {
        let not_found = |reason: String| Error::LibraryNotFound {
            path: path.to_owned(),
            reason,
        };

        unsafe {
            let library = libloading::Library::new(path).map_err(|e| not_found(e.to_string()))?;
            let (version_fn, version_string_fn, autohint_fn) = {
                let version: Symbol<VersionFn> = library.get(b"TTF_autohint_version\0")
                                                        .map_err(|e| not_found(e.to_string()))?;
                let version_string: Symbol<VersionStringFn> =
                    library.get(b"TTF_autohint_version_string\0")
                           .map_err(|e| not_found(e.to_string()))?;
                let autohint: Symbol<AutohintFn> = library.get(b"TTF_autohint\0")
                                                          .map_err(|e| not_found(e.to_string()))?;
                (*version, *version_string, *autohint)
            };
            debug!("loaded {}", path.display());

            Ok(Library {
                library,
                path: path.to_owned(),
                version_fn,
                version_string_fn,
                autohint_fn,
                allocator: SystemAllocator,
            })
        }
    }

    /// The path the library was loaded from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The engine's major, minor and revision numbers.
    pub fn version_numbers(&self) -> (i32, i32, i32) {
        let (mut major, mut minor, mut revision) = (0, 0, 0);
        unsafe { (self.version_fn)(&mut major, &mut minor, &mut revision) }
        (major, minor, revision)
    }
}

impl Debug for Library {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("Library").field("path", &self.path).finish()
    }
}

// Used when the library reports no version string.
fn format_version((major, minor, revision): (i32, i32, i32)) -> String {
    if revision == 0 {
        format!("{}.{}", major, minor)
    } else {
        format!("{}.{}.{}", major, minor, revision)
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![];
    if let Some(dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_owned)) {
        candidates.extend(LIBRARY_NAMES.iter()
                                       .map(|name| dir.join(name))
                                       .filter(|path| path.is_file()));
    }
    candidates.extend(LIBRARY_NAMES.iter().map(PathBuf::from));
    candidates
}

impl Entry for Library {
    fn version_string(&self) -> Result<String, Error> {
        let string = unsafe { (self.version_string_fn)() };
        if !string.is_null() {
            let version = unsafe { CStr::from_ptr(string) }.to_string_lossy().into_owned();
            if !version.is_empty() {
                return Ok(version);
            }
        }
        Ok(format_version(self.version_numbers()))
    }

    unsafe fn autohint(&self, format: &CStr, args: &[Arg]) -> Result<c_int, Error> {
        if args.len() > MAX_ARGS {
            return Err(Error::TooManyArguments(args.len()));
        }
        let mut words = [0u64; MAX_ARGS];
        for (word, arg) in words.iter_mut().zip(args) {
            *word = arg.to_word();
        }

        Ok(call_padded!(self.autohint_fn, format.as_ptr(), words, [
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
            32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
            60 61 62 63
        ]))
    }
}

impl Backend for Library {
    fn version(&self) -> Result<String, Error> {
        self.version_string()
    }

    fn hint(&self, schema: &OptionSchema, request: Request) -> Result<Output, Error> {
        hint_with_entry(self, &self.allocator, schema, request)
    }
}

/// Hints a font through any implementation of the engine's entry points.
///
/// `allocator` is handed to the engine for its output and for the name strings the info
/// callbacks resize, and is used to release the output afterwards.
pub fn hint_with_entry<E>(entry: &E,
                          allocator: &dyn Allocator,
                          schema: &OptionSchema,
                          request: Request)
                          -> Result<Output, Error>
                          where E: Entry + ?Sized {
    let Request { options, out_file } = request;

    let info_string = if options.no_info {
        None
    } else {
        Some(build_info_string(&entry.version_string()?, options.detailed_info, &options))
    };
    let mut info_data = InfoData::new(info_string, options.family_suffix.clone(), allocator);
    let mut error_data = ErrorData::default();
    let mut progress_data = ProgressData::default();

    let x_height_snapping_exceptions =
        c_string("x_height_snapping_exceptions", &options.x_height_snapping_exceptions)?;
    let default_script = c_string("default_script", &options.default_script)?;
    let fallback_script = c_string("fallback_script", &options.fallback_script)?;
    let reference_name = match options.reference_name() {
        Some(name) => Some(c_string("reference_name", name)?),
        None => None,
    };

    let mut out_buffer: *mut u8 = ptr::null_mut();
    let mut out_buffer_len: size_t = 0;
    let mut error_string: *const c_char = ptr::null();

    let control = options.control.as_ref();
    let reference = options.reference.as_ref();
    let info_data_ptr = &mut info_data as *mut InfoData as *const c_void;
    let wants_info = info_data.is_needed();
    let wants_post = info_data.needs_post_callback();

    let items = vec![
        ("in_buffer", Some(Arg::pointer(options.in_buffer.as_ptr()))),
        ("in_buffer_len", Some(Arg::Size(options.in_buffer.len()))),
        ("out_buffer", Some(Arg::pointer(&mut out_buffer as *mut *mut u8))),
        ("out_buffer_len", Some(Arg::pointer(&mut out_buffer_len as *mut size_t))),
        ("control_buffer", control.map(|control| Arg::pointer(control.buffer.as_ptr()))),
        ("control_buffer_len", control.map(|control| Arg::Size(control.buffer.len()))),
        ("reference_buffer", reference.map(|reference| Arg::pointer(reference.buffer.as_ptr()))),
        ("reference_buffer_len", reference.map(|reference| Arg::Size(reference.buffer.len()))),
        ("reference_index", Some(Arg::Int(options.reference_index))),
        ("reference_name", reference_name.as_ref().map(|name| Arg::pointer(name.as_ptr()))),
        ("hinting_range_min", Some(Arg::Int(options.hinting_range_min as c_int))),
        ("hinting_range_max", Some(Arg::Int(options.hinting_range_max as c_int))),
        ("hinting_limit", Some(Arg::Int(options.hinting_limit as c_int))),
        ("hint_composites", Some(Arg::bool(options.hint_composites))),
        ("adjust_subglyphs", Some(Arg::bool(options.adjust_subglyphs))),
        ("gray_stem_width_mode", Some(Arg::Int(options.gray_stem_width_mode.as_i32()))),
        ("gdi_cleartype_stem_width_mode",
         Some(Arg::Int(options.gdi_cleartype_stem_width_mode.as_i32()))),
        ("dw_cleartype_stem_width_mode",
         Some(Arg::Int(options.dw_cleartype_stem_width_mode.as_i32()))),
        ("increase_x_height", Some(Arg::Int(options.increase_x_height as c_int))),
        ("x_height_snapping_exceptions",
         Some(Arg::pointer(x_height_snapping_exceptions.as_ptr()))),
        ("windows_compatibility", Some(Arg::bool(options.windows_compatibility))),
        ("default_script", Some(Arg::pointer(default_script.as_ptr()))),
        ("fallback_script", Some(Arg::pointer(fallback_script.as_ptr()))),
        ("fallback_scaling", Some(Arg::bool(options.fallback_scaling))),
        ("symbol", Some(Arg::bool(options.symbol))),
        ("fallback_stem_width", Some(Arg::Int(options.fallback_stem_width as c_int))),
        ("ignore_restrictions", Some(Arg::bool(options.ignore_restrictions))),
        ("TTFA_info", Some(Arg::bool(options.ttfa_info))),
        ("dehint", Some(Arg::bool(options.dehint))),
        ("epoch", options.epoch.map(Arg::ULongLong)),
        ("debug", Some(Arg::bool(options.debug))),
        ("error_string", Some(Arg::pointer(&mut error_string as *mut *const c_char))),
        ("alloc_func", Some(Arg::Pointer(allocator.alloc_func() as *const c_void))),
        ("free_func", Some(Arg::Pointer(allocator.free_func() as *const c_void))),
        ("info_callback",
         if wants_info { Some(Arg::Pointer(info_callback as *const c_void)) } else { None }),
        ("info_post_callback",
         if wants_post { Some(Arg::Pointer(info_post_callback as *const c_void)) } else { None }),
        ("info_callback_data", if wants_info { Some(Arg::Pointer(info_data_ptr)) } else { None }),
        ("error_callback", Some(Arg::Pointer(error_callback as *const c_void))),
        ("error_callback_data", Some(Arg::pointer(&mut error_data as *mut ErrorData))),
        ("progress_callback",
         if options.verbose {
             Some(Arg::Pointer(progress_callback as *const c_void))
         } else {
             None
         }),
        ("progress_callback_data",
         if options.verbose {
             Some(Arg::pointer(&mut progress_data as *mut ProgressData))
         } else {
             None
         }),
    ];

    let (format, args) = format_varargs(schema, items)?;
    debug!("calling TTF_autohint(\"{}\", ...) with {} arguments",
           format.to_string_lossy(),
           args.len());
    let code = unsafe { entry.autohint(&format, &args)? };

    // Whatever the outcome, the engine's output belongs to us now.
    let output = unsafe { NativeBuffer::from_raw(out_buffer, out_buffer_len, allocator) };

    if code != 0 {
        debug!("TTF_autohint returned 0x{:02X}, error callback saw 0x{:02X}",
               code,
               error_data.code);
        let message = error_data.message.take().unwrap_or_else(|| {
            if error_string.is_null() {
                String::new()
            } else {
                unsafe { CStr::from_ptr(error_string).to_string_lossy().into_owned() }
            }
        });
        return Err(EngineError::Native(NativeError {
            code,
            message,
            line_number: error_data.line_number,
            line: error_data.line.take(),
            column: error_data.column,
            control_name: options.control_name().map(ToOwned::to_owned),
            reference_name: options.reference_name().map(ToOwned::to_owned),
        }).into());
    }

    if output.is_null() || output.as_bytes().is_empty() {
        return Err(Error::EmptyOutput);
    }
    let font = output.as_bytes().to_vec();
    drop(output);
    drop(info_data);

    deliver(out_file, font)
}

fn c_string(key: &str, text: &str) -> Result<CString, Error> {
    CString::new(text).map_err(|_| ValidationError::InvalidText { key: key.to_owned() }.into())
}

/// What the engine reported through the error callback.
#[derive(Debug, Default)]
struct ErrorData {
    code: c_int,
    message: Option<String>,
    line_number: u32,
    line: Option<String>,
    column: Option<usize>,
}

extern "C" fn error_callback(error: c_int,
                             error_string: *const c_char,
                             line_number: c_uint,
                             line: *const c_char,
                             position: *const c_char,
                             user: *mut c_void) {
    if user.is_null() {
        return;
    }
    unsafe {
        let data = &mut *(user as *mut ErrorData);
        data.code = error;
        data.message = c_str_to_string(error_string).filter(|message| !message.is_empty());
        data.line_number = line_number;
        data.line = c_str_to_string(line);
        data.column = if !line.is_null() && !position.is_null() && position >= line {
            Some(position as usize - line as usize + 1)
        } else {
            None
        };
    }
}

unsafe fn c_str_to_string(string: *const c_char) -> Option<String> {
    if string.is_null() {
        None
    } else {
        Some(CStr::from_ptr(string).to_string_lossy().into_owned())
    }
}

#[derive(Debug, Default)]
struct ProgressData {
    // The font and the tenth of the glyphs last reported.
    last_step: Option<(c_long, c_long)>,
}

extern "C" fn progress_callback(current_glyph: c_long,
                                glyph_count: c_long,
                                current_font: c_long,
                                font_count: c_long,
                                user: *mut c_void)
                                -> c_int {
    if user.is_null() {
        return 0;
    }
    let data = unsafe { &mut *(user as *mut ProgressData) };
    let percent = if glyph_count > 0 {
        (current_glyph + 1).max(0) * 100 / glyph_count
    } else {
        100
    };
    let step = (current_font, percent / 10);
    if data.last_step != Some(step) {
        data.last_step = Some(step);
        if font_count > 1 {
            info!("font {}/{}: {}% of {} glyphs",
                  current_font + 1,
                  font_count,
                  step.1 * 10,
                  glyph_count);
        } else {
            info!("{}% of {} glyphs", step.1 * 10, glyph_count);
        }
    }
    0
}
