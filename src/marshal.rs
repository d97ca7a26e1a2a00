// ttfautohint/src/marshal.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Translation of options into what the engine understands.
//!
//! `TTF_autohint` takes a comma-separated list of option names followed by one variadic argument
//! per name; the `ttfautohint` executable takes long command-line flags.

use libc::{c_int, c_uint, c_void, size_t};
use log::debug;
use std::ffi::{CString, OsString};
use std::io;

use crate::error::Error;
use crate::options::{OptionSchema, Options};

/// One variadic argument to `TTF_autohint`, typed as the engine reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arg {
    Int(c_int),
    UInt(c_uint),
    Size(size_t),
    /// `unsigned long long`, used by `epoch`.
    ULongLong(u64),
    Pointer(*const c_void),
}

impl Arg {
    /// The argument widened to one 64-bit register or stack slot.
    #[inline]
    pub fn to_word(self) -> u64 {
        match self {
            Arg::Int(value) => value as i64 as u64,
            Arg::UInt(value) => value as u64,
            Arg::Size(value) => value as u64,
            Arg::ULongLong(value) => value,
            Arg::Pointer(pointer) => pointer as usize as u64,
        }
    }

    #[inline]
    pub fn pointer<T>(pointer: *const T) -> Arg {
        Arg::Pointer(pointer as *const c_void)
    }

    #[inline]
    pub fn bool(value: bool) -> Arg {
        Arg::Int(value as c_int)
    }
}

/// Builds the option string and the matching argument list for `TTF_autohint`.
///
/// Items whose key is not a native option, or whose value is `None`, are dropped. The rest are
/// sorted by key and the keys are spelled with dashes, so `TTFA_info` comes first.
pub fn format_varargs<'a, I>(schema: &OptionSchema, items: I) -> Result<(CString, Vec<Arg>), Error>
                             where I: IntoIterator<Item = (&'a str, Option<Arg>)> {
    let mut items: Vec<(&str, Arg)> =
        items.into_iter()
             .filter(|&(key, _)| {
                 let known = schema.is_native_option(key);
                 if !known {
                     debug!("not passing unknown option `{}` to the engine", key);
                 }
                 known
             })
             .filter_map(|(key, arg)| arg.map(|arg| (key, arg)))
             .collect();
    items.sort_by(|a, b| a.0.cmp(b.0));

    let format = items.iter()
                      .map(|&(key, _)| key.replace('_', "-"))
                      .collect::<Vec<_>>()
                      .join(", ");
    let format = CString::new(format)
        .map_err(|error| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, error)))?;
    let args = items.into_iter().map(|(_, arg)| arg).collect();
    Ok((format, args))
}

/// Builds the command-line arguments for the `ttfautohint` executable, without the input and
/// output file operands.
///
/// Options at the executable's own defaults are omitted. Control instructions and reference
/// fonts are passed by path, so buffers must have been written out beforehand.
pub fn format_args(schema: &OptionSchema, options: &Options) -> Vec<OsString> {
    let defaults = Options::default();
    let mut args = Args(vec![]);

    for key in schema.user_options() {
        match key {
            "control_file" => {
                if let Some(path) = options.control.as_ref().and_then(|c| c.path.as_ref()) {
                    args.value("--control-file", path.as_os_str());
                }
            }
            "reference_file" => {
                if let Some(path) = options.reference.as_ref().and_then(|r| r.path.as_ref()) {
                    args.value("--reference", path.as_os_str());
                }
            }
            "reference_index" if options.reference_index != defaults.reference_index => {
                args.value("--reference-index", options.reference_index.to_string());
            }
            "hinting_range_min" if options.hinting_range_min != defaults.hinting_range_min => {
                args.value("--hinting-range-min", options.hinting_range_min.to_string());
            }
            "hinting_range_max" if options.hinting_range_max != defaults.hinting_range_max => {
                args.value("--hinting-range-max", options.hinting_range_max.to_string());
            }
            "hinting_limit" if options.hinting_limit != defaults.hinting_limit => {
                args.value("--hinting-limit", options.hinting_limit.to_string());
            }
            "hint_composites" => args.flag("--composites", options.hint_composites),
            "adjust_subglyphs" => args.flag("--adjust-subglyphs", options.adjust_subglyphs),
            "gray_stem_width_mode" if options.stem_width_modes() != defaults.stem_width_modes() => {
                let modes: String =
                    options.stem_width_modes().iter().map(|mode| mode.letter()).collect();
                args.value("--stem-width-mode", modes);
            }
            "increase_x_height" if options.increase_x_height != defaults.increase_x_height => {
                args.value("--increase-x-height", options.increase_x_height.to_string());
            }
            "x_height_snapping_exceptions" if !options.x_height_snapping_exceptions.is_empty() => {
                args.value("--x-height-snapping-exceptions",
                           options.x_height_snapping_exceptions.as_str());
            }
            "windows_compatibility" => {
                args.flag("--windows-compatibility", options.windows_compatibility)
            }
            "default_script" if options.default_script != defaults.default_script => {
                args.value("--default-script", options.default_script.as_str());
            }
            "fallback_script" if options.fallback_script != defaults.fallback_script => {
                args.value("--fallback-script", options.fallback_script.as_str());
            }
            "fallback_scaling" => args.flag("--fallback-scaling", options.fallback_scaling),
            "symbol" => args.flag("--symbol", options.symbol),
            "fallback_stem_width"
                if options.fallback_stem_width != defaults.fallback_stem_width => {
                args.value("--fallback-stem-width", options.fallback_stem_width.to_string());
            }
            "ignore_restrictions" => {
                args.flag("--ignore-restrictions", options.ignore_restrictions)
            }
            "family_suffix" => {
                if let Some(ref suffix) = options.family_suffix {
                    args.value("--family-suffix", suffix.as_str());
                }
            }
            "detailed_info" => args.flag("--detailed-info", options.detailed_info),
            "no_info" => args.flag("--no-info", options.no_info),
            "TTFA_info" => args.flag("--ttfa-table", options.ttfa_info),
            "dehint" => args.flag("--dehint", options.dehint),
            "epoch" => {
                if let Some(epoch) = options.epoch {
                    args.value("--epoch", epoch.to_string());
                }
            }
            "debug" => args.flag("--debug", options.debug),
            "verbose" => args.flag("--verbose", options.verbose),
            _ => {}
        }
    }

    args.0
}

struct Args(Vec<OsString>);

impl Args {
    fn flag(&mut self, flag: &str, set: bool) {
        if set {
            self.0.push(flag.into());
        }
    }

    fn value<V>(&mut self, flag: &str, value: V) where V: Into<OsString> {
        self.0.push(flag.into());
        self.0.push(value.into());
    }
}
