// ttfautohint/src/options.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The options accepted by the hinting engine and their validation.
//!
//! Callers describe a hinting request as a list of keyword arguments (`Kwargs`), the same names
//! the engine uses with underscores instead of dashes. `validate_options` checks them against an
//! `OptionSchema`, fills in defaults, reads input files, and produces a typed `Request`.

use log::debug;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::fs::File;
use std::io::{self, Read, Write};
use std::iter::FromIterator;
use std::path::{Path, PathBuf};

use crate::error::{Error, ValidationError};

/// The display name of control instructions that did not come from a named file.
pub const CONTROL_NAME_PLACEHOLDER: &str = "<control-instructions>";

/// How stem widths are adjusted for one rendering technology.
///
/// The discriminants are the integers the engine expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StemWidthMode {
    /// Stem widths are left as they are.
    Natural = -1,
    /// Stem widths are snapped to integer values, as far as the glyph shape allows.
    Quantized = 0,
    /// Stem widths are snapped aggressively to integer values.
    Strong = 1,
}

impl StemWidthMode {
    /// Reconstructs a mode from the engine's integer encoding.
    pub fn from_i64(value: i64) -> Option<StemWidthMode> {
        match value {
            -1 => Some(StemWidthMode::Natural),
            0 => Some(StemWidthMode::Quantized),
            1 => Some(StemWidthMode::Strong),
            _ => None,
        }
    }

    /// Parses the one-letter code used by `--stem-width-mode` (`n`, `q` or `s`).
    pub fn from_letter(letter: char) -> Option<StemWidthMode> {
        match letter {
            'n' => Some(StemWidthMode::Natural),
            'q' => Some(StemWidthMode::Quantized),
            's' => Some(StemWidthMode::Strong),
            _ => None,
        }
    }

    /// The mode's name as the engine documents it.
    pub fn name(self) -> &'static str {
        match self {
            StemWidthMode::Natural => "NATURAL",
            StemWidthMode::Quantized => "QUANTIZED",
            StemWidthMode::Strong => "STRONG",
        }
    }

    /// The lowercase first letter of the mode's name.
    #[inline]
    pub fn letter(self) -> char {
        self.name().as_bytes()[0].to_ascii_lowercase() as char
    }

    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A reader together with the name it should be reported under, if any.
pub struct NamedReader {
    pub reader: Box<dyn Read>,
    pub name: Option<String>,
}

/// A loosely typed option value, before validation.
pub enum Value {
    /// Same as leaving the option out.
    None,
    Bool(bool),
    Int(i64),
    /// Text. For file options this is a path.
    Text(String),
    Bytes(Vec<u8>),
    Path(PathBuf),
    Reader(NamedReader),
    Writer(Box<dyn Write>),
    StemWidthMode(StemWidthMode),
}

impl Value {
    /// Wraps an anonymous reader, such as a pipe.
    pub fn reader<R>(reader: R) -> Value where R: Read + 'static {
        Value::Reader(NamedReader {
            reader: Box::new(reader),
            name: None,
        })
    }

    /// Wraps a reader that corresponds to a named file.
    pub fn named_reader<R, S>(reader: R, name: S) -> Value
                              where R: Read + 'static, S: Into<String> {
        Value::Reader(NamedReader {
            reader: Box::new(reader),
            name: Some(name.into()),
        })
    }

    pub fn writer<W>(writer: W) -> Value where W: Write + 'static {
        Value::Writer(Box::new(writer))
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        match *self {
            Value::None => true,
            _ => false,
        }
    }

    /// The kind of value, as it appears in error messages.
    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Path(_) => "path",
            Value::Reader(_) => "reader",
            Value::Writer(_) => "writer",
            Value::StemWidthMode(_) => "StemWidthMode",
        }
    }
}

impl Debug for Value {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match *self {
            Value::None => fmt.write_str("None"),
            Value::Bool(value) => value.fmt(fmt),
            Value::Int(value) => value.fmt(fmt),
            Value::Text(ref value) => value.fmt(fmt),
            Value::Bytes(ref value) => write!(fmt, "<{} bytes>", value.len()),
            Value::Path(ref value) => value.fmt(fmt),
            Value::Reader(ref reader) => write!(fmt, "<reader {:?}>", reader.name),
            Value::Writer(_) => fmt.write_str("<writer>"),
            Value::StemWidthMode(mode) => mode.fmt(fmt),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Value {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Value {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Value {
        Value::Bytes(value.to_vec())
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Value {
        Value::Path(value)
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Value {
        Value::Path(value.to_owned())
    }
}

impl From<StemWidthMode> for Value {
    fn from(value: StemWidthMode) -> Value {
        Value::StemWidthMode(value)
    }
}

impl<T> From<Option<T>> for Value where T: Into<Value> {
    fn from(value: Option<T>) -> Value {
        match value {
            Some(value) => value.into(),
            None => Value::None,
        }
    }
}

/// Keyword arguments for a hinting call, in the order they were given.
#[derive(Debug, Default)]
pub struct Kwargs {
    entries: Vec<(String, Value)>,
}

impl Kwargs {
    #[inline]
    pub fn new() -> Kwargs {
        Kwargs::default()
    }

    /// Adds an argument, builder style.
    pub fn set<K, V>(mut self, key: K, value: V) -> Kwargs where K: Into<String>, V: Into<Value> {
        self.insert(key, value);
        self
    }

    /// Adds an argument, replacing and returning any previous value for the same key.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
                        where K: Into<String>, V: Into<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.0 == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|entry| entry.0 == key).map(|entry| &entry.1)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|entry| entry.0 == key)?;
        Some(self.entries.remove(index).1)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| &*entry.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Kwargs {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Kwargs where K: Into<String>, V: Into<Value> {
    fn from_iter<I>(iter: I) -> Kwargs where I: IntoIterator<Item = (K, V)> {
        let mut kwargs = Kwargs::new();
        for (key, value) in iter {
            kwargs.insert(key, value);
        }
        kwargs
    }
}

/// Auxiliary input (control instructions or a reference font), read into memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Auxiliary {
    /// The full contents.
    pub buffer: Vec<u8>,
    /// The file it was read from, when it was given as a path.
    pub path: Option<PathBuf>,
    /// The name used in diagnostics.
    pub name: Option<String>,
}

impl Auxiliary {
    pub fn from_buffer(buffer: Vec<u8>) -> Auxiliary {
        Auxiliary {
            buffer,
            path: None,
            name: None,
        }
    }
}

/// Fully resolved hinting options.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// The font to hint.
    pub in_buffer: Vec<u8>,
    /// Control instructions.
    pub control: Option<Auxiliary>,
    /// A reference font for blue zones and stem widths.
    pub reference: Option<Auxiliary>,
    /// The face index within a reference font collection.
    pub reference_index: i32,
    pub hinting_range_min: u32,
    pub hinting_range_max: u32,
    /// The PPEM value above which hinting is switched off; 0 means no limit.
    pub hinting_limit: u32,
    pub hint_composites: bool,
    pub adjust_subglyphs: bool,
    pub gray_stem_width_mode: StemWidthMode,
    pub gdi_cleartype_stem_width_mode: StemWidthMode,
    pub dw_cleartype_stem_width_mode: StemWidthMode,
    pub increase_x_height: u32,
    pub x_height_snapping_exceptions: String,
    pub windows_compatibility: bool,
    pub default_script: String,
    pub fallback_script: String,
    pub fallback_scaling: bool,
    pub symbol: bool,
    pub fallback_stem_width: u32,
    pub ignore_restrictions: bool,
    /// Appended to the family name in the name table.
    pub family_suffix: Option<String>,
    pub detailed_info: bool,
    pub no_info: bool,
    /// Whether to add a `TTFA` table recording these options.
    pub ttfa_info: bool,
    pub dehint: bool,
    /// Fixed timestamp for the `head` table, for reproducible output.
    pub epoch: Option<u64>,
    pub debug: bool,
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            in_buffer: vec![],
            control: None,
            reference: None,
            reference_index: 0,
            hinting_range_min: 8,
            hinting_range_max: 50,
            hinting_limit: 200,
            hint_composites: false,
            adjust_subglyphs: false,
            gray_stem_width_mode: StemWidthMode::Quantized,
            gdi_cleartype_stem_width_mode: StemWidthMode::Strong,
            dw_cleartype_stem_width_mode: StemWidthMode::Quantized,
            increase_x_height: 14,
            x_height_snapping_exceptions: String::new(),
            windows_compatibility: false,
            default_script: "latn".to_owned(),
            fallback_script: "none".to_owned(),
            fallback_scaling: false,
            symbol: false,
            fallback_stem_width: 0,
            ignore_restrictions: false,
            family_suffix: None,
            detailed_info: false,
            no_info: false,
            ttfa_info: false,
            dehint: false,
            epoch: None,
            debug: false,
            verbose: false,
        }
    }
}

impl Options {
    /// Default options for hinting `in_buffer`.
    pub fn new(in_buffer: Vec<u8>) -> Options {
        Options {
            in_buffer,
            ..Options::default()
        }
    }

    #[inline]
    pub fn control_name(&self) -> Option<&str> {
        self.control.as_ref().and_then(|control| control.name.as_deref())
    }

    #[inline]
    pub fn reference_name(&self) -> Option<&str> {
        self.reference.as_ref().and_then(|reference| reference.name.as_deref())
    }

    /// The three stem width modes in gray, GDI ClearType, DirectWrite ClearType order.
    #[inline]
    pub fn stem_width_modes(&self) -> [StemWidthMode; 3] {
        [
            self.gray_stem_width_mode,
            self.gdi_cleartype_stem_width_mode,
            self.dw_cleartype_stem_width_mode,
        ]
    }
}

/// Where the hinted font goes.
pub enum OutFile {
    Path(PathBuf),
    Writer(Box<dyn Write>),
}

impl OutFile {
    /// Writes the whole font, returning the number of bytes written.
    pub fn write_font(self, data: &[u8]) -> io::Result<usize> {
        match self {
            OutFile::Path(path) => {
                let mut file = File::create(path)?;
                file.write_all(data)?;
                Ok(data.len())
            }
            OutFile::Writer(mut writer) => {
                writer.write_all(data)?;
                writer.flush()?;
                Ok(data.len())
            }
        }
    }
}

impl Debug for OutFile {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match *self {
            OutFile::Path(ref path) => write!(fmt, "OutFile::Path({:?})", path),
            OutFile::Writer(_) => fmt.write_str("OutFile::Writer"),
        }
    }
}

/// A validated hinting request.
#[derive(Debug)]
pub struct Request {
    pub options: Options,
    /// If set, the font is written here instead of being returned.
    pub out_file: Option<OutFile>,
}

impl Request {
    pub fn new(options: Options) -> Request {
        Request {
            options,
            out_file: None,
        }
    }
}

const USER_OPTIONS: &[&str] = &[
    "in_file",
    "in_buffer",
    "out_file",
    "control_file",
    "control_buffer",
    "reference_file",
    "reference_buffer",
    "reference_index",
    "reference_name",
    "hinting_range_min",
    "hinting_range_max",
    "hinting_limit",
    "hint_composites",
    "adjust_subglyphs",
    "gray_stem_width_mode",
    "gdi_cleartype_stem_width_mode",
    "dw_cleartype_stem_width_mode",
    "increase_x_height",
    "x_height_snapping_exceptions",
    "windows_compatibility",
    "default_script",
    "fallback_script",
    "fallback_scaling",
    "symbol",
    "fallback_stem_width",
    "ignore_restrictions",
    "family_suffix",
    "detailed_info",
    "no_info",
    "TTFA_info",
    "dehint",
    "epoch",
    "debug",
    "verbose",
];

// Keys understood by `TTF_autohint`, with underscores for dashes.
const NATIVE_OPTIONS: &[&str] = &[
    "in_buffer",
    "in_buffer_len",
    "out_buffer",
    "out_buffer_len",
    "control_buffer",
    "control_buffer_len",
    "reference_buffer",
    "reference_buffer_len",
    "reference_index",
    "reference_name",
    "hinting_range_min",
    "hinting_range_max",
    "hinting_limit",
    "hint_composites",
    "adjust_subglyphs",
    "gray_stem_width_mode",
    "gdi_cleartype_stem_width_mode",
    "dw_cleartype_stem_width_mode",
    "increase_x_height",
    "x_height_snapping_exceptions",
    "windows_compatibility",
    "default_script",
    "fallback_script",
    "fallback_scaling",
    "symbol",
    "fallback_stem_width",
    "ignore_restrictions",
    "TTFA_info",
    "dehint",
    "epoch",
    "debug",
    "error_string",
    "alloc_func",
    "free_func",
    "info_callback",
    "info_post_callback",
    "info_callback_data",
    "error_callback",
    "error_callback_data",
    "progress_callback",
    "progress_callback_data",
];

/// The set of recognized option names and their defaults.
///
/// A schema is immutable once built; pass it to whatever validates or marshals options.
#[derive(Clone, Debug)]
pub struct OptionSchema {
    user_options: &'static [&'static str],
    native_options: &'static [&'static str],
    defaults: Options,
}

impl OptionSchema {
    /// The schema with the engine's documented defaults.
    #[inline]
    pub fn new() -> OptionSchema {
        OptionSchema::with_defaults(Options::default())
    }

    /// A schema whose defaults are taken from `defaults`. Its input buffer is ignored.
    pub fn with_defaults(mut defaults: Options) -> OptionSchema {
        defaults.in_buffer.clear();
        defaults.control = None;
        defaults.reference = None;
        OptionSchema {
            user_options: USER_OPTIONS,
            native_options: NATIVE_OPTIONS,
            defaults,
        }
    }

    #[inline]
    pub fn defaults(&self) -> &Options {
        &self.defaults
    }

    /// Returns true if `key` may appear in the keyword arguments of a hinting call.
    #[inline]
    pub fn is_user_option(&self, key: &str) -> bool {
        self.user_options.contains(&key)
    }

    /// Returns true if `key` is passed on to `TTF_autohint`.
    #[inline]
    pub fn is_native_option(&self, key: &str) -> bool {
        self.native_options.contains(&key)
    }

    /// All user option names, in declaration order.
    pub fn user_options(&self) -> impl Iterator<Item = &'static str> {
        self.user_options.iter().cloned()
    }
}

impl Default for OptionSchema {
    #[inline]
    fn default() -> OptionSchema {
        OptionSchema::new()
    }
}

/// Checks keyword arguments against `schema` and resolves them into a `Request`.
///
/// Every check happens before any input file is read; nothing here calls into the engine.
pub fn validate_options(schema: &OptionSchema, kwargs: Kwargs) -> Result<Request, Error> {
    let unknown: Vec<String> = kwargs.keys()
                                     .filter(|key| !schema.is_user_option(key))
                                     .map(|key| key.to_owned())
                                     .collect();
    if !unknown.is_empty() {
        return Err(ValidationError::UnknownOptions(unknown).into());
    }

    let mut raw = RawOptions {
        values: kwargs.into_iter().filter(|(_, value)| !value.is_none()).collect(),
    };
    let mut options = schema.defaults().clone();

    options.no_info = raw.take_bool("no_info", options.no_info)?;
    options.detailed_info = raw.take_bool("detailed_info", options.detailed_info)?;
    if options.no_info && options.detailed_info {
        return Err(ValidationError::MutuallyExclusive("no_info", "detailed_info").into());
    }

    let input = raw.take_source("in_file", "in_buffer")?.ok_or(ValidationError::NoInput)?;
    let control = raw.take_source("control_file", "control_buffer")?;
    let reference = raw.take_source("reference_file", "reference_buffer")?;
    let reference_name = raw.take_text("reference_name")?;
    let out_file = raw.take_out_file("out_file")?;

    options.reference_index = raw.take_int("reference_index", options.reference_index)?;
    options.hinting_range_min = raw.take_uint("hinting_range_min", options.hinting_range_min)?;
    options.hinting_range_max = raw.take_uint("hinting_range_max", options.hinting_range_max)?;
    options.hinting_limit = raw.take_uint("hinting_limit", options.hinting_limit)?;
    options.hint_composites = raw.take_bool("hint_composites", options.hint_composites)?;
    options.adjust_subglyphs = raw.take_bool("adjust_subglyphs", options.adjust_subglyphs)?;
    options.gray_stem_width_mode =
        raw.take_stem_width_mode("gray_stem_width_mode", options.gray_stem_width_mode)?;
    options.gdi_cleartype_stem_width_mode =
        raw.take_stem_width_mode("gdi_cleartype_stem_width_mode",
                                 options.gdi_cleartype_stem_width_mode)?;
    options.dw_cleartype_stem_width_mode =
        raw.take_stem_width_mode("dw_cleartype_stem_width_mode",
                                 options.dw_cleartype_stem_width_mode)?;
    options.increase_x_height = raw.take_uint("increase_x_height", options.increase_x_height)?;
    options.x_height_snapping_exceptions =
        raw.take_ascii("x_height_snapping_exceptions", options.x_height_snapping_exceptions)?;
    options.windows_compatibility =
        raw.take_bool("windows_compatibility", options.windows_compatibility)?;
    options.default_script = raw.take_ascii("default_script", options.default_script)?;
    options.fallback_script = raw.take_ascii("fallback_script", options.fallback_script)?;
    options.fallback_scaling = raw.take_bool("fallback_scaling", options.fallback_scaling)?;
    options.symbol = raw.take_bool("symbol", options.symbol)?;
    options.fallback_stem_width =
        raw.take_uint("fallback_stem_width", options.fallback_stem_width)?;
    options.ignore_restrictions =
        raw.take_bool("ignore_restrictions", options.ignore_restrictions)?;
    options.family_suffix = raw.take_text("family_suffix")?
                               .or(options.family_suffix)
                               .filter(|suffix| !suffix.is_empty());
    options.ttfa_info = raw.take_bool("TTFA_info", options.ttfa_info)?;
    options.dehint = raw.take_bool("dehint", options.dehint)?;
    options.epoch = match raw.take_int_value("epoch")? {
        Some(epoch) if epoch < 0 => {
            return Err(ValidationError::OutOfRange { key: "epoch".to_owned(), value: epoch }.into())
        }
        Some(epoch) => Some(epoch as u64),
        None => options.epoch,
    };
    options.debug = raw.take_bool("debug", options.debug)?;
    options.verbose = raw.take_bool("verbose", options.verbose)?;
    debug_assert!(raw.values.is_empty(), "unhandled options: {:?}", raw.values.keys());

    let (in_buffer, _, _) = input.read()?;
    options.in_buffer = in_buffer;

    options.control = match control {
        None => None,
        Some(control) => {
            let (buffer, path, name) = control.read()?;
            let name = name.unwrap_or_else(|| CONTROL_NAME_PLACEHOLDER.to_owned());
            Some(Auxiliary { buffer, path, name: Some(name) })
        }
    };

    options.reference = match reference {
        None => {
            if reference_name.is_some() {
                debug!("ignoring reference_name without a reference font");
            }
            None
        }
        Some(reference) => {
            let (buffer, path, name) = reference.read()?;
            Some(Auxiliary { buffer, path, name: reference_name.or(name) })
        }
    };

    Ok(Request { options, out_file })
}

// Where a file-or-buffer option pair gets its bytes.
enum Source {
    Buffer(Vec<u8>),
    Path(PathBuf),
    Reader(NamedReader),
}

impl Source {
    // Returns the contents, the originating path and a display name.
    fn read(self) -> Result<(Vec<u8>, Option<PathBuf>, Option<String>), io::Error> {
        match self {
            Source::Buffer(buffer) => Ok((buffer, None, None)),
            Source::Path(path) => {
                let mut buffer = vec![];
                File::open(&path)?.read_to_end(&mut buffer)?;
                let name = path.to_string_lossy().into_owned();
                Ok((buffer, Some(path), Some(name)))
            }
            Source::Reader(NamedReader { mut reader, name }) => {
                let mut buffer = vec![];
                reader.read_to_end(&mut buffer)?;
                Ok((buffer, None, name))
            }
        }
    }
}

struct RawOptions {
    values: HashMap<String, Value>,
}

impl RawOptions {
    fn take(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    fn take_bool(&mut self, key: &str, default: bool) -> Result<bool, ValidationError> {
        match self.take(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(value),
            Some(other) => Err(wrong_type(key, "bool", &other)),
        }
    }

    fn take_int_value(&mut self, key: &str) -> Result<Option<i64>, ValidationError> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Int(value)) => Ok(Some(value)),
            Some(other) => Err(wrong_type(key, "int", &other)),
        }
    }

    fn take_int(&mut self, key: &str, default: i32) -> Result<i32, ValidationError> {
        match self.take_int_value(key)? {
            None => Ok(default),
            Some(value) if value >= i32::min_value() as i64 && value <= i32::max_value() as i64 => {
                Ok(value as i32)
            }
            Some(value) => Err(ValidationError::OutOfRange { key: key.to_owned(), value }),
        }
    }

    fn take_uint(&mut self, key: &str, default: u32) -> Result<u32, ValidationError> {
        match self.take_int_value(key)? {
            None => Ok(default),
            Some(value) if value >= 0 && value <= i32::max_value() as i64 => Ok(value as u32),
            Some(value) => Err(ValidationError::OutOfRange { key: key.to_owned(), value }),
        }
    }

    fn take_stem_width_mode(&mut self, key: &str, default: StemWidthMode)
                            -> Result<StemWidthMode, ValidationError> {
        match self.take(key) {
            None => Ok(default),
            Some(Value::StemWidthMode(mode)) => Ok(mode),
            Some(Value::Int(value)) => {
                StemWidthMode::from_i64(value).ok_or_else(|| {
                    ValidationError::InvalidStemWidthMode { key: key.to_owned(), value }
                })
            }
            Some(other) => Err(wrong_type(key, "StemWidthMode", &other)),
        }
    }

    // Text that must stay ASCII, such as script tags.
    fn take_ascii(&mut self, key: &str, default: String) -> Result<String, ValidationError> {
        let text = match self.take(key) {
            None => return Ok(default),
            Some(Value::Text(text)) => text,
            Some(Value::Bytes(bytes)) => {
                String::from_utf8(bytes)
                    .map_err(|_| ValidationError::NonAscii { key: key.to_owned() })?
            }
            Some(other) => return Err(wrong_type(key, "str", &other)),
        };
        if text.is_ascii() {
            Ok(text)
        } else {
            Err(ValidationError::NonAscii { key: key.to_owned() })
        }
    }

    fn take_text(&mut self, key: &str) -> Result<Option<String>, ValidationError> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text)),
            Some(Value::Bytes(bytes)) => {
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|_| ValidationError::InvalidText { key: key.to_owned() })
            }
            Some(Value::Path(path)) => Ok(Some(path.to_string_lossy().into_owned())),
            Some(other) => Err(wrong_type(key, "str", &other)),
        }
    }

    fn take_source(&mut self, file_key: &'static str, buffer_key: &'static str)
                   -> Result<Option<Source>, ValidationError> {
        match (self.take(file_key), self.take(buffer_key)) {
            (Some(_), Some(_)) => Err(ValidationError::MutuallyExclusive(file_key, buffer_key)),
            (None, None) => Ok(None),
            (None, Some(Value::Bytes(buffer))) => Ok(Some(Source::Buffer(buffer))),
            (None, Some(other)) => Err(wrong_type(buffer_key, "bytes", &other)),
            (Some(Value::Path(path)), None) => Ok(Some(Source::Path(path))),
            (Some(Value::Text(path)), None) => Ok(Some(Source::Path(PathBuf::from(path)))),
            (Some(Value::Reader(reader)), None) => Ok(Some(Source::Reader(reader))),
            (Some(other), None) => Err(wrong_type(file_key, "a path or a reader", &other)),
        }
    }

    fn take_out_file(&mut self, key: &str) -> Result<Option<OutFile>, ValidationError> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Path(path)) => Ok(Some(OutFile::Path(path))),
            Some(Value::Text(path)) => Ok(Some(OutFile::Path(PathBuf::from(path)))),
            Some(Value::Writer(writer)) => Ok(Some(OutFile::Writer(writer))),
            Some(other) => Err(wrong_type(key, "a path or a writer", &other)),
        }
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::WrongType {
        key: key.to_owned(),
        expected,
        found: found.type_name(),
    }
}
