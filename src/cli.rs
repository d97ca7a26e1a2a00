// ttfautohint/src/cli.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `ttfautohint` command line, modeled on the engine's own executable.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::warn;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use crate::options::{Kwargs, StemWidthMode, Value};

/// The standard input or output placeholder for file operands.
pub const STDIO_PLACEHOLDER: &str = "-";

/// A parsed command line.
#[derive(Debug)]
pub struct Invocation {
    /// The input font, or `None` for standard input.
    pub in_file: Option<PathBuf>,
    /// The output font, or `None` for standard output.
    pub out_file: Option<PathBuf>,
    /// Hinting options other than the input and output.
    pub kwargs: Kwargs,
    /// Whether to print versions and exit.
    pub version: bool,
    pub verbose: bool,
    pub debug: bool,
    /// The `--epoch` value, or the resolved `SOURCE_DATE_EPOCH` once `resolve_epoch` has run.
    pub epoch: Option<i64>,
    /// `SOURCE_DATE_EPOCH` as found in the environment, not yet checked.
    pub source_date_epoch: Option<String>,
}

impl Invocation {
    /// Falls back to `SOURCE_DATE_EPOCH` when no `--epoch` was given.
    ///
    /// An invalid value is logged and ignored, so call this once logging is set up.
    pub fn resolve_epoch(&mut self) {
        if let Some(value) = self.source_date_epoch.take() {
            if self.epoch.is_none() {
                self.epoch = parse_source_date_epoch(&value);
            }
        }
    }

    /// The keyword arguments for a hinting call, with the input and output attached.
    pub fn into_kwargs(mut self) -> Kwargs {
        self.resolve_epoch();
        let mut kwargs = self.kwargs;
        if let Some(epoch) = self.epoch {
            kwargs.insert("epoch", epoch);
        }
        match self.in_file {
            Some(path) => kwargs.insert("in_file", path),
            None => kwargs.insert("in_file", Value::reader(io::stdin())),
        };
        match self.out_file {
            Some(path) => kwargs.insert("out_file", path),
            None => kwargs.insert("out_file", Value::writer(io::stdout())),
        };
        kwargs
    }
}

pub fn command() -> Command {
    let number = |id: &'static str, short: char, long: &'static str, help: &'static str| {
        Arg::new(id).short(short)
                    .long(long)
                    .value_name("N")
                    .value_parser(value_parser!(u32))
                    .help(help)
    };
    let text = |id: &'static str, short: char, long: &'static str, help: &'static str| {
        Arg::new(id).short(short).long(long).value_name("S").help(help)
    };
    let switch = |id: &'static str, short: char, long: &'static str, help: &'static str| {
        Arg::new(id).short(short).long(long).action(ArgAction::SetTrue).help(help)
    };

    Command::new("ttfautohint")
        .author("The Pathfinder Project Developers")
        .about("Add new, auto-generated hints to a TrueType font")
        .disable_version_flag(true)
        .arg(Arg::new("IN-FILE").index(1).default_value(STDIO_PLACEHOLDER).help("Input font"))
        .arg(Arg::new("OUT-FILE").index(2).default_value(STDIO_PLACEHOLDER).help("Output font"))
        .arg(number("hinting_range_min", 'l', "hinting-range-min",
                    "The minimum PPEM value for hint sets [8]"))
        .arg(number("hinting_range_max", 'r', "hinting-range-max",
                    "The maximum PPEM value for hint sets [50]"))
        .arg(number("hinting_limit", 'G', "hinting-limit",
                    "Switch off hinting above this PPEM value [200]; 0 means no limit"))
        .arg(number("increase_x_height", 'x', "increase-x-height",
                    "Increase the x height for sizes in the range 6<=PPEM<=N [14]; 0 switches \
                     this off"))
        .arg(text("x_height_snapping_exceptions", 'X', "x-height-snapping-exceptions",
                  "Specify a comma-separated list of x-height snapping exceptions"))
        .arg(number("fallback_stem_width", 'H', "fallback-stem-width",
                    "Set the default stem width in font units for the fallback script"))
        .arg(text("default_script", 'D', "default-script", "Set the default script [latn]"))
        .arg(text("fallback_script", 'f', "fallback-script", "Set the fallback script [none]"))
        .arg(switch("fallback_scaling", 'S', "fallback-scaling",
                    "Use scaling only for the fallback script"))
        .arg(Arg::new("control_file").short('m')
                                     .long("control-file")
                                     .value_name("FILE")
                                     .value_parser(value_parser!(PathBuf))
                                     .help("Get control instructions from FILE"))
        .arg(Arg::new("reference_file").short('R')
                                       .long("reference")
                                       .value_name("FILE")
                                       .value_parser(value_parser!(PathBuf))
                                       .help("Derive blue zones from reference font FILE"))
        .arg(Arg::new("reference_index").short('Z')
                                        .long("reference-index")
                                        .value_name("N")
                                        .value_parser(value_parser!(i32))
                                        .help("Face index of the reference font [0]"))
        .arg(Arg::new("stem_width_mode").short('a')
                                        .long("stem-width-mode")
                                        .value_name("S")
                                        .value_parser(parse_stem_width_modes)
                                        .conflicts_with("strong_stem_width")
                                        .help("Stem width and positioning mode for gray, GDI \
                                               ClearType and DirectWrite ClearType, as three \
                                               letters out of `n`, `q` and `s` [qsq]"))
        .arg(Arg::new("strong_stem_width").short('w')
                                          .long("strong-stem-width")
                                          .value_name("S")
                                          .hide(true)
                                          .help("Use strong stem widths for the renderers \
                                                 named by `g`, `G` and `D`"))
        .arg(switch("hint_composites", 'c', "composites",
                    "Hint glyph composites also"))
        .arg(switch("adjust_subglyphs", 'p', "adjust-subglyphs",
                    "Handle subglyph adjustments in exotic fonts"))
        .arg(switch("symbol", 's', "symbol",
                    "Input is a symbol font"))
        .arg(switch("windows_compatibility", 'W', "windows-compatibility",
                    "Add blue zones for `usWinAscent' and `usWinDescent'"))
        .arg(switch("ignore_restrictions", 'i', "ignore-restrictions",
                    "Override font license restrictions"))
        .arg(switch("no_info", 'n', "no-info",
                    "Don't add ttfautohint info to the version string(s) in the `name' table")
             .conflicts_with("detailed_info"))
        .arg(switch("detailed_info", 'I', "detailed-info",
                    "Add detailed ttfautohint info to the version string(s) in the `name' table"))
        .arg(text("family_suffix", 'F', "family-suffix",
                  "Append suffix to the family name string(s) in the `name' table"))
        .arg(switch("TTFA_info", 't', "ttfa-table",
                    "Add TTFA information table"))
        .arg(switch("dehint", 'd', "dehint",
                    "Remove all hints"))
        .arg(Arg::new("epoch").long("epoch")
                              .value_name("N")
                              .value_parser(value_parser!(i64).range(0..))
                              .help("Seconds since 1970-01-01 for the `head' table timestamps; \
                                     defaults to $SOURCE_DATE_EPOCH"))
        .arg(Arg::new("debug").long("debug")
                              .action(ArgAction::SetTrue)
                              .help("Print debugging information"))
        .arg(switch("verbose", 'v', "verbose", "Show progress information"))
        .arg(switch("version", 'V', "version", "Print version information and exit"))
}

/// Parses a command line, keeping `SOURCE_DATE_EPOCH` for `Invocation::resolve_epoch`.
pub fn parse<I, T>(args: I) -> Result<Invocation, clap::Error>
                   where I: IntoIterator<Item = T>, T: Into<OsString> + Clone {
    let source_date_epoch = env::var("SOURCE_DATE_EPOCH").ok();
    parse_with_epoch(args, source_date_epoch.as_deref())
}

/// Parses a command line with an explicit `SOURCE_DATE_EPOCH` value.
pub fn parse_with_epoch<I, T>(args: I, source_date_epoch: Option<&str>)
                              -> Result<Invocation, clap::Error>
                              where I: IntoIterator<Item = T>, T: Into<OsString> + Clone {
    let matches = command().try_get_matches_from(args)?;
    Ok(invocation(&matches, source_date_epoch.map(ToOwned::to_owned)))
}

fn invocation(matches: &ArgMatches, source_date_epoch: Option<String>) -> Invocation {
    let mut kwargs = Kwargs::new();

    for key in &["hinting_range_min",
                 "hinting_range_max",
                 "hinting_limit",
                 "increase_x_height",
                 "fallback_stem_width"] {
        if let Some(&value) = matches.get_one::<u32>(key) {
            kwargs.insert(*key, value);
        }
    }
    if let Some(&value) = matches.get_one::<i32>("reference_index") {
        kwargs.insert("reference_index", value);
    }
    for key in &["x_height_snapping_exceptions",
                 "default_script",
                 "fallback_script",
                 "family_suffix"] {
        if let Some(value) = matches.get_one::<String>(key) {
            kwargs.insert(*key, value.clone());
        }
    }
    for key in &["control_file", "reference_file"] {
        if let Some(path) = matches.get_one::<PathBuf>(key) {
            kwargs.insert(*key, path.clone());
        }
    }

    let modes = match (matches.get_one::<[StemWidthMode; 3]>("stem_width_mode"),
                       matches.get_one::<String>("strong_stem_width")) {
        (Some(&modes), _) => Some(modes),
        (None, Some(letters)) => Some(strong_stem_width_modes(letters)),
        (None, None) => None,
    };
    if let Some([gray, gdi_cleartype, dw_cleartype]) = modes {
        kwargs.insert("gray_stem_width_mode", gray);
        kwargs.insert("gdi_cleartype_stem_width_mode", gdi_cleartype);
        kwargs.insert("dw_cleartype_stem_width_mode", dw_cleartype);
    }

    for key in &["fallback_scaling",
                 "hint_composites",
                 "adjust_subglyphs",
                 "symbol",
                 "windows_compatibility",
                 "ignore_restrictions",
                 "no_info",
                 "detailed_info",
                 "TTFA_info",
                 "dehint",
                 "debug",
                 "verbose"] {
        if matches.get_flag(key) {
            kwargs.insert(*key, true);
        }
    }

    let file = |id: &str| {
        matches.get_one::<String>(id)
               .filter(|path| *path != STDIO_PLACEHOLDER)
               .map(PathBuf::from)
    };

    Invocation {
        in_file: file("IN-FILE"),
        out_file: file("OUT-FILE"),
        kwargs,
        version: matches.get_flag("version"),
        verbose: matches.get_flag("verbose"),
        debug: matches.get_flag("debug"),
        epoch: matches.get_one::<i64>("epoch").cloned(),
        source_date_epoch,
    }
}

fn parse_stem_width_modes(value: &str) -> Result<[StemWidthMode; 3], String> {
    let modes: Vec<StemWidthMode> = value.chars().filter_map(StemWidthMode::from_letter).collect();
    if value.chars().count() != 3 || modes.len() != 3 {
        return Err(format!("`{}` is not three letters out of `n`, `q` and `s`", value));
    }
    Ok([modes[0], modes[1], modes[2]])
}

// The legacy `-w` letters select strong stem widths; everything else is quantized.
fn strong_stem_width_modes(letters: &str) -> [StemWidthMode; 3] {
    let mode = |letter| {
        if letters.contains(letter) {
            StemWidthMode::Strong
        } else {
            StemWidthMode::Quantized
        }
    };
    [mode('g'), mode('G'), mode('D')]
}

fn parse_source_date_epoch(value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(epoch) if epoch >= 0 => Some(epoch),
        Ok(_) => {
            warn!("ignoring invalid SOURCE_DATE_EPOCH `{}`: negative timestamp", value);
            None
        }
        Err(error) => {
            warn!("ignoring invalid SOURCE_DATE_EPOCH `{}`: {}", value, error);
            None
        }
    }
}
