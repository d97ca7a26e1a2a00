// ttfautohint/src/info.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Name table edits performed while the engine runs.
//!
//! The engine reports every `name` record to `info_callback`, which may rewrite it in place. The
//! version string (name ID 5) gets an info string describing the hinting parameters, and when a
//! family suffix is requested the family-related records are collected and rewritten once all
//! of them have been seen, from `info_post_callback`.

use byteorder::{BigEndian, ByteOrder};
use libc::{c_int, c_void};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Overflow;
use crate::memory::{Allocator, MutableByteString};
use crate::options::Options;

/// Every info string starts with this.
pub const INFO_PREFIX: &str = "; ttfautohint";

/// The signature of the `info-callback` option.
pub type InfoFunc = extern "C" fn(platform_id: u16,
                                  encoding_id: u16,
                                  language_id: u16,
                                  name_id: u16,
                                  len: *mut u16,
                                  string: *mut *mut u8,
                                  user: *mut c_void)
                                  -> c_int;

/// The signature of the `info-post-callback` option.
pub type InfoPostFunc = extern "C" fn(user: *mut c_void) -> c_int;

/// Name IDs whose records receive the family suffix.
pub const FAMILY_NAME_IDS: [u16; 5] = [1, 4, 6, 16, 21];

/// Builds the text appended to the font's version string.
///
/// The detailed form lists the hinting parameters as `ttfautohint` command-line flags.
pub fn build_info_string(version: &str, detailed: bool, options: &Options) -> String {
    let mut info = format!("{} (v{})", INFO_PREFIX, version);
    if !detailed {
        return info;
    }

    if options.dehint {
        info.push_str(" -d");
        return info;
    }

    info.push_str(&format!(" -l {}", options.hinting_range_min));
    info.push_str(&format!(" -r {}", options.hinting_range_max));
    info.push_str(&format!(" -G {}", options.hinting_limit));
    info.push_str(&format!(" -x {}", options.increase_x_height));
    if options.fallback_stem_width != 0 {
        info.push_str(&format!(" -H {}", options.fallback_stem_width));
    }
    info.push_str(&format!(" -D {}", options.default_script));
    info.push_str(&format!(" -f {}", options.fallback_script));

    if let Some(control_name) = options.control_name() {
        info.push_str(&format!(" -m \"{}\"", basename(control_name)));
    }
    if let Some(reference_name) = options.reference_name() {
        info.push_str(&format!(" -R \"{}\"", basename(reference_name)));
    }
    if options.reference_index != 0 {
        info.push_str(&format!(" -Z {}", options.reference_index));
    }

    info.push_str(" -a ");
    info.extend(options.stem_width_modes().iter().map(|mode| mode.letter()));

    let flags = [
        (options.windows_compatibility, " -W"),
        (options.adjust_subglyphs, " -p"),
        (options.hint_composites, " -c"),
        (options.symbol, " -s"),
        (options.fallback_scaling, " -S"),
        (options.ttfa_info, " -t"),
    ];
    for &(set, flag) in &flags {
        if set {
            info.push_str(flag);
        }
    }

    info.push_str(&format!(" -X \"{}\"", options.x_height_snapping_exceptions));
    info
}

fn basename(name: &str) -> &str {
    Path::new(name).file_name().and_then(|name| name.to_str()).unwrap_or(name)
}

/// Returns true if name records with these IDs are stored as UTF-16BE.
///
/// Macintosh records, and Windows records in encodings other than Unicode BMP (1) and full
/// Unicode (10), use a single byte per character.
#[inline]
pub fn name_string_is_wide(platform_id: u16, encoding_id: u16) -> bool {
    !(platform_id == 1 || (platform_id == 3 && !(encoding_id == 1 || encoding_id == 10)))
}

/// How the characters of one name record are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NameEncoding {
    Narrow,
    Wide,
}

impl NameEncoding {
    fn for_ids(platform_id: u16, encoding_id: u16) -> NameEncoding {
        if name_string_is_wide(platform_id, encoding_id) {
            NameEncoding::Wide
        } else {
            NameEncoding::Narrow
        }
    }

    #[inline]
    fn unit(self) -> usize {
        match self {
            NameEncoding::Narrow => 1,
            NameEncoding::Wide => 2,
        }
    }

    // Narrow text is ASCII; anything else becomes `?`.
    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            NameEncoding::Narrow => {
                text.chars().map(|ch| if ch.is_ascii() { ch as u8 } else { b'?' }).collect()
            }
            NameEncoding::Wide => {
                let units: Vec<u16> = text.encode_utf16().collect();
                let mut bytes = vec![0; units.len() * 2];
                BigEndian::write_u16_into(&units, &mut bytes);
                bytes
            }
        }
    }

    fn strip_spaces(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            NameEncoding::Narrow => bytes.iter().cloned().filter(|&byte| byte != b' ').collect(),
            NameEncoding::Wide => {
                bytes.chunks(2)
                     .filter(|unit| unit.len() < 2 || BigEndian::read_u16(unit) != 0x20)
                     .flat_map(|unit| unit.iter().cloned())
                     .collect()
            }
        }
    }

    // Searches on character boundaries only.
    fn find(self, haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
        let unit = self.unit();
        if needle.is_empty() || needle.len() > haystack.len() {
            return None;
        }
        (from..=(haystack.len() - needle.len()))
            .step_by(unit)
            .find(|&start| &haystack[start..(start + needle.len())] == needle)
    }
}

/// Replaces or appends the info string in a version string record.
///
/// An existing info string is replaced from its start up to the next `;` (or the end of the
/// record), so that text following it survives. If the result does not fit in a name record,
/// the record is left unchanged and `Overflow` is returned.
pub fn patch_version_string(platform_id: u16,
                            encoding_id: u16,
                            string: &mut MutableByteString,
                            info_string: &str)
                            -> Result<(), Overflow> {
    let encoding = NameEncoding::for_ids(platform_id, encoding_id);
    let old = string.as_bytes();
    if encoding == NameEncoding::Wide && old.len() % 2 != 0 {
        warn!("skipping malformed UTF-16 version string ({} bytes)", old.len());
        return Ok(());
    }

    let info = encoding.encode(info_string);
    let prefix = encoding.encode(INFO_PREFIX);
    let semicolon = encoding.encode(";");

    let mut new = Vec::with_capacity(old.len() + info.len());
    match encoding.find(old, &prefix, 0) {
        Some(start) => {
            new.extend_from_slice(&old[..start]);
            new.extend_from_slice(&info);
            if let Some(end) = encoding.find(old, &semicolon, start + encoding.unit()) {
                new.extend_from_slice(&old[end..]);
            }
        }
        None => {
            new.extend_from_slice(old);
            new.extend_from_slice(&info);
        }
    }
    string.replace(&new)
}

/// Inserts `suffix` right after the first occurrence of `family_name` in `string`, or appends
/// it if the family name does not occur.
///
/// All three are raw name record bytes in the same encoding.
pub fn insert_suffix(string: &mut MutableByteString, family_name: &[u8], suffix: &[u8])
                     -> Result<(), Overflow> {
    insert_suffix_units(string, family_name, suffix, NameEncoding::Narrow)
}

fn insert_suffix_units(string: &mut MutableByteString,
                       family_name: &[u8],
                       suffix: &[u8],
                       encoding: NameEncoding)
                       -> Result<(), Overflow> {
    let old = string.as_bytes();
    let at = match encoding.find(old, family_name, 0) {
        Some(start) => start + family_name.len(),
        None => old.len(),
    };
    let mut new = Vec::with_capacity(old.len() + suffix.len());
    new.extend_from_slice(&old[..at]);
    new.extend_from_slice(suffix);
    new.extend_from_slice(&old[at..]);
    string.replace(&new)
}

// A family-related record captured by the info callback. The pointers belong to the engine and
// stay valid until it returns.
#[derive(Clone, Copy, Debug)]
struct NameRecord {
    name_id: u16,
    string: *mut *mut u8,
    len: *mut u16,
}

/// The family-related records sharing one platform, encoding and language.
#[derive(Debug)]
pub struct Family {
    platform_id: u16,
    encoding_id: u16,
    records: Vec<NameRecord>,
    name: Option<Vec<u8>>,
}

impl Family {
    fn new(platform_id: u16, encoding_id: u16) -> Family {
        Family {
            platform_id,
            encoding_id,
            records: vec![],
            name: None,
        }
    }

    /// The family name in this group's encoding, once resolved.
    #[inline]
    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    /// The name IDs that were captured, in the order they were reported.
    pub fn name_ids(&self) -> Vec<u16> {
        self.records.iter().map(|record| record.name_id).collect()
    }

    fn record(&self, name_id: u16) -> Option<&NameRecord> {
        self.records.iter().find(|record| record.name_id == name_id)
    }
}

/// Per-call state shared with the info callbacks.
///
/// The engine receives a pointer to this value as `info-callback-data`; it must stay in place
/// until the native call returns.
pub struct InfoData<'a> {
    info_string: Option<String>,
    family_suffix: Option<String>,
    families: BTreeMap<(u16, u16, u16), Family>,
    finalized: bool,
    allocator: &'a dyn Allocator,
}

impl<'a> InfoData<'a> {
    pub fn new(info_string: Option<String>,
               family_suffix: Option<String>,
               allocator: &'a dyn Allocator)
               -> InfoData<'a> {
        InfoData {
            info_string,
            family_suffix: family_suffix.filter(|suffix| !suffix.is_empty()),
            families: BTreeMap::new(),
            finalized: false,
            allocator,
        }
    }

    /// Returns true if the engine needs to call back at all.
    #[inline]
    pub fn is_needed(&self) -> bool {
        self.info_string.is_some() || self.family_suffix.is_some()
    }

    /// Returns true if the records must be revisited after all of them have been reported.
    #[inline]
    pub fn needs_post_callback(&self) -> bool {
        self.family_suffix.is_some()
    }

    #[inline]
    pub fn info_string(&self) -> Option<&str> {
        self.info_string.as_deref()
    }

    /// The captured families, in ascending (platform, encoding, language) order.
    pub fn families(&self) -> impl Iterator<Item = (&(u16, u16, u16), &Family)> {
        self.families.iter()
    }

    /// Handles one name record. Returns the status reported back to the engine.
    ///
    /// # Safety
    ///
    /// `string` and `len` must describe a record allocated with this value's allocator, and must
    /// remain valid until `finalize` has run.
    pub unsafe fn on_name(&mut self,
                          platform_id: u16,
                          encoding_id: u16,
                          language_id: u16,
                          name_id: u16,
                          string: *mut *mut u8,
                          len: *mut u16)
                          -> c_int {
        if name_id == 5 {
            if let Some(ref info_string) = self.info_string {
                let mut record = MutableByteString::from_raw(string, len, self.allocator);
                if let Err(error) = patch_version_string(platform_id,
                                                         encoding_id,
                                                         &mut record,
                                                         info_string) {
                    debug!("version string left unchanged: {}", error);
                }
            }
            return 0;
        }

        if self.family_suffix.is_some() && FAMILY_NAME_IDS.contains(&name_id) {
            self.families
                .entry((platform_id, encoding_id, language_id))
                .or_insert_with(|| Family::new(platform_id, encoding_id))
                .records
                .push(NameRecord { name_id, string, len });
        }
        0
    }

    /// Appends the family suffix to every captured record. Runs at most once.
    pub fn finalize(&mut self) -> c_int {
        if self.finalized {
            return 0;
        }
        self.finalized = true;

        let suffix = match self.family_suffix {
            Some(ref suffix) => suffix.clone(),
            None => return 0,
        };
        let allocator = self.allocator;

        // Preferred family name first, then the legacy one.
        for family in self.families.values_mut() {
            let source = family.record(16).or_else(|| family.record(1)).cloned();
            family.name = source.map(|record| unsafe { record_bytes(&record, allocator) })
                                .filter(|name| !name.is_empty());
        }

        let keys: Vec<(u16, u16, u16)> = self.families.keys().cloned().collect();
        for key in keys {
            if self.families[&key].name.is_some() {
                continue;
            }
            let borrowed = self.families
                               .iter()
                               .find(|&(other, family)| {
                                   other.0 == key.0 && other.1 == key.1 && family.name.is_some()
                               })
                               .and_then(|(_, family)| family.name.clone());
            if let Some(family) = self.families.get_mut(&key) {
                family.name = borrowed;
            }
        }

        for (key, family) in &self.families {
            let name = match family.name {
                Some(ref name) => name,
                None => {
                    debug!("no family name for name records {:?}", key);
                    continue;
                }
            };
            let encoding = NameEncoding::for_ids(family.platform_id, family.encoding_id);
            let encoded_suffix = encoding.encode(&suffix);

            for record in &family.records {
                let mut string =
                    unsafe { MutableByteString::from_raw(record.string, record.len, allocator) };
                let result = if record.name_id == 6 {
                    insert_suffix_units(&mut string,
                                        &encoding.strip_spaces(name),
                                        &encoding.strip_spaces(&encoded_suffix),
                                        encoding)
                } else {
                    insert_suffix_units(&mut string, name, &encoded_suffix, encoding)
                };
                if let Err(error) = result {
                    warn!("name ID {} for {:?} left unchanged: {}", record.name_id, key, error);
                }
            }
        }
        0
    }
}

unsafe fn record_bytes(record: &NameRecord, allocator: &dyn Allocator) -> Vec<u8> {
    MutableByteString::from_raw(record.string, record.len, allocator).to_bytes()
}

/// The `info-callback` handed to the engine. `user` points to an `InfoData`.
pub extern "C" fn info_callback(platform_id: u16,
                                encoding_id: u16,
                                language_id: u16,
                                name_id: u16,
                                len: *mut u16,
                                string: *mut *mut u8,
                                user: *mut c_void)
                                -> c_int {
    if user.is_null() || len.is_null() || string.is_null() {
        return 0;
    }
    unsafe {
        let data = &mut *(user as *mut InfoData);
        data.on_name(platform_id, encoding_id, language_id, name_id, string, len)
    }
}

/// The `info-post-callback` handed to the engine. `user` points to an `InfoData`.
pub extern "C" fn info_post_callback(user: *mut c_void) -> c_int {
    if user.is_null() {
        return 0;
    }
    unsafe {
        let data = &mut *(user as *mut InfoData);
        data.finalize()
    }
}

#[cfg(test)]
mod test {
    use libc::c_void;
    use pretty_assertions::assert_eq;

    use super::{build_info_string, info_callback, info_post_callback, insert_suffix};
    use super::{name_string_is_wide, patch_version_string, InfoData, NameEncoding, INFO_PREFIX};
    use crate::memory::{NativeString, SystemAllocator, MAX_STRING_LENGTH};
    use crate::options::{Auxiliary, Options, StemWidthMode};

    const TEST_VERSION: &str = "1.7";

    fn test_info() -> String {
        format!("{} (v{})", INFO_PREFIX, TEST_VERSION)
    }

    fn test_info_detailed() -> String {
        test_info() + " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -X \"\""
    }

    fn encode(text: &str, platform_id: u16, encoding_id: u16) -> Vec<u8> {
        NameEncoding::for_ids(platform_id, encoding_id).encode(text)
    }

    #[test]
    fn info_string_without_detail() {
        assert_eq!(build_info_string(TEST_VERSION, false, &Options::default()), test_info());
    }

    #[test]
    fn info_string_with_detail() {
        let cases: Vec<(Options, &str)> = vec![
            (Options::default(), " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -X \"\""),
            (Options { dehint: true, ..Options::default() }, " -d"),
            (Options { fallback_stem_width: 200, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -H 200 -D latn -f none -a qsq -X \"\""),
            (Options {
                control: Some(Auxiliary {
                    buffer: vec![],
                    path: None,
                    name: Some("src/my_control_file.txt".to_owned()),
                }),
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -m \"my_control_file.txt\" -a qsq -X \"\""),
            (Options {
                reference: Some(Auxiliary {
                    buffer: vec![],
                    path: None,
                    name: Some("build/MyFont-Regular.ttf".to_owned()),
                }),
                reference_index: 1,
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -R \"MyFont-Regular.ttf\" -Z 1 -a qsq \
              -X \"\""),
            (Options { gray_stem_width_mode: StemWidthMode::Natural, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a nsq -X \"\""),
            (Options { gray_stem_width_mode: StemWidthMode::Strong, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a ssq -X \"\""),
            (Options {
                gdi_cleartype_stem_width_mode: StemWidthMode::Natural,
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qnq -X \"\""),
            (Options {
                gdi_cleartype_stem_width_mode: StemWidthMode::Quantized,
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qqq -X \"\""),
            (Options {
                dw_cleartype_stem_width_mode: StemWidthMode::Natural,
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsn -X \"\""),
            (Options {
                dw_cleartype_stem_width_mode: StemWidthMode::Strong,
                ..Options::default()
             },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qss -X \"\""),
            (Options { windows_compatibility: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -W -X \"\""),
            (Options { adjust_subglyphs: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -p -X \"\""),
            (Options { hint_composites: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -c -X \"\""),
            (Options { symbol: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -s -X \"\""),
            (Options { fallback_scaling: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -S -X \"\""),
            (Options { ttfa_info: true, ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -t -X \"\""),
            (Options { x_height_snapping_exceptions: "6,13-17".to_owned(), ..Options::default() },
             " -l 8 -r 50 -G 200 -x 14 -D latn -f none -a qsq -X \"6,13-17\""),
        ];
        for (options, expected) in cases {
            assert_eq!(build_info_string(TEST_VERSION, true, &options), test_info() + expected);
        }
    }

    #[test]
    fn wide_name_strings() {
        assert!(!name_string_is_wide(1, 0));
        assert!(name_string_is_wide(3, 1));
        assert!(name_string_is_wide(3, 10));
        assert!(!name_string_is_wide(3, 0));
        assert!(name_string_is_wide(0, 3));
    }

    #[test]
    fn version_string_gets_info() {
        let appendices = [
            ("", ""),
            ("; ttfautohint (v1.5)", ""),
            ("; ttfautohint (v1.5)", "; foo bar"),
        ];
        for &(platform_id, encoding_id) in &[(1, 0), (3, 1), (3, 10)] {
            for info_string in &[test_info(), test_info_detailed()] {
                for &(previous_info, appendix) in &appendices {
                    let initial = format!("Version 1.000{}{}", previous_info, appendix);
                    let mut string =
                        NativeString::new(&encode(&initial, platform_id, encoding_id),
                                          &SystemAllocator).unwrap();
                    patch_version_string(platform_id,
                                         encoding_id,
                                         &mut string.as_mutable(),
                                         info_string).unwrap();
                    let expected = format!("Version 1.000{}{}", info_string, appendix);
                    assert_eq!(string.as_bytes(), &encode(&expected, platform_id, encoding_id)[..]);
                }
            }
        }
    }

    #[test]
    fn version_string_overflow_is_ignored() {
        let size = MAX_STRING_LENGTH - test_info().len() + 1;
        let initial = vec![0; size];
        let mut string = NativeString::new(&initial, &SystemAllocator).unwrap();
        assert!(patch_version_string(1, 0, &mut string.as_mutable(), &test_info()).is_err());
        assert_eq!(string.as_bytes(), &initial[..]);
    }

    #[test]
    fn odd_wide_version_string_is_left_alone() {
        let mut string = NativeString::new(b"\0V\0e\0", &SystemAllocator).unwrap();
        patch_version_string(3, 1, &mut string.as_mutable(), &test_info()).unwrap();
        assert_eq!(string.as_bytes(), b"\0V\0e\0");
    }

    #[test]
    fn suffix_insertion() {
        let cases: [(&[u8], &[u8]); 3] = [
            (b"New Font", b"New Font Hinted"),
            (b"New Font Condensed", b"New Font Hinted Condensed"),
            (b"FooBar", b"FooBar Hinted"),
        ];
        for &(initial, expected) in &cases {
            let mut string = NativeString::new(initial, &SystemAllocator).unwrap();
            insert_suffix(&mut string.as_mutable(), b"New Font", b" Hinted").unwrap();
            assert_eq!(string.as_bytes(), expected);
        }
    }

    #[test]
    fn suffix_insertion_overflow_is_ignored() {
        let initial = vec![0; 0xFFFE];
        let mut string = NativeString::new(&initial, &SystemAllocator).unwrap();
        assert!(insert_suffix(&mut string.as_mutable(), b"Foo Bar", b"-H").is_err());
        assert_eq!(string.as_bytes(), &initial[..]);
    }

    // Reports a record the way the engine does and returns the new contents.
    fn report(data: &mut InfoData,
              ids: (u16, u16, u16, u16),
              string: &mut NativeString)
              -> i32 {
        let (string_ptr, len_ptr) = string.as_raw_parts();
        info_callback(ids.0, ids.1, ids.2, ids.3, len_ptr, string_ptr,
                      data as *mut InfoData as *mut c_void)
    }

    #[test]
    fn callback_patches_version_string() {
        let mut data = InfoData::new(Some(test_info()), None, &SystemAllocator);
        let mut version = NativeString::new(b"Version 1.000", &SystemAllocator).unwrap();
        assert_eq!(report(&mut data, (1, 0, 0, 5), &mut version), 0);
        assert_eq!(version.as_bytes(), format!("Version 1.000{}", test_info()).as_bytes());
        assert_eq!(data.families().count(), 0);
        assert_eq!(data.info_string(), Some(&*test_info()));
        assert!(!data.needs_post_callback());
    }

    #[test]
    fn family_suffix_is_applied_once() {
        let mut data = InfoData::new(None, Some(" Hinted".to_owned()), &SystemAllocator);
        let allocator = &SystemAllocator;

        let wide = |text: &str| encode(text, 3, 1);
        let mut mac_family = NativeString::new(b"New Font", allocator).unwrap();
        let mut mac_full = NativeString::new(b"New Font Condensed Bold", allocator).unwrap();
        let mut mac_ps = NativeString::new(b"NewFontCondensed-Bold", allocator).unwrap();
        let mut win_typo = NativeString::new(&wide("New Font Condensed"), allocator).unwrap();
        let mut win_family =
            NativeString::new(&wide("New Font Condensed Bold"), allocator).unwrap();
        // Same platform and encoding, another language, no family record of its own.
        let mut win_full_de =
            NativeString::new(&wide("New Font Condensed Fett"), allocator).unwrap();

        report(&mut data, (1, 0, 0, 1), &mut mac_family);
        report(&mut data, (1, 0, 0, 4), &mut mac_full);
        report(&mut data, (1, 0, 0, 6), &mut mac_ps);
        report(&mut data, (3, 1, 0x409, 16), &mut win_typo);
        report(&mut data, (3, 1, 0x409, 1), &mut win_family);
        report(&mut data, (3, 1, 0x407, 4), &mut win_full_de);

        assert_eq!(data.families().count(), 3);
        let ptr = &mut data as *mut InfoData as *mut c_void;
        assert_eq!(info_post_callback(ptr), 0);
        assert_eq!(info_post_callback(ptr), 0);

        let families: Vec<_> = data.families()
                                   .map(|(&key, family)| {
                                       (key, family.name().map(|name| name.to_vec()),
                                        family.name_ids())
                                   })
                                   .collect();
        assert_eq!(families,
                   vec![((1, 0, 0), Some(b"New Font".to_vec()), vec![1, 4, 6]),
                        ((3, 1, 0x407), Some(wide("New Font Condensed")), vec![4]),
                        ((3, 1, 0x409), Some(wide("New Font Condensed")), vec![16, 1])]);

        assert_eq!(mac_family.as_bytes(), b"New Font Hinted");
        assert_eq!(mac_full.as_bytes(), b"New Font Hinted Condensed Bold");
        assert_eq!(mac_ps.as_bytes(), b"NewFontHintedCondensed-Bold");
        assert_eq!(win_typo.as_bytes(), &wide("New Font Condensed Hinted")[..]);
        assert_eq!(win_family.as_bytes(), &wide("New Font Condensed Hinted Bold")[..]);
        assert_eq!(win_full_de.as_bytes(), &wide("New Font Condensed Hinted Fett")[..]);
    }

    #[test]
    fn narrow_suffix_replaces_non_ascii() {
        assert_eq!(NameEncoding::Narrow.encode(" Hintéd"), b" Hint?d");
        assert_eq!(NameEncoding::Wide.encode("A é"), vec![0, b'A', 0, b' ', 0, 0xE9]);
        assert_eq!(NameEncoding::Wide.strip_spaces(&[0, b'A', 0, b' ', 0, b'B']),
                   vec![0, b'A', 0, b'B']);
    }
}
