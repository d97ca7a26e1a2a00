// ttfautohint/tests/tests.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// General tests.

use libc::{c_int, c_void, size_t};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::cmp;
use std::ffi::{CStr, CString};
use std::fs;
use std::mem;
use std::process::Command;
use std::ptr;
use std::slice;
use std::sync::Mutex;

use ttfautohint::backends::library::{hint_with_entry, Entry, ErrorFunc};
use ttfautohint::info::{InfoFunc, InfoPostFunc};
use ttfautohint::marshal::Arg;
use ttfautohint::memory::{AllocFunc, FreeFunc, SystemAllocator};
use ttfautohint::options::{Options, Request};
use ttfautohint::{validate_options, Backend, EngineError, Error, Kwargs, OptionSchema, Output};

static TEST_FONT: &[u8] = b"\x00\x01\x00\x00fake font";
static TEST_VERSION: &str = "1.8.4";

type NameRecord = (u16, u16, u16, u16, Vec<u8>);

// Held by tests that spawn processes, so that no child inherits a script still open for writing.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

fn wide(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes().to_vec()).collect()
}

// Stands in for `TTF_autohint`: reports its name records through the info callbacks, then
// returns the input with a prefix.
struct FakeEngine {
    names: Vec<NameRecord>,
    failure: Option<(c_int, &'static str)>,
    formats: RefCell<Vec<String>>,
    patched_names: RefCell<Vec<NameRecord>>,
}

impl FakeEngine {
    fn new(names: Vec<NameRecord>) -> FakeEngine {
        FakeEngine {
            names,
            failure: None,
            formats: RefCell::new(vec![]),
            patched_names: RefCell::new(vec![]),
        }
    }

    fn failing(code: c_int, message: &'static str) -> FakeEngine {
        FakeEngine { failure: Some((code, message)), ..FakeEngine::new(vec![]) }
    }

    fn last_format(&self) -> String {
        self.formats.borrow().last().cloned().unwrap_or_default()
    }

    fn patched(&self, ids: (u16, u16, u16, u16)) -> Vec<u8> {
        self.patched_names
            .borrow()
            .iter()
            .find(|record| (record.0, record.1, record.2, record.3) == ids)
            .map(|record| record.4.clone())
            .unwrap()
    }
}

impl Entry for FakeEngine {
    fn version_string(&self) -> Result<String, Error> {
        Ok(TEST_VERSION.to_owned())
    }

    unsafe fn autohint(&self, format: &CStr, args: &[Arg]) -> Result<c_int, Error> {
        let format = format.to_str().unwrap().to_owned();
        let keys: Vec<String> = if format.is_empty() {
            vec![]
        } else {
            format.split(", ").map(ToOwned::to_owned).collect()
        };
        assert_eq!(keys.len(), args.len());
        self.formats.borrow_mut().push(format);

        let arg = |key: &str| keys.iter().position(|k| k == key).map(|index| args[index]);
        let pointer = |key: &str| match arg(key) {
            Some(Arg::Pointer(pointer)) => pointer as *mut c_void,
            None => ptr::null_mut(),
            Some(other) => panic!("{} is not a pointer: {:?}", key, other),
        };
        let size = |key: &str| match arg(key) {
            Some(Arg::Size(size)) => size,
            other => panic!("{} is not a size: {:?}", key, other),
        };

        if let Some((code, message)) = self.failure {
            let callback = pointer("error-callback");
            if !callback.is_null() {
                let callback: ErrorFunc = mem::transmute(callback);
                let message = CString::new(message).unwrap();
                callback(code,
                         message.as_ptr(),
                         0,
                         ptr::null(),
                         ptr::null(),
                         pointer("error-callback-data"));
            }
            return Ok(code);
        }

        let input = slice::from_raw_parts(pointer("in-buffer") as *const u8, size("in-buffer-len"));
        let alloc: AllocFunc = mem::transmute(pointer("alloc-func"));
        let free: FreeFunc = mem::transmute(pointer("free-func"));

        // The engine owns the strings; callbacks may reallocate them.
        let mut records: Vec<(NameRecord, *mut u8, u16)> =
            self.names
                .iter()
                .map(|record| {
                    let len = record.4.len();
                    let string = alloc(cmp::max(len, 1)) as *mut u8;
                    ptr::copy_nonoverlapping(record.4.as_ptr(), string, len);
                    (record.clone(), string, len as u16)
                })
                .collect();

        let info = pointer("info-callback");
        let info_data = pointer("info-callback-data");
        if !info.is_null() {
            let info: InfoFunc = mem::transmute(info);
            for &mut (ref record, ref mut string, ref mut len) in records.iter_mut() {
                assert_eq!(info(record.0, record.1, record.2, record.3, len, string, info_data), 0);
            }
            let post = pointer("info-post-callback");
            if !post.is_null() {
                let post: InfoPostFunc = mem::transmute(post);
                assert_eq!(post(info_data), 0);
            }
        }

        let mut patched = self.patched_names.borrow_mut();
        for (record, string, len) in records {
            let bytes = slice::from_raw_parts(string, len as usize).to_vec();
            patched.push((record.0, record.1, record.2, record.3, bytes));
            free(string as *mut c_void);
        }

        let mut output = b"hinted:".to_vec();
        output.extend_from_slice(input);
        let out_buffer = alloc(output.len()) as *mut u8;
        ptr::copy_nonoverlapping(output.as_ptr(), out_buffer, output.len());
        *(pointer("out-buffer") as *mut *mut u8) = out_buffer;
        *(pointer("out-buffer-len") as *mut size_t) = output.len();
        Ok(0)
    }
}

struct FakeBackend(FakeEngine);

impl Backend for FakeBackend {
    fn version(&self) -> Result<String, Error> {
        self.0.version_string()
    }

    fn hint(&self, schema: &OptionSchema, request: Request) -> Result<Output, Error> {
        hint_with_entry(&self.0, &SystemAllocator, schema, request)
    }
}

fn hint(engine: &FakeEngine, kwargs: Kwargs) -> Result<Output, Error> {
    let schema = OptionSchema::new();
    let request = validate_options(&schema, kwargs)?;
    hint_with_entry(engine, &SystemAllocator, &schema, request)
}

fn version_names() -> Vec<NameRecord> {
    vec![
        (1, 0, 0, 5, b"Version 1.000".to_vec()),
        (3, 1, 0x409, 5, wide("Version 1.000; ttfautohint (v1.5); build 7")),
    ]
}

#[test]
pub fn hint_returns_engine_output() {
    let engine = FakeEngine::new(version_names());
    let output = hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)).unwrap();
    let mut expected = b"hinted:".to_vec();
    expected.extend_from_slice(TEST_FONT);
    assert_eq!(output, Output::Bytes(expected));

    assert_eq!(engine.patched((1, 0, 0, 5)), b"Version 1.000; ttfautohint (v1.8.4)".to_vec());
    assert_eq!(engine.patched((3, 1, 0x409, 5)),
               wide("Version 1.000; ttfautohint (v1.8.4); build 7"));
}

#[test]
pub fn format_string_is_sorted() {
    let engine = FakeEngine::new(vec![]);
    hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)
                               .set("TTFA_info", true)
                               .set("epoch", 0)).unwrap();
    let format = engine.last_format();
    assert!(format.starts_with("TTFA-info, adjust-subglyphs, alloc-func, debug, default-script, "),
            "{}", format);
    assert!(format.contains("epoch, error-callback, error-callback-data, error-string"));
    assert!(format.contains("info-callback, info-callback-data, "));
    assert!(!format.contains("info-post-callback"));
    assert!(!format.contains("control-buffer"));
    assert!(!format.contains("progress-callback"));
}

#[test]
pub fn detailed_info_is_written() {
    let engine = FakeEngine::new(version_names());
    hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)
                               .set("detailed_info", true)
                               .set("control_buffer", &b"a 1 2"[..])).unwrap();
    assert_eq!(String::from_utf8(engine.patched((1, 0, 0, 5))).unwrap(),
               "Version 1.000; ttfautohint (v1.8.4) -l 8 -r 50 -G 200 -x 14 -D latn -f none \
                -m \"<control-instructions>\" -a qsq -X \"\"");
    assert!(engine.last_format().contains("control-buffer, control-buffer-len"));
}

#[test]
pub fn no_info_leaves_names_alone() {
    let engine = FakeEngine::new(version_names());
    hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT).set("no_info", true)).unwrap();
    assert_eq!(engine.patched((1, 0, 0, 5)), b"Version 1.000".to_vec());
    assert!(!engine.last_format().contains("info-callback"));
}

#[test]
pub fn family_suffix_is_inserted() {
    let engine = FakeEngine::new(vec![
        (1, 0, 0, 1, b"New Font".to_vec()),
        (1, 0, 0, 4, b"New Font Condensed".to_vec()),
        (1, 0, 0, 6, b"NewFont-Condensed".to_vec()),
        (3, 1, 0x409, 1, wide("New Font Condensed")),
        (3, 1, 0x409, 16, wide("New Font")),
        (3, 1, 0x409, 21, wide("New Font Condensed")),
    ]);
    hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)
                               .set("no_info", true)
                               .set("family_suffix", " Hinted")).unwrap();

    assert!(engine.last_format().contains("info-post-callback"));
    assert_eq!(engine.patched((1, 0, 0, 1)), b"New Font Hinted".to_vec());
    assert_eq!(engine.patched((1, 0, 0, 4)), b"New Font Hinted Condensed".to_vec());
    assert_eq!(engine.patched((1, 0, 0, 6)), b"NewFontHinted-Condensed".to_vec());
    assert_eq!(engine.patched((3, 1, 0x409, 1)), wide("New Font Hinted Condensed"));
    assert_eq!(engine.patched((3, 1, 0x409, 16)), wide("New Font Hinted"));
    assert_eq!(engine.patched((3, 1, 0x409, 21)), wide("New Font Hinted Condensed"));
}

#[test]
pub fn engine_errors_are_reported() {
    let engine = FakeEngine::failing(0x0A, "invalid font type");
    match hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)) {
        Err(Error::Engine(EngineError::Native(error))) => {
            assert_eq!(error.code, 0x0A);
            assert_eq!(error.to_string(), "0x0A: invalid font type");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
pub fn control_file_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let control_file = dir.path().join("ctrl.txt");
    fs::write(&control_file, "a @ 1").unwrap();

    let engine = FakeEngine::failing(0x201, "invalid character");
    let error = hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)
                                           .set("control_file", control_file.clone()))
        .unwrap_err();
    assert_eq!(error.to_string(),
               format!("{}: invalid character (0x201)", control_file.display()));
}

#[test]
pub fn output_is_written_to_out_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("out.ttf");
    let engine = FakeEngine::new(vec![]);
    let output = hint(&engine, Kwargs::new().set("in_buffer", TEST_FONT)
                                            .set("out_file", out_file.clone())).unwrap();
    let written = fs::read(&out_file).unwrap();
    assert_eq!(output, Output::Written(written.len()));
    assert!(written.ends_with(TEST_FONT));
}

#[test]
pub fn invalid_options_never_reach_the_engine() {
    let backend = FakeBackend(FakeEngine::new(vec![]));
    let error = backend.hint_kwargs(&OptionSchema::new(), Kwargs::new().set("in_buffer", TEST_FONT)
                                                                       .set("foo", 1))
                       .unwrap_err();
    assert_eq!(error.to_string(), "unknown keyword argument: 'foo'");
    assert!(backend.0.formats.borrow().is_empty());
    assert_eq!(backend.version().unwrap(), TEST_VERSION);
}

#[test]
pub fn typed_request_is_hinted() {
    let backend = FakeBackend(FakeEngine::new(version_names()));
    let options = Options { dehint: true, detailed_info: true, ..Options::new(TEST_FONT.to_vec()) };
    let output = backend.hint(&OptionSchema::new(), Request::new(options)).unwrap();
    assert!(output.into_bytes().unwrap().ends_with(TEST_FONT));
    assert_eq!(backend.0.patched((1, 0, 0, 5)), b"Version 1.000; ttfautohint (v1.8.4) -d".to_vec());
}

#[test]
pub fn command_line_warns_about_invalid_source_date_epoch() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|error| error.into_inner());
    let output = Command::new(env!("CARGO_BIN_EXE_ttfautohint"))
        .arg("-V")
        .env("SOURCE_DATE_EPOCH", "yesterday")
        .env("TTFAUTOHINT_BACKEND", "executable")
        .env("TTFAUTOHINT_PATH", "/nonexistent/ttfautohint")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ignoring invalid SOURCE_DATE_EPOCH `yesterday`"), "{}", stderr);
    assert!(String::from_utf8_lossy(&output.stdout).contains("ttfautohint engine unavailable"));
}

#[cfg(unix)]
#[test]
pub fn executable_backend_pipes_the_font() {
    use std::os::unix::fs::PermissionsExt;
    use ttfautohint::backends::Executable;

    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|error| error.into_inner());

    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let script = |name: &str, body: String| {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    };
    // All scripts are written before anything is spawned.
    let good = script("ttfautohint",
                      format!("if [ \"$1\" = \"--version\" ]; then\n\
                               echo \"ttfautohint 1.8.4\"; exit 0\n\
                               fi\n\
                               printf '%s\\n' \"$@\" > '{}'\n\
                               printf 'hinted:'\n\
                               cat\n",
                              args_file.display()));
    let bad = script("ttfautohint-bad",
                     "cat > /dev/null\necho 'invalid font' >&2\nexit 3\n".to_owned());

    let schema = OptionSchema::new();
    let executable = Executable::new(good);
    assert_eq!(executable.version().unwrap(), "1.8.4");

    let output = executable.hint_kwargs(&schema, Kwargs::new().set("in_buffer", TEST_FONT)
                                                              .set("control_buffer", &b"a 1"[..])
                                                              .set("hinting_range_min", 12)
                                                              .set("dehint", true))
                           .unwrap();
    let mut expected = b"hinted:".to_vec();
    expected.extend_from_slice(TEST_FONT);
    assert_eq!(output, Output::Bytes(expected));

    let args = fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args[0], "--control-file");
    assert!(args[1].ends_with("/<control-instructions>"));
    assert_eq!(&args[2..], &["--hinting-range-min", "12", "--dehint"]);

    match Executable::new(bad).hint_kwargs(&schema, Kwargs::new().set("in_buffer", TEST_FONT)) {
        Err(Error::Engine(EngineError::Process { status, stderr })) => {
            assert_eq!(status, Some(3));
            assert_eq!(stderr.trim(), "invalid font");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
