#![allow(dead_code)]

use std::path::PathBuf;

use envfile_rs::{EnvMap, Error, parse_reader, parse_str};

/// Parse `input` from memory and from a stream, assert both agree, and
/// return the result.
pub fn parse_both(input: &str) -> EnvMap {
    let from_text =
        parse_str(input).unwrap_or_else(|e| panic!("parse_str failed: {e}\n--- input ---\n{input}"));
    let from_stream = parse_reader(input.as_bytes())
        .unwrap_or_else(|e| panic!("parse_reader failed: {e}\n--- input ---\n{input}"));
    assert_eq!(
        from_text, from_stream,
        "text and stream parse disagree\n--- input ---\n{input}"
    );
    from_text
}

/// Parse `input` both ways, assert both fail with the same message, and
/// return the in-memory error.
pub fn parse_error(input: &str) -> Error {
    let from_text = parse_str(input).expect_err("parse_str should fail");
    let from_stream = parse_reader(input.as_bytes()).expect_err("parse_reader should fail");
    assert_eq!(
        from_text.to_string(),
        from_stream.to_string(),
        "text and stream errors disagree\n--- input ---\n{input}"
    );
    from_text
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("read fixture")
}

/// Assert every `(key, value)` pair is present in `env`.
pub fn assert_entries(env: &EnvMap, expected: &[(&str, &str)]) {
    for (key, value) in expected {
        assert_eq!(env.get(key), Some(*value), "value mismatch for key {key}");
    }
}
