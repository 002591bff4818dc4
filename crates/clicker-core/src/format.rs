//! Persisted snapshot format
//!
//! ```json
//! { "pre": [{"x": 1, "y": 2, "interval": 100}], "clicks": [], "post": [] }
//! ```
//!
//! Missing phase keys load as empty lists and unknown keys are ignored.
//! Non-numeric or negative fields reject the whole document.

use crate::error::{Error, Result};
use crate::step::{Phase, Sequences, Step};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SnapshotFile {
    pre: Vec<Step>,
    clicks: Vec<Step>,
    post: Vec<Step>,
}

impl From<SnapshotFile> for Sequences {
    fn from(f: SnapshotFile) -> Self {
        Sequences::from_phases(f.pre, f.clicks, f.post)
    }
}

impl From<&Sequences> for SnapshotFile {
    fn from(s: &Sequences) -> Self {
        Self {
            pre: s.phase(Phase::Pre).to_vec(),
            clicks: s.phase(Phase::Main).to_vec(),
            post: s.phase(Phase::Post).to_vec(),
        }
    }
}

pub fn parse(input: &str) -> Result<Sequences> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    from_value(value)
}

pub fn read(reader: impl Read) -> Result<Sequences> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    from_value(value)
}

fn from_value(value: serde_json::Value) -> Result<Sequences> {
    if !value.is_object() {
        return Err(Error::load_format("expected an object with pre/clicks/post keys"));
    }
    let file: SnapshotFile = serde_json::from_value(value)?;
    Ok(file.into())
}

pub fn write(writer: impl Write, sequences: &Sequences) -> Result<()> {
    serde_json::to_writer_pretty(writer, &SnapshotFile::from(sequences))
        .map_err(|e| Error::Io(e.into()))
}

pub fn to_string(sequences: &Sequences) -> Result<String> {
    let mut buf = Vec::new();
    write(&mut buf, sequences)?;
    String::from_utf8(buf).map_err(|e| Error::load_format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_phases_default_to_empty() {
        let seq = parse(r#"{"clicks": [{"x":1,"y":2,"interval":100}]}"#).unwrap();
        assert!(seq.phase(Phase::Pre).is_empty());
        assert!(seq.phase(Phase::Post).is_empty());
        assert_eq!(seq.phase(Phase::Main), &[Step::new(1, 2, 100)]);
    }

    #[test]
    fn non_numeric_coordinate_is_rejected() {
        let err = parse(r#"{"pre": [{"x":"a","y":2,"interval":100}]}"#).unwrap_err();
        assert!(matches!(err, Error::LoadFormat(_)));
    }

    #[test]
    fn float_coordinates_are_rounded() {
        let seq = parse(
            r#"{"clicks": [{"x":512.0,"y":384.0,"interval":100}, {"x":10.4,"y":-3.6,"interval":5}]}"#,
        )
        .unwrap();
        assert_eq!(seq.phase(Phase::Main), &[Step::new(512, 384, 100), Step::new(10, -4, 5)]);
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let err = parse(r#"{"pre": [{"x":1e12,"y":2,"interval":100}]}"#).unwrap_err();
        assert!(matches!(err, Error::LoadFormat(_)));
    }

    #[test]
    fn negative_interval_is_rejected() {
        assert!(parse(r#"{"post": [{"x":1,"y":2,"interval":-5}]}"#).is_err());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(matches!(parse("[1, 2, 3]"), Err(Error::LoadFormat(_))));
        assert!(matches!(parse(r#"{"pre": 4}"#), Err(Error::LoadFormat(_))));
        assert!(matches!(parse("not json"), Err(Error::LoadFormat(_))));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let seq = parse(r#"{"pre": [], "version": 2}"#).unwrap();
        assert!(seq.is_empty());
    }

    #[test]
    fn written_file_uses_original_keys() {
        let seq = Sequences::from_phases(vec![Step::new(5, 6, 7)], vec![], vec![]);
        let text = to_string(&seq).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pre"][0]["interval"], 7);
        assert!(value["clicks"].as_array().unwrap().is_empty());
        assert_eq!(parse(&text).unwrap(), seq);
    }
}
