//! Tape persistence
//!
//! Human-readable JSON, streamed through `BufReader`/`BufWriter` rather than
//! intermediate strings. Loads decode the wire shape first and admit it
//! through [`Tape::from_segments`], so an ill-formed chain surfaces as
//! [`IoError::InvalidTape`], distinct from a JSON-level failure.
//!
//! Author: Moroya Sakamoto

use crate::tape::{RawTape, Tape, TapeError};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// File I/O errors
#[derive(Error, Debug)]
pub enum IoError {
    /// Underlying file I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or schema mismatch
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The file decoded but the chain is not well formed
    #[error("Invalid tape: {0}")]
    InvalidTape(#[from] TapeError),
}

/// Save a tape to a JSON file
pub fn save_tape(tape: &Tape, path: impl AsRef<Path>) -> Result<(), IoError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, tape)
        .map_err(|e| IoError::Serialization(e.to_string()))?;

    Ok(())
}

/// Load a tape from a JSON file, validating the chain
pub fn load_tape(path: impl AsRef<Path>) -> Result<Tape, IoError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let raw: RawTape =
        serde_json::from_reader(reader).map_err(|e| IoError::Serialization(e.to_string()))?;

    Ok(Tape::from_segments(raw.segments)?)
}

/// Serialize a tape to a JSON string
pub fn to_json_string(tape: &Tape) -> Result<String, IoError> {
    serde_json::to_string_pretty(tape).map_err(|e| IoError::Serialization(e.to_string()))
}

/// Parse a tape from a JSON string, validating the chain
pub fn from_json_string(json: &str) -> Result<Tape, IoError> {
    let raw: RawTape =
        serde_json::from_str(json).map_err(|e| IoError::Serialization(e.to_string()))?;
    Ok(Tape::from_segments(raw.segments)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::{Instruction, Slot, TapeBuilder, TapeSegment};
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("alice_atlas_io_{}", name));
        path
    }

    fn wave_tape() -> Tape {
        let mut b = TapeBuilder::with_segment_capacity(4).unwrap();
        let x = b.x();
        let s = b.sin(x);
        let y = b.y();
        let c = b.cos(y);
        b.add(s, c);
        b.build().unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let tape = wave_tape();
        let path = temp_path("round_trip.json");

        save_tape(&tape, &path).unwrap();
        let loaded = load_tape(&path).unwrap();

        assert_eq!(loaded, tape);
        assert_eq!(loaded.segment_count(), 2);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_string_round_trip() {
        let tape = wave_tape();
        let json = to_json_string(&tape).unwrap();
        let parsed = from_json_string(&json).unwrap();
        assert_eq!(parsed, tape);
    }

    #[test]
    fn test_load_rejects_ill_formed_chain() {
        // Well-formed JSON, ill-formed chain: slot 1 references itself.
        let segment = TapeSegment::new(vec![
            Instruction::x(),
            Instruction::neg(Slot::new(0)),
        ])
        .unwrap();
        let mut json = serde_json::to_value(&Tape::from_segments(vec![segment]).unwrap()).unwrap();
        json["segments"][0]["instructions"][1]["lhs"] = serde_json::json!(1.0);

        let err = from_json_string(&json.to_string()).unwrap_err();
        assert!(matches!(err, IoError::InvalidTape(_)));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = from_json_string("{not json").unwrap_err();
        assert!(matches!(err, IoError::Serialization(_)));
    }
}
