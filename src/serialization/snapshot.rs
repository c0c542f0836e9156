use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{SavedCell, Snapshot};

/// One entry of the stored record list.
///
/// Kept untagged so the serialized form is exactly the shape existing saves
/// use: plain `{x, y, value}` objects followed by one `{score}` object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum Record {
    Cell(SavedCell),
    Score { score: u64 },
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot has no records")]
    Empty,
    #[error("last record must be the score total")]
    MissingScore,
    #[error("score record before the end of the record list")]
    MisplacedScore,
}

/// Encode a snapshot as the flat JSON record list: every cell in grid order
/// (`value` null when empty), then one trailing score record.
pub fn to_json_string(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let mut records: Vec<Record> = snapshot.cells.iter().copied().map(Record::Cell).collect();
    records.push(Record::Score {
        score: snapshot.score,
    });
    Ok(serde_json::to_string(&records)?)
}

/// Decode a snapshot from the flat JSON record list.
///
/// Only the list shape is checked here; cell-level validation (coordinates,
/// duplicates, values) happens in `Game::restore`.
pub fn from_json_str(json: &str) -> Result<Snapshot, SnapshotError> {
    let records: Vec<Record> = serde_json::from_str(json)?;
    let (last, cells) = records.split_last().ok_or(SnapshotError::Empty)?;
    let score = match *last {
        Record::Score { score } => score,
        Record::Cell(_) => return Err(SnapshotError::MissingScore),
    };
    let mut out = Vec::with_capacity(cells.len());
    for record in cells {
        match *record {
            Record::Cell(cell) => out.push(cell),
            Record::Score { .. } => return Err(SnapshotError::MisplacedScore),
        }
    }
    Ok(Snapshot { cells: out, score })
}

/// Write a JSON-encoded snapshot to a file.
pub fn write_json_to_path<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let json = to_json_string(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a JSON-encoded snapshot from a file.
pub fn read_json_from_path<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
    let json = fs::read_to_string(path)?;
    from_json_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Game, Move};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::NamedTempFile;

    fn sample_snapshot() -> Snapshot {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::new(&mut rng);
        for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
            game.apply_move(dir, &mut rng);
        }
        game.snapshot()
    }

    #[test]
    fn test_record_list_shape() {
        let json = to_json_string(&sample_snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 17);
        for record in &records[..16] {
            assert!(record.get("x").is_some());
            assert!(record.get("y").is_some());
            assert!(record.get("value").is_some());
            assert!(record.get("score").is_none());
        }
        assert!(records[16].get("score").is_some());
        assert!(records[16].get("x").is_none());
    }

    #[test]
    fn round_trip_string() {
        let snapshot = sample_snapshot();
        let json = to_json_string(&snapshot).unwrap();
        assert_eq!(from_json_str(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_parses_stored_save() {
        // Hand-written in the exact shape older saves used.
        let json = r#"[
            {"x":0,"y":0,"value":2},
            {"x":1,"y":0,"value":null},
            {"x":0,"y":1,"value":null},
            {"x":1,"y":1,"value":4},
            {"score":12}
        ]"#;
        let snapshot = from_json_str(json).unwrap();
        assert_eq!(snapshot.score, 12);
        assert_eq!(snapshot.cells.len(), 4);
        assert_eq!(snapshot.cells[0].value, Some(2));
        assert_eq!(snapshot.cells[1].value, None);

        let mut game = Game::empty_with_size(2);
        game.restore(&snapshot).unwrap();
        assert_eq!(game.score(), 12);
        assert_eq!(game.tile(1, 1).unwrap().value(), 4);
        assert!(game.tile(1, 0).is_none());
    }

    #[test]
    fn test_restore_through_codec() {
        let snapshot = sample_snapshot();
        let json = to_json_string(&snapshot).unwrap();

        let mut game = Game::empty();
        game.restore(&from_json_str(&json).unwrap()).unwrap();
        assert_eq!(game.snapshot(), snapshot);
    }

    #[test]
    fn test_rejects_empty_list() {
        assert!(matches!(from_json_str("[]"), Err(SnapshotError::Empty)));
    }

    #[test]
    fn test_rejects_missing_score() {
        let json = r#"[{"x":0,"y":0,"value":2}]"#;
        assert!(matches!(from_json_str(json), Err(SnapshotError::MissingScore)));
    }

    #[test]
    fn test_rejects_misplaced_score() {
        let json = r#"[{"score":3},{"x":0,"y":0,"value":2},{"score":3}]"#;
        assert!(matches!(from_json_str(json), Err(SnapshotError::MisplacedScore)));
    }

    #[test]
    fn test_rejects_negative_score() {
        let json = r#"[{"x":0,"y":0,"value":2},{"score":-5}]"#;
        assert!(matches!(from_json_str(json), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let snapshot = sample_snapshot();
        let file = NamedTempFile::new().unwrap();
        write_json_to_path(file.path(), &snapshot).unwrap();
        assert_eq!(read_json_from_path(file.path()).unwrap(), snapshot);
    }
}
