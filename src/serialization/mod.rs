//! Serialization surface for saved games.
//!
//! This module defines the flat-record JSON format saved games are stored
//! in: one `{x, y, value}` record per cell in grid order (value null when
//! the cell is empty), then exactly one trailing `{score}` record. The shape
//! is kept byte-compatible with existing stored saves.

mod snapshot;

pub use snapshot::{
    SnapshotError,
    to_json_string,
    from_json_str,
    write_json_to_path,
    read_json_from_path,
};
