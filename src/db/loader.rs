//! Bulk loading
//!
//! Feeds JSON-lines input (one object per line) through `Database::create`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::error::{AtlasError, Result};

use super::database::Database;

/// Create one record per non-blank line of `reader`; returns how many
pub fn load_json_lines<R: BufRead>(db: &Database, reader: R) -> Result<usize> {
    let mut count = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(fields) => {
                db.create(fields);
                count += 1;
            }
            other => {
                return Err(AtlasError::InvalidArgument(format!(
                    "line {}: expected a JSON object, got {}",
                    line_no + 1,
                    other
                )));
            }
        }
    }

    tracing::info!(count, "records loaded");
    Ok(count)
}

/// [`load_json_lines`] over a file
pub fn load_json_lines_file(db: &Database, path: &Path) -> Result<usize> {
    let file = File::open(path)?;
    load_json_lines(db, BufReader::new(file))
}
