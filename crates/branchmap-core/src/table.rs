use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    Written { rows: usize },
    /// Nothing to write; any existing file is left untouched.
    Skipped,
}

/// Writes `rows` as CSV with a header taken from the record's field names.
/// Missing values become empty cells.
pub fn write_table<R: Serialize>(path: &Path, rows: &[R]) -> Result<TableOutcome, CoreError> {
    if rows.is_empty() {
        return Ok(TableOutcome::Skipped);
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| CoreError::io(parent, error))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|error| CoreError::csv(path, error))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|error| CoreError::csv(path, error))?;
    }
    writer.flush().map_err(|error| CoreError::io(path, error))?;

    Ok(TableOutcome::Written { rows: rows.len() })
}

/// `serialize_with` helper writing a flag as `True` or `False`.
pub fn title_case_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    }

    #[test]
    fn writes_header_and_blank_missing_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("rows.csv");
        let rows = [
            Row { name: "Nizami", latitude: Some(40.37), longitude: Some(49.84) },
            Row { name: "Gəncə", latitude: None, longitude: None },
        ];

        let outcome = write_table(&path, &rows).expect("write succeeds");

        assert_eq!(outcome, TableOutcome::Written { rows: 2 });
        let written = fs::read_to_string(&path).expect("file exists");
        assert_eq!(written, "name,latitude,longitude\nNizami,40.37,49.84\nGəncə,,\n");
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rows.csv");

        let outcome = write_table::<Row>(&path, &[]).expect("skip succeeds");

        assert_eq!(outcome, TableOutcome::Skipped);
        assert!(!path.exists());
    }
}
