use std::path::Path;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub mod events;
pub mod model;
pub mod noise;
pub mod result;
pub mod tables;

pub use model::OccupancyModel;
pub use result::PredictionResult;
pub use tables::ModelTables;

/// Violated preconditions of a prediction call.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid month: {0} (expected 1-12)")]
    InvalidMonth(u8),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("no lot characteristics configured for `{0}`")]
    MissingLotCharacteristics(String),
}

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("failed to read model tables: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse model tables: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model tables: {0}")]
    Invalid(String),
}

/// Loads and validates model tables from a JSON file.
pub fn load_tables_from_path(path: impl AsRef<Path>) -> Result<ModelTables, TablesError> {
    let contents = std::fs::read_to_string(path)?;
    let tables: ModelTables = serde_json::from_str(&contents)?;
    tables.validate()?;
    Ok(tables)
}

/// Parses an RFC 3339 timestamp and shifts it to local wall-clock time.
pub fn parse_local_timestamp(
    raw: &str,
    offset: UtcOffset,
) -> Result<PrimitiveDateTime, PredictionError> {
    let parsed = OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|err| PredictionError::InvalidTimestamp(format!("{raw}: {err}")))?;
    Ok(to_local(parsed, offset))
}

pub fn local_now(offset: UtcOffset) -> PrimitiveDateTime {
    to_local(OffsetDateTime::now_utc(), offset)
}

fn to_local(datetime: OffsetDateTime, offset: UtcOffset) -> PrimitiveDateTime {
    let local = datetime.to_offset(offset);
    PrimitiveDateTime::new(local.date(), local.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::{datetime, offset};

    fn temp_path(label: &str) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        Ok(std::env::temp_dir().join(format!("lotcast-{label}-{unique}.json")))
    }

    #[test]
    fn default_tables_round_trip_through_file() -> Result<(), Box<dyn std::error::Error>> {
        let path = temp_path("tables")?;
        fs::write(&path, serde_json::to_string_pretty(&ModelTables::default())?)?;

        let loaded = load_tables_from_path(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded?, ModelTables::default());
        Ok(())
    }

    #[test]
    fn invalid_tables_file_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut tables = ModelTables::default();
        tables.lot_characteristics.remove("public");
        let path = temp_path("tables-invalid")?;
        fs::write(&path, serde_json::to_string(&tables)?)?;

        let loaded = load_tables_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(loaded, Err(TablesError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn malformed_tables_file_is_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = temp_path("tables-malformed")?;
        fs::write(&path, "{\"time_factors\": 3}")?;

        let loaded = load_tables_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(loaded, Err(TablesError::Parse(_))));
        Ok(())
    }

    #[test]
    fn missing_tables_file_is_read_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = temp_path("tables-missing")?;
        assert!(matches!(
            load_tables_from_path(&path),
            Err(TablesError::Read(_))
        ));
        Ok(())
    }

    #[test]
    fn timestamp_is_shifted_to_local_offset() -> Result<(), PredictionError> {
        let local = parse_local_timestamp("2024-10-16T12:30:00Z", offset!(-4))?;
        assert_eq!(local, datetime!(2024-10-16 8:30));
        Ok(())
    }

    #[test]
    fn malformed_timestamp_is_typed_error() {
        assert!(matches!(
            parse_local_timestamp("yesterday at noon", UtcOffset::UTC),
            Err(PredictionError::InvalidTimestamp(_))
        ));
    }
}
