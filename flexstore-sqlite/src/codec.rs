//! Conversions between rows and model types.
//!
//! Timestamps are stored as RFC 3339 UTC text with exactly nine fractional digits.
//! Every encoded value has the same width, so comparing the text compares the
//! instants; `ORDER BY created_at` and `MAX(updated_at, ?)` rely on this.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Row, types::Type};
use serde_json::value::RawValue;

use flexstore_core::{collection::Collection, document::Document};

pub(crate) const COLLECTION_COLUMNS: &str = "name, created_at, updated_at";
pub(crate) const DOCUMENT_COLUMNS: &str = "id, collection_name, data, created_at, updated_at";

pub(crate) fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|at| at.with_timezone(&Utc))
}

fn timestamp_column(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(index)?;

    decode_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Maps a row selected with [`COLLECTION_COLUMNS`].
pub(crate) fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        name: row.get(0)?,
        created_at: timestamp_column(row, 1)?,
        updated_at: timestamp_column(row, 2)?,
    })
}

/// Maps a row selected with [`DOCUMENT_COLUMNS`].
pub(crate) fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let data: String = row.get(2)?;
    let data = RawValue::from_string(data)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Document {
        id: row.get(0)?,
        collection_name: row.get(1)?,
        data,
        created_at: timestamp_column(row, 3)?,
        updated_at: timestamp_column(row, 4)?,
    })
}
