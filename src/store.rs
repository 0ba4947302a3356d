//! Monthly sheet storage over OpenDAL
//!
//! The store is the workbook: one CSV object per calendar month at the
//! operator root, named `{key}.csv`. Row 1 of every sheet is the fixed
//! header; rows 2..N are `(timestamp, name, status)` in arrival order.

use opendal::Operator;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Header row seeded into every sheet at creation time.
pub const SHEET_HEADER: [&str; 3] = ["Date", "Name", "Attendance"];

/// One check-in record, appended verbatim to the month's sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinRow {
    pub timestamp: String,
    pub name: String,
    pub status: String,
}

/// Outcome of a successful [`Store::record`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Whether this call created and seeded the month's sheet
    pub sheet_created: bool,
}

/// Handle to the backing tabular store.
///
/// Replaces the ambient "active spreadsheet" of the original design with an
/// explicit handle held in application state. Mutations are serialized
/// behind an async mutex, so within one process a month's sheet is created
/// exactly once and appends never interleave.
pub struct Store {
    op: Operator,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(op: Operator) -> Self {
        Self {
            op,
            write_lock: Mutex::new(()),
        }
    }

    /// Append `row` to the sheet for `key`, creating and seeding the sheet
    /// first if this is the month's first write.
    ///
    /// Creation and append are separate writes: a failure between the two
    /// leaves a header-only sheet behind, and the append itself is
    /// all-or-nothing at single-row granularity.
    pub async fn record(&self, key: &str, row: &CheckinRow) -> Result<RecordOutcome> {
        let _guard = self.write_lock.lock().await;
        let object = sheet_object(key);

        let exists = self.object_exists(key, &object).await?;

        let sheet_created = if exists {
            false
        } else {
            self.create_sheet(key, &object).await?;
            true
        };

        let mut content = self
            .op
            .read(&object)
            .await
            .map_err(|e| StoreError::Read {
                sheet: key.to_string(),
                source: e,
            })?
            .to_vec();

        let record = encode_record(&[
            row.timestamp.as_str(),
            row.name.as_str(),
            row.status.as_str(),
        ])
        .map_err(|e| {
            StoreError::Encode {
                sheet: key.to_string(),
                source: e,
            }
        })?;
        content.extend_from_slice(&record);

        self.op
            .write(&object, content)
            .await
            .map_err(|e| StoreError::Write {
                sheet: key.to_string(),
                source: e,
            })?;

        debug!(sheet = %key, created = sheet_created, "Appended row");
        Ok(RecordOutcome { sheet_created })
    }

    /// Create the sheet for `key` seeded with the header row.
    async fn create_sheet(&self, key: &str, object: &str) -> Result<()> {
        let header = encode_record(&SHEET_HEADER).map_err(|e| StoreError::Encode {
            sheet: key.to_string(),
            source: e,
        })?;

        self.op
            .write(object, header)
            .await
            .map_err(|e| StoreError::Write {
                sheet: key.to_string(),
                source: e,
            })?;

        debug!(sheet = %key, "Created sheet");
        Ok(())
    }

    /// Read all rows of the sheet for `key`, header included.
    pub async fn rows(&self, key: &str) -> Result<Vec<Vec<String>>> {
        let content = self
            .op
            .read(&sheet_object(key))
            .await
            .map_err(|e| StoreError::Read {
                sheet: key.to_string(),
                source: e,
            })?
            .to_vec();

        decode_rows(&content).map_err(|e| StoreError::Decode {
            sheet: key.to_string(),
            source: e,
        })
    }

    /// Whether a sheet exists for `key`.
    pub async fn sheet_exists(&self, key: &str) -> Result<bool> {
        self.object_exists(key, &sheet_object(key)).await
    }

    async fn object_exists(&self, key: &str, object: &str) -> Result<bool> {
        // OpenDAL 0.54 API: use stat() and check for error
        match self.op.stat(object).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Stat {
                sheet: key.to_string(),
                source: e,
            }),
        }
    }

    /// Readiness probe: verify the backing store answers a listing.
    pub async fn ping(&self) -> Result<()> {
        self.op
            .list("")
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unreachable { source: e })
    }
}

fn sheet_object(key: &str) -> String {
    format!("{}.csv", key)
}

fn encode_record(fields: &[&str]) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(fields)?;
        writer.flush()?;
    }
    Ok(buf)
}

fn decode_rows(content: &[u8]) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
