//! Append-only irrigation journal.
//!
//! One CSV file, one row per decision:
//!
//! ```text
//! Fecha y Hora,Humedad (raw),Válvula,Observaciones[,Estado visual]
//! 2025-06-01 08:00:00,950,ON,auto: valve activated, soil dry
//! ```
//!
//! Rows are only ever appended, except for [`Journal::amend_last_visual_state`],
//! which rewrites the visual-state cell of the last row. Every operation runs
//! under one internal mutex, so an amend can never interleave with an append
//! from the same process.

mod record;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;

use crate::error::JournalError;

pub use record::{JournalRecord, TIMESTAMP_FORMAT};

/// Fixed columns, in order.
pub const HEADER: [&str; 4] = ["Fecha y Hora", "Humedad (raw)", "Válvula", "Observaciones"];

/// Column added by the classification collaborator.
pub const VISUAL_COLUMN: &str = "Estado visual";

/// File-backed journal store.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Journal {
    /// Open the journal at `path`, creating parent directories and writing the
    /// header if the file is missing or empty. Never truncates existing rows.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| JournalError::io(parent, e))?;
        }
        let journal = Self {
            path,
            lock: Mutex::new(()),
        };
        let file = journal.open_for_append()?;
        drop(file);
        debug!("journal ready at {}", journal.path.display());
        Ok(journal)
    }

    /// Attach to an existing journal without writing to it.
    ///
    /// Returns `None` when no file exists at `path`. A zero-length file is
    /// left as is and reads back as empty.
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Option<Self>, JournalError> {
        let path = path.into();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(Self {
                path,
                lock: Mutex::new(()),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JournalError::io(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &JournalRecord) -> Result<(), JournalError> {
        let _guard = self.guard();
        let width = match self.read_headers()? {
            Some(headers) => headers.len().max(HEADER.len()),
            None => HEADER.len(),
        };
        let mut fields = record.to_fields();
        fields.resize(width, String::new());

        let file = self.open_for_append()?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(&fields)?;
        writer.flush().map_err(|e| JournalError::io(&self.path, e))?;
        Ok(())
    }

    /// Most recent record, or `None` when no data row exists yet.
    pub fn last_record(&self) -> Result<Option<JournalRecord>, JournalError> {
        let _guard = self.guard();
        let Some((headers, rows)) = self.read_table()? else {
            return Ok(None);
        };
        let columns = record::Columns::locate(&headers);
        rows.last()
            .map(|row| JournalRecord::from_row(row, &columns))
            .transpose()
    }

    /// Every record, oldest first.
    pub fn records(&self) -> Result<Vec<JournalRecord>, JournalError> {
        let _guard = self.guard();
        let Some((headers, rows)) = self.read_table()? else {
            return Ok(Vec::new());
        };
        let columns = record::Columns::locate(&headers);
        rows.iter()
            .map(|row| JournalRecord::from_row(row, &columns))
            .collect()
    }

    /// Number of data rows.
    pub fn len(&self) -> Result<usize, JournalError> {
        let _guard = self.guard();
        Ok(self.read_table()?.map_or(0, |(_, rows)| rows.len()))
    }

    pub fn is_empty(&self) -> Result<bool, JournalError> {
        self.len().map(|n| n == 0)
    }

    /// Set the visual-state label on the last row.
    ///
    /// Adds the `Estado visual` column if the file does not have it yet and
    /// replaces the file through a rename. Returns `false` (and writes
    /// nothing) when the journal has no rows.
    pub fn amend_last_visual_state(&self, label: &str) -> Result<bool, JournalError> {
        let _guard = self.guard();
        let Some((mut headers, rows)) = self.read_table()? else {
            return Ok(false);
        };
        if rows.is_empty() {
            return Ok(false);
        }

        let visual_idx = match headers.iter().position(|h| h == VISUAL_COLUMN) {
            Some(idx) => idx,
            None => {
                headers.push_field(VISUAL_COLUMN);
                headers.len() - 1
            }
        };
        let width = headers.len();
        let last = rows.len() - 1;

        let tmp = self.path.with_extension("csv.tmp");
        let file = File::create(&tmp).map_err(|e| JournalError::io(&tmp, e))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(&headers)?;
        for (i, row) in rows.iter().enumerate() {
            let mut fields: Vec<&str> = row.iter().collect();
            fields.resize(width.max(fields.len()), "");
            if i == last {
                fields[visual_idx] = label;
            }
            writer.write_record(&fields)?;
        }
        writer
            .into_inner()
            .map_err(|e| JournalError::io(&tmp, e.into_error()))?
            .sync_all()
            .map_err(|e| JournalError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| JournalError::io(&self.path, e))?;

        debug!("amended last row with visual state {label:?}");
        Ok(true)
    }

    // ── Internal ──────────────────────────────────────────────

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open for appending, writing the header first if the file is empty.
    fn open_for_append(&self) -> Result<File, JournalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| JournalError::io(&self.path, e))?;
        let len = file
            .metadata()
            .map_err(|e| JournalError::io(&self.path, e))?
            .len();
        if len == 0 {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut file);
            writer.write_record(HEADER)?;
            writer.flush().map_err(|e| JournalError::io(&self.path, e))?;
        }
        Ok(file)
    }

    fn open_for_read(&self) -> Result<Option<File>, JournalError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JournalError::io(&self.path, e)),
        }
    }

    fn read_headers(&self) -> Result<Option<StringRecord>, JournalError> {
        let Some(file) = self.open_for_read()? else {
            return Ok(None);
        };
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader.headers()?.clone();
        Ok((!headers.is_empty()).then_some(headers))
    }

    fn read_table(&self) -> Result<Option<(StringRecord, Vec<StringRecord>)>, JournalError> {
        let Some(file) = self.open_for_read()? else {
            return Ok(None);
        };
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(None);
        }
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Some((headers, rows)))
    }
}
