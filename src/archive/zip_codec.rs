//! ZIP/JAR codec
//!
//! Reads every entry of an in-memory archive and builds new archives in memory.
//! Entry timestamps use the ZIP DOS date-time (two-second resolution, no zone),
//! interpreted as UTC.

use crate::error::{Result, SnapshotError};
use crate::types::Timestamp;
use chrono::{Datelike, NaiveDate, Timelike};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// One decoded archive entry
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub timestamp: Timestamp,
    pub is_dir: bool,
}

/// Convert a DOS date-time to milliseconds since the epoch
pub fn dos_time_to_timestamp(dt: DateTime) -> Timestamp {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)
        .and_then(|d| d.and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32))
        .map(|t| t.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Convert milliseconds since the epoch to a DOS date-time, clamped to the DOS range
pub fn timestamp_to_dos_time(ts: Timestamp) -> DateTime {
    let Some(t) = chrono::DateTime::from_timestamp_millis(ts) else {
        return DateTime::default();
    };
    let t = t.naive_utc();
    if t.year() < 1980 {
        return DateTime::default();
    }
    DateTime::from_date_and_time(
        t.year().min(2107) as u16,
        t.month() as u8,
        t.day() as u8,
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
    )
    .unwrap_or_default()
}

/// Decode all entries of a ZIP held in memory, in central-directory order.
pub fn read_entries(bytes: &[u8], origin: &str) -> Result<Vec<ZipEntry>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| SnapshotError::archive(origin, e))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| SnapshotError::archive(origin, e))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| SnapshotError::io(format!("{}!{}", origin, file.name()), e))?;
        entries.push(ZipEntry {
            name: file.name().to_string(),
            timestamp: dos_time_to_timestamp(file.last_modified()),
            is_dir: file.is_dir(),
            data,
        });
    }
    Ok(entries)
}

/// In-memory ZIP writer
///
/// Level 0 stores entries uncompressed; levels 1-9 deflate.
pub struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    level: u32,
    origin: String,
}

impl ZipBuilder {
    pub fn new(level: u32, origin: impl Into<String>) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            level: level.min(9),
            origin: origin.into(),
        }
    }

    fn options(&self, timestamp: Timestamp) -> FileOptions {
        let options = FileOptions::default().last_modified_time(timestamp_to_dos_time(timestamp));
        if self.level == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level as i32))
        }
    }

    pub fn add_file(&mut self, name: &str, data: &[u8], timestamp: Timestamp) -> Result<()> {
        let options = self.options(timestamp);
        self.writer
            .start_file(name, options)
            .map_err(|e| SnapshotError::archive(&self.origin, e))?;
        self.writer
            .write_all(data)
            .map_err(|e| SnapshotError::io(format!("{}!{}", self.origin, name), e))
    }

    /// Add an explicit directory entry; a trailing `/` is appended when missing.
    pub fn add_directory(&mut self, name: &str, timestamp: Timestamp) -> Result<()> {
        let options = self.options(timestamp);
        self.writer
            .add_directory(name.trim_end_matches('/'), options)
            .map_err(|e| SnapshotError::archive(&self.origin, e))
    }

    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| SnapshotError::archive(&self.origin, e))?;
        Ok(cursor.into_inner())
    }
}
