use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime, Timelike};
use shared::{
    domain::{IdPolicy, LogRecord, Selection, LOG_HEADER},
    selection::SelectionSink,
};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("issue log '{path}' does not exist; it must be initialized first")]
    NotInitialized { path: PathBuf },
    #[error("issue log '{path}' does not start with the expected header row")]
    MissingHeader { path: PathBuf },
    #[error("row {row} of issue log '{path}' is not a valid record: {reason}")]
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },
    #[error("failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("malformed issue log '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Append-only CSV issue log. Row 1 is always [`LOG_HEADER`].
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    id_policy: IdPolicy,
}

struct LogScan {
    data_rows: usize,
    last_id: Option<u64>,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>, id_policy: IdPolicy) -> Self {
        Self {
            path: path.into(),
            id_policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    /// Creates the log with only the header row when it does not exist yet.
    /// An existing file is left alone whatever it contains. Returns whether
    /// the file was created.
    pub fn ensure_initialized(&self) -> Result<bool, LogStoreError> {
        if self.exists()? {
            return Ok(false);
        }
        ensure_parent_dir_exists(&self.path)?;

        let header = encode_row(&self.path, |writer| writer.write_record(LOG_HEADER))?;
        let tmp = self.stage(&new_log_builder(), &self.path, &header)?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {}
            // lost a race against another initializer; the file is there now
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(self.io_error("create", err.error)),
        }

        info!(path = %self.path.display(), "created issue log");
        Ok(true)
    }

    pub fn append(&self, category: &str, issue: &str) -> Result<LogRecord, LogStoreError> {
        self.append_at(category, issue, Local::now().naive_local())
    }

    /// Reads the whole log, derives the next id, and replaces the file with
    /// the old contents plus one row in a single rename. The replacement
    /// keeps the log's permissions, and a symlinked log is rewritten at its
    /// target.
    pub fn append_at(
        &self,
        category: &str,
        issue: &str,
        timestamp: NaiveDateTime,
    ) -> Result<LogRecord, LogStoreError> {
        let mut contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LogStoreError::NotInitialized {
                    path: self.path.clone(),
                })
            }
            Err(err) => return Err(self.io_error("read", err)),
        };

        let scan = self.scan(&contents)?;
        let id = self.next_id(&scan)?;

        let record = LogRecord {
            id,
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            category: category.to_string(),
            issue: issue.to_string(),
        };
        let row = encode_row(&self.path, |writer| writer.serialize(&record))?;

        if !contents.is_empty() && !contents.ends_with(b"\n") {
            contents.push(b'\n');
        }
        contents.extend_from_slice(&row);

        let target = self.resolve_target()?;
        let permissions = fs::metadata(&target)
            .map_err(|err| self.io_error("inspect", err))?
            .permissions();
        let tmp = self.stage(&Builder::new(), &target, &contents)?;
        fs::set_permissions(tmp.path(), permissions)
            .map_err(|err| self.io_error("copy permissions for", err))?;
        tmp.persist(&target)
            .map_err(|err| self.io_error("save", err.error))?;

        debug!(
            path = %self.path.display(),
            id = record.id,
            category = %record.category,
            issue = %record.issue,
            "appended issue record"
        );
        Ok(record)
    }

    /// All data rows in file order.
    pub fn records(&self) -> Result<Vec<LogRecord>, LogStoreError> {
        let contents = fs::read(&self.path).map_err(|err| self.io_error("read", err))?;
        let mut reader = csv::ReaderBuilder::new().from_reader(contents.as_slice());

        let headers = reader.headers().map_err(|source| self.csv_error(source))?;
        if !headers.iter().eq(LOG_HEADER) {
            return Err(self.missing_header());
        }

        reader
            .deserialize::<LogRecord>()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|err| LogStoreError::InvalidRow {
                    path: self.path.clone(),
                    row: index + 2,
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    fn scan(&self, contents: &[u8]) -> Result<LogScan, LogStoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(contents);
        let mut rows = reader.records();

        match rows.next() {
            Some(Ok(header)) if header.iter().eq(LOG_HEADER) => {}
            Some(Err(source)) => return Err(self.csv_error(source)),
            _ => return Err(self.missing_header()),
        }

        let mut data_rows = 0;
        let mut last = None;
        for row in rows {
            last = Some(row.map_err(|source| self.csv_error(source))?);
            data_rows += 1;
        }

        let last_id = match last {
            Some(row) => {
                let raw = row.get(0).unwrap_or_default().trim();
                let id = raw.parse::<u64>().map_err(|_| LogStoreError::InvalidRow {
                    path: self.path.clone(),
                    row: data_rows + 1,
                    reason: format!("id '{raw}' is not a positive integer"),
                })?;
                Some(id)
            }
            None => None,
        };

        Ok(LogScan { data_rows, last_id })
    }

    fn next_id(&self, scan: &LogScan) -> Result<u64, LogStoreError> {
        let next = match self.id_policy {
            IdPolicy::Sequential => match scan.last_id {
                Some(last) => last.checked_add(1),
                None => Some(1),
            },
            IdPolicy::LegacyRowNumber => u64::try_from(scan.data_rows)
                .ok()
                .and_then(|rows| rows.checked_add(2)),
        };
        next.ok_or_else(|| LogStoreError::InvalidRow {
            path: self.path.clone(),
            row: scan.data_rows + 1,
            reason: "no id is left after the last record's id".to_string(),
        })
    }

    /// The file a rename must replace: the symlink target when the log is a
    /// symlink, the log path otherwise.
    fn resolve_target(&self) -> Result<PathBuf, LogStoreError> {
        let metadata =
            fs::symlink_metadata(&self.path).map_err(|err| self.io_error("inspect", err))?;
        if metadata.file_type().is_symlink() {
            fs::canonicalize(&self.path).map_err(|err| self.io_error("resolve", err))
        } else {
            Ok(self.path.clone())
        }
    }

    fn stage(
        &self,
        builder: &Builder<'_, '_>,
        target: &Path,
        contents: &[u8],
    ) -> Result<NamedTempFile, LogStoreError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = builder
            .tempfile_in(dir)
            .map_err(|err| self.io_error("stage", err))?;
        tmp.write_all(contents)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| self.io_error("write", err))?;
        Ok(tmp)
    }

    fn exists(&self) -> Result<bool, LogStoreError> {
        self.path
            .try_exists()
            .map_err(|err| self.io_error("inspect", err))
    }

    fn io_error(&self, action: &'static str, source: io::Error) -> LogStoreError {
        LogStoreError::Io {
            action,
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> LogStoreError {
        LogStoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn missing_header(&self) -> LogStoreError {
        LogStoreError::MissingHeader {
            path: self.path.clone(),
        }
    }
}

impl SelectionSink for LogStore {
    fn append(&mut self, selection: &Selection) -> anyhow::Result<LogRecord> {
        Ok(LogStore::append(
            self,
            selection.category.as_str(),
            selection.issue.as_str(),
        )?)
    }
}

fn encode_row(
    path: &Path,
    write: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
) -> Result<Vec<u8>, LogStoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write(&mut writer).map_err(|source| LogStoreError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    writer.into_inner().map_err(|err| LogStoreError::Io {
        action: "encode",
        path: path.to_path_buf(),
        source: err.into_error(),
    })
}

/// Staging for a brand-new log: on unix the usual 0666 minus umask instead
/// of the owner-only mode of temporary files.
fn new_log_builder() -> Builder<'static, 'static> {
    #[allow(unused_mut)]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn ensure_parent_dir_exists(path: &Path) -> Result<(), LogStoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|source| LogStoreError::Io {
        action: "create parent directory for",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
