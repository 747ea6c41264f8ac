//! Replication stream and append-only log
//!
//! Every batch an invocation propagates lands here. The stream inserts a
//! `SELECT` whenever an entry targets a different database than the one
//! before it, keeps the most recent entries in a bounded backlog, and appends
//! them to the append-only log when one is configured.
//!
//! # Log format
//!
//! The log is a sequence of RESP arrays of bulk strings, one per command,
//! exactly as a client would send them. A torn final entry (crash during a
//! write) is ignored on load.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ember_core::resp::parse_frame;
use ember_core::{Frame, Result};
use tracing::{error, warn};

use crate::config::FsyncPolicy;
use crate::propagate::Propagated;

/// Append-only file of propagated commands.
#[derive(Debug)]
pub(crate) struct AppendOnlyLog {
    path: PathBuf,
    writer: BufWriter<File>,
    fsync: FsyncPolicy,
}

impl AppendOnlyLog {
    pub(crate) fn open(path: &Path, fsync: FsyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(AppendOnlyLog {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            fsync,
        })
    }

    fn write_batch(&mut self, entries: &[Vec<Vec<u8>>]) -> io::Result<()> {
        for argv in entries {
            self.writer.write_all(&Frame::command(argv))?;
        }
        self.writer.flush()?;
        if self.fsync == FsyncPolicy::Always {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

/// Read every complete command from an append-only log.
pub(crate) fn read_log(path: &Path) -> Result<Vec<Vec<Vec<u8>>>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut commands = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (frame, used) = match parse_frame(&bytes[offset..]) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    target: "ember::propagate",
                    path = %path.display(),
                    offset,
                    error = %e,
                    "ignoring truncated tail of append-only log"
                );
                break;
            }
        };
        offset += used;
        match frame {
            Frame::Array(items) => {
                let argv: Option<Vec<Vec<u8>>> = items
                    .into_iter()
                    .map(|item| match item {
                        Frame::Bulk(bytes) => Some(bytes),
                        _ => None,
                    })
                    .collect();
                match argv {
                    Some(argv) if !argv.is_empty() => commands.push(argv),
                    _ => warn!(target: "ember::propagate", offset, "skipping malformed log entry"),
                }
            }
            _ => warn!(target: "ember::propagate", offset, "skipping non-array log entry"),
        }
    }
    Ok(commands)
}

#[derive(Debug)]
pub(crate) struct ReplicationStream {
    backlog: VecDeque<Vec<Vec<u8>>>,
    capacity: usize,
    current_db: Option<usize>,
    offset: u64,
    log: Option<AppendOnlyLog>,
}

impl ReplicationStream {
    pub(crate) fn new(capacity: usize, log: Option<AppendOnlyLog>) -> Self {
        ReplicationStream {
            backlog: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            current_db: None,
            offset: 0,
            log,
        }
    }

    /// Append one invocation's batch.
    pub(crate) fn append(&mut self, batch: Vec<Propagated>) {
        if batch.is_empty() {
            return;
        }
        let mut entries = Vec::with_capacity(batch.len() + 1);
        for entry in batch {
            if let Some(db) = entry.db {
                if self.current_db != Some(db) {
                    entries.push(vec![b"SELECT".to_vec(), db.to_string().into_bytes()]);
                    self.current_db = Some(db);
                }
            }
            entries.push(entry.argv);
        }

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.write_batch(&entries) {
                error!(
                    target: "ember::propagate",
                    path = %log.path.display(),
                    error = %e,
                    "append-only log write failed"
                );
            }
        }

        for argv in entries {
            if self.backlog.len() == self.capacity {
                self.backlog.pop_front();
            }
            self.backlog.push_back(argv);
            self.offset += 1;
        }
    }

    /// Most recent entries, oldest first.
    pub(crate) fn backlog(&self) -> Vec<Vec<Vec<u8>>> {
        self.backlog.iter().cloned().collect()
    }

    /// Path of the append-only log, if one is open
    pub(crate) fn log_path(&self) -> Option<PathBuf> {
        self.log.as_ref().map(|log| log.path.clone())
    }

    /// Total entries ever appended
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}
