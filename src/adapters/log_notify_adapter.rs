//! Append-to-logfile notification adapter.
//!
//! Stands in for a real messaging integration: one timestamped line per
//! message, appended to a per-strategy log file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::domain::error::PairtraderError;
use crate::ports::notify_port::NotifyPort;

pub struct LogNotifyAdapter {
    path: PathBuf,
}

impl LogNotifyAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl NotifyPort for LogNotifyAdapter {
    fn send(&self, message: &str) -> Result<(), PairtraderError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{stamp}: {message}")?;
        Ok(())
    }
}
