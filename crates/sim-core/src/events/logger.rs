//! Action Logger
//!
//! Append-only JSONL log of actions, one record per line.

use sim_events::Action;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes actions to a JSONL file
pub struct ActionLogger {
    writer: Option<BufWriter<File>>,
    action_count: u64,
}

impl ActionLogger {
    /// Create a new logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            action_count: 0,
        })
    }

    /// Create a logger that discards actions
    pub fn null() -> Self {
        Self {
            writer: None,
            action_count: 0,
        }
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn log(&mut self, action: &Action) -> std::io::Result<()> {
        self.action_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = action.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, actions: &[Action]) -> std::io::Result<()> {
        for action in actions {
            self.log(action)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for ActionLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to flush action log");
        }
    }
}
