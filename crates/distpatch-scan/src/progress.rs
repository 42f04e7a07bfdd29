//! Read progress reporting.

use std::time::Duration;

/// Progress information while reading a distribution.
#[derive(Debug, Clone)]
pub struct ReadProgress {
    /// Number of archive entries read so far.
    pub entries_read: u64,
    /// Number of file entries read so far.
    pub files_read: u64,
    /// Number of directory entries read so far.
    pub dirs_read: u64,
    /// Total content bytes read so far.
    pub bytes_read: u64,
    /// Entry currently being read.
    pub current_entry: String,
    /// Time elapsed since the read started.
    pub elapsed: Duration,
}

impl ReadProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            entries_read: 0,
            files_read: 0,
            dirs_read: 0,
            bytes_read: 0,
            current_entry: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate read rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_read as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate read rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_read as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ReadProgress {
    fn default() -> Self {
        Self::new()
    }
}
