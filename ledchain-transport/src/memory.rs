//! In-memory transport that records every latch.

use ledchain_core::{Transport, TransportError};

/// Records each `write` as one latch; can be told to fail.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    channel: String,
    writes: Vec<Vec<u8>>,
    baud: u32,
    verbose: bool,
    /// Writes accepted before every further write fails.
    fail_after: Option<usize>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryTransport {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            writes: Vec::new(),
            baud: 0,
            verbose: false,
            fail_after: None,
        }
    }

    /// Accept `count` more writes, then fail every following one.
    pub fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(self.writes.len() + count);
    }

    /// Stop injecting failures.
    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub fn take_writes(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.writes)
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_after.is_some_and(|limit| self.writes.len() >= limit) {
            return Err(TransportError::NotOpen(self.channel.clone()));
        }
        if self.verbose {
            tracing::info!(channel = %self.channel, frames = %crate::format_latch(bytes), "write");
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        self.baud = hz;
        Ok(())
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn channel(&self) -> &str {
        &self.channel
    }
}
