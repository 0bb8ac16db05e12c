// src/card/mod.rs

mod exchange;
#[cfg(test)]
pub(crate) mod mock;
mod requests;
mod transport;

pub use requests::{Measurement, SimUsage};

use crate::common::{
    document::NoteDocument,
    error::NoteError,
    hal_traits::{NoteI2c, NoteTimer},
    timing, NoteAddr,
};

/// Driver for one card on one bus.
///
/// Owns the bus interface, the structured document and the shared
/// transaction buffer; all protocol state lives here, so a single `Notecard`
/// per bus replaces the module-level globals a C port of the wire protocol
/// would use. Exchanges are strictly synchronous and one at a time.
#[derive(Debug)]
pub struct Notecard<IF>
where
    IF: NoteI2c + NoteTimer,
{
    pub(crate) interface: IF,
    address: NoteAddr,
    chunk_limit: usize,
    doc: NoteDocument,
    txn: [u8; timing::TRANSACTION_BUFFER],
    reply_len: usize,
}

impl<IF> Notecard<IF>
where
    IF: NoteI2c + NoteTimer,
{
    /// Creates a driver for a card at the factory-default address.
    pub fn new(interface: IF) -> Self {
        Self::with_address(interface, NoteAddr::DEFAULT_ADDRESS)
    }

    pub fn with_address(interface: IF, address: NoteAddr) -> Self {
        Notecard {
            interface,
            address,
            chunk_limit: timing::CHUNK_MAX,
            doc: NoteDocument::new(),
            txn: [0; timing::TRANSACTION_BUFFER],
            reply_len: 0,
        }
    }

    /// Lowers the per-write chunk size below the default bus limit, for
    /// platforms whose I2C buffers are smaller than 32 bytes.
    pub fn set_chunk_limit(&mut self, limit: usize) {
        self.chunk_limit = limit.clamp(1, timing::CHUNK_MAX);
    }

    pub fn address(&self) -> NoteAddr {
        self.address
    }

    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Releases the bus interface.
    pub fn release(self) -> IF {
        self.interface
    }

    /// The shared document: the request being built, or, after a successful
    /// exchange, the parsed response.
    pub fn doc(&self) -> &NoteDocument {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut NoteDocument {
        &mut self.doc
    }

    /// Begins a new request named `request`, clearing any previous contents.
    pub fn start_request(&mut self, request: &str) {
        self.doc.clear();
        self.doc.set_str("req", request);
    }

    /// Runs a build-send-interpret cycle up to three times with a fixed
    /// pause in between, returning the first success or the last error.
    ///
    /// Every call site that talks to the card goes through this envelope;
    /// there is no backoff and no jitter.
    pub fn with_retries<T, F>(&mut self, mut op: F) -> Result<T, NoteError<IF::Error>>
    where
        F: FnMut(&mut Self) -> Result<T, NoteError<IF::Error>>,
    {
        let mut last_error = NoteError::Timeout;

        for attempt in 0..timing::REQUEST_ATTEMPTS {
            match op(self) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = e,
            }

            if attempt + 1 < timing::REQUEST_ATTEMPTS {
                self.interface.delay_ms(timing::RETRY_DELAY.as_millis() as u32);
            }
        }

        Err(last_error)
    }

    /// The reply as reassembled from the bus, newline included.
    pub fn reply_bytes(&self) -> &[u8] {
        &self.txn[..self.reply_len]
    }
}
