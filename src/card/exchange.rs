// src/card/exchange.rs

use super::Notecard;
use crate::common::{
    error::NoteError,
    hal_traits::{NoteI2c, NoteTimer},
    timing,
};

impl<IF> Notecard<IF>
where
    IF: NoteI2c + NoteTimer,
{
    /// Sends the current document to the card and replaces it with the
    /// card's response.
    ///
    /// Success means the request was fully transmitted and the response was
    /// reassembled up to a trailing newline with the peripheral drained. A
    /// response that cannot be parsed still counts as success and leaves the
    /// document empty.
    pub fn send_request(&mut self) -> Result<(), NoteError<IF::Error>> {
        self.exchange()?;
        Ok(())
    }

    /// Like [`send_request`](Self::send_request), additionally copying the
    /// response re-serialized as compact JSON into `reply`, truncated to its
    /// capacity. Returns the number of bytes copied.
    pub fn send_request_with_reply(
        &mut self,
        reply: &mut [u8],
    ) -> Result<usize, NoteError<IF::Error>> {
        self.exchange()?;
        let text = self.doc.to_json();
        let copy = text.len().min(reply.len());
        reply[..copy].copy_from_slice(&text[..copy]);
        Ok(copy)
    }

    fn exchange(&mut self) -> Result<(), NoteError<IF::Error>> {
        self.reply_len = 0;

        // Serialize the document, newline-terminated, into the transaction
        // buffer.
        let body = self.doc.to_json();
        if body.len() + 1 > self.txn.len() {
            log::warn!("request of {} bytes exceeds transaction buffer", body.len() + 1);
            return Err(NoteError::BufferOverflow { capacity: self.txn.len() });
        }
        log::debug!(
            "request: {}",
            core::str::from_utf8(&body).unwrap_or("<invalid utf8>")
        );
        self.txn[..body.len()].copy_from_slice(&body);
        self.txn[body.len()] = b'\n';
        let total = body.len() + 1;

        self.transmit_frames(total)?;
        self.reassemble_reply()?;

        log::debug!(
            "response: {}",
            core::str::from_utf8(self.reply_bytes()).unwrap_or("<invalid utf8>")
        );

        // Parse failure is non-fatal: the caller sees an empty document.
        let reply_len = self.reply_len;
        if !self.doc.replace_from_json(&self.txn[..reply_len]) {
            log::debug!("response did not parse, leaving document empty");
        }

        Ok(())
    }

    /// Transmits `total` buffered bytes in bus-legal chunks, paced so the
    /// card's interrupt-fed receive buffer is never overrun.
    fn transmit_frames(&mut self, total: usize) -> Result<(), NoteError<IF::Error>> {
        let mut offset = 0;
        let mut sent_in_segment = 0;

        while offset < total {
            let chunk_len = (total - offset).min(self.chunk_limit);
            let mut chunk = [0u8; timing::CHUNK_MAX];
            chunk[..chunk_len].copy_from_slice(&self.txn[offset..offset + chunk_len]);

            self.interface
                .delay_ms(timing::CHUNK_PRE_DELAY.as_millis() as u32);
            self.transmit(&chunk[..chunk_len])?;

            offset += chunk_len;
            sent_in_segment += chunk_len;
            if sent_in_segment > timing::SEGMENT_LENGTH {
                sent_in_segment = 0;
                self.interface
                    .delay_ms(timing::SEGMENT_DELAY.as_millis() as u32);
            }
            self.interface
                .delay_ms(timing::CHUNK_POST_DELAY.as_millis() as u32);
        }

        Ok(())
    }

    /// Polls the card and reassembles the newline-terminated reply into the
    /// transaction buffer.
    ///
    /// The available-count returned by each poll sizes the next request; the
    /// loop ends successfully only once a newline has been seen AND the
    /// peripheral reports nothing left, since the card can surface the
    /// newline before its internal queue has drained. The 30 s deadline is
    /// checked on every iteration, so a peripheral that keeps reporting
    /// pending bytes cannot starve the timeout.
    fn reassemble_reply(&mut self) -> Result<(), NoteError<IF::Error>> {
        let started = self.interface.now();
        let deadline = started + timing::RESPONSE_TIMEOUT;

        let mut len = 0usize;
        let mut chunk_len = 0usize;
        let mut saw_newline = false;

        loop {
            self.interface
                .delay_ms(timing::CHUNK_PRE_DELAY.as_millis() as u32);

            let mut chunk = [0u8; timing::CHUNK_MAX];
            let available = self.receive(&mut chunk[..chunk_len], chunk_len as u8)?;
            self.txn[len..len + chunk_len].copy_from_slice(&chunk[..chunk_len]);
            len += chunk_len;

            // The newline alone does not end the loop; the peripheral must
            // also report itself drained.
            if len > 0 && self.txn[len - 1] == b'\n' {
                saw_newline = true;
            }

            // Size the next request from this poll's available-count,
            // clamped to what the buffer can still hold.
            chunk_len = usize::from(available)
                .min(self.chunk_limit)
                .min(self.txn.len() - len);

            if chunk_len > 0 {
                if self.interface.now() >= deadline {
                    log::warn!("no complete response within deadline");
                    return Err(NoteError::Timeout);
                }
                continue;
            }

            if saw_newline {
                break;
            }

            // Drained into a full buffer with no newline: keep what we have.
            if available == 0 && len >= self.txn.len() {
                log::warn!("reply reached transaction buffer capacity");
                break;
            }

            if self.interface.now() >= deadline {
                log::warn!("no response");
                return Err(NoteError::Timeout);
            }

            self.interface
                .delay_ms(timing::POLL_DELAY.as_millis() as u32);
        }

        self.reply_len = len;
        Ok(())
    }
}
