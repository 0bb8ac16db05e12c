// src/card/transport.rs

use super::Notecard;
use crate::common::{
    error::{BusFault, NoteError},
    hal_traits::{NoteI2c, NoteTimer},
    timing,
};

// Implementation block for the raw bus primitives
impl<IF> Notecard<IF>
where
    IF: NoteI2c + NoteTimer,
{
    /// Writes one chunk as a single bus transaction: a 1-byte length header
    /// followed by the payload.
    ///
    /// On any bus fault the error is classified and logged, the bus is
    /// reset, and the fault is propagated. There is no partial success.
    pub(super) fn transmit(&mut self, chunk: &[u8]) -> Result<(), NoteError<IF::Error>> {
        if chunk.len() > self.chunk_limit {
            return Err(NoteError::ChunkTooLong {
                got: chunk.len(),
                limit: self.chunk_limit,
            });
        }

        let mut frame = [0u8; timing::CHUNK_MAX + 1];
        frame[0] = chunk.len() as u8;
        frame[1..=chunk.len()].copy_from_slice(chunk);

        if let Err(e) = self.interface.write(self.address.get(), &frame[..chunk.len() + 1]) {
            log::warn!("chunk write failed: {:?}", e.kind());
            self.interface.reset();
            return Err(NoteError::Bus(e));
        }

        Ok(())
    }

    /// Requests `requested` bytes from the peripheral and copies them into
    /// `out`, returning how many more bytes the peripheral still holds.
    ///
    /// Two bus phases: a `[0x00, requested]` control write (retried up to
    /// three times, resetting the bus between failed attempts), then a read
    /// of `requested + 2` bytes whose header is `[available, echoed]`. The
    /// payload reaches `out` only after the header checks pass.
    pub(super) fn receive(
        &mut self,
        out: &mut [u8],
        requested: u8,
    ) -> Result<u8, NoteError<IF::Error>> {
        debug_assert!(usize::from(requested) <= self.chunk_limit);
        debug_assert!(out.len() >= usize::from(requested));

        let mut control_fault = None;
        for _ in 0..timing::CONTROL_WRITE_ATTEMPTS {
            match self.interface.write(self.address.get(), &[0x00, requested]) {
                Ok(()) => {
                    control_fault = None;
                    break;
                }
                Err(e) => {
                    log::warn!("read request failed: {:?}", e.kind());
                    self.interface.reset();
                    control_fault = Some(e);
                }
            }
        }
        if let Some(e) = control_fault {
            return Err(NoteError::Bus(e));
        }

        // Let the peripheral's interrupt-fed buffer settle before reading.
        self.interface
            .delay_ms(timing::READ_SETTLE_DELAY.as_millis() as u32);

        let mut scratch = [0u8; timing::CHUNK_MAX + 2];
        let frame = &mut scratch[..usize::from(requested) + 2];
        if let Err(e) = self.interface.read(self.address.get(), frame) {
            log::warn!("chunk read failed: {:?}", e.kind());
            return Err(NoteError::Bus(e));
        }

        let available = frame[0];
        if available > timing::AVAILABLE_MAX {
            log::warn!("available byte count {} above maximum", available);
            return Err(NoteError::AvailableOverflow(available));
        }

        let echoed = frame[1];
        if echoed != requested {
            log::warn!("echoed byte count {} does not match requested {}", echoed, requested);
            return Err(NoteError::EchoMismatch { requested, echoed });
        }

        out[..usize::from(requested)].copy_from_slice(&frame[2..]);
        Ok(available)
    }
}
