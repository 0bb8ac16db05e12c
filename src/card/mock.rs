// src/card/mock.rs

//! Scripted card simulator for unit tests: implements the bus and timer
//! traits with a virtual clock, records every transaction, and serves
//! replies according to the wire protocol's control-write/read handshake.

use crate::common::error::{BusErrorKind, BusFault};
use crate::common::hal_traits::{NoteI2c, NoteTimer};
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::ops::{Add, Sub};
use core::time::Duration;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MockInstant(u64);

impl Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_millis() as u64))
    }
}

impl Sub<MockInstant> for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: MockInstant) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockBusError(pub BusErrorKind);

impl BusFault for MockBusError {
    fn kind(&self) -> BusErrorKind {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct MockCard {
    now_ms: u64,

    // Transmit side
    pub frames: Vec<Vec<u8>>,
    pub written: Vec<u8>,
    pub write_attempts: usize,
    pub control_writes: usize,
    pub resets: usize,
    pub fail_writes: usize,
    pub write_fault: BusErrorKind,

    // Receive side
    pub reads: usize,
    pub fail_reads: usize,
    replies: VecDeque<VecDeque<u8>>,
    pub echo: bool,
    pub echo_override: Option<u8>,
    pub available_override: Option<u8>,
    pub available_script: Option<VecDeque<u8>>,
    pub endless_available: Option<u8>,
    pending_request: Option<u8>,
}

impl MockCard {
    pub fn new() -> Self {
        MockCard {
            now_ms: 0,
            frames: Vec::new(),
            written: Vec::new(),
            write_attempts: 0,
            control_writes: 0,
            resets: 0,
            fail_writes: 0,
            write_fault: BusErrorKind::Unknown,
            reads: 0,
            fail_reads: 0,
            replies: VecDeque::new(),
            echo: false,
            echo_override: None,
            available_override: None,
            available_script: None,
            endless_available: None,
            pending_request: None,
        }
    }

    /// Queues one reply the card will serve; each staged reply is drained by
    /// one exchange before the next becomes visible as available.
    pub fn stage_reply(&mut self, data: &[u8]) {
        self.replies.push_back(data.iter().copied().collect());
    }

    pub fn fault(&self, kind: BusErrorKind) -> MockBusError {
        MockBusError(kind)
    }
}

impl NoteI2c for MockCard {
    type Error = MockBusError;

    fn write(&mut self, _address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.write_attempts += 1;
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(MockBusError(self.write_fault));
        }

        if bytes.len() == 2 && bytes[0] == 0x00 {
            // Read-request control write
            self.control_writes += 1;
            self.pending_request = Some(bytes[1]);
        } else {
            // Length-prefixed data chunk
            assert_eq!(bytes[0] as usize, bytes.len() - 1, "bad chunk length header");
            self.frames.push(bytes.to_vec());
            self.written.extend_from_slice(&bytes[1..]);
            if self.echo {
                if self.replies.is_empty() {
                    self.replies.push_back(VecDeque::new());
                }
                if let Some(back) = self.replies.back_mut() {
                    back.extend(bytes[1..].iter().copied());
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, _address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(MockBusError(BusErrorKind::Unknown));
        }
        self.reads += 1;

        assert!(buffer.len() >= 2, "protocol read shorter than its header");
        let requested = buffer.len() - 2;
        let expected = self.pending_request.take();
        assert_eq!(expected, Some(requested as u8), "read without matching request");

        for slot in buffer[2..].iter_mut() {
            *slot = self
                .replies
                .front_mut()
                .and_then(|reply| reply.pop_front())
                .unwrap_or(0);
        }

        let remaining = self.replies.front().map_or(0, |reply| reply.len());
        let available = if let Some(n) = self.endless_available {
            n
        } else if let Some(script) = self.available_script.as_mut() {
            script.pop_front().unwrap_or(0)
        } else if let Some(n) = self.available_override {
            n
        } else {
            remaining.min(253) as u8
        };
        if remaining == 0 && !self.replies.is_empty() {
            self.replies.pop_front();
        }

        buffer[0] = available;
        buffer[1] = self.echo_override.unwrap_or(requested as u8);
        Ok(())
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

impl NoteTimer for MockCard {
    type Instant = MockInstant;

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms = self.now_ms.saturating_add(u64::from(ms));
    }

    fn now(&self) -> Self::Instant {
        MockInstant(self.now_ms)
    }
}
