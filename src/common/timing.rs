// src/common/timing.rs

use core::time::Duration;

// The card surfaces only a small interrupt-fed receive buffer; every pacing
// constant below exists to keep the host from overrunning it. Values match
// the card's documented I2C timing.

// === Bus limits ===

/// Maximum payload bytes per bus write (excluding the 1-byte length header).
pub const CHUNK_MAX: usize = 32;
/// Maximum value the peripheral may report as still-available after a read.
pub const AVAILABLE_MAX: u8 = 253;
/// Capacity of the shared request/reply transaction buffer.
pub const TRANSACTION_BUFFER: usize = 4096;

// === Transmit pacing ===

/// Pause before each chunk write (and before each read poll).
pub const CHUNK_PRE_DELAY: Duration = Duration::from_millis(6);
/// Pause after each chunk write.
pub const CHUNK_POST_DELAY: Duration = Duration::from_millis(20);
/// Bytes after which the longer segment pause is inserted.
pub const SEGMENT_LENGTH: usize = 250;
/// Pause after each transmitted segment, letting the card drain its buffer.
pub const SEGMENT_DELAY: Duration = Duration::from_millis(250);

// === Receive timing ===

/// Settle time between the read-request control write and the bus read.
pub const READ_SETTLE_DELAY: Duration = Duration::from_millis(2);
/// Pause between polls while the card has nothing available yet.
pub const POLL_DELAY: Duration = Duration::from_millis(50);
/// Overall deadline for a complete response.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

// === Retry discipline ===

/// Attempts for the read-request control write inside `receive`.
pub const CONTROL_WRITE_ATTEMPTS: usize = 3;
/// Attempts for a full build-send-interpret cycle at every call site.
pub const REQUEST_ATTEMPTS: usize = 3;
/// Pause between full-cycle attempts.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);
