// src/common/error.rs

use core::fmt::Debug;

/// Classification of a bus-layer fault, independent of the HAL's own error type.
///
/// Mirrors the categories an I2C controller can report for a failed
/// transaction (see `embedded_hal::i2c::ErrorKind` for the equivalent
/// taxonomy in the HAL ecosystem).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusErrorKind {
    /// The peripheral did not acknowledge its address.
    AddressNack,
    /// The peripheral did not acknowledge a data byte.
    DataNack,
    /// The bus transaction timed out.
    Timeout,
    /// The data did not fit the controller's transmit buffer.
    Oversize,
    /// Any other transmission fault.
    Unknown,
}

/// Implemented by a bus implementation's error type so the transport can
/// classify and log a fault before resetting the bus.
pub trait BusFault: Debug {
    fn kind(&self) -> BusErrorKind;
}

#[derive(Debug, thiserror::Error)]
pub enum NoteError<E = ()>
where
    E: Debug,
{
    /// Underlying bus fault from the I2C implementation.
    #[error("I2C fault: {0:?}")]
    Bus(E),

    /// Provided address is not a valid 7-bit bus address.
    #[error("invalid 7-bit device address {0:#04x}")]
    InvalidAddress(u8),

    /// Chunk handed to the transport exceeds the bus write limit.
    #[error("chunk of {got} bytes exceeds bus limit of {limit}")]
    ChunkTooLong { got: usize, limit: usize },

    /// No complete response arrived before the deadline.
    #[error("response timed out")]
    Timeout,

    /// Serialized request does not fit the transaction buffer.
    #[error("request exceeds {capacity} byte transaction buffer")]
    BufferOverflow { capacity: usize },

    /// Peripheral reported more pending bytes than the protocol allows (253).
    #[error("available byte count {0} above protocol maximum")]
    AvailableOverflow(u8),

    /// Peripheral echoed a different byte count than was requested.
    #[error("echoed byte count {echoed} does not match requested {requested}")]
    EchoMismatch { requested: u8, echoed: u8 },
}

// Allow mapping from the underlying bus error if From is implemented
impl<E: Debug> From<E> for NoteError<E> {
    fn from(e: E) -> Self {
        NoteError::Bus(e)
    }
}
