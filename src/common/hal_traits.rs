// src/common/hal_traits.rs

use super::error::BusFault;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in time produced by a [`NoteTimer`], usable for deadline checks.
///
/// Any copyable, ordered instant with `Duration` arithmetic qualifies; a
/// blanket impl covers e.g. `std::time::Instant` and HAL tick wrappers.
pub trait NoteInstant:
    Copy + PartialOrd + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

impl<T> NoteInstant for T where
    T: Copy + PartialOrd + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

/// Abstraction for raw I2C master access to the card.
///
/// One whole bus transaction per call, blocking until it completes or the
/// controller reports a fault. No partial transfers: a successful `read`
/// has filled the entire buffer.
pub trait NoteI2c {
    /// Error reported by the bus implementation, classifiable via [`BusFault`].
    type Error: BusFault;

    /// Writes `bytes` to the device at `address` in a single transaction.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Reads exactly `buffer.len()` bytes from the device at `address`.
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Reinitializes the bus controller after a fault.
    ///
    /// Called unconditionally on transmit faults; must not fail. In-flight
    /// state is discarded.
    fn reset(&mut self);
}

/// Abstraction for blocking delays and a monotonic clock.
pub trait NoteTimer {
    type Instant: NoteInstant;

    /// Blocks for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Returns the current instant of a monotonic clock.
    fn now(&self) -> Self::Instant;
}

/// Adapter making any `embedded-hal` 1.0 I2C peripheral usable as a
/// [`NoteI2c`] (requires the `impl-hal` feature).
///
/// `reset` is a no-op: `embedded-hal` exposes no controller reinit. Targets
/// whose controller wedges on a fault should implement [`NoteI2c`] directly
/// on a type that can tear the peripheral down and bring it back up.
#[cfg(feature = "impl-hal")]
pub struct HalBus<I2C> {
    bus: I2C,
}

#[cfg(feature = "impl-hal")]
impl<I2C> HalBus<I2C> {
    pub fn new(bus: I2C) -> Self {
        Self { bus }
    }

    /// Releases the wrapped peripheral.
    pub fn release(self) -> I2C {
        self.bus
    }
}

/// Newtype carrying an `embedded-hal` I2C error through [`BusFault`].
#[cfg(feature = "impl-hal")]
#[derive(Debug)]
pub struct HalBusError<E>(pub E);

#[cfg(feature = "impl-hal")]
impl<E> BusFault for HalBusError<E>
where
    E: embedded_hal::i2c::Error,
{
    fn kind(&self) -> super::error::BusErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        use super::error::BusErrorKind;
        match self.0.kind() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusErrorKind::AddressNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => BusErrorKind::DataNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown) => BusErrorKind::AddressNack,
            ErrorKind::Overrun => BusErrorKind::Oversize,
            _ => BusErrorKind::Unknown,
        }
    }
}

#[cfg(feature = "impl-hal")]
impl<I2C> NoteI2c for HalBus<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = HalBusError<I2C::Error>;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(address, bytes).map_err(HalBusError)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.read(address, buffer).map_err(HalBusError)
    }

    fn reset(&mut self) {}
}
