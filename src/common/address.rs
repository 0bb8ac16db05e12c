// src/common/address.rs

use super::error::NoteError;
use core::convert::TryFrom;
use core::fmt;

/// A validated 7-bit I2C device address.
///
/// The reserved ranges `0x00..=0x07` and `0x78..=0x7F` are rejected; the
/// card cannot legally occupy them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NoteAddr(u8);

impl NoteAddr {
    /// Factory-default address of the card.
    pub const DEFAULT_ADDRESS: NoteAddr = NoteAddr(0x17);

    /// Creates a new `NoteAddr` if the given byte is a usable 7-bit address.
    pub fn new(address: u8) -> Result<Self, NoteError<()>> {
        if Self::is_valid_address(address) {
            Ok(NoteAddr(address))
        } else {
            Err(NoteError::InvalidAddress(address))
        }
    }

    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_valid_address(address: u8) -> bool {
        matches!(address, 0x08..=0x77)
    }
}

impl Default for NoteAddr {
    fn default() -> Self {
        Self::DEFAULT_ADDRESS
    }
}

impl TryFrom<u8> for NoteAddr {
    type Error = NoteError<()>;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NoteAddr> for u8 {
    fn from(value: NoteAddr) -> Self {
        value.0
    }
}

impl fmt::Display for NoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(NoteAddr::new(0x08).is_ok());
        assert!(NoteAddr::new(0x17).is_ok());
        assert!(NoteAddr::new(0x77).is_ok());
    }

    #[test]
    fn test_reserved_addresses() {
        assert!(matches!(NoteAddr::new(0x00), Err(NoteError::InvalidAddress(0x00))));
        assert!(matches!(NoteAddr::new(0x07), Err(NoteError::InvalidAddress(0x07))));
        assert!(matches!(NoteAddr::new(0x78), Err(NoteError::InvalidAddress(0x78))));
        assert!(matches!(NoteAddr::new(0xFF), Err(NoteError::InvalidAddress(0xFF))));
    }

    #[test]
    fn test_default_is_card_address() {
        assert_eq!(NoteAddr::default().get(), 0x17);
    }

    #[test]
    fn test_try_from_u8() {
        assert_eq!(NoteAddr::try_from(0x17).unwrap(), NoteAddr(0x17));
        assert!(NoteAddr::try_from(0x7F).is_err());
    }
}
