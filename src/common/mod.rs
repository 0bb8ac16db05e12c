// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod base64;
pub mod document;
pub mod error;
pub mod hal_traits;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From address.rs
pub use address::NoteAddr;

// From document.rs
pub use document::{EntryPath, NoteDocument};

// From error.rs
pub use error::{BusErrorKind, BusFault, NoteError};

// From hal_traits.rs
pub use hal_traits::{NoteI2c, NoteInstant, NoteTimer};

// From timing.rs (constants - users can access via common::timing::*)
// No re-exports by default.

// --- Feature-gated re-exports ---

// embedded-hal adapter (from hal_traits.rs)
#[cfg(feature = "impl-hal")]
pub use hal_traits::{HalBus, HalBusError};
