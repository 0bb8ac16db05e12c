// src/settings.rs

//! Persistent application settings for the card link.
//!
//! Storage is a byte-addressed store (typically flash) behind the
//! [`SettingsStore`] contract. Records carry a validity marker so reading
//! uninitialized storage is detected instead of trusted.

use crate::card::SimUsage;
use alloc::string::{String, ToString};
use arrayvec::ArrayVec;

/// Byte-offset read/write access to persistent storage.
///
/// Both operations report plain success/failure; the store decides nothing
/// about content.
pub trait SettingsStore {
    fn read(&mut self, offset: u32, buffer: &mut [u8]) -> bool;
    fn write(&mut self, offset: u32, data: &[u8]) -> bool;
}

/// Flash offset of the report interval record.
pub const INTERVAL_OFFSET: u32 = 0x02;
/// Flash offset of the card settings record.
pub const SETTINGS_OFFSET: u32 = 0x10;

/// Marker byte validating the interval record.
const INTERVAL_MARK: u8 = 0xAA;
/// Marker word validating the settings record.
const VALID_MARK: u16 = 0xAA55;

const UID_LEN: usize = 256;
const APN_LEN: usize = 256;
/// marker + product UID + connection mode + SIM usage + APN + motion flag
const RECORD_LEN: usize = 2 + UID_LEN + 1 + 1 + APN_LEN + 1;

/// Settings governing how the card connects and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSettings {
    /// Hub product identifier, e.g. `com.my-company.my-name:my-project`.
    pub product_uid: String,
    /// Continuous connection instead of periodic sync.
    pub continuous: bool,
    pub sim_usage: SimUsage,
    /// Access point name used with an external SIM.
    pub ext_sim_apn: String,
    /// Report on motion instead of on a fixed schedule.
    pub motion_trigger: bool,
}

impl Default for CardSettings {
    fn default() -> Self {
        CardSettings {
            product_uid: "com.my-company.my-name:my-project".to_string(),
            continuous: false,
            sim_usage: SimUsage::Internal,
            ext_sim_apn: "internet".to_string(),
            motion_trigger: false,
        }
    }
}

/// Copies `text` into a NUL-padded field of `len` bytes, truncating as
/// needed but always leaving a terminating NUL.
fn push_text_field(record: &mut ArrayVec<u8, RECORD_LEN>, text: &str, len: usize) {
    let copy = text.len().min(len - 1);
    record.extend(text.as_bytes()[..copy].iter().copied());
    for _ in copy..len {
        record.push(0);
    }
}

fn text_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl CardSettings {
    /// Loads settings from `store`. Returns `None` when the store cannot be
    /// read or holds no valid record; callers fall back to `Default`.
    pub fn load(store: &mut impl SettingsStore) -> Option<Self> {
        let mut record = [0u8; RECORD_LEN];
        if !store.read(SETTINGS_OFFSET, &mut record) {
            log::warn!("settings store read failed");
            return None;
        }
        if u16::from_le_bytes([record[0], record[1]]) != VALID_MARK {
            log::debug!("no valid settings record found");
            return None;
        }

        let uid = &record[2..2 + UID_LEN];
        let continuous = record[2 + UID_LEN] != 0;
        let sim = record[2 + UID_LEN + 1];
        let apn = &record[2 + UID_LEN + 2..2 + UID_LEN + 2 + APN_LEN];
        let motion = record[RECORD_LEN - 1] != 0;

        Some(CardSettings {
            product_uid: text_field(uid),
            continuous,
            sim_usage: SimUsage::from_u8(sim).unwrap_or_default(),
            ext_sim_apn: text_field(apn),
            motion_trigger: motion,
        })
    }

    /// Writes the settings record, marker included.
    pub fn save(&self, store: &mut impl SettingsStore) -> bool {
        let mut record = ArrayVec::<u8, RECORD_LEN>::new();
        record.extend(VALID_MARK.to_le_bytes());
        push_text_field(&mut record, &self.product_uid, UID_LEN);
        record.push(self.continuous as u8);
        record.push(self.sim_usage as u8);
        push_text_field(&mut record, &self.ext_sim_apn, APN_LEN);
        record.push(self.motion_trigger as u8);

        let saved = store.write(SETTINGS_OFFSET, &record);
        if !saved {
            log::warn!("saving settings failed");
        }
        saved
    }
}

/// Loads the report interval in seconds, or `None` when unset.
pub fn load_interval(store: &mut impl SettingsStore) -> Option<u32> {
    let mut record = [0u8; 5];
    if !store.read(INTERVAL_OFFSET, &mut record) {
        log::warn!("interval read failed");
        return None;
    }
    if record[4] != INTERVAL_MARK {
        log::debug!("no valid report interval found");
        return None;
    }
    Some(u32::from_le_bytes([record[0], record[1], record[2], record[3]]))
}

/// Writes the report interval in seconds, retrying the write once.
pub fn save_interval(store: &mut impl SettingsStore, seconds: u32) -> bool {
    let mut record = [0u8; 5];
    record[..4].copy_from_slice(&seconds.to_le_bytes());
    record[4] = INTERVAL_MARK;
    store.write(INTERVAL_OFFSET, &record) || store.write(INTERVAL_OFFSET, &record)
}
