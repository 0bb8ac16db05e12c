// src/card/requests.rs

use super::Notecard;
use crate::common::{
    base64,
    error::NoteError,
    hal_traits::{NoteI2c, NoteTimer},
};

/// A named float reading destined for the note body, e.g. `("temp", 23.4)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Measurement<'a> {
    pub name: &'a str,
    pub value: f32,
}

impl<'a> Measurement<'a> {
    pub fn new(name: &'a str, value: f32) -> Self {
        Self { name, value }
    }
}

/// Which SIM the card's modem uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SimUsage {
    /// Internal eSIM only.
    #[default]
    Internal = 0,
    /// External SIM only.
    External = 1,
    /// External SIM first, internal eSIM as fallback.
    ExternalPrimary = 2,
    /// Internal eSIM first, external SIM as fallback.
    ExternalSecondary = 3,
}

impl SimUsage {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SimUsage::Internal),
            1 => Some(SimUsage::External),
            2 => Some(SimUsage::ExternalPrimary),
            3 => Some(SimUsage::ExternalSecondary),
            _ => None,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            SimUsage::Internal => "primary",
            SimUsage::External => "secondary",
            SimUsage::ExternalPrimary => "dual-secondary-primary",
            SimUsage::ExternalSecondary => "dual-primary-secondary",
        }
    }

    fn uses_external_sim(&self) -> bool {
        !matches!(self, SimUsage::Internal)
    }
}

// High-level card operations. Thin call sites: build a request, run it
// through the retry envelope, read what the caller needs out of the reply.
impl<IF> Notecard<IF>
where
    IF: NoteI2c + NoteTimer,
{
    /// Points the card at a hub route and sets its sync cadence.
    pub fn hub_set(
        &mut self,
        product_uid: &str,
        continuous: bool,
        sync_seconds: i32,
    ) -> Result<(), NoteError<IF::Error>> {
        self.with_retries(|card| {
            card.start_request("hub.set");
            card.doc_mut().set_str("product", product_uid);
            card.doc_mut()
                .set_str("mode", if continuous { "continuous" } else { "minimum" });
            card.doc_mut().set_i32("seconds", sync_seconds);
            card.doc_mut().set_bool("heartbeat", true);
            card.send_request()
        })
    }

    /// Selects the SIM and, for external SIMs, the access point name.
    pub fn wireless(&mut self, usage: SimUsage, apn: &str) -> Result<(), NoteError<IF::Error>> {
        self.with_retries(|card| {
            card.start_request("card.wireless");
            card.doc_mut().set_str("mode", "auto");
            if usage.uses_external_sim() {
                card.doc_mut().set_str("apn", apn);
            }
            card.doc_mut().set_str("method", usage.method());
            card.send_request()
        })
    }

    /// Queries the card's firmware version, copying the reply JSON into
    /// `reply`. Returns the number of bytes copied.
    pub fn firmware_version(&mut self, reply: &mut [u8]) -> Result<usize, NoteError<IF::Error>> {
        self.with_retries(|card| {
            card.start_request("card.version");
            card.send_request_with_reply(reply)
        })
    }

    /// Queries the hub connection status, copying the reply JSON into
    /// `reply`. Returns the number of bytes copied.
    pub fn hub_status(&mut self, reply: &mut [u8]) -> Result<usize, NoteError<IF::Error>> {
        self.with_retries(|card| {
            card.start_request("hub.status");
            card.send_request_with_reply(reply)
        })
    }

    /// Turns off location sampling and location tracking.
    pub fn disable_location(&mut self) -> Result<(), NoteError<IF::Error>> {
        self.with_retries(|card| {
            card.start_request("card.location.mode");
            card.doc_mut().set_str("mode", "off");
            card.send_request()
        })?;
        self.with_retries(|card| {
            card.start_request("card.location.track");
            card.doc_mut().set_bool("stop", true);
            card.send_request()
        })
    }

    /// Turns off motion sensing, motion sync and motion tracking.
    pub fn disable_motion(&mut self) -> Result<(), NoteError<IF::Error>> {
        for request in ["card.motion.mode", "card.motion.sync", "card.motion.track"] {
            self.with_retries(|card| {
                card.start_request(request);
                card.doc_mut().set_bool("stop", true);
                card.send_request()
            })?;
        }
        Ok(())
    }

    /// Submits a sensor note for sync: named measurements in the body plus
    /// the raw payload, base64-encoded.
    pub fn send_note(
        &mut self,
        device_id: &str,
        measurements: &[Measurement<'_>],
        payload: &[u8],
    ) -> Result<(), NoteError<IF::Error>> {
        let encoded = base64::encode_string(payload);
        self.with_retries(|card| {
            card.start_request("note.add");
            card.doc_mut().set_str("file", "data.qo");
            card.doc_mut().set_bool("sync", true);
            card.doc_mut().set_str(("body", "dev_eui"), device_id);
            for m in measurements {
                card.doc_mut().set_f32(("body", m.name), m.value);
            }
            card.doc_mut().set_str("payload", &encoded);
            card.send_request()
        })
    }

    /// Asks the hub to drop the card's state so it reconnects from scratch.
    /// Single-shot: not retried.
    pub fn restore(&mut self) -> Result<(), NoteError<IF::Error>> {
        self.start_request("hub.status");
        self.doc_mut().set_bool("delete", true);
        self.doc_mut().set_bool("connected", true);
        self.send_request()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::mock::MockCard;
    use crate::common::error::BusErrorKind;
    use alloc::string::String;

    fn replying_card(replies: usize) -> Notecard<MockCard> {
        let mut mock = MockCard::new();
        for _ in 0..replies {
            mock.stage_reply(b"{}\n");
        }
        Notecard::new(mock)
    }

    fn written_text(card: &Notecard<MockCard>) -> String {
        String::from_utf8(card.interface.written.clone()).unwrap()
    }

    #[test]
    fn test_hub_set_builds_expected_request() {
        let mut card = replying_card(1);
        card.hub_set("com.example:sensor", true, 120).unwrap();
        assert_eq!(
            written_text(&card),
            "{\"heartbeat\":true,\"mode\":\"continuous\",\"product\":\"com.example:sensor\",\"req\":\"hub.set\",\"seconds\":120}\n"
        );
    }

    #[test]
    fn test_wireless_internal_sim_omits_apn() {
        let mut card = replying_card(1);
        card.wireless(SimUsage::Internal, "internet").unwrap();
        let text = written_text(&card);
        assert!(text.contains("\"method\":\"primary\""));
        assert!(!text.contains("apn"));
    }

    #[test]
    fn test_wireless_external_sim_carries_apn() {
        let mut card = replying_card(1);
        card.wireless(SimUsage::ExternalPrimary, "internet").unwrap();
        let text = written_text(&card);
        assert!(text.contains("\"apn\":\"internet\""));
        assert!(text.contains("\"method\":\"dual-secondary-primary\""));
    }

    #[test]
    fn test_send_note_encodes_payload_and_body() {
        let mut card = replying_card(1);
        let measurements = [
            Measurement::new("temp", 23.5),
            Measurement::new("humid", 48.25),
        ];
        card.send_note("0011223344556677", &measurements, &[0x00, 0x01, 0x02])
            .unwrap();
        let text = written_text(&card);
        assert!(text.contains("\"req\":\"note.add\""));
        assert!(text.contains("\"file\":\"data.qo\""));
        assert!(text.contains("\"payload\":\"AAEC\""));
        assert!(text.contains("\"body\":{\"dev_eui\":\"0011223344556677\",\"humid\":48.25,\"temp\":23.5}"));
    }

    #[test]
    fn test_failing_exchange_attempted_exactly_three_times() {
        let mut mock = MockCard::new();
        mock.fail_writes = usize::MAX;
        mock.write_fault = BusErrorKind::Timeout;
        let mut card = Notecard::new(mock);

        let result = card.hub_set("com.example:sensor", false, 60);
        assert!(matches!(result, Err(NoteError::Bus(_))));
        // One failed first-chunk write per attempt, no fourth attempt.
        assert_eq!(card.interface.write_attempts, 3);
    }

    #[test]
    fn test_version_reply_reaches_caller_buffer() {
        let mut mock = MockCard::new();
        mock.stage_reply(b"{\"version\":\"notecard-5.3.1\"}\n");
        let mut card = Notecard::new(mock);

        let mut reply: heapless::Vec<u8, 64> = heapless::Vec::new();
        reply.resize_default(64).unwrap();
        let copied = card.firmware_version(&mut reply).unwrap();
        assert_eq!(&reply[..copied], b"{\"version\":\"notecard-5.3.1\"}");

        let mut version = [0u8; 32];
        let len = card.doc().get_str("version", &mut version).unwrap();
        assert_eq!(&version[..len], b"notecard-5.3.1");
    }

    #[test]
    fn test_disable_motion_issues_all_three_requests() {
        let mut card = replying_card(3);
        card.disable_motion().unwrap();
        let text = written_text(&card);
        assert!(text.contains("\"req\":\"card.motion.mode\""));
        assert!(text.contains("\"req\":\"card.motion.sync\""));
        assert!(text.contains("\"req\":\"card.motion.track\""));
    }

    #[test]
    fn test_restore_is_single_shot() {
        let mut mock = MockCard::new();
        mock.fail_writes = usize::MAX;
        let mut card = Notecard::new(mock);

        let result = card.restore();
        assert!(matches!(result, Err(NoteError::Bus(_))));
        assert_eq!(card.interface.write_attempts, 1);
    }
}
