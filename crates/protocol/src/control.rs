//! Signaling-Events (WebSocket, JSON)
//!
//! Definiert alle Events die zwischen Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Jeder Frame ist ein JSON-Objekt `{"event": "<name>", "data": <payload>}`
//! - `data` darf bei Events ohne Nutzlast fehlen
//! - Signal-Nutzlasten (Offer/Answer/ICE) werden nie interpretiert und
//!   unveraendert als `serde_json::Value` weitergereicht

use chrono::{DateTime, Utc};
use duett_core::types::{PeerId, RoomId, Rolle};
use serde::{Deserialize, Serialize};

use crate::wire::ProtokollFehler;

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Signal an einen bestimmten Peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAnfrage {
    /// Empfaenger des Signals
    pub to: PeerId,
    /// Opake Nutzlast (SDP, ICE-Kandidat, ...)
    pub data: serde_json::Value,
}

/// Chat-Nachricht an den Partner im Raum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnfrage {
    pub text: String,
    /// Fehlt die Raum-ID wird die Nachricht verworfen
    #[serde(rename = "roomId", default)]
    pub room_id: Option<RoomId>,
}

/// Tipp-Indikator (typing / stop_typing)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TippAnfrage {
    #[serde(rename = "roomId", default)]
    pub room_id: Option<RoomId>,
}

/// Alle Events die ein Client senden darf
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// In die Vermittlung einreihen
    Join,
    /// Signal an einen Peer weiterleiten
    Signal(SignalAnfrage),
    /// Chat-Nachricht in den Raum senden
    SendMessage(ChatAnfrage),
    /// Partner tippt
    Typing(TippAnfrage),
    /// Partner tippt nicht mehr
    StopTyping(TippAnfrage),
    /// Raum freiwillig verlassen (optional mit Raum-ID)
    Leave(Option<RoomId>),
}

/// Roher Umschlag vor der Auswertung der Nutzlast
#[derive(Debug, Deserialize)]
struct RohEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientEvent {
    /// Deserialisiert ein Client-Event aus einem JSON-Frame
    ///
    /// Unbekannte Events und unvollstaendige Nutzlasten ergeben einen
    /// `ProtokollFehler`; der Aufrufer behandelt sie als No-Op.
    pub fn from_json(json: &str) -> Result<Self, ProtokollFehler> {
        let roh: RohEvent = serde_json::from_str(json)?;
        Self::aus_nutzlast(&roh.event, roh.data)
    }

    /// Wertet die Nutzlast eines bereits zerlegten Events aus
    pub fn aus_nutzlast(event: &str, data: serde_json::Value) -> Result<Self, ProtokollFehler> {
        let ungueltig = |e: serde_json::Error| ProtokollFehler::UngueltigeNutzlast {
            event: event.to_string(),
            grund: e.to_string(),
        };

        match event {
            "join" => Ok(Self::Join),
            "signal" => serde_json::from_value(data)
                .map(Self::Signal)
                .map_err(ungueltig),
            "send_message" => serde_json::from_value(data)
                .map(Self::SendMessage)
                .map_err(ungueltig),
            "typing" => Ok(Self::Typing(tipp_anfrage(data).map_err(ungueltig)?)),
            "stop_typing" => Ok(Self::StopTyping(tipp_anfrage(data).map_err(ungueltig)?)),
            "leave" => serde_json::from_value(data)
                .map(Self::Leave)
                .map_err(ungueltig),
            andere => Err(ProtokollFehler::UnbekanntesEvent(andere.to_string())),
        }
    }

    /// Name des Events fuer Logs und Metrik-Labels
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Signal(_) => "signal",
            Self::SendMessage(_) => "send_message",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stop_typing",
            Self::Leave(_) => "leave",
        }
    }
}

/// typing/stop_typing ohne Nutzlast ist erlaubt (dann ohne Raum)
fn tipp_anfrage(data: serde_json::Value) -> serde_json::Result<TippAnfrage> {
    if data.is_null() {
        return Ok(TippAnfrage::default());
    }
    serde_json::from_value(data)
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Weitergeleitete Chat-Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatNachricht {
    pub from: PeerId,
    pub text: String,
    /// Zeitpunkt an dem der Server die Nachricht angenommen hat
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
}

/// Alle Events die der Server an einen Client sendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Eigene Peer-ID nach dem Verbindungsaufbau
    IdAssigned { id: PeerId },
    /// Peer sitzt im Warteplatz
    Waiting,
    /// Paarung erfolgreich
    Matched {
        room: RoomId,
        role: Rolle,
        partner: PeerId,
    },
    /// Weitergeleitetes Signal
    Signal {
        from: PeerId,
        data: serde_json::Value,
    },
    /// Chat-Nachricht vom Partner
    ReceiveMessage(ChatNachricht),
    /// Partner tippt
    Typing,
    /// Partner tippt nicht mehr
    StopTyping,
    /// Partner hat den Raum verlassen oder die Verbindung verloren
    PartnerLeft { leaver: PeerId },
}

impl ServerEvent {
    /// Serialisiert das Event als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Event aus JSON (Client-Seite, Tests)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn join_ohne_nutzlast() {
        let event = ClientEvent::from_json(r#"{"event":"join"}"#).unwrap();
        assert_eq!(event, ClientEvent::Join);
    }

    #[test]
    fn signal_nutzlast_bleibt_unveraendert() {
        let ziel = PeerId::new();
        let daten = json!({"type": "offer", "sdp": {"type": "offer", "sdp": "v=0\r\n"}});
        let frame = json!({"event": "signal", "data": {"to": ziel, "data": daten}}).to_string();

        match ClientEvent::from_json(&frame).unwrap() {
            ClientEvent::Signal(anfrage) => {
                assert_eq!(anfrage.to, ziel);
                assert_eq!(anfrage.data, daten);
            }
            andere => panic!("Erwartet Signal, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn signal_ohne_empfaenger_ist_ungueltig() {
        let frame = json!({"event": "signal", "data": {"data": {"type": "ice"}}}).to_string();
        let fehler = ClientEvent::from_json(&frame).unwrap_err();
        assert!(matches!(fehler, ProtokollFehler::UngueltigeNutzlast { .. }));
    }

    #[test]
    fn signal_ohne_daten_ist_ungueltig() {
        let frame = json!({"event": "signal", "data": {"to": PeerId::new()}}).to_string();
        assert!(ClientEvent::from_json(&frame).is_err());
    }

    #[test]
    fn send_message_mit_und_ohne_raum() {
        let mit = json!({"event": "send_message", "data": {"text": "hallo", "roomId": "a#b"}});
        match ClientEvent::from_json(&mit.to_string()).unwrap() {
            ClientEvent::SendMessage(c) => {
                assert_eq!(c.text, "hallo");
                assert_eq!(c.room_id, Some(RoomId::from("a#b")));
            }
            andere => panic!("Erwartet SendMessage, erhalten: {andere:?}"),
        }

        let ohne = json!({"event": "send_message", "data": {"text": "hallo"}});
        match ClientEvent::from_json(&ohne.to_string()).unwrap() {
            ClientEvent::SendMessage(c) => assert!(c.room_id.is_none()),
            andere => panic!("Erwartet SendMessage, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn leave_mit_raum_als_string() {
        let frame = json!({"event": "leave", "data": "a#b"}).to_string();
        assert_eq!(
            ClientEvent::from_json(&frame).unwrap(),
            ClientEvent::Leave(Some(RoomId::from("a#b")))
        );
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"leave"}"#).unwrap(),
            ClientEvent::Leave(None)
        );
    }

    #[test]
    fn typing_ohne_nutzlast_erlaubt() {
        assert_eq!(
            ClientEvent::from_json(r#"{"event":"stop_typing"}"#).unwrap(),
            ClientEvent::StopTyping(TippAnfrage::default())
        );
    }

    #[test]
    fn unbekanntes_event() {
        let fehler = ClientEvent::from_json(r#"{"event":"kick"}"#).unwrap_err();
        assert!(matches!(fehler, ProtokollFehler::UnbekanntesEvent(ref e) if e == "kick"));
    }

    #[test]
    fn server_events_wire_format() {
        assert_eq!(ServerEvent::Waiting.to_json().unwrap(), r#"{"event":"waiting"}"#);

        let partner = PeerId::new();
        let matched = ServerEvent::Matched {
            room: RoomId::from("a#b"),
            role: Rolle::Caller,
            partner,
        };
        let wert: serde_json::Value = serde_json::from_str(&matched.to_json().unwrap()).unwrap();
        assert_eq!(wert["event"], "matched");
        assert_eq!(wert["data"]["room"], "a#b");
        assert_eq!(wert["data"]["role"], "caller");
        assert_eq!(wert["data"]["partner"], partner.to_string());
    }

    #[test]
    fn receive_message_traegt_sent_at() {
        let nachricht = ServerEvent::ReceiveMessage(ChatNachricht {
            from: PeerId::new(),
            text: "hi".into(),
            sent_at: Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap(),
        });
        let wert: serde_json::Value =
            serde_json::from_str(&nachricht.to_json().unwrap()).unwrap();
        assert_eq!(wert["event"], "receive_message");
        assert_eq!(wert["data"]["text"], "hi");
        assert_eq!(wert["data"]["sentAt"], "2026-03-01T18:30:00Z");

        let zurueck = ServerEvent::from_json(&nachricht.to_json().unwrap()).unwrap();
        assert_eq!(zurueck, nachricht);
    }
}
