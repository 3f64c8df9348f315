//! Relay – Leitet Signale, Chat und Tipp-Status zwischen Raum-Mitgliedern weiter
//!
//! Signal-Nutzlasten sind opak und werden unveraendert weitergereicht.
//! Chat und Tipp-Status gehen nur an das andere Mitglied des Raums,
//! und nur wenn der Absender selbst Mitglied ist.

use chrono::Utc;
use duett_core::{DuettError, PeerId, RoomId};
use duett_protocol::{ChatNachricht, ServerEvent};

use crate::registry::VerbindungsRegistry;

/// Leitet ein Signal an einen beliebigen verbundenen Peer weiter
pub fn signal_weiterleiten(
    registry: &VerbindungsRegistry,
    von: PeerId,
    an: PeerId,
    daten: serde_json::Value,
) -> duett_core::Result<()> {
    registry.senden(&an, ServerEvent::Signal { from: von, data: daten })
}

/// Sendet eine Chat-Nachricht an den Partner im Raum
pub fn chat_weiterleiten(
    registry: &VerbindungsRegistry,
    von: PeerId,
    raum: Option<&RoomId>,
    text: String,
) -> duett_core::Result<()> {
    let partner = partner_im_raum(registry, von, raum)?;
    let nachricht = ChatNachricht {
        from: von,
        text,
        sent_at: Utc::now(),
    };
    registry.senden(&partner, ServerEvent::ReceiveMessage(nachricht))
}

/// Sendet `typing` bzw. `stop_typing` an den Partner im Raum
pub fn tippen_weiterleiten(
    registry: &VerbindungsRegistry,
    von: PeerId,
    raum: Option<&RoomId>,
    tippt: bool,
) -> duett_core::Result<()> {
    let partner = partner_im_raum(registry, von, raum)?;
    let event = if tippt {
        ServerEvent::Typing
    } else {
        ServerEvent::StopTyping
    };
    registry.senden(&partner, event)
}

/// Prueft Raum-ID und Mitgliedschaft und liefert das andere Mitglied
fn partner_im_raum(
    registry: &VerbindungsRegistry,
    von: PeerId,
    raum: Option<&RoomId>,
) -> duett_core::Result<PeerId> {
    let raum_id = raum.filter(|r| !r.ist_leer()).ok_or(DuettError::OhneRaum)?;
    let raum = registry
        .raum(raum_id)
        .ok_or_else(|| DuettError::RaumNichtGefunden(raum_id.clone()))?;
    raum.partner_von(&von).ok_or_else(|| DuettError::KeinMitglied {
        peer: von,
        raum: raum_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Raum;
    use serde_json::json;
    use tokio::sync::mpsc::Receiver;

    struct Aufbau {
        registry: VerbindungsRegistry,
        a: PeerId,
        b: PeerId,
        raum: RoomId,
        rx_a: Receiver<ServerEvent>,
        rx_b: Receiver<ServerEvent>,
    }

    fn aufbau() -> Aufbau {
        let mut registry = VerbindungsRegistry::default();
        let (a, b) = (PeerId::new(), PeerId::new());
        let rx_a = registry.registrieren(a);
        let rx_b = registry.registrieren(b);
        let raum = RoomId::aus_paar(a, b);
        registry.raum_anlegen(Raum {
            id: raum.clone(),
            caller: a,
            callee: b,
        });
        Aufbau {
            registry,
            a,
            b,
            raum,
            rx_a,
            rx_b,
        }
    }

    #[test]
    fn signal_unveraendert_mit_absender() {
        let mut t = aufbau();
        let nutzlast = json!({"sdp": {"type": "offer", "sdp": "v=0"}, "x": [1, 2, 3]});

        signal_weiterleiten(&t.registry, t.a, t.b, nutzlast.clone()).unwrap();
        assert_eq!(
            t.rx_b.try_recv().unwrap(),
            ServerEvent::Signal {
                from: t.a,
                data: nutzlast
            }
        );
        assert!(t.rx_a.try_recv().is_err());
    }

    #[test]
    fn signal_an_getrennten_peer_ist_unzustellbar() {
        let t = aufbau();
        let err = signal_weiterleiten(&t.registry, t.a, PeerId::new(), json!(null)).unwrap_err();
        assert!(err.ist_unzustellbar());
    }

    #[test]
    fn chat_nur_an_partner() {
        let mut t = aufbau();
        chat_weiterleiten(&t.registry, t.a, Some(&t.raum), "hallo".into()).unwrap();

        match t.rx_b.try_recv().unwrap() {
            ServerEvent::ReceiveMessage(n) => {
                assert_eq!(n.from, t.a);
                assert_eq!(n.text, "hallo");
            }
            anders => panic!("Unerwartetes Event: {anders:?}"),
        }
        assert!(t.rx_a.try_recv().is_err());
    }

    #[test]
    fn chat_ohne_raum_wird_verworfen() {
        let mut t = aufbau();
        assert!(matches!(
            chat_weiterleiten(&t.registry, t.a, None, "x".into()),
            Err(DuettError::OhneRaum)
        ));
        let leer = RoomId::from("  ");
        assert!(matches!(
            chat_weiterleiten(&t.registry, t.a, Some(&leer), "x".into()),
            Err(DuettError::OhneRaum)
        ));
        assert!(t.rx_b.try_recv().is_err());
    }

    #[test]
    fn chat_von_fremdem_peer_wird_verworfen() {
        let mut t = aufbau();
        let fremd = PeerId::new();
        let _rx = t.registry.registrieren(fremd);

        assert!(matches!(
            chat_weiterleiten(&t.registry, fremd, Some(&t.raum), "x".into()),
            Err(DuettError::KeinMitglied { .. })
        ));
        assert!(t.rx_a.try_recv().is_err());
        assert!(t.rx_b.try_recv().is_err());
    }

    #[test]
    fn chat_in_unbekannten_raum() {
        let t = aufbau();
        let raum = RoomId::from("gibt#esnicht");
        assert!(matches!(
            chat_weiterleiten(&t.registry, t.a, Some(&raum), "x".into()),
            Err(DuettError::RaumNichtGefunden(_))
        ));
    }

    #[test]
    fn tippen_und_aufhoeren() {
        let mut t = aufbau();
        tippen_weiterleiten(&t.registry, t.b, Some(&t.raum), true).unwrap();
        tippen_weiterleiten(&t.registry, t.b, Some(&t.raum), true).unwrap();
        tippen_weiterleiten(&t.registry, t.b, Some(&t.raum), false).unwrap();

        // Keine Deduplizierung
        assert_eq!(t.rx_a.try_recv().unwrap(), ServerEvent::Typing);
        assert_eq!(t.rx_a.try_recv().unwrap(), ServerEvent::Typing);
        assert_eq!(t.rx_a.try_recv().unwrap(), ServerEvent::StopTyping);
        assert!(t.rx_b.try_recv().is_err());
    }
}
