//! Matchmaker – Paart ankommende Peers ueber den Warteplatz
//!
//! Der zuerst wartende Peer wird `caller`, der ankommende `callee`.
//! Ein verwaister Warteplatz-Eintrag (Peer inzwischen getrennt) wird durch
//! den ankommenden Peer ersetzt statt gepaart.

use duett_core::{PeerId, Rolle, RoomId};
use duett_protocol::ServerEvent;

use crate::lebenszyklus::{abbauen, Abgang};
use crate::registry::Raum;
use crate::vermittlung::VermittlungsZustand;
use crate::warteplatz::Angebot;

/// Ergebnis eines `join`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beitritt {
    /// Peer ist nicht (mehr) registriert – nichts passiert
    Unbekannt,
    /// Peer sitzt im Warteplatz
    Wartend,
    /// Raum wurde gebildet
    Gepaart {
        raum: RoomId,
        caller: PeerId,
        callee: PeerId,
    },
}

/// Verarbeitet einen `join` unter dem Vermittlungs-Lock
pub fn beitreten(zustand: &mut VermittlungsZustand, peer: PeerId) -> Beitritt {
    if !zustand.registry.ist_registriert(&peer) {
        tracing::debug!(peer = %peer, "join von unbekanntem Peer ignoriert");
        return Beitritt::Unbekannt;
    }

    // Aus einem bestehenden Raum heraus erst sauber verlassen
    if zustand.registry.raum_von(&peer).is_some() {
        abbauen(zustand, peer, Abgang::Verlassen);
    }

    let wartend = match zustand.warteplatz.anbieten(peer) {
        Angebot::Wartend => None,
        Angebot::Gefunden(w) if !zustand.registry.ist_registriert(&w) => {
            tracing::debug!(verwaist = %w, peer = %peer, "Verwaisten Warteplatz ersetzt");
            zustand.warteplatz.besetzen(peer);
            None
        }
        Angebot::Gefunden(w) => Some(w),
    };

    let Some(caller) = wartend else {
        if let Err(e) = zustand.registry.senden(&peer, ServerEvent::Waiting) {
            tracing::debug!(peer = %peer, fehler = %e, "waiting nicht zustellbar");
        }
        tracing::debug!(peer = %peer, "Peer wartet");
        return Beitritt::Wartend;
    };

    let callee = peer;
    let raum = Raum {
        id: RoomId::aus_paar(caller, callee),
        caller,
        callee,
    };
    let raum_id = raum.id.clone();
    zustand.registry.raum_anlegen(raum);

    for (empfaenger, rolle, partner) in [
        (caller, Rolle::Caller, callee),
        (callee, Rolle::Callee, caller),
    ] {
        let event = ServerEvent::Matched {
            room: raum_id.clone(),
            role: rolle,
            partner,
        };
        if let Err(e) = zustand.registry.senden(&empfaenger, event) {
            tracing::debug!(peer = %empfaenger, fehler = %e, "matched nicht zustellbar");
        }
    }

    tracing::info!(raum = %raum_id, caller = %caller, callee = %callee, "Peers gepaart");

    Beitritt::Gepaart {
        raum: raum_id,
        caller,
        callee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erster_join_wartet() {
        let mut zustand = VermittlungsZustand::default();
        let a = PeerId::new();
        let mut rx = zustand.registry.registrieren(a);

        assert_eq!(beitreten(&mut zustand, a), Beitritt::Wartend);
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Waiting);
        assert_eq!(zustand.warteplatz.inhaber(), Some(a));
    }

    #[test]
    fn zweiter_join_paart_mit_rollen() {
        let mut zustand = VermittlungsZustand::default();
        let (a, b) = (PeerId::new(), PeerId::new());
        let mut rx_a = zustand.registry.registrieren(a);
        let mut rx_b = zustand.registry.registrieren(b);

        beitreten(&mut zustand, a);
        let ergebnis = beitreten(&mut zustand, b);
        let raum = RoomId::aus_paar(a, b);
        assert_eq!(
            ergebnis,
            Beitritt::Gepaart {
                raum: raum.clone(),
                caller: a,
                callee: b
            }
        );

        assert_eq!(rx_a.try_recv().unwrap(), ServerEvent::Waiting);
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerEvent::Matched {
                room: raum.clone(),
                role: Rolle::Caller,
                partner: b
            }
        );
        assert_eq!(
            rx_b.try_recv().unwrap(),
            ServerEvent::Matched {
                room: raum,
                role: Rolle::Callee,
                partner: a
            }
        );
        assert!(zustand.warteplatz.ist_leer());
    }

    #[test]
    fn doppelter_join_paart_nicht_mit_sich_selbst() {
        let mut zustand = VermittlungsZustand::default();
        let a = PeerId::new();
        let _rx = zustand.registry.registrieren(a);

        assert_eq!(beitreten(&mut zustand, a), Beitritt::Wartend);
        assert_eq!(beitreten(&mut zustand, a), Beitritt::Wartend);
        assert_eq!(zustand.registry.raum_anzahl(), 0);
    }

    #[test]
    fn verwaister_warteplatz_wird_ersetzt() {
        let mut zustand = VermittlungsZustand::default();
        let (tot, b) = (PeerId::new(), PeerId::new());
        let mut rx_b = zustand.registry.registrieren(b);
        // Verwaister Eintrag ohne Registrierung
        zustand.warteplatz.besetzen(tot);

        assert_eq!(beitreten(&mut zustand, b), Beitritt::Wartend);
        assert_eq!(zustand.warteplatz.inhaber(), Some(b));
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::Waiting);
    }

    #[test]
    fn unbekannter_peer_wird_ignoriert() {
        let mut zustand = VermittlungsZustand::default();
        assert_eq!(beitreten(&mut zustand, PeerId::new()), Beitritt::Unbekannt);
        assert!(zustand.warteplatz.ist_leer());
    }

    #[test]
    fn join_aus_raum_verlaesst_ihn_zuerst() {
        let mut zustand = VermittlungsZustand::default();
        let (a, b) = (PeerId::new(), PeerId::new());
        let _rx_a = zustand.registry.registrieren(a);
        let mut rx_b = zustand.registry.registrieren(b);
        beitreten(&mut zustand, a);
        beitreten(&mut zustand, b);
        while rx_b.try_recv().is_ok() {}

        assert_eq!(beitreten(&mut zustand, a), Beitritt::Wartend);
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::PartnerLeft { leaver: a });
        assert_eq!(zustand.registry.raum_von(&b), None);
        assert_eq!(zustand.warteplatz.inhaber(), Some(a));
    }
}
