//! Lebenszyklus – Abbau bei Verlassen und Verbindungsabbruch
//!
//! Beide Wege fuehren denselben Abbau aus:
//! 1. Warteplatz raeumen, falls er den Peer haelt
//! 2. Partner im Raum mit `partner_left` benachrichtigen
//! 3. Raum aufloesen (Raum und Rolle bei beiden Mitgliedern loeschen)
//!
//! Bei `Getrennt` wird der Registry-Eintrag zusaetzlich entfernt.

use duett_core::{PeerId, RoomId};
use duett_protocol::ServerEvent;

use crate::vermittlung::VermittlungsZustand;

/// Wie ein Peer seinen Zustand verlaesst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abgang {
    /// Expliziter `leave` – die Verbindung bleibt registriert
    Verlassen,
    /// Verbindung geschlossen – der Peer wird abgemeldet
    Getrennt,
}

/// Ergebnis eines Abbaus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abbau {
    pub war_wartend: bool,
    pub raum: Option<RoomId>,
    pub partner: Option<PeerId>,
}

impl Abbau {
    /// Gibt true zurueck wenn der Abbau nichts veraendert hat
    pub fn ist_leer(&self) -> bool {
        !self.war_wartend && self.raum.is_none()
    }
}

/// Baut den Zustand eines Peers ab. Mehrfacher Aufruf ist ein No-op.
pub fn abbauen(zustand: &mut VermittlungsZustand, peer: PeerId, abgang: Abgang) -> Abbau {
    let war_wartend = zustand.warteplatz.raeumen_falls(&peer);

    let raum_id = match abgang {
        Abgang::Getrennt => zustand.registry.abmelden(&peer),
        Abgang::Verlassen => zustand.registry.raum_von(&peer).cloned(),
    };

    let Some(raum) = raum_id.and_then(|id| zustand.registry.raum_aufloesen(&id)) else {
        return Abbau {
            war_wartend,
            ..Abbau::default()
        };
    };

    let partner = raum.partner_von(&peer);
    if let Some(partner) = partner {
        if let Err(e) = zustand
            .registry
            .senden(&partner, ServerEvent::PartnerLeft { leaver: peer })
        {
            tracing::debug!(peer = %partner, fehler = %e, "partner_left nicht zustellbar");
        }
    }

    tracing::info!(peer = %peer, raum = %raum.id, ?abgang, "Raum abgebaut");

    Abbau {
        war_wartend,
        raum: Some(raum.id),
        partner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaker::{beitreten, Beitritt};

    fn gepaart() -> (
        VermittlungsZustand,
        PeerId,
        PeerId,
        tokio::sync::mpsc::Receiver<ServerEvent>,
        tokio::sync::mpsc::Receiver<ServerEvent>,
    ) {
        let mut zustand = VermittlungsZustand::default();
        let (a, b) = (PeerId::new(), PeerId::new());
        let mut rx_a = zustand.registry.registrieren(a);
        let mut rx_b = zustand.registry.registrieren(b);
        beitreten(&mut zustand, a);
        assert!(matches!(beitreten(&mut zustand, b), Beitritt::Gepaart { .. }));
        // waiting + matched bzw. matched verwerfen
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}
        (zustand, a, b, rx_a, rx_b)
    }

    #[test]
    fn trennen_benachrichtigt_partner_genau_einmal() {
        let (mut zustand, a, b, _rx_a, mut rx_b) = gepaart();

        let abbau = abbauen(&mut zustand, a, Abgang::Getrennt);
        assert_eq!(abbau.partner, Some(b));
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::PartnerLeft { leaver: a });

        let zweiter = abbauen(&mut zustand, a, Abgang::Getrennt);
        assert!(zweiter.ist_leer());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn trennen_entfernt_registry_eintrag() {
        let (mut zustand, a, b, _rx_a, _rx_b) = gepaart();
        abbauen(&mut zustand, a, Abgang::Getrennt);

        assert!(!zustand.registry.ist_registriert(&a));
        assert!(zustand.registry.ist_registriert(&b));
        assert_eq!(zustand.registry.raum_von(&b), None);
        assert_eq!(zustand.registry.rolle_von(&b), None);
        assert_eq!(zustand.registry.raum_anzahl(), 0);
    }

    #[test]
    fn verlassen_behaelt_registry_eintrag() {
        let (mut zustand, a, _b, _rx_a, mut rx_b) = gepaart();
        let abbau = abbauen(&mut zustand, a, Abgang::Verlassen);

        assert!(abbau.raum.is_some());
        assert!(zustand.registry.ist_registriert(&a));
        assert_eq!(zustand.registry.raum_von(&a), None);
        assert!(matches!(
            rx_b.try_recv(),
            Ok(ServerEvent::PartnerLeft { leaver }) if leaver == a
        ));
    }

    #[test]
    fn wartender_peer_raeumt_warteplatz() {
        let mut zustand = VermittlungsZustand::default();
        let a = PeerId::new();
        let _rx = zustand.registry.registrieren(a);
        beitreten(&mut zustand, a);

        let abbau = abbauen(&mut zustand, a, Abgang::Getrennt);
        assert!(abbau.war_wartend);
        assert!(abbau.raum.is_none());
        assert!(zustand.warteplatz.ist_leer());
    }

    #[test]
    fn unbekannter_peer_ist_noop() {
        let mut zustand = VermittlungsZustand::default();
        assert!(abbauen(&mut zustand, PeerId::new(), Abgang::Verlassen).ist_leer());
    }
}
