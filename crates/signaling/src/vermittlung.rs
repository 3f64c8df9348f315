//! Vermittlung – Gemeinsamer Zustand aus Registry, Warteplatz und Raeumen
//!
//! Der gesamte Zustand liegt hinter EINEM `parking_lot::Mutex`. Jede
//! Operation nimmt den Lock genau einmal fuer ihre ganze Dauer, damit
//! Lesen-Leeren-Pruefen des Warteplatzes nie mit einem zweiten `join`
//! verschraenkt wird. Unter dem Lock wird nie gewartet (`try_send`).

use duett_core::{DuettError, PeerId, Rolle, RoomId};
use duett_observability::DuettMetriken;
use duett_protocol::{ChatAnfrage, ServerEvent, SignalAnfrage, TippAnfrage};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::lebenszyklus::{abbauen, Abbau, Abgang};
use crate::matchmaker::{beitreten, Beitritt};
use crate::registry::{VerbindungsRegistry, SEND_QUEUE_GROESSE};
use crate::relay;
use crate::warteplatz::Warteplatz;

/// Der Zustand hinter dem Vermittlungs-Lock
#[derive(Debug, Default)]
pub struct VermittlungsZustand {
    pub registry: VerbindungsRegistry,
    pub warteplatz: Warteplatz,
}

impl VermittlungsZustand {
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            registry: VerbindungsRegistry::neu(queue_groesse),
            warteplatz: Warteplatz::neu(),
        }
    }
}

/// Thread-safe Handle auf die Vermittlung. Clone teilt den Zustand.
#[derive(Clone)]
pub struct Vermittlung {
    inner: Arc<Mutex<VermittlungsZustand>>,
    metriken: DuettMetriken,
}

impl Vermittlung {
    pub fn neu(queue_groesse: usize, metriken: DuettMetriken) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VermittlungsZustand::neu(queue_groesse))),
            metriken,
        }
    }

    /// Vermittlung mit Standard-Queue-Groesse
    pub fn mit_metriken(metriken: DuettMetriken) -> Self {
        Self::neu(SEND_QUEUE_GROESSE, metriken)
    }

    /// Registriert einen neuen Peer und sendet ihm `id_assigned`
    pub fn verbinden(&self, peer: PeerId) -> mpsc::Receiver<ServerEvent> {
        let mut zustand = self.inner.lock();
        let rx = zustand.registry.registrieren(peer);
        if let Err(e) = zustand
            .registry
            .senden(&peer, ServerEvent::IdAssigned { id: peer })
        {
            tracing::warn!(peer = %peer, fehler = %e, "id_assigned nicht zustellbar");
        }
        self.gauges_aktualisieren(&zustand);
        rx
    }

    /// `join`: Warteplatz oder Paarung
    pub fn beitreten(&self, peer: PeerId) -> Beitritt {
        let mut zustand = self.inner.lock();
        let ergebnis = beitreten(&mut zustand, peer);
        if matches!(ergebnis, Beitritt::Gepaart { .. }) {
            self.metriken.paarungen_total.inc();
        }
        self.gauges_aktualisieren(&zustand);
        ergebnis
    }

    /// `signal`: opake Nutzlast an `to` weiterleiten
    pub fn signal(&self, von: PeerId, anfrage: SignalAnfrage) -> duett_core::Result<()> {
        let zustand = self.inner.lock();
        let ergebnis = relay::signal_weiterleiten(&zustand.registry, von, anfrage.to, anfrage.data);
        self.zaehlen("signal", &ergebnis);
        ergebnis
    }

    /// `send_message`: Chat an den Partner im Raum
    pub fn chat(&self, von: PeerId, anfrage: ChatAnfrage) -> duett_core::Result<()> {
        let zustand = self.inner.lock();
        let ergebnis = relay::chat_weiterleiten(
            &zustand.registry,
            von,
            anfrage.room_id.as_ref(),
            anfrage.text,
        );
        self.zaehlen("chat", &ergebnis);
        ergebnis
    }

    /// `typing` / `stop_typing`
    pub fn tippen(&self, von: PeerId, anfrage: TippAnfrage, tippt: bool) -> duett_core::Result<()> {
        let zustand = self.inner.lock();
        let ergebnis =
            relay::tippen_weiterleiten(&zustand.registry, von, anfrage.room_id.as_ref(), tippt);
        self.zaehlen("typing", &ergebnis);
        ergebnis
    }

    /// Expliziter `leave`
    ///
    /// Abgebaut wird der tatsaechliche Zustand des Peers; die mitgesendete
    /// Raum-ID wird nur protokolliert.
    pub fn verlassen(&self, peer: PeerId, hinweis: Option<RoomId>) -> Abbau {
        let mut zustand = self.inner.lock();
        let abbau = abbauen(&mut zustand, peer, Abgang::Verlassen);
        if let Some(hinweis) = hinweis.filter(|h| !h.ist_leer()) {
            if abbau.raum.as_ref() != Some(&hinweis) {
                tracing::debug!(
                    peer = %peer,
                    hinweis = %hinweis,
                    "leave nennt anderen Raum als den aktuellen"
                );
            }
        }
        self.gauges_aktualisieren(&zustand);
        abbau
    }

    /// Verbindung geschlossen: Abbau und Abmeldung
    pub fn trennen(&self, peer: PeerId) -> Abbau {
        let mut zustand = self.inner.lock();
        let abbau = abbauen(&mut zustand, peer, Abgang::Getrennt);
        self.gauges_aktualisieren(&zustand);
        abbau
    }

    /// Aktueller Inhaber des Warteplatzes
    pub fn wartender(&self) -> Option<PeerId> {
        self.inner.lock().warteplatz.inhaber()
    }

    pub fn raum_von(&self, peer: &PeerId) -> Option<RoomId> {
        self.inner.lock().registry.raum_von(peer).cloned()
    }

    pub fn rolle_von(&self, peer: &PeerId) -> Option<Rolle> {
        self.inner.lock().registry.rolle_von(peer)
    }

    pub fn ist_verbunden(&self, peer: &PeerId) -> bool {
        self.inner.lock().registry.ist_registriert(peer)
    }

    pub fn peer_anzahl(&self) -> usize {
        self.inner.lock().registry.anzahl()
    }

    pub fn raum_anzahl(&self) -> usize {
        self.inner.lock().registry.raum_anzahl()
    }

    fn gauges_aktualisieren(&self, zustand: &VermittlungsZustand) {
        self.metriken
            .verbundene_peers
            .set(zustand.registry.anzahl() as i64);
        self.metriken
            .wartende_peers
            .set(i64::from(!zustand.warteplatz.ist_leer()));
        self.metriken
            .aktive_raeume
            .set(zustand.registry.raum_anzahl() as i64);
    }

    fn zaehlen(&self, art: &str, ergebnis: &duett_core::Result<()>) {
        match ergebnis {
            Ok(()) => self.metriken.weitergeleitet(art),
            Err(e) => {
                self.metriken.verworfen(art);
                match e {
                    DuettError::QueueVoll(_) => {}
                    _ => tracing::debug!(art, fehler = %e, "Event verworfen"),
                }
            }
        }
    }
}
