//! Message-Dispatcher – Routet Client-Events an die Vermittlung
//!
//! Jedes Event wird synchron unter dem Vermittlungs-Lock verarbeitet.
//! Fehler (unbekannter Empfaenger, fremder Raum) werden an die
//! Verbindung zurueckgegeben, die sie nur protokolliert.

use duett_core::PeerId;
use duett_protocol::ClientEvent;
use std::sync::Arc;

use crate::error::SignalingResult;
use crate::server_state::SignalingState;

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein dekodiertes Event eines Peers
    pub fn dispatch(&self, event: ClientEvent, peer: PeerId) -> SignalingResult<()> {
        tracing::trace!(peer = %peer, event = event.name(), "Event empfangen");
        let vermittlung = &self.state.vermittlung;

        match event {
            ClientEvent::Join => {
                vermittlung.beitreten(peer);
            }
            ClientEvent::Signal(anfrage) => vermittlung.signal(peer, anfrage)?,
            ClientEvent::SendMessage(anfrage) => vermittlung.chat(peer, anfrage)?,
            ClientEvent::Typing(anfrage) => vermittlung.tippen(peer, anfrage, true)?,
            ClientEvent::StopTyping(anfrage) => vermittlung.tippen(peer, anfrage, false)?,
            ClientEvent::Leave(hinweis) => {
                vermittlung.verlassen(peer, hinweis);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalingError;
    use crate::server_state::SignalingConfig;
    use duett_core::DuettError;
    use duett_observability::DuettMetriken;
    use duett_protocol::{ChatAnfrage, ServerEvent};

    fn dispatcher() -> (MessageDispatcher, Arc<SignalingState>) {
        let state = SignalingState::neu(SignalingConfig::default(), DuettMetriken::neu().unwrap());
        (MessageDispatcher::neu(Arc::clone(&state)), state)
    }

    #[test]
    fn join_und_leave_ueber_dispatcher() {
        let (d, state) = dispatcher();
        let a = PeerId::new();
        let mut rx = state.vermittlung.verbinden(a);
        rx.try_recv().unwrap();

        d.dispatch(ClientEvent::Join, a).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Waiting);
        assert_eq!(state.vermittlung.wartender(), Some(a));

        d.dispatch(ClientEvent::Leave(None), a).unwrap();
        assert_eq!(state.vermittlung.wartender(), None);
    }

    #[test]
    fn chat_ohne_raum_liefert_fehler() {
        let (d, state) = dispatcher();
        let a = PeerId::new();
        let _rx = state.vermittlung.verbinden(a);

        let ergebnis = d.dispatch(
            ClientEvent::SendMessage(ChatAnfrage {
                text: "hallo".into(),
                room_id: None,
            }),
            a,
        );
        assert!(matches!(
            ergebnis,
            Err(SignalingError::Vermittlung(DuettError::OhneRaum))
        ));
    }
}
