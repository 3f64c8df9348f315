//! Warteplatz – der einzelne Platz fuer den naechsten unverpaarten Peer
//!
//! Es gibt hoechstens einen wartenden Peer. Der naechste Beitritt eines
//! anderen Peers raeumt den Platz und bildet ein Paar.

use duett_core::PeerId;

/// Ergebnis eines Angebots an den Warteplatz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Angebot {
    /// Der Peer sitzt jetzt (oder weiterhin) im Warteplatz
    Wartend,
    /// Der Platz war von diesem Peer besetzt und ist jetzt leer
    Gefunden(PeerId),
}

#[derive(Debug, Default)]
pub struct Warteplatz {
    inhaber: Option<PeerId>,
}

impl Warteplatz {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Bietet einen Peer an: leer -> besetzen, sonst Inhaber herausgeben
    ///
    /// Ein Peer wird nie mit sich selbst gepaart.
    pub fn anbieten(&mut self, peer: PeerId) -> Angebot {
        match self.inhaber {
            None => {
                self.inhaber = Some(peer);
                Angebot::Wartend
            }
            Some(wartend) if wartend == peer => Angebot::Wartend,
            Some(wartend) => {
                self.inhaber = None;
                Angebot::Gefunden(wartend)
            }
        }
    }

    /// Setzt den Inhaber direkt (z.B. nach verwaistem Eintrag)
    pub fn besetzen(&mut self, peer: PeerId) {
        self.inhaber = Some(peer);
    }

    /// Raeumt den Platz, falls `peer` ihn besetzt
    pub fn raeumen_falls(&mut self, peer: &PeerId) -> bool {
        if self.inhaber.as_ref() == Some(peer) {
            self.inhaber = None;
            true
        } else {
            false
        }
    }

    pub fn inhaber(&self) -> Option<PeerId> {
        self.inhaber
    }

    pub fn ist_leer(&self) -> bool {
        self.inhaber.is_none()
    }
}
