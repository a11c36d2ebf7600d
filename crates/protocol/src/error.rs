//! Fehlertypen fuer das Wire-Protokoll

use thiserror::Error;

/// Gruende, aus denen ein eingehender Frame verworfen wird
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame ist kein gueltiges JSON-Envelope
    #[error("Ungueltiges Envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// Ereignisname ist nicht bekannt
    #[error("Unbekanntes Ereignis: {0}")]
    UnbekanntesEreignis(String),

    /// Payload passt nicht zum Ereignis (fehlendes Feld, falscher Typ)
    #[error("Ungueltige Daten fuer '{ereignis}': {grund}")]
    UngueltigeDaten { ereignis: String, grund: String },

    /// Pflichtfeld fehlt oder ist leer
    #[error("Pflichtfeld '{feld}' fehlt in '{ereignis}'")]
    FeldFehlt {
        ereignis: &'static str,
        feld: &'static str,
    },

    /// Frame ueberschreitet die maximale Groesse
    #[error("Frame zu gross: {laenge} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { laenge: usize, maximum: usize },

    /// Ausgehendes Ereignis konnte nicht serialisiert werden
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Kurzer, stabiler Grund fuer Metrik-Labels
    pub fn grund(&self) -> &'static str {
        match self {
            Self::Envelope(_) => "envelope",
            Self::UnbekanntesEreignis(_) => "unknown_event",
            Self::UngueltigeDaten { .. } => "invalid_payload",
            Self::FeldFehlt { .. } => "missing_field",
            Self::ZuGross { .. } => "too_large",
            Self::Serialisierung(_) => "serialize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feld_fehlt_anzeige() {
        let e = ProtocolError::FeldFehlt {
            ereignis: "chat-send",
            feld: "message",
        };
        assert_eq!(e.to_string(), "Pflichtfeld 'message' fehlt in 'chat-send'");
        assert_eq!(e.grund(), "missing_field");
    }

    #[test]
    fn zu_gross_anzeige() {
        let e = ProtocolError::ZuGross {
            laenge: 10,
            maximum: 5,
        };
        assert!(e.to_string().contains("10 Bytes"));
        assert_eq!(e.grund(), "too_large");
    }
}
