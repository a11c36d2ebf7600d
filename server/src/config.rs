//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen und danach durch
//! Umgebungsvariablen ueberschrieben (`PORT`, `DATABASE_URL`,
//! `CORS_ORIGIN`, `APP_ENV`). Nach dem Start unveraenderlich.

use anyhow::{bail, Result};
use mentorlink_db::DatabaseConfig;
use mentorlink_signaling::{SignalingConfig, MAX_ZEITSPANNE_SEK};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub netzwerk: NetzwerkEinstellungen,
    pub cors: CorsEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub signaling: SignalingConfig,
    pub logging: LoggingEinstellungen,
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename fuer Logs
    pub name: String,
    /// Laufzeitumgebung (`development`, `production`, ...)
    pub umgebung: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "MentorLink Relay".into(),
            umgebung: "development".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// CORS-Einstellungen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsEinstellungen {
    /// Erlaubte Origins (leer = alle erlaubt)
    pub origins: Vec<String>,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL (Pflicht, z.B. `sqlite://mentorlink.db`)
    pub url: String,
    pub max_verbindungen: u32,
    pub verbindungs_timeout_sek: u64,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_verbindungen: 5,
            verbindungs_timeout_sek: 10,
        }
    }
}

impl DatenbankEinstellungen {
    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_verbindungen: self.max_verbindungen,
            verbindungs_timeout: Duration::from_secs(self.verbindungs_timeout_sek),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder EnvFilter-Direktive
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den separaten Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: false,
            port: 9300,
        }
    }
}

/// Herkunft der geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    Datei,
    /// Datei nicht gefunden
    Standardwerte,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    ///
    /// Loggt nicht selbst: beim Laden ist das Logging noch nicht
    /// initialisiert. Die Quelle wird stattdessen zurueckgegeben.
    pub fn laden(pfad: &str) -> Result<(Self, ConfigQuelle)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map(|config| (config, ConfigQuelle::Datei))
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigQuelle::Standardwerte))
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn aus_toml(inhalt: &str) -> Result<Self> {
        Ok(toml::from_str(inhalt)?)
    }

    /// Laedt Datei und Prozess-Umgebung und validiert das Ergebnis
    pub fn aus_umgebung(pfad: &str) -> Result<(Self, ConfigQuelle)> {
        let (mut config, quelle) = Self::laden(pfad)?;
        config.umgebung_anwenden(|name| std::env::var(name).ok())?;
        config.validieren()?;
        Ok((config, quelle))
    }

    /// Ueberschreibt Werte aus Umgebungsvariablen
    ///
    /// Leere Variablen werden ignoriert. `CORS_ORIGIN` ist kommasepariert.
    pub fn umgebung_anwenden(&mut self, lesen: impl Fn(&str) -> Option<String>) -> Result<()> {
        let wert = |name: &str| lesen(name).filter(|w| !w.trim().is_empty());

        if let Some(port) = wert("PORT") {
            self.netzwerk.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT '{port}' ist ungueltig: {e}"))?;
        }
        if let Some(url) = wert("DATABASE_URL") {
            self.datenbank.url = url;
        }
        if let Some(origins) = wert("CORS_ORIGIN") {
            self.cors.origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(umgebung) = wert("APP_ENV") {
            self.server.umgebung = umgebung;
        }
        Ok(())
    }

    /// Prueft Pflichtfelder und Wertebereiche
    pub fn validieren(&self) -> Result<()> {
        if self.datenbank.url.trim().is_empty() {
            bail!("DATABASE_URL ist erforderlich");
        }
        if self.signaling.keepalive_sek == 0 {
            bail!("signaling.keepalive_sek muss groesser als 0 sein");
        }
        if self.signaling.verbindungs_timeout_sek > MAX_ZEITSPANNE_SEK {
            bail!("signaling.verbindungs_timeout_sek darf hoechstens {MAX_ZEITSPANNE_SEK} sein");
        }
        if self.signaling.verbindungs_timeout_sek <= self.signaling.keepalive_sek {
            bail!("signaling.verbindungs_timeout_sek muss groesser als keepalive_sek sein");
        }
        if self.signaling.max_frame_size == 0 {
            bail!("signaling.max_frame_size muss groesser als 0 sein");
        }
        if self.datenbank.max_verbindungen == 0 {
            bail!("datenbank.max_verbindungen muss groesser als 0 sein");
        }
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer HTTP und WebSocket zurueck
    pub fn http_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }
}
