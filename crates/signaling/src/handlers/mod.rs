//! Handler fuer alle Client-Ereignisse
//!
//! Jeder Handler ist fuer eine Gruppe von Ereignissen zustaendig und
//! arbeitet nur auf dem gemeinsamen SignalingState. Rueckgabewert ist die
//! Anzahl der Zustellungen.

pub mod call_handler;
pub mod chat_handler;
pub mod teilnehmer_handler;
