//! Client-side durable state: the "remember me" identity, display
//! preferences, and an offline fallback copy of the event list. One JSON
//! file per concern under a client-chosen directory.
//!
//! The cached identity is the same plaintext name+code pair as primary
//! auth; it provides no stronger guarantee than the login operation
//! itself.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use pulse_types::models::{Account, Event};

const SESSION_FILE: &str = "session.json";
const ACCOUNT_FILE: &str = "account.json";
const PREFS_FILE: &str = "preferences.json";
const EVENTS_FILE: &str = "events.json";

/// The identity triple cached after a successful create/login, replayed
/// through the login lookup on the next launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub user_id: Uuid,
    pub name: String,
    pub pairing_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub language: Language,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "blue".into(),
            language: Language::Ja,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ja,
    En,
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    // -- Session identity --

    pub fn save_session(&self, session: &SavedSession) -> io::Result<()> {
        self.write(SESSION_FILE, session)
    }

    pub fn load_session(&self) -> Option<SavedSession> {
        self.read(SESSION_FILE)
    }

    pub fn clear_session(&self) {
        let _ = fs::remove_file(self.dir.join(SESSION_FILE));
    }

    // -- Last known account --

    pub fn save_account(&self, account: &Account) -> io::Result<()> {
        self.write(ACCOUNT_FILE, account)
    }

    pub fn load_account(&self) -> Option<Account> {
        self.read(ACCOUNT_FILE)
    }

    pub fn clear_account(&self) {
        let _ = fs::remove_file(self.dir.join(ACCOUNT_FILE));
    }

    // -- Preferences --

    pub fn save_preferences(&self, prefs: &Preferences) -> io::Result<()> {
        self.write(PREFS_FILE, prefs)
    }

    pub fn preferences(&self) -> Preferences {
        self.read(PREFS_FILE).unwrap_or_default()
    }

    // -- Offline event-list fallback (never authoritative) --

    pub fn cache_events(&self, events: &[Event]) -> io::Result<()> {
        self.write(EVENTS_FILE, &events)
    }

    pub fn cached_events(&self) -> Vec<Event> {
        self.read(EVENTS_FILE).unwrap_or_default()
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
        fs::write(self.dir.join(file), json)
    }

    /// A missing or unparseable file reads as absent; corrupt files are
    /// removed so the next read starts clean.
    fn read<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt cache file {}: {}", path.display(), e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn session_round_trip_and_clear() {
        let (_dir, store) = store();
        assert_eq!(store.load_session(), None);

        let session = SavedSession {
            user_id: Uuid::new_v4(),
            name: "Mika".into(),
            pairing_code: "A1B2C3D4".into(),
        };
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session(), Some(session));

        store.clear_session();
        assert_eq!(store.load_session(), None);
    }

    #[test]
    fn corrupt_session_file_reads_as_absent_and_is_removed() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("session.json"), b"{not json").unwrap();

        assert_eq!(store.load_session(), None);
        assert!(!dir.path().join("session.json").exists());
    }

    #[test]
    fn preferences_default_when_missing() {
        let (_dir, store) = store();
        assert_eq!(store.preferences(), Preferences::default());

        let prefs = Preferences {
            theme: "rose".into(),
            language: Language::En,
        };
        store.save_preferences(&prefs).unwrap();
        assert_eq!(store.preferences(), prefs);
    }

    #[test]
    fn event_cache_round_trips() {
        let (_dir, store) = store();
        assert!(store.cached_events().is_empty());

        let events = vec![Event {
            id: Uuid::new_v4(),
            title: "Engagement".into(),
            start_date: Utc::now(),
            messages: vec![],
        }];
        store.cache_events(&events).unwrap();

        let cached = store.cached_events();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, events[0].id);
        assert_eq!(cached[0].title, "Engagement");
    }
}
