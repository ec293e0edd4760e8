//! Local key-value persistence.
//!
//! Plays the part browser `localStorage` plays for the web client: a flat map
//! of string keys to string values, written through to a JSON file on every
//! mutation. No expiry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::Identity;
use crate::error::{Result, SstError};

/// Key holding the logged-in identity as a JSON document.
pub const USER_KEY: &str = "sst:user";

/// Key under which the facilitator's chosen activity template for a room is kept.
pub fn selected_activity_key(room_code: &str) -> String {
    format!("room:{}:selectedActivityId", room_code.trim().to_uppercase())
}

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store at `path`. A missing file yields an empty store; the
    /// file and its parent directories are created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                SstError::Storage(format!("{} is not a JSON object: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The in-memory map only changes once the file write succeeds.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let mut next = self.entries.clone();
        next.insert(key.into(), value.into());
        self.write(&next)?;
        self.entries = next;
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.write(&next)?;
        self.entries = next;
        Ok(true)
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| SstError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Typed accessors
    // -----------------------------------------------------------------------

    pub fn identity(&self) -> Option<Identity> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed stored identity");
                None
            }
        }
    }

    pub fn save_identity(&mut self, identity: &Identity) -> Result<()> {
        let json =
            serde_json::to_string(identity).map_err(|e| SstError::Storage(e.to_string()))?;
        self.set(USER_KEY, json)
    }

    pub fn clear_identity(&mut self) -> Result<bool> {
        self.remove(USER_KEY)
    }

    /// Activity id chosen for `room_code`, if any. Non-numeric values are
    /// treated as unset.
    pub fn selected_activity(&self, room_code: &str) -> Option<u64> {
        self.get(&selected_activity_key(room_code))?.trim().parse().ok()
    }

    pub fn set_selected_activity(&mut self, room_code: &str, activity_id: u64) -> Result<()> {
        self.set(selected_activity_key(room_code), activity_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;

    fn identity() -> Identity {
        Identity {
            id: 7,
            username: "tmp_a1b2".to_string(),
            display_name: "student A".to_string(),
            role: Role::Learner,
            created_at: None,
        }
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("storage.json")).unwrap();
        assert!(store.get(USER_KEY).is_none());
    }

    #[test]
    fn set_writes_through_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.get("k"), Some("v"));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).unwrap();
        store.set("k", "v").unwrap();
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
    }

    #[test]
    fn failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut store = LocalStore::open(blocker.join("s.json")).unwrap();

        assert!(store.set("k", "v").is_err());
        assert_eq!(store.get("k"), None);
        assert!(store.save_identity(&identity()).is_err());
        assert_eq!(store.identity(), None);
    }

    #[test]
    fn failed_remove_keeps_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let path = sub.join("s.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        // Replace the parent directory with a plain file so the next write fails.
        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, "").unwrap();
        assert!(store.remove("k").is_err());
        assert_eq!(store.get("k"), Some("v"));
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(LocalStore::open(&path), Err(SstError::Storage(_))));
    }

    #[test]
    fn identity_round_trips_under_user_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).unwrap();
        store.save_identity(&identity()).unwrap();
        assert!(store.get(USER_KEY).unwrap().contains("student A"));
        assert_eq!(store.identity(), Some(identity()));
        assert!(store.clear_identity().unwrap());
        assert_eq!(store.identity(), None);
    }

    #[test]
    fn selected_activity_key_is_per_room_and_uppercased() {
        assert_eq!(selected_activity_key("ab12cd"), "room:AB12CD:selectedActivityId");
    }

    #[test]
    fn selected_activity_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).unwrap();
        assert_eq!(store.selected_activity("ROOM01"), None);
        store.set_selected_activity("ROOM01", 3).unwrap();
        assert_eq!(store.selected_activity("room01"), Some(3));
        assert_eq!(store.selected_activity("ROOM02"), None);
    }

    #[test]
    fn non_numeric_selected_activity_is_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).unwrap();
        store.set(selected_activity_key("R1"), "abc").unwrap();
        assert_eq!(store.selected_activity("R1"), None);
    }
}
