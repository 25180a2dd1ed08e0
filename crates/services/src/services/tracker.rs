//! Device-local workflow bookkeeping.
//!
//! Two id lists live only on this device: requests created through the
//! direct-proposal flow, and purchased proposals. They are not server-backed
//! and not shared across devices; clearing local data loses them.

use std::{
    fs, io,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerState {
    #[serde(default)]
    direct_requests: Vec<Uuid>,
    #[serde(default)]
    purchased_proposals: Vec<Uuid>,
}

/// JSON-file-backed id tracker. All reads hit the in-memory copy; every
/// write persists before returning.
#[derive(Debug)]
pub struct LocalTracker {
    path: Option<PathBuf>,
    state: Mutex<TrackerState>,
}

impl LocalTracker {
    /// Open the tracker at `path`. A missing or unreadable file starts
    /// empty; a corrupt one is discarded with a warning.
    pub fn open(path: PathBuf) -> Self {
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), "discarding corrupt tracker file: {e}");
                TrackerState::default()
            }),
            Err(_) => TrackerState::default(),
        };
        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    /// Tracker that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn record_direct_request(&self, id: Uuid) -> io::Result<()> {
        self.mutate(|state| {
            if !state.direct_requests.contains(&id) {
                state.direct_requests.push(id);
            }
        })
    }

    pub fn forget_direct_request(&self, id: Uuid) -> io::Result<()> {
        self.mutate(|state| state.direct_requests.retain(|d| *d != id))
    }

    pub fn is_direct_request(&self, id: Uuid) -> bool {
        self.lock().direct_requests.contains(&id)
    }

    pub fn direct_request_ids(&self) -> Vec<Uuid> {
        self.lock().direct_requests.clone()
    }

    pub fn record_purchase(&self, proposal_id: Uuid) -> io::Result<()> {
        self.mutate(|state| {
            if !state.purchased_proposals.contains(&proposal_id) {
                state.purchased_proposals.push(proposal_id);
            }
        })
    }

    pub fn is_purchased(&self, proposal_id: Uuid) -> bool {
        self.lock().purchased_proposals.contains(&proposal_id)
    }

    fn mutate(&self, apply: impl FnOnce(&mut TrackerState)) -> io::Result<()> {
        let mut state = self.lock();
        apply(&mut state);
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string_pretty(&*state)?;
            fs::write(path, raw)?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_requests_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let id = Uuid::new_v4();

        let tracker = LocalTracker::open(path.clone());
        tracker.record_direct_request(id).unwrap();
        assert!(tracker.is_direct_request(id));

        let reopened = LocalTracker::open(path);
        assert!(reopened.is_direct_request(id));
        assert!(!reopened.is_purchased(id));
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let tracker = LocalTracker::in_memory();
        let id = Uuid::new_v4();

        tracker.record_direct_request(id).unwrap();
        tracker.record_direct_request(id).unwrap();
        assert_eq!(tracker.direct_request_ids(), vec![id]);

        tracker.forget_direct_request(id).unwrap();
        assert!(tracker.direct_request_ids().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, "not json").unwrap();

        let tracker = LocalTracker::open(path);
        assert!(tracker.direct_request_ids().is_empty());
    }

    #[test]
    fn purchases_are_tracked_separately() {
        let tracker = LocalTracker::in_memory();
        let id = Uuid::new_v4();

        tracker.record_purchase(id).unwrap();
        assert!(tracker.is_purchased(id));
        assert!(!tracker.is_direct_request(id));
    }
}
