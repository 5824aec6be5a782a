use std::collections::HashSet;

use serde::Serialize;

use crate::errors::ErrorKind;
use crate::models::notification::Notification;

/// Owned copy of the store's state, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub loading: bool,
    pub last_error: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the collection.
    Applied { count: usize, unread: usize },
    /// A newer refresh already landed; this response was discarded.
    Stale,
    NoSession,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyRead,
    /// The service accepted the call but the id is not in the local
    /// collection (e.g. a refresh replaced it meanwhile).
    NotFoundLocally,
    NoSession,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkAllOutcome {
    /// `marked` entries were confirmed by the service and flipped locally;
    /// `failed` entries were rejected and stay unread. Entries a refresh
    /// removed or already marked read count in neither.
    Completed { marked: usize, failed: usize },
    NoSession,
    Disposed,
}

/// Mutable store state. Every mutation keeps `unread_count` equal to the
/// number of unread entries.
#[derive(Debug, Default)]
pub(crate) struct State {
    notifications: Vec<Notification>,
    unread_count: usize,
    in_flight: usize,
    last_error: Option<ErrorKind>,
    applied_seq: u64,
}

impl State {
    pub(crate) fn begin_refresh(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn end_refresh(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// True once a refresh issued after `seq` has been applied.
    pub(crate) fn is_superseded(&self, seq: u64) -> bool {
        seq <= self.applied_seq
    }

    /// Replace the collection with a refresh response tagged `seq`.
    /// Responses older than the last applied one are dropped.
    pub(crate) fn apply_list(&mut self, seq: u64, list: Vec<Notification>) -> RefreshOutcome {
        if self.is_superseded(seq) {
            return RefreshOutcome::Stale;
        }

        self.notifications = dedupe(list);
        self.unread_count = self.notifications.iter().filter(|n| !n.read).count();
        self.applied_seq = seq;
        self.last_error = None;

        RefreshOutcome::Applied {
            count: self.notifications.len(),
            unread: self.unread_count,
        }
    }

    pub(crate) fn mark_read(&mut self, id: &str) -> MarkOutcome {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            None => MarkOutcome::NotFoundLocally,
            Some(n) if n.read => MarkOutcome::AlreadyRead,
            Some(n) => {
                n.read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
                MarkOutcome::Marked
            }
        }
    }

    pub(crate) fn unread_ids(&self) -> Vec<String> {
        self.notifications
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id.clone())
            .collect()
    }

    pub(crate) fn set_error(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
    }

    pub(crate) fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub(crate) fn clear(&mut self) {
        *self = State::default();
    }

    pub(crate) fn snapshot(&self) -> StoreState {
        StoreState {
            notifications: self.notifications.clone(),
            unread_count: self.unread_count,
            loading: self.in_flight > 0,
            last_error: self.last_error,
        }
    }

    pub(crate) fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}

// Keeps the first occurrence of each id, preserving server order.
fn dedupe(list: Vec<Notification>) -> Vec<Notification> {
    let mut seen = HashSet::with_capacity(list.len());
    let before = list.len();
    let out: Vec<Notification> = list
        .into_iter()
        .filter(|n| seen.insert(n.id.clone()))
        .collect();
    if out.len() != before {
        tracing::warn!(
            dropped = before - out.len(),
            "notification list contained duplicate ids"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn n(id: &str, read: bool) -> Notification {
        Notification {
            id: id.into(),
            r#type: "job_alert".into(),
            title: format!("title {}", id),
            message: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            read,
            related_job: None,
            category: None,
        }
    }

    #[test]
    fn test_apply_list_counts_unread() {
        let mut state = State::default();
        let outcome = state.apply_list(1, vec![n("a", false), n("b", true), n("c", false)]);
        assert_eq!(outcome, RefreshOutcome::Applied { count: 3, unread: 2 });
        assert_eq!(state.unread_count(), 2);
    }

    #[test]
    fn test_apply_list_preserves_order() {
        let mut state = State::default();
        state.apply_list(1, vec![n("z", false), n("a", false), n("m", true)]);
        let ids: Vec<_> = state.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_apply_list_drops_duplicate_ids() {
        let mut state = State::default();
        state.apply_list(1, vec![n("a", false), n("b", false), n("a", true)]);
        assert_eq!(state.notifications().len(), 2);
        assert!(!state.notifications()[0].read, "first occurrence wins");
        assert_eq!(state.unread_count(), 2);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = State::default();
        state.apply_list(2, vec![n("new", false)]);
        assert_eq!(state.apply_list(1, vec![n("old", false)]), RefreshOutcome::Stale);
        assert_eq!(state.notifications()[0].id, "new");
    }

    #[test]
    fn test_successful_apply_clears_error() {
        let mut state = State::default();
        state.set_error(ErrorKind::NetworkFailure);
        state.apply_list(1, vec![]);
        assert!(state.snapshot().last_error.is_none());
    }

    #[test]
    fn test_mark_read_transitions() {
        let mut state = State::default();
        state.apply_list(1, vec![n("a", false), n("b", true)]);

        assert_eq!(state.mark_read("a"), MarkOutcome::Marked);
        assert_eq!(state.unread_count(), 0);
        assert_eq!(state.mark_read("a"), MarkOutcome::AlreadyRead);
        assert_eq!(state.mark_read("b"), MarkOutcome::AlreadyRead);
        assert_eq!(state.mark_read("missing"), MarkOutcome::NotFoundLocally);
        assert_eq!(state.unread_count(), 0);
    }

    #[test]
    fn test_loading_tracks_overlapping_refreshes() {
        let mut state = State::default();
        state.begin_refresh();
        state.begin_refresh();
        state.end_refresh();
        assert!(state.snapshot().loading);
        state.end_refresh();
        assert!(!state.snapshot().loading);
        state.end_refresh();
        assert!(!state.snapshot().loading);
    }

    #[test]
    fn test_superseded_after_newer_apply() {
        let mut state = State::default();
        assert!(!state.is_superseded(1));
        state.apply_list(3, vec![n("a", false)]);
        assert!(state.is_superseded(2));
        assert!(state.is_superseded(3));
        assert!(!state.is_superseded(4));
    }

    #[test]
    fn test_unread_ids() {
        let mut state = State::default();
        state.apply_list(1, vec![n("a", false), n("b", true), n("c", false)]);
        assert_eq!(state.unread_ids(), vec!["a".to_string(), "c".to_string()]);
    }
}
