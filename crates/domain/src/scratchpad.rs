//! Session scratchpad: one free-text note per play session
//!
//! The current session is edited in place and committed to a bounded
//! history. Commits are debounced so a burst of keystrokes produces a
//! single write.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Most sessions kept in history
pub const MAX_SESSION_HISTORY: usize = 50;

/// Default quiet period before an edit is committed
pub const DEFAULT_AUTOSAVE_DELAY_MS: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScratchSession {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

impl ScratchSession {
    /// An empty note titled after its creation time, e.g.
    /// "Session May 4, 2024 8:00 PM".
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: format!("Session {}", now.format("%b %-d, %Y %-I:%M %p")),
            content: String::new(),
            created: now,
            last_saved: None,
        }
    }

    /// File name offered when exporting the note.
    pub fn download_file_name(&self) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}.txt", stem, self.id)
    }

    /// First `max_chars` characters of the content, for history listings.
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

// ============================================================================
// History
// ============================================================================

/// Sessions, most recently saved first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHistory(Vec<ScratchSession>);

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any session with the same id and moves it to the front.
    pub fn upsert(&mut self, session: ScratchSession) {
        self.0.retain(|s| s.id != session.id);
        self.0.insert(0, session);
        self.0.truncate(MAX_SESSION_HISTORY);
    }

    pub fn find(&self, id: SessionId) -> Option<&ScratchSession> {
        self.0.iter().find(|s| s.id == id)
    }

    pub fn sessions(&self) -> &[ScratchSession] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Debouncer
// ============================================================================

/// Tracks when a pending edit becomes due for commit.
///
/// Driven by timestamps rather than timers: every `touch` pushes the
/// deadline out, and `take_due` fires once the quiet period has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Clears and reports a due deadline.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_AUTOSAVE_DELAY_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 20, minute, second).unwrap()
    }

    fn session(n: u128) -> ScratchSession {
        ScratchSession::new(SessionId::from_uuid(Uuid::from_u128(n)), at(0, 0))
    }

    mod sessions {
        use super::*;

        #[test]
        fn title_uses_creation_time() {
            assert_eq!(session(1).title, "Session May 4, 2024 8:00 PM");
        }

        #[test]
        fn download_name_sanitizes_title() {
            let mut s = session(1);
            s.title = "Night at the Inn!".into();
            assert_eq!(
                s.download_file_name(),
                "Night_at_the_Inn__00000000-0000-0000-0000-000000000001.txt"
            );
        }

        #[test]
        fn serializes_camel_case() {
            let json = serde_json::to_value(session(1)).unwrap();
            assert!(json.get("lastSaved").is_some());
            assert_eq!(json["content"], "");
        }
    }

    mod history {
        use super::*;

        #[test]
        fn upsert_moves_to_front_without_duplicates() {
            let mut history = SessionHistory::new();
            history.upsert(session(1));
            history.upsert(session(2));
            let mut edited = session(1);
            edited.content = "goblins".into();
            history.upsert(edited);

            assert_eq!(history.len(), 2);
            assert_eq!(history.sessions()[0].content, "goblins");
            assert_eq!(history.sessions()[1].id, session(2).id);
        }

        #[test]
        fn capped_at_fifty() {
            let mut history = SessionHistory::new();
            for n in 0..60 {
                history.upsert(session(n));
            }
            assert_eq!(history.len(), MAX_SESSION_HISTORY);
            assert_eq!(history.sessions()[0].id, session(59).id);
            assert!(history.find(session(5).id).is_none());
        }
    }

    mod debouncer {
        use super::*;

        #[test]
        fn fires_once_after_quiet_period() {
            let mut debouncer = Debouncer::new(Duration::seconds(2));
            assert!(!debouncer.take_due(at(0, 0)));

            debouncer.touch(at(0, 0));
            debouncer.touch(at(0, 1));
            assert!(!debouncer.take_due(at(0, 2)));
            assert!(debouncer.take_due(at(0, 3)));
            assert!(!debouncer.take_due(at(0, 4)));
        }

        #[test]
        fn cancel_drops_pending() {
            let mut debouncer = Debouncer::default();
            debouncer.touch(at(0, 0));
            debouncer.cancel();
            assert!(!debouncer.is_pending());
            assert!(!debouncer.is_due(at(1, 0)));
        }
    }
}
