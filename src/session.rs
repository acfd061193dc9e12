//! Live score mirroring
//!
//! Each page load gets a random session id. While the game runs, the session
//! row on the leaderboard is kept equal to the in-game score by polling a
//! [`ScoreProvider`] and upserting only when the value changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::entry::coerce_f64;
use crate::error::StorageResult;
use crate::leaderboard::Leaderboard;

/// Read access to the running game's score.
///
/// `None` means no game is exposing a score right now.
pub trait ScoreProvider {
    fn current_score(&self) -> Option<f64>;
}

impl<F> ScoreProvider for F
where
    F: Fn() -> Option<f64>,
{
    fn current_score(&self) -> Option<f64> {
        self()
    }
}

/// Provider for pages without a game
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScoreProvider;

impl ScoreProvider for NoScoreProvider {
    fn current_score(&self) -> Option<f64> {
        None
    }
}

const SESSION_PREFIX: &str = "sess_";
const SESSION_ID_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Per-page-load identity of the live leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// `sess_` followed by 7 lowercase base-36 characters
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut id = String::with_capacity(SESSION_PREFIX.len() + SESSION_ID_LEN);
        id.push_str(SESSION_PREFIX);
        for _ in 0..SESSION_ID_LEN {
            id.push(BASE36[rng.random_range(0..BASE36.len())] as char);
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Change-detecting poller for the live row
#[derive(Debug, Clone)]
pub struct SessionMirror {
    session_id: SessionId,
    last_score: Option<u64>,
}

impl SessionMirror {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            last_score: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn last_score(&self) -> Option<u64> {
        self.last_score
    }

    /// Sample the live score and upsert the session row if it changed.
    ///
    /// `name_field` is the current player name input. Returns true if a write
    /// happened.
    pub fn poll(&mut self, leaderboard: &mut Leaderboard, name_field: &str) -> StorageResult<bool> {
        let Some(raw) = leaderboard.live_score_raw() else {
            return Ok(false);
        };
        let score = coerce_f64(raw);
        if self.last_score == Some(score) {
            return Ok(false);
        }

        // Recorded even if the write fails; no retry until the score moves
        self.last_score = Some(score);
        leaderboard.upsert_session_score(self.session_id.as_str(), name_field, score)?;
        log::debug!("Session {} mirrored score {}", self.session_id, score);
        Ok(true)
    }
}

/// Interval job polling `mirror` against a shared leaderboard.
///
/// `name_field` reads the player name input at each tick. Storage failures
/// are logged; the job keeps running.
pub fn mirror_job(
    leaderboard: Rc<RefCell<Leaderboard>>,
    mut mirror: SessionMirror,
    name_field: impl Fn() -> String + 'static,
) -> impl FnMut() + 'static {
    move || {
        let name = name_field();
        if let Err(e) = mirror.poll(&mut leaderboard.borrow_mut(), &name) {
            log::error!("Failed to mirror live score: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platform::{ManualClock, MemoryStorage};
    use crate::scheduler::Scheduler;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::Cell;

    fn leaderboard_with(score: Rc<Cell<Option<f64>>>) -> Leaderboard {
        let config = Config {
            seed_presets: false,
            ..Default::default()
        };
        Leaderboard::new(Box::new(MemoryStorage::new()), config)
            .with_clock(Box::new(ManualClock::new(1_000)))
            .with_provider(Box::new(move || score.get()))
    }

    #[test]
    fn test_session_id_shape() {
        let mut rng = Pcg32::seed_from_u64(7);
        let id = SessionId::generate(&mut rng);
        let s = id.as_str();
        assert!(s.starts_with("sess_"));
        assert_eq!(s.len(), 12);
        assert!(s[5..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_session_id_deterministic_per_seed() {
        let a = SessionId::generate(&mut Pcg32::seed_from_u64(42));
        let b = SessionId::generate(&mut Pcg32::seed_from_u64(42));
        let c = SessionId::generate(&mut Pcg32::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_poll_without_provider_never_writes() {
        let score = Rc::new(Cell::new(None));
        let mut lb = leaderboard_with(score);
        let mut mirror = SessionMirror::new(SessionId("sess_test001".to_string()));

        assert!(!mirror.poll(&mut lb, "Nemo").unwrap());
        assert!(lb.entries().is_empty());
        assert_eq!(mirror.last_score(), None);
    }

    #[test]
    fn test_poll_writes_only_on_change() {
        let score = Rc::new(Cell::new(Some(10.0)));
        let mut lb = leaderboard_with(score.clone());
        let mut mirror = SessionMirror::new(SessionId("sess_test001".to_string()));

        assert!(mirror.poll(&mut lb, "").unwrap());
        assert!(!mirror.poll(&mut lb, "").unwrap());
        assert!(!mirror.poll(&mut lb, "Renamed").unwrap());

        score.set(Some(25.7));
        assert!(mirror.poll(&mut lb, "  Nemo ").unwrap());

        let entries = lb.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Nemo");
        assert_eq!(entries[0].score, 25);
        assert_eq!(entries[0].session_id.as_deref(), Some("sess_test001"));
    }

    #[test]
    fn test_first_zero_score_is_written() {
        let score = Rc::new(Cell::new(Some(0.0)));
        let mut lb = leaderboard_with(score);
        let mut mirror = SessionMirror::new(SessionId("sess_zero000".to_string()));

        assert!(mirror.poll(&mut lb, "").unwrap());
        let entries = lb.entries();
        assert_eq!(entries[0].name, "You");
        assert_eq!(entries[0].score, 0);
    }

    #[test]
    fn test_mirror_job_on_scheduler() {
        let score = Rc::new(Cell::new(None));
        let lb = Rc::new(RefCell::new(leaderboard_with(score.clone())));
        let mirror = SessionMirror::new(SessionId("sess_sched00".to_string()));

        let mut scheduler = Scheduler::new();
        let mut job = mirror_job(lb.clone(), mirror, || "Nemo".to_string());
        let handle = scheduler.every(1000, move |_| job());

        scheduler.advance(3000);
        assert!(lb.borrow().entries().is_empty());

        score.set(Some(40.0));
        scheduler.advance(1000);
        score.set(Some(55.0));
        scheduler.advance(1000);
        let entries = lb.borrow().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 55);

        handle.cancel();
        score.set(Some(90.0));
        scheduler.advance(5000);
        assert_eq!(lb.borrow().entries()[0].score, 55);
    }
}
