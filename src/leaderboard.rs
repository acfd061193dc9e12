//! Leaderboard service
//!
//! One instance is built at startup and owns everything the UI layer needs:
//! the store, the clock, the live score provider and the renderer. Every
//! mutation is a load-modify-save followed by a re-render.

use std::cell::RefCell;

use crate::config::Config;
use crate::consts::CLEAR_CONFIRM_MESSAGE;
use crate::entry::{ScoreEntry, coerce_f64};
use crate::error::{ImportError, StorageResult};
use crate::platform::{Clock, KeyValueStorage, SystemClock};
use crate::ranking::{LeaderboardRenderer, LeaderboardView, NullRenderer};
use crate::seed::seed_if_empty;
use crate::session::{NoScoreProvider, ScoreProvider};
use crate::store::ScoreStore;
use crate::transfer::{ExportFile, ImportReport, export_json, parse_import};

/// Yes/no prompt shown before destructive actions
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

pub struct Leaderboard {
    store: ScoreStore,
    config: Config,
    clock: Box<dyn Clock>,
    provider: Box<dyn ScoreProvider>,
    renderer: Box<dyn LeaderboardRenderer>,
}

impl Leaderboard {
    /// Leaderboard over `storage` with the real clock, no live score and no
    /// renderer attached
    pub fn new(storage: Box<dyn KeyValueStorage>, config: Config) -> Self {
        Self {
            store: ScoreStore::new(storage, config.storage_key.clone()),
            config,
            clock: Box::new(SystemClock),
            provider: Box::new(NoScoreProvider),
            renderer: Box::new(NullRenderer),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn ScoreProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn LeaderboardRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Startup: seed presets if the store is empty, then render
    pub fn init(&mut self) -> StorageResult<LeaderboardView> {
        if self.config.seed_presets {
            seed_if_empty(&self.store, self.clock.now_ms())?;
        }
        Ok(self.render())
    }

    /// Stored entries in storage order
    pub fn entries(&self) -> Vec<ScoreEntry> {
        self.store.load()
    }

    /// Current ranked view without touching the renderer
    pub fn view(&self) -> LeaderboardView {
        LeaderboardView::from_entries(&self.store.load(), self.config.max_displayed)
    }

    /// Rebuild the view and push it to the renderer
    pub fn render(&mut self) -> LeaderboardView {
        let view = self.view();
        self.renderer.render(&view);
        view
    }

    /// Append a manually submitted score
    pub fn add_score(&mut self, name: &str, score: u64) -> StorageResult<ScoreEntry> {
        let entry = ScoreEntry::new(name, score, self.clock.now_ms());
        let mut entries = self.store.load();
        entries.push(entry.clone());
        self.store.save(&entries)?;
        log::info!("Added score {} for {}", entry.score, entry.name);
        self.render();
        Ok(entry)
    }

    /// Insert or overwrite the row owned by `session_id`
    pub fn upsert_session_score(
        &mut self,
        session_id: &str,
        name: &str,
        score: u64,
    ) -> StorageResult<ScoreEntry> {
        let entry = ScoreEntry::for_session(session_id, name, score, self.clock.now_ms());
        let mut entries = self.store.load();
        match entries
            .iter_mut()
            .find(|e| e.session_id.as_deref() == Some(session_id))
        {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        self.store.save(&entries)?;
        self.render();
        Ok(entry)
    }

    /// Remove every entry after the user confirms.
    /// Returns false if they declined.
    pub fn clear(&mut self, confirm: &dyn Confirm) -> StorageResult<bool> {
        if !confirm.confirm(CLEAR_CONFIRM_MESSAGE) {
            return Ok(false);
        }
        self.store.clear()?;
        self.render();
        Ok(true)
    }

    /// Raw value from the live score provider
    pub fn live_score_raw(&self) -> Option<f64> {
        self.provider.current_score()
    }

    pub fn live_score(&self) -> Option<u64> {
        self.live_score_raw().map(coerce_f64)
    }

    /// Score for a manual submission.
    ///
    /// Parses the leading integer of the score field; if there is none, uses
    /// the live score, or 0 without one.
    pub fn resolve_submitted_score(&self, raw: &str) -> u64 {
        parse_int_prefix(raw)
            .or_else(|| self.live_score())
            .unwrap_or(0)
    }

    /// Whole collection as a download
    pub fn export(&self) -> StorageResult<ExportFile> {
        let entries = self.store.load();
        let contents = export_json(&entries)?;
        log::info!("Exported {} entries", entries.len());
        Ok(ExportFile {
            file_name: self.config.export_file_name.clone(),
            contents,
        })
    }

    /// Merge an import file into the stored collection.
    ///
    /// All or nothing: on error nothing is written.
    pub fn import(&mut self, text: &str) -> Result<ImportReport, ImportError> {
        let (incoming, dropped) = parse_import(text, self.clock.now_ms())?;
        let report = ImportReport {
            accepted: incoming.len(),
            dropped,
        };

        let mut entries = self.store.load();
        entries.extend(incoming);
        self.store.save(&entries)?;
        if dropped > 0 {
            log::warn!("Import dropped {} malformed rows", dropped);
        }
        log::info!("Imported {} entries", report.accepted);
        self.render();
        Ok(report)
    }
}

/// [`Leaderboard::clear`] on a shared leaderboard.
///
/// The prompt runs before the leaderboard is borrowed, so interval jobs that
/// fire while a modal dialog is open can still use it.
pub fn clear_shared(
    leaderboard: &RefCell<Leaderboard>,
    confirm: &dyn Confirm,
) -> StorageResult<bool> {
    if !confirm.confirm(CLEAR_CONFIRM_MESSAGE) {
        return Ok(false);
    }
    leaderboard.borrow_mut().clear(&|_: &str| true)
}

/// Leading base-10 integer as a score: optional whitespace, optional sign,
/// digits. Trailing junk is ignored, negatives are 0 and values past
/// `u64::MAX` saturate. `None` if there are no digits.
fn parse_int_prefix(raw: &str) -> Option<u64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    if negative {
        return Some(0);
    }
    // All digits, so overflow is the only possible error
    Some(rest[..digits].parse::<u64>().unwrap_or(u64::MAX))
}
