//! Fish Leaderboard - local high score table for the fishing game
//!
//! Core modules:
//! - `entry`: Score records and the coercion rules applied to untrusted input
//! - `store`: JSON collection persisted under one storage key
//! - `seed`: One-time preset population
//! - `ranking`: Sorting and the rendered view
//! - `leaderboard`: Service object exposing the UI-facing operations
//! - `transfer`: Export/import of leaderboard files
//! - `session`: Live score mirroring under a per-page-load identity
//! - `scheduler`: Cancellable interval tasks with deterministic stepping
//! - `platform`: Storage backends and wall-clock time
//! - `config`: Tunables, persisted like the game's settings

pub mod config;
pub mod entry;
pub mod error;
pub mod leaderboard;
pub mod platform;
pub mod ranking;
pub mod scheduler;
pub mod seed;
pub mod session;
pub mod store;
pub mod transfer;

pub use config::Config;
pub use entry::ScoreEntry;
pub use error::{ConfigError, ImportError, StorageError};
pub use leaderboard::Leaderboard;
pub use ranking::{LeaderboardRenderer, LeaderboardView, RankedRow};
pub use session::{ScoreProvider, SessionId, SessionMirror};
pub use store::ScoreStore;
pub use transfer::{ExportFile, ImportReport};

/// Leaderboard constants
pub mod consts {
    /// Storage key holding the score collection
    pub const STORAGE_KEY: &str = "fish_leaderboard_v1";
    /// Rows shown in the rendered view
    pub const MAX_DISPLAYED: usize = 50;
    /// File name offered for downloads
    pub const EXPORT_FILE_NAME: &str = "fish-leaderboard.json";
    /// How long a download object URL stays alive (ms)
    pub const EXPORT_URL_TTL_MS: u32 = 5000;
    /// Live score polling interval (ms)
    pub const POLL_INTERVAL_MS: u32 = 1000;

    /// Name used when a manual submission has none
    pub const DEFAULT_NAME: &str = "Anon";
    /// Name used for the live session row when the name field is blank
    pub const SESSION_DEFAULT_NAME: &str = "You";

    pub const CLEAR_CONFIRM_MESSAGE: &str = "Clear leaderboard? This cannot be undone.";
}
