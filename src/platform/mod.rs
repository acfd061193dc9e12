//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, a directory of JSON files natively)
//! - Time

pub mod storage;
pub mod time;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use time::{Clock, ManualClock, SystemClock};
