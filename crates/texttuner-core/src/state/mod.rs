//! Session state and its persistence.
//!
//! - [`schema`] — `SessionState`, `Settings`, result slots
//! - [`storage`] — `KeyValueStore` trait with file and in-memory backends
//! - [`persist`] — save / load of the single `textTuner` record

pub mod persist;
pub mod schema;
pub mod storage;

pub use persist::{clear_state, load_state, save_state, STORAGE_KEY};
pub use schema::{
    ProviderDefaults, ResultSlot, SessionState, Settings, SkillResults, CUSTOM_PROVIDER,
    DEFAULT_PROVIDER,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
