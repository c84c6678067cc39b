//! Local Storage
//!
//! Process-wide persistent state:
//!
//! - **kv**: SQLite-backed key-value store ([`LocalStore`])
//! - **cache**: Timestamped overview snapshot with a freshness window
//! - **error**: Error types

pub mod cache;
pub mod error;
pub mod kv;

pub use cache::OverviewCache;
pub use error::{StoreError, StoreResult};
pub use kv::{LocalStore, ASSISTANT_SESSION_KEY, OVERVIEW_SNAPSHOT_KEY, TOKEN_KEY};
