//! # Fitdash
//!
//! Client for a personal fitness-tracking API: routing, session handling,
//! view models for every dashboard screen, background sync and the
//! insights assistant.
//!
//! ## Modules
//!
//! - [`api`]: Typed HTTP client and wire DTOs
//! - [`storage`]: Local key-value store and overview snapshot cache
//! - [`router`]: Location parsing, screen resolution, navigation history
//! - [`session`]: Credential and login-redirect policy
//! - [`view`]: Pure view-model builders and formatters
//! - [`sync`]: Sync trigger and freshness poller
//! - [`assistant`]: Multi-turn assistant session
//! - [`app`]: Application state and event dispatch
//! - [`render`]: Text and JSON rendering of the active screen
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fitdash::{App, Config, LocalStore};
//! use fitdash::render::{render, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = LocalStore::open(&config.storage.data_dir)?;
//!     let mut app = App::new(config, store).await?;
//!
//!     app.open("/dashboard").await;
//!     println!("{}", render(&app, OutputFormat::Table));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod assistant;
pub mod config;
pub mod logging;
pub mod render;
pub mod router;
pub mod session;
pub mod storage;
pub mod sync;
pub mod view;

pub use api::{ApiClient, ClientError, ClientResult};

pub use app::{App, Generation, Ticket};

pub use assistant::{AssistantBackend, AssistantSession, Message, OverviewLoader, Role};

pub use config::{Config, ConfigError, LoggingConfig};

pub use router::{Location, Navigator, Route, RouteTables, Screen};

pub use session::SessionGuard;

pub use storage::{LocalStore, OverviewCache, StoreError, StoreResult};

pub use sync::{SyncBackend, SyncOutcome, SyncPoller};
