//! Dashboard API
//!
//! Typed client for the fitness dashboard HTTP API (base path `/api/v1`).
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /auth/login` - Exchange credentials for a bearer token
//! - `POST /auth/logout` - Revoke the session
//!
//! ## Sync
//! - `POST /sync[?force=1]` - Request a server-side refresh
//! - `GET /health` - Freshness timestamp
//!
//! ## Overview
//! - `GET /weekly?limit=N` - Weekly periods, newest first
//! - `GET /activity_totals[?start&end]` - Totals per activity type
//! - `GET /insights` - Analytics payload
//!
//! ## Activities
//! - `GET /activities?type&limit&offset[&start&end]` - One page of activities
//! - `GET /activity/:id` plus `/summary`, `/series`, `/route`, `/laps`, `/segments`
//! - `GET /segments_best` - Best segment tables
//!
//! ## Assistant
//! - `GET /insights/series?metric&weeks` - Weekly series of one metric
//! - `POST /insights/evaluate` - Ask the assistant
//! - `POST /insights/context` - Record a context event
//! - `GET /assistant/overview` - Assistant summary
//!
//! A `401` on any call surfaces as [`ClientError::Unauthorized`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fitdash::api::ApiClient;
//! use fitdash::config::ApiConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(&ApiConfig::default())?;
//!     let login = client.login("runner", "secret").await?;
//!     client.set_token(login.access_token).await;
//!
//!     let health = client.health().await?;
//!     println!("last update: {:?}", health.last_update);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dto;
pub mod error;

pub use client::ApiClient;
pub use error::{ClientError, ClientResult};
