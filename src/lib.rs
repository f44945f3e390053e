//! Client for the Gowalla check-in API with background activity polling.
//!
//! The typed HTTP surface lives in [`client::GowallaApi`]; the polling
//! subsystem in [`client::PollRegistry`] simulates push notifications over
//! the pull-based API by watching activity feeds with per-subscription
//! timestamp cursors.
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use gowalla_client::{
//!     ClientConfig, GowallaApi, PollRegistry, PollTarget, event::PollEvent,
//! };
//!
//! # async fn run() -> gowalla_client::Result<()> {
//! let api = Arc::new(GowallaApi::new(ClientConfig::new("my-api-key"))?);
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let registry = PollRegistry::new(api, tx);
//!
//! let id = registry.add(
//!     PollTarget::spot("11888"),
//!     Some(Duration::from_secs(60)),
//!     None,
//!     Arc::new(|event| {
//!         println!("new activity: {}", event.kind);
//!         Ok(())
//!     }),
//! )?;
//!
//! while let Some(notification) = rx.recv().await {
//!     if let PollEvent::FetchFailed(id, reason) = notification {
//!         eprintln!("poll {id} failed: {reason}");
//!     }
//! }
//!
//! registry.remove(id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cursor;
pub mod dispatcher;
pub mod domain;
pub mod event;
pub mod id;
pub mod resource;
pub mod timestamp;

pub use client::{
    ClientConfig, ClientError, EventCallback, FeedSource, GowallaApi, PollRegistry, PollTarget,
    Result,
};
pub use cursor::{PollCursor, SCAN_LIMIT};
pub use id::{SpotId, SubscriptionId};
