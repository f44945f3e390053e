//! Gowalla client modules
//!
//! The HTTP client, its configuration, and the background polling subsystem,
//! split into focused components so each seam stays testable on its own.

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod poller;

// Re-export main types for convenience
pub use api::GowallaApi;
pub use config::{ClientConfig, PollingConfig};
pub use error::ClientError;
pub use fetcher::{FeedSource, PollTarget};
pub use poller::{EventCallback, PollRegistry};

pub type Result<T> = std::result::Result<T, ClientError>;
