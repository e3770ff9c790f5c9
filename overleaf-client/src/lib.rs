//! Scraping client for Overleaf Community Edition.
//!
//! Overleaf CE has no public API. This crate provides:
//! - Cookie session handling with CSRF tokens ([`session`])
//! - Extraction of JSON payloads embedded in page `<meta>` tags ([`extract`])
//! - Domain operations: login, invites, project listing, archive download ([`client`])

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod session;
pub mod types;

pub use client::{OverleafClient, ProjectDownload};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ExtractionError, ExtractionFailure};
pub use types::*;
