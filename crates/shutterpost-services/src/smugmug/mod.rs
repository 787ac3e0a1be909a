//! SmugMug binding (API v2)
//!
//! Uploads go into the configured album. The checksum tag is stored as a
//! keyword; SmugMug also keeps the MD5 of the archived original, which the
//! filename search uses for confirmation.

mod client;
mod search;
mod types;

pub use client::SmugMugClient;
pub use search::SmugMugSearcher;
