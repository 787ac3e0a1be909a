//! Shutterpost remote services
//!
//! Bindings to hosted photo services. Each service provides the remote
//! operations used by the upload orchestrator ([`PhotoService`]) and,
//! optionally, a [`RemoteSearcher`] that finds assets uploaded earlier.
//! Searchers are looked up by service name through [`SearcherRegistry`].

pub mod client;
pub mod error;
pub mod flickr;
pub mod registry;
pub mod search;
pub mod service;
pub mod smugmug;

// Re-export commonly used types
pub use client::{ApiClient, Credentials};
pub use error::{RemoteError, RemoteResult};
pub use flickr::{FlickrClient, FlickrSearcher};
pub use registry::SearcherRegistry;
pub use search::RemoteSearcher;
pub use service::{resolve_urls, select_image_url, ImageSize, PhotoService, ResolvedUrls};
pub use smugmug::{SmugMugClient, SmugMugSearcher};
