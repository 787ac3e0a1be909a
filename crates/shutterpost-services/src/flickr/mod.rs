//! Flickr binding
//!
//! REST calls return JSON (`format=json&nojsoncallback=1`); uploads go to a
//! separate endpoint that answers in XML. Checksums are stored as machine
//! tags, which Flickr can search directly.

mod client;
mod search;
mod types;

pub use client::FlickrClient;
pub use search::FlickrSearcher;
