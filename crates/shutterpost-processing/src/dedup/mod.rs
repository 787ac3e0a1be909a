//! Duplicate detection against the local cache and the remote service

mod checker;

pub use checker::DuplicateChecker;
