//! Page loaders for the XPages interpreter.
//!
//! This crate provides platform-specific implementations of the
//! `PageLoader` trait from xpages-traits.
//!
//! ## Available Loaders
//!
//! - [`FilesystemPageLoader`]: Loads pages from a directory, judging staleness by modification time
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory loader from xpages-traits:
//! - [`InMemoryPageLoader`]: Pre-populated in-memory storage with versioned tokens

mod filesystem;

pub use filesystem::FilesystemPageLoader;

pub use xpages_traits::InMemoryPageLoader;
