//! Interface definitions for search backends.
//!
//! This module defines the abstract `SearchBackend` trait that allows
//! for dependency injection and swappable engine implementations.

mod search_backend;

pub use search_backend::{BackendKind, SearchBackend};
