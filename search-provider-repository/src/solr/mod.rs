//! Solr implementation of the search backend.
//!
//! This module provides a `SearchBackend` that talks to a Solr core over its
//! HTTP JSON API.

mod client;
mod requests;
mod response;

pub use client::SolrBackend;
