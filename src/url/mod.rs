//! URL handling module for Site-Audit
//!
//! This module provides URL normalization (the dedup key for the crawl
//! frontier), host extraction, and internal-vs-external classification.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, is_internal, on_root_host, path_depth, same_site};
pub use normalize::{normalize_url, resolve_and_normalize};
