//! Version layer for app update checking
//!
//! This module provides parsing and comparison of app versions and the
//! collaborator that fetches the latest published version.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│ RemoteInfo  │────▶│ Classifier  │
//! │  (fetch)    │     │  (version)  │     │  (severity) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Sources   │                         │   Semver    │
//! │  (itunes)   │                         │ (parse/cmp) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`classifier`]: Update severity between installed and remote versions
//! - [`error`]: Error types for fetch, store and check cycle failures
//! - [`semver`]: `SemanticVersion` parsing, ordering and canonical form
//! - [`source`]: Trait for fetching the latest published version
//! - [`sources`]: Concrete sources (App Store lookup)
//! - [`types`]: Common types like `RemoteVersionInfo`

pub mod classifier;
pub mod error;
pub mod semver;
pub mod source;
pub mod sources;
pub mod types;
