//! Update prompt layer
//!
//! This module owns the check cycle and the collaborators it drives.
//!
//! # Modules
//!
//! - [`clock`]: Injectable time source and day arithmetic
//! - [`engine`]: `UpdateEngine`, the due-check/fetch/classify/decide/present pipeline
//! - [`presenter`]: `UpdateAction`, `UserIntent` and the `Presenter` trait
//! - [`store`]: `StateStore` trait and its SQLite implementation

pub mod clock;
pub mod engine;
pub mod presenter;
pub mod store;
