//! Remote version source implementations

pub mod itunes;

pub use itunes::ItunesLookup;
