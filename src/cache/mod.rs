//! Offline companion-asset cache.
//!
//! watchdeck mirrors a fixed set of remote companion assets (the web app
//! shell, help documents, icons) into a local versioned store so the
//! dashboard works without a network. The module provides:
//! - a fixed, versioned [`AssetManifest`] (required shell + optional
//!   externals),
//! - [`CacheManager`]: install (all-or-nothing) / activate (purge stale
//!   generations) / cache-first GET gateway with a navigation fallback,
//! - the [`CacheStore`] and [`AssetFetcher`] seams with SQLite and reqwest
//!   production backends.

mod client;
mod manager;
mod store;
mod types;

pub use client::{AssetFetcher, HttpFetcher};
pub use manager::{CacheManager, LifecyclePhase};
pub use store::{CacheStore, MemoryStore, SqliteStore};
pub use types::{
  AssetManifest, AssetRequest, AssetResponse, Method, RequestMode, ResponseKind, APP_CACHE_PREFIX,
  APP_SHELL, CACHE_VERSION, EXTERNAL_RESOURCES, ROOT_DOCUMENT,
};
