//! Request/response model and the fixed companion-asset manifest.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Static version tag partitioning cache generations.
pub const CACHE_VERSION: &str = "v1";

/// Cache collection name prefix; the full name is `{prefix}-{version}`.
pub const APP_CACHE_PREFIX: &str = "watchdeck";

/// Relative paths of the companion app shell. Required: installed
/// all-or-nothing.
pub const APP_SHELL: &[&str] = &[
  "/",
  "/index.html",
  "/styles.css",
  "/app.js",
  "/manifest.webmanifest",
  "/icons/icon-192.png",
  "/icons/icon-512.png",
  "/icons/app-icon.svg",
];

/// Optional external resources, prefetched best-effort during install.
pub const EXTERNAL_RESOURCES: &[&str] = &[
  "https://cdn.jsdelivr.net/npm/html2canvas@1.4.1/dist/html2canvas.min.js",
  "https://fonts.googleapis.com/css2?family=Orbitron:wght@400;600&display=swap",
];

/// App-shell path served as the offline fallback for failed navigations.
pub const ROOT_DOCUMENT: &str = "/index.html";

/// Request method. Only `Get` is served by the cache gateway; everything
/// else passes through to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
  Patch,
}

/// How the requested resource is being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// A top-level document load; failures degrade to the cached root
  /// document.
  Navigate,
  /// Any other resource load; failures propagate to the caller.
  Asset,
}

/// A request routed through the asset gateway.
#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub url: String,
  pub method: Method,
  pub mode: RequestMode,
}

impl AssetRequest {
  /// A plain GET for a subresource.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      method: Method::Get,
      mode: RequestMode::Asset,
    }
  }

  /// A top-level navigation GET.
  pub fn navigation(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      method: Method::Get,
      mode: RequestMode::Navigate,
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }
}

/// Origin classification of a fetched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
  /// Same-origin, fully readable.
  Basic,
  /// Cross-origin but readable.
  Cors,
  /// Cross-origin and unreadable; never stored.
  Opaque,
}

/// A response, either fresh from the network or replayed from the store.
#[derive(Debug, Clone)]
pub struct AssetResponse {
  pub status: u16,
  pub kind: ResponseKind,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Whether the gateway may store this response opportunistically:
  /// a plain same-origin 200.
  pub fn is_cacheable(&self) -> bool {
    self.status == 200 && self.kind == ResponseKind::Basic
  }

  /// Body decoded as UTF-8, lossily.
  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

/// The fixed set of assets one cache generation installs, plus the version
/// tag that names its collection.
#[derive(Debug, Clone)]
pub struct AssetManifest {
  pub version: String,
  pub required: Vec<String>,
  pub optional: Vec<String>,
  pub root_document: String,
}

impl AssetManifest {
  /// Resolve the built-in shell and external lists against an asset base
  /// URL.
  pub fn for_base(base: &Url) -> Result<Self> {
    let join = |path: &str| -> Result<String> {
      base
        .join(path)
        .map(|u| u.to_string())
        .map_err(|e| eyre!("Invalid asset path {} against {}: {}", path, base, e))
    };

    Ok(Self {
      version: CACHE_VERSION.to_string(),
      required: APP_SHELL.iter().map(|p| join(p)).collect::<Result<_>>()?,
      optional: EXTERNAL_RESOURCES.iter().map(|u| u.to_string()).collect(),
      root_document: join(ROOT_DOCUMENT)?,
    })
  }

  /// Collection name for this manifest's generation.
  pub fn cache_name(&self) -> String {
    format!("{}-{}", APP_CACHE_PREFIX, self.version)
  }
}
