//! Versioned offline cache: lifecycle state machine and request gateway.
//!
//! One [`CacheManager`] owns one cache generation, named
//! `{app}-{version}`. Install fetches the required manifest all-or-nothing
//! and prefetches optional externals best-effort; activate purges every
//! collection from other generations; the steady-state gateway serves GET
//! requests cache-first with a network fallback and, for navigations that
//! fail at the network layer, the cached root document.

use color_eyre::{eyre::eyre, Result};
use futures::future::{join_all, try_join_all};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::client::AssetFetcher;
use super::store::CacheStore;
use super::types::{AssetManifest, AssetRequest, AssetResponse, Method, RequestMode};

/// Cache lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
  Uninstalled,
  Installing,
  /// Required assets stored; ready to take over immediately.
  Installed,
  Activating,
  /// Current generation is the only one left and controls all requests.
  Active,
}

impl LifecyclePhase {
  pub fn label(&self) -> &'static str {
    match self {
      LifecyclePhase::Uninstalled => "uninstalled",
      LifecyclePhase::Installing => "installing",
      LifecyclePhase::Installed => "installed",
      LifecyclePhase::Activating => "activating",
      LifecyclePhase::Active => "active",
    }
  }
}

/// Offline cache manager, generic over the network and storage seams.
pub struct CacheManager<F: AssetFetcher, S: CacheStore> {
  fetcher: Arc<F>,
  store: Arc<S>,
  manifest: AssetManifest,
  phase: Arc<Mutex<LifecyclePhase>>,
}

impl<F: AssetFetcher, S: CacheStore> CacheManager<F, S> {
  pub fn new(fetcher: F, store: S, manifest: AssetManifest) -> Self {
    Self {
      fetcher: Arc::new(fetcher),
      store: Arc::new(store),
      manifest,
      phase: Arc::new(Mutex::new(LifecyclePhase::Uninstalled)),
    }
  }

  /// Collection name of this manager's generation.
  pub fn cache_name(&self) -> String {
    self.manifest.cache_name()
  }

  pub fn manifest(&self) -> &AssetManifest {
    &self.manifest
  }

  pub fn phase(&self) -> LifecyclePhase {
    self
      .phase
      .lock()
      .map(|p| *p)
      .unwrap_or(LifecyclePhase::Uninstalled)
  }

  fn set_phase(&self, phase: LifecyclePhase) {
    if let Ok(mut current) = self.phase.lock() {
      *current = phase;
    }
  }

  /// Install this generation.
  ///
  /// Every required asset is fetched concurrently; the first failure
  /// (transport error or non-success status) aborts the install before
  /// anything is written, leaving any previous generation untouched.
  /// Optional externals are then prefetched independently; their failures
  /// are logged and ignored. On return the generation is ready to take
  /// over without any waiting period.
  pub async fn install(&self) -> Result<()> {
    self.set_phase(LifecyclePhase::Installing);

    match self.install_inner().await {
      Ok(()) => {
        self.set_phase(LifecyclePhase::Installed);
        Ok(())
      }
      Err(e) => {
        self.set_phase(LifecyclePhase::Uninstalled);
        Err(e)
      }
    }
  }

  async fn install_inner(&self) -> Result<()> {
    let collection = self.cache_name();

    // Required shell: fetch everything, stage in memory, commit in one
    // atomic write.
    let staged = try_join_all(self.manifest.required.iter().map(|url| {
      let fetcher = Arc::clone(&self.fetcher);
      let request = AssetRequest::get(url.clone());
      let url = url.clone();
      async move {
        let response = fetcher.fetch(&request).await?;
        if !response.is_success() {
          return Err(eyre!(
            "Required asset {} returned status {}",
            url,
            response.status
          ));
        }
        Ok((url, response))
      }
    }))
    .await?;

    self.store.put_all(&collection, &staged)?;
    info!(
      collection = %collection,
      assets = staged.len(),
      "installed required assets"
    );

    // Optional externals: each fetch is independent, failures are only
    // logged.
    join_all(self.manifest.optional.iter().map(|url| {
      let fetcher = Arc::clone(&self.fetcher);
      let store = Arc::clone(&self.store);
      let collection = collection.clone();
      let request = AssetRequest::get(url.clone());
      let url = url.clone();
      async move {
        match fetcher.fetch(&request).await {
          Ok(response) if response.status == 200 => {
            if let Err(e) = store.put(&collection, &url, &response) {
              warn!(url = %url, error = %e, "failed to store optional resource");
            }
          }
          Ok(response) => {
            warn!(url = %url, status = response.status, "optional resource not cached");
          }
          Err(e) => {
            warn!(url = %url, error = %e, "failed to prefetch optional resource");
          }
        }
      }
    }))
    .await;

    Ok(())
  }

  /// Activate this generation: purge every collection whose name differs
  /// from the current one, then start controlling requests immediately.
  pub async fn activate(&self) -> Result<()> {
    self.set_phase(LifecyclePhase::Activating);

    let current = self.cache_name();
    let mut purged = 0usize;
    for name in self.store.list_collections()? {
      if name != current {
        self.store.delete_collection(&name)?;
        purged += 1;
      }
    }

    self.set_phase(LifecyclePhase::Active);
    info!(collection = %current, purged, "cache generation active");
    Ok(())
  }

  /// Serve one request through the gateway.
  ///
  /// GET only: cache hit wins outright (no revalidation, no freshness
  /// check); a miss goes to the network, and a plain same-origin 200 is
  /// copied into the store on the way back. When the network fails
  /// entirely, navigations degrade to the cached root document and
  /// everything else propagates the failure unchanged. Non-GET methods
  /// pass straight through to the network, never stored.
  pub async fn handle_request(&self, request: &AssetRequest) -> Result<AssetResponse> {
    if request.method != Method::Get {
      return self.fetcher.fetch(request).await;
    }

    let collection = self.cache_name();
    if let Some(cached) = self.store.get(&collection, &request.url)? {
      return Ok(cached);
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.is_cacheable() {
          if let Err(e) = self.store.put(&collection, &request.url, &response) {
            warn!(url = %request.url, error = %e, "failed to cache response");
          }
        }
        Ok(response)
      }
      Err(network_err) => {
        if request.mode == RequestMode::Navigate {
          match self.store.get(&collection, &self.manifest.root_document)? {
            Some(fallback) => Ok(fallback),
            None => Err(eyre!(
              "Offline and no cached fallback for root document {}",
              self.manifest.root_document
            )),
          }
        } else {
          Err(network_err)
        }
      }
    }
  }
}

impl<F: AssetFetcher, S: CacheStore> Clone for CacheManager<F, S> {
  fn clone(&self) -> Self {
    Self {
      fetcher: Arc::clone(&self.fetcher),
      store: Arc::clone(&self.store),
      manifest: self.manifest.clone(),
      phase: Arc::clone(&self.phase),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::store::MemoryStore;
  use crate::cache::types::ResponseKind;
  use std::collections::HashMap;

  /// Scripted network: URL -> canned response, anything else fails like an
  /// offline socket. Records every URL it is asked for.
  struct FakeFetcher {
    responses: HashMap<String, AssetResponse>,
    calls: Mutex<Vec<String>>,
  }

  impl FakeFetcher {
    fn new() -> Self {
      Self {
        responses: HashMap::new(),
        calls: Mutex::new(Vec::new()),
      }
    }

    fn with(mut self, url: &str, response: AssetResponse) -> Self {
      self.responses.insert(url.to_string(), response);
      self
    }

    fn calls_to(&self, url: &str) -> usize {
      self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn total_calls(&self) -> usize {
      self.calls.lock().unwrap().len()
    }
  }

  impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
      self.calls.lock().unwrap().push(request.url.clone());
      match self.responses.get(&request.url) {
        Some(response) => Ok(response.clone()),
        None => Err(eyre!("connection refused: {}", request.url)),
      }
    }
  }

  fn basic(status: u16, body: &str) -> AssetResponse {
    AssetResponse {
      status,
      kind: ResponseKind::Basic,
      content_type: Some("text/html".to_string()),
      body: body.as_bytes().to_vec(),
    }
  }

  fn cors(status: u16, body: &str) -> AssetResponse {
    AssetResponse {
      kind: ResponseKind::Cors,
      ..basic(status, body)
    }
  }

  fn manifest(required: &[&str], optional: &[&str]) -> AssetManifest {
    AssetManifest {
      version: "v1".to_string(),
      required: required.iter().map(|s| s.to_string()).collect(),
      optional: optional.iter().map(|s| s.to_string()).collect(),
      root_document: "https://x/index.html".to_string(),
    }
  }

  fn manager(
    fetcher: FakeFetcher,
    manifest: AssetManifest,
  ) -> CacheManager<FakeFetcher, MemoryStore> {
    CacheManager::new(fetcher, MemoryStore::new(), manifest)
  }

  #[tokio::test]
  async fn test_install_stores_every_required_asset() {
    let fetcher = FakeFetcher::new()
      .with("https://x/index.html", basic(200, "<html>"))
      .with("https://x/styles.css", basic(200, "body{}"));
    let mgr = manager(
      fetcher,
      manifest(&["https://x/index.html", "https://x/styles.css"], &[]),
    );

    mgr.install().await.unwrap();

    assert_eq!(mgr.phase(), LifecyclePhase::Installed);
    assert_eq!(mgr.cache_name(), "watchdeck-v1");
    for url in ["https://x/index.html", "https://x/styles.css"] {
      assert!(mgr.store.get("watchdeck-v1", url).unwrap().is_some());
    }
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing_on_missing_asset() {
    // styles.css 404s: nothing from this generation may become reachable.
    let fetcher = FakeFetcher::new()
      .with("https://x/index.html", basic(200, "<html>"))
      .with("https://x/styles.css", basic(404, "not found"));
    let mgr = manager(
      fetcher,
      manifest(&["https://x/index.html", "https://x/styles.css"], &[]),
    );

    let err = mgr.install().await.unwrap_err();
    assert!(err.to_string().contains("https://x/styles.css"));
    assert!(mgr.store.list_collections().unwrap().is_empty());
    assert_eq!(mgr.phase(), LifecyclePhase::Uninstalled);
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing_on_transport_failure() {
    let fetcher = FakeFetcher::new().with("https://x/index.html", basic(200, "<html>"));
    let mgr = manager(
      fetcher,
      manifest(&["https://x/index.html", "https://x/app.js"], &[]),
    );

    assert!(mgr.install().await.is_err());
    assert!(mgr.store.list_collections().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_optional_prefetch_failure_is_nonfatal() {
    let fetcher = FakeFetcher::new().with("https://x/index.html", basic(200, "<html>"));
    let mgr = manager(
      fetcher,
      manifest(&["https://x/index.html"], &["https://cdn/helper.js"]),
    );

    mgr.install().await.unwrap();

    assert_eq!(mgr.phase(), LifecyclePhase::Installed);
    assert!(mgr
      .store
      .get("watchdeck-v1", "https://cdn/helper.js")
      .unwrap()
      .is_none());
  }

  #[tokio::test]
  async fn test_optional_prefetch_success_is_stored() {
    let fetcher = FakeFetcher::new()
      .with("https://x/index.html", basic(200, "<html>"))
      .with("https://cdn/helper.js", cors(200, "fn()"));
    let mgr = manager(
      fetcher,
      manifest(&["https://x/index.html"], &["https://cdn/helper.js"]),
    );

    mgr.install().await.unwrap();

    assert!(mgr
      .store
      .get("watchdeck-v1", "https://cdn/helper.js")
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn test_activate_leaves_exactly_the_current_collection() {
    let fetcher = FakeFetcher::new().with("https://x/index.html", basic(200, "<html>"));
    let mgr = manager(fetcher, manifest(&["https://x/index.html"], &[]));

    // Leftovers from prior generations and unrelated apps.
    mgr.store.put("watchdeck-v0", "https://x/old", &basic(200, "old")).unwrap();
    mgr.store.put("otherapp-v3", "https://y/z", &basic(200, "z")).unwrap();

    mgr.install().await.unwrap();
    mgr.activate().await.unwrap();

    assert_eq!(mgr.store.list_collections().unwrap(), vec!["watchdeck-v1"]);
    assert_eq!(mgr.phase(), LifecyclePhase::Active);
  }

  #[tokio::test]
  async fn test_cached_asset_never_touches_network() {
    let fetcher = FakeFetcher::new().with("https://x/index.html", basic(200, "<html>"));
    let mgr = manager(fetcher, manifest(&["https://x/index.html"], &[]));

    mgr.install().await.unwrap();
    let installs = mgr.fetcher.calls_to("https://x/index.html");

    let got = mgr
      .handle_request(&AssetRequest::get("https://x/index.html"))
      .await
      .unwrap();

    assert_eq!(got.body, b"<html>");
    assert_eq!(mgr.fetcher.calls_to("https://x/index.html"), installs);
  }

  #[tokio::test]
  async fn test_miss_fetches_once_then_serves_from_cache() {
    let fetcher = FakeFetcher::new().with("https://x/extra.css", basic(200, "p{}"));
    let mgr = manager(fetcher, manifest(&[], &[]));

    let request = AssetRequest::get("https://x/extra.css");
    mgr.handle_request(&request).await.unwrap();
    mgr.handle_request(&request).await.unwrap();

    assert_eq!(mgr.fetcher.calls_to("https://x/extra.css"), 1);
  }

  #[tokio::test]
  async fn test_non_cacheable_responses_are_returned_but_not_stored() {
    let fetcher = FakeFetcher::new()
      .with("https://x/missing", basic(404, "gone"))
      .with("https://cdn/font.css", cors(200, "@font-face{}"));
    let mgr = manager(fetcher, manifest(&[], &[]));

    let miss = mgr
      .handle_request(&AssetRequest::get("https://x/missing"))
      .await
      .unwrap();
    assert_eq!(miss.status, 404);

    let cross = mgr
      .handle_request(&AssetRequest::get("https://cdn/font.css"))
      .await
      .unwrap();
    assert_eq!(cross.kind, ResponseKind::Cors);

    // Neither response was stored: both hit the network again.
    mgr.handle_request(&AssetRequest::get("https://x/missing")).await.unwrap();
    mgr.handle_request(&AssetRequest::get("https://cdn/font.css")).await.unwrap();
    assert_eq!(mgr.fetcher.calls_to("https://x/missing"), 2);
    assert_eq!(mgr.fetcher.calls_to("https://cdn/font.css"), 2);
  }

  #[tokio::test]
  async fn test_non_get_bypasses_the_cache_entirely() {
    let fetcher = FakeFetcher::new().with("https://x/api", basic(200, "ok"));
    let mgr = manager(fetcher, manifest(&[], &[]));

    // Prime the same URL in the cache; a POST must still hit the network.
    mgr.store.put("watchdeck-v1", "https://x/api", &basic(200, "stale")).unwrap();

    let request = AssetRequest::get("https://x/api").with_method(Method::Post);
    let got = mgr.handle_request(&request).await.unwrap();

    assert_eq!(got.body, b"ok");
    assert_eq!(mgr.fetcher.calls_to("https://x/api"), 1);
  }

  #[tokio::test]
  async fn test_offline_navigation_falls_back_to_root_document() {
    let fetcher = FakeFetcher::new().with("https://x/index.html", basic(200, "<shell>"));
    let mgr = manager(fetcher, manifest(&["https://x/index.html"], &[]));
    mgr.install().await.unwrap();

    // Navigation to an uncached page while the network is down.
    let got = mgr
      .handle_request(&AssetRequest::navigation("https://x/stats"))
      .await
      .unwrap();

    assert_eq!(got.body, b"<shell>");
  }

  #[tokio::test]
  async fn test_fallback_keeps_the_status_stored_at_install_time() {
    let fetcher = FakeFetcher::new();
    let mgr = manager(fetcher, manifest(&[], &[]));
    mgr
      .store
      .put("watchdeck-v1", "https://x/index.html", &basic(203, "<shell>"))
      .unwrap();

    let got = mgr
      .handle_request(&AssetRequest::navigation("https://x/stats"))
      .await
      .unwrap();

    assert_eq!(got.status, 203);
  }

  #[tokio::test]
  async fn test_offline_navigation_without_root_document_errors_distinctly() {
    let fetcher = FakeFetcher::new();
    let mgr = manager(fetcher, manifest(&[], &[]));

    let err = mgr
      .handle_request(&AssetRequest::navigation("https://x/stats"))
      .await
      .unwrap_err();

    assert!(err.to_string().contains("no cached fallback"));
  }

  #[tokio::test]
  async fn test_offline_subresource_failure_propagates() {
    let fetcher = FakeFetcher::new();
    let mgr = manager(fetcher, manifest(&[], &[]));
    mgr
      .store
      .put("watchdeck-v1", "https://x/index.html", &basic(200, "<shell>"))
      .unwrap();

    let err = mgr
      .handle_request(&AssetRequest::get("https://x/app.js"))
      .await
      .unwrap_err();

    // The original network error, not the navigation fallback.
    assert!(err.to_string().contains("connection refused"));
  }

  #[tokio::test]
  async fn test_total_network_count_for_install() {
    let fetcher = FakeFetcher::new()
      .with("https://x/index.html", basic(200, "<html>"))
      .with("https://x/app.js", basic(200, "js"))
      .with("https://cdn/helper.js", cors(200, "fn()"));
    let mgr = manager(
      fetcher,
      manifest(
        &["https://x/index.html", "https://x/app.js"],
        &["https://cdn/helper.js"],
      ),
    );

    mgr.install().await.unwrap();
    assert_eq!(mgr.fetcher.total_calls(), 3);
  }
}
