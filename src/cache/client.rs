//! Network fetch seam and the reqwest-backed implementation.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use url::Url;

use super::types::{AssetRequest, AssetResponse, Method, ResponseKind};

/// Trait for fetching a request from the live network.
///
/// The gateway and the install/prefetch phases go through this seam so tests
/// can substitute a scripted network.
pub trait AssetFetcher: Send + Sync {
  fn fetch(&self, request: &AssetRequest) -> impl Future<Output = Result<AssetResponse>> + Send;
}

/// HTTP fetcher over a shared reqwest client.
///
/// Responses are classified `Basic` when the request URL shares the asset
/// base's origin, `Cors` otherwise; reqwest reads every body, so `Opaque`
/// never occurs here.
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: url::Origin,
}

impl HttpFetcher {
  pub fn new(base: &Url) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("watchdeck/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      origin: base.origin(),
    })
  }
}

fn reqwest_method(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Head => reqwest::Method::HEAD,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Delete => reqwest::Method::DELETE,
    Method::Patch => reqwest::Method::PATCH,
  }
}

impl AssetFetcher for HttpFetcher {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
    let url = Url::parse(&request.url)
      .map_err(|e| eyre!("Invalid request URL {}: {}", request.url, e))?;

    let kind = if url.origin() == self.origin {
      ResponseKind::Basic
    } else {
      ResponseKind::Cors
    };

    let response = self
      .client
      .request(reqwest_method(request.method), url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", request.url, e))?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?
      .to_vec();

    Ok(AssetResponse {
      status,
      kind,
      content_type,
      body,
    })
  }
}
