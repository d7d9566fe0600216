//! Request classification: a pure function of the request and the route table.

use serde::Deserialize;
use std::collections::BTreeSet;
use url::Url;

use crate::fetch::{FetchRequest, RequestMode};

/// Which handling path a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Backend API call (path-prefixed), network-only, never cached
  Api,
  /// Top-level page navigation
  Navigation,
  /// Static asset by prefix or extension allow-list
  StaticAsset,
  /// Anything else; handled like a static asset
  Other,
}

/// Route table driving classification. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct Routes {
  /// Path prefix reserved for backend calls
  #[serde(default = "default_api_prefix")]
  pub api_prefix: String,
  /// Path prefixes treated as static assets
  #[serde(default = "default_static_prefixes")]
  pub static_prefixes: Vec<String>,
  /// File extensions treated as static assets (case-insensitive)
  #[serde(default = "default_static_extensions", deserialize_with = "deserialize_lowercase_set")]
  pub static_extensions: BTreeSet<String>,
}

impl Default for Routes {
  fn default() -> Self {
    Self {
      api_prefix: default_api_prefix(),
      static_prefixes: default_static_prefixes(),
      static_extensions: default_static_extensions(),
    }
  }
}

fn default_api_prefix() -> String {
  "/api/".to_string()
}

fn default_static_prefixes() -> Vec<String> {
  vec!["/assets/".to_string(), "/static/".to_string()]
}

fn default_static_extensions() -> BTreeSet<String> {
  [
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "json",
    "webp", "map",
  ]
  .iter()
  .map(|s| s.to_string())
  .collect()
}

fn deserialize_lowercase_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(v.into_iter().map(|s| s.to_lowercase()).collect())
}

/// Whether the request targets the gateway's own origin.
/// Cross-origin requests are passed through without interception.
pub fn is_same_origin(req: &FetchRequest, origin: &Url) -> bool {
  req.url.scheme() == origin.scheme()
    && req.url.host_str() == origin.host_str()
    && req.url.port_or_known_default() == origin.port_or_known_default()
}

/// Classify a same-origin request. Precedence: API beats everything
/// (a navigation to an API path is still an API call), then navigation,
/// then static assets.
pub fn classify(req: &FetchRequest, routes: &Routes) -> RequestClass {
  let path = req.url.path();

  if path.starts_with(&routes.api_prefix) {
    return RequestClass::Api;
  }

  if req.mode == RequestMode::Navigate || accepts_html(req) {
    return RequestClass::Navigation;
  }

  if routes.static_prefixes.iter().any(|p| path.starts_with(p)) {
    return RequestClass::StaticAsset;
  }

  if let Some(ext) = path_extension(path) {
    if routes.static_extensions.contains(&ext) {
      return RequestClass::StaticAsset;
    }
  }

  RequestClass::Other
}

fn accepts_html(req: &FetchRequest) -> bool {
  req
    .accept
    .as_deref()
    .is_some_and(|a| a.contains("text/html"))
}

/// Extension of the last path segment, lowercased. None for dotless paths.
fn path_extension(path: &str) -> Option<String> {
  let segment = path.rsplit('/').next()?;
  let (_, ext) = segment.rsplit_once('.')?;
  if ext.is_empty() {
    None
  } else {
    Some(ext.to_lowercase())
  }
}
