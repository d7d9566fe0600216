//! Request and response descriptors for the interception pipeline.

use sha2::{Digest, Sha256};
use url::Url;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
  Patch,
  Options,
}

impl Method {
  /// Parse from a method name, case-insensitive.
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Some(Method::Get),
      "HEAD" => Some(Method::Head),
      "POST" => Some(Method::Post),
      "PUT" => Some(Method::Put),
      "DELETE" => Some(Method::Delete),
      "PATCH" => Some(Method::Patch),
      "OPTIONS" => Some(Method::Options),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
      Method::Patch => "PATCH",
      Method::Options => "OPTIONS",
    }
  }

  /// Whether the method changes server state. Mutating methods never fall
  /// back to the HTML offline shell.
  pub fn is_mutating(&self) -> bool {
    matches!(
      self,
      Method::Post | Method::Put | Method::Delete | Method::Patch
    )
  }
}

/// Request mode, distinguishing page navigations from subresource loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Top-level page navigation
  Navigate,
  /// Everything else (scripts, styles, data fetches, ...)
  Other,
}

/// An intercepted request descriptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
  pub method: Method,
  pub url: Url,
  pub mode: RequestMode,
  /// Accept header, if the caller provided one
  pub accept: Option<String>,
}

impl FetchRequest {
  /// A plain GET subresource request.
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
      mode: RequestMode::Other,
      accept: None,
    }
  }

  /// A top-level navigation request.
  pub fn navigate(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
      mode: RequestMode::Navigate,
      accept: Some("text/html".to_string()),
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
    self.accept = Some(accept.into());
    self
  }

  /// Human-readable request identity: method plus URL without fragment.
  /// Two requests with the same identity hit the same cache entry.
  pub fn identity(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    format!("{} {}", self.method.as_str(), url)
  }

  /// Stable fixed-length cache key derived from the identity.
  pub fn cache_key(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.identity().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// Where a response came from, for logging and callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Live network response
  Network,
  /// Snapshot restored from the cache bucket
  Cache,
  /// The stored offline shell page
  OfflineShell,
  /// Synthesized by the gateway (terminal 503 fallback)
  Synthesized,
}

impl std::fmt::Display for ResponseSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ResponseSource::Network => write!(f, "network"),
      ResponseSource::Cache => write!(f, "cache"),
      ResponseSource::OfflineShell => write!(f, "offline-shell"),
      ResponseSource::Synthesized => write!(f, "synthesized"),
    }
  }
}

/// A response as returned to the caller of the gateway.
#[derive(Debug, Clone)]
pub struct FetchResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
  pub source: ResponseSource,
}

impl FetchResponse {
  /// Synthesized 503 with a machine-readable offline flag, for API callers.
  pub fn offline_json() -> Self {
    Self {
      status: 503,
      headers: vec![("content-type".to_string(), "application/json".to_string())],
      body: br#"{"error":"Offline","offline":true}"#.to_vec(),
      source: ResponseSource::Synthesized,
    }
  }

  /// Synthesized 503 plain-text response, the absolute last resort.
  pub fn offline_text() -> Self {
    Self {
      status: 503,
      headers: vec![("content-type".to_string(), "text/plain".to_string())],
      body: b"Offline".to_vec(),
      source: ResponseSource::Synthesized,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  #[test]
  fn test_identity_strips_fragment() {
    let a = FetchRequest::get(url("https://app.test/page?q=1#top"));
    let b = FetchRequest::get(url("https://app.test/page?q=1#bottom"));
    assert_eq!(a.identity(), b.identity());
    assert_eq!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_identity_distinguishes_method_and_query() {
    let get = FetchRequest::get(url("https://app.test/page"));
    let post = FetchRequest::get(url("https://app.test/page")).with_method(Method::Post);
    let other_query = FetchRequest::get(url("https://app.test/page?q=2"));
    assert_ne!(get.cache_key(), post.cache_key());
    assert_ne!(get.cache_key(), other_query.cache_key());
  }

  #[test]
  fn test_offline_json_is_machine_readable() {
    let resp = FetchResponse::offline_json();
    assert_eq!(resp.status, 503);
    let value: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(value["offline"], serde_json::json!(true));
    assert_eq!(value["error"], serde_json::json!("Offline"));
  }

  #[test]
  fn test_mutating_methods() {
    assert!(Method::Post.is_mutating());
    assert!(Method::Delete.is_mutating());
    assert!(!Method::Get.is_mutating());
    assert!(!Method::Head.is_mutating());
  }
}
