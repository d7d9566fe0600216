//! The offline cache gateway.
//!
//! Intercepts same-origin requests and decides the response source:
//! network, cache bucket, offline shell, or a synthesized 503. Every path
//! has a terminal fallback - `handle` never returns an error.

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::bucket::{BucketStore, ResponseSnapshot};
use crate::classify::{classify, is_same_origin, RequestClass, Routes};
use crate::config::Config;
use crate::fetch::{FetchRequest, FetchResponse, Method, RequestMode, ResponseSource};
use crate::net::Fetcher;

/// Gateway lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
  /// Pre-populating the current bucket; ready to replace a prior instance
  Installing,
  /// Controlling requests; superseded buckets purged
  Active,
  /// Replaced by a newer version; no longer handling requests
  Superseded,
}

/// Control signals from the owning host, outside the interception path.
/// Wire format: `{"type":"SKIP_WAITING"}` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
  /// Promote to Active immediately, fire-and-forget
  SkipWaiting,
  /// Drop every bucket; acknowledged with `Ack`
  ClearCache,
  /// Report the version identifier; answered with `Version`
  GetVersion,
}

/// Replies to control messages that expect one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlReply {
  Ack,
  Version { version: String },
}

/// The gateway itself, generic over the network seam and the bucket store.
pub struct Gateway<F: Fetcher, S: BucketStore> {
  fetcher: F,
  store: Arc<S>,
  origin: Url,
  routes: Routes,
  version: String,
  offline_shell: FetchRequest,
  precache: Vec<Url>,
  timeout: Duration,
  state: RwLock<GatewayState>,
}

impl<F: Fetcher, S: BucketStore> Gateway<F, S> {
  /// Build a gateway from configuration, taking ownership of the store.
  pub fn new(fetcher: F, store: S, config: &Config) -> Result<Self> {
    Self::with_store(fetcher, Arc::new(store), config)
  }

  /// Build a gateway over a shared store.
  pub fn with_store(fetcher: F, store: Arc<S>, config: &Config) -> Result<Self> {
    let origin = Url::parse(&config.origin)?;
    let offline_shell = FetchRequest::get(origin.join(&config.offline_shell)?);
    let precache = config
      .precache
      .iter()
      .map(|p| origin.join(p))
      .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Self {
      fetcher,
      store,
      origin,
      routes: config.routes.clone(),
      version: config.cache_version.clone(),
      offline_shell,
      precache,
      timeout: Duration::from_millis(config.network_timeout_ms),
      state: RwLock::new(GatewayState::Installing),
    })
  }

  /// Name of the bucket for the current cache version.
  pub fn bucket_name(&self) -> String {
    format!("offgate-{}", self.version)
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn state(&self) -> GatewayState {
    match self.state.read() {
      Ok(guard) => *guard,
      Err(poisoned) => *poisoned.into_inner(),
    }
  }

  fn set_state(&self, new_state: GatewayState) {
    let mut guard = match self.state.write() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    *guard = new_state;
  }

  /// Install: open the current bucket and pre-populate it with the critical
  /// asset list. Per-asset failures are logged and non-fatal; the gateway is
  /// ready to replace a prior instance as soon as this returns.
  pub async fn install(&self) -> Result<()> {
    let bucket = self.bucket_name();
    self.store.open_bucket(&bucket)?;
    info!(%bucket, assets = self.precache.len(), "installing");

    for url in &self.precache {
      let req = FetchRequest::get(url.clone());
      match self.fetcher.fetch(&req).await {
        Ok(resp) if resp.status == 200 => {
          self.store_snapshot(&req, &resp);
        }
        Ok(resp) => {
          warn!(%url, status = resp.status, "precache skipped, non-200 response");
        }
        Err(e) => {
          warn!(%url, error = %e, "precache fetch failed");
        }
      }
    }

    Ok(())
  }

  /// Activate: purge every bucket whose name differs from the current
  /// version and take control. Idempotent - re-activating the same version
  /// never deletes the active bucket.
  pub fn activate(&self) -> Result<()> {
    let current = self.bucket_name();
    self.store.open_bucket(&current)?;

    for bucket in self.store.list_buckets()? {
      if bucket != current {
        info!(%bucket, "purging superseded bucket");
        self.store.delete_bucket(&bucket)?;
      }
    }

    self.set_state(GatewayState::Active);
    info!(version = %self.version, "gateway active");
    Ok(())
  }

  /// Mark this instance replaced by a newer version.
  pub fn supersede(&self) {
    self.set_state(GatewayState::Superseded);
    info!(version = %self.version, "gateway superseded");
  }

  /// Intercept one request. Infallible: the worst case is a synthesized
  /// plain-text 503.
  pub async fn handle(&self, req: &FetchRequest) -> FetchResponse {
    if !is_same_origin(req, &self.origin) {
      // Pass through untouched: no caching, no offline shell.
      return match self.fetcher.fetch(req).await {
        Ok(resp) => resp,
        Err(e) => {
          warn!(identity = %req.identity(), error = %e, "cross-origin passthrough failed");
          FetchResponse::offline_text()
        }
      };
    }

    match classify(req, &self.routes) {
      RequestClass::Api => self.handle_api(req).await,
      RequestClass::Navigation => self.handle_navigation(req).await,
      RequestClass::StaticAsset | RequestClass::Other => self.network_first(req).await,
    }
  }

  /// API calls go network-first and are never cached. On transport failure,
  /// mutating methods get a JSON 503; GETs may fall back to the offline
  /// shell so client-side routing keeps working.
  async fn handle_api(&self, req: &FetchRequest) -> FetchResponse {
    match self.fetcher.fetch(req).await {
      Ok(resp) => resp,
      Err(e) => {
        debug!(identity = %req.identity(), error = %e, "api request failed, offline");
        if req.method.is_mutating() {
          FetchResponse::offline_json()
        } else {
          self
            .offline_shell_response()
            .unwrap_or_else(FetchResponse::offline_json)
        }
      }
    }
  }

  /// Navigations: network, caching 200s for repeat loads; on transport
  /// failure serve the matching cached entry, else the offline shell.
  async fn handle_navigation(&self, req: &FetchRequest) -> FetchResponse {
    match self.fetcher.fetch(req).await {
      Ok(resp) => {
        // The bucket is GET-only; a form POST that classifies as a
        // navigation must never be snapshotted and replayed.
        if req.method == Method::Get && resp.status == 200 {
          self.store_snapshot(req, &resp);
        }
        resp
      }
      Err(e) => {
        debug!(identity = %req.identity(), error = %e, "navigation failed, falling back");
        if let Some(cached) = self.lookup(req) {
          return cached;
        }
        self
          .offline_shell_response()
          .unwrap_or_else(FetchResponse::offline_text)
      }
    }
  }

  /// Network-first with a bounded wait. A slow network is treated the same
  /// as a failed one; the loser of the race is dropped, so a late network
  /// response is discarded, never returned.
  async fn network_first(&self, req: &FetchRequest) -> FetchResponse {
    match tokio::time::timeout(self.timeout, self.fetcher.fetch(req)).await {
      Ok(Ok(resp)) => {
        if req.method == Method::Get && resp.status == 200 {
          self.store_snapshot(req, &resp);
        }
        resp
      }
      Ok(Err(e)) => {
        debug!(identity = %req.identity(), error = %e, "network failed, falling back");
        self.fallback(req)
      }
      Err(_elapsed) => {
        debug!(identity = %req.identity(), timeout = ?self.timeout, "network timed out, falling back");
        self.fallback(req)
      }
    }
  }

  /// Terminal fallback chain: cached entry, then (for navigations) the
  /// offline shell, then a synthesized 503.
  fn fallback(&self, req: &FetchRequest) -> FetchResponse {
    if let Some(cached) = self.lookup(req) {
      return cached;
    }

    if req.mode == RequestMode::Navigate {
      if let Some(shell) = self.offline_shell_response() {
        return shell;
      }
    }

    FetchResponse::offline_text()
  }

  /// Look up a request in the current bucket. Store errors are treated as
  /// misses - caching is never a precondition for serving a response.
  fn lookup(&self, req: &FetchRequest) -> Option<FetchResponse> {
    match self.store.get(&self.bucket_name(), &req.cache_key()) {
      Ok(Some(snapshot)) => Some(snapshot.into_response(ResponseSource::Cache)),
      Ok(None) => None,
      Err(e) => {
        warn!(identity = %req.identity(), error = %e, "cache lookup failed");
        None
      }
    }
  }

  fn offline_shell_response(&self) -> Option<FetchResponse> {
    match self
      .store
      .get(&self.bucket_name(), &self.offline_shell.cache_key())
    {
      Ok(Some(snapshot)) => Some(snapshot.into_response(ResponseSource::OfflineShell)),
      Ok(None) => None,
      Err(e) => {
        warn!(error = %e, "offline shell lookup failed");
        None
      }
    }
  }

  /// Best-effort snapshot store; failures are logged and swallowed.
  fn store_snapshot(&self, req: &FetchRequest, resp: &FetchResponse) {
    let snapshot = ResponseSnapshot::capture(resp);
    if let Err(e) = self.store.put(
      &self.bucket_name(),
      &req.cache_key(),
      &req.identity(),
      &snapshot,
    ) {
      warn!(identity = %req.identity(), error = %e, "cache store failed");
    }
  }

  /// Handle a control message. `None` means the message carries no reply
  /// (fire-and-forget).
  pub fn handle_message(&self, msg: &ControlMessage) -> Result<Option<ControlReply>> {
    match msg {
      ControlMessage::SkipWaiting => {
        // No-op once active
        if self.state() != GatewayState::Active {
          self.activate()?;
        }
        Ok(None)
      }
      ControlMessage::ClearCache => {
        self.store.clear_all()?;
        info!("cache cleared");
        Ok(Some(ControlReply::Ack))
      }
      ControlMessage::GetVersion => Ok(Some(ControlReply::Version {
        version: self.version.clone(),
      })),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bucket::SqliteStore;
  use color_eyre::eyre::eyre;
  use std::collections::HashMap;
  use std::future::Future;
  use std::sync::Mutex;

  #[derive(Debug, Clone)]
  enum Outcome {
    Respond(u16, &'static [u8]),
    Fail,
    Slow(Duration, u16, &'static [u8]),
  }

  /// Scripted fetcher: each URL maps to a fixed outcome; unknown URLs fail
  /// like a dead network.
  #[derive(Clone, Default)]
  struct FakeFetcher {
    outcomes: Arc<Mutex<HashMap<String, Outcome>>>,
  }

  impl FakeFetcher {
    fn set(&self, url: &str, outcome: Outcome) {
      self.outcomes.lock().unwrap().insert(url.to_string(), outcome);
    }

    fn clear(&self) {
      self.outcomes.lock().unwrap().clear();
    }
  }

  impl Fetcher for FakeFetcher {
    fn fetch(&self, req: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send {
      let outcome = self.outcomes.lock().unwrap().get(req.url.as_str()).cloned();
      async move {
        match outcome {
          Some(Outcome::Respond(status, body)) => Ok(resp(status, body)),
          Some(Outcome::Slow(delay, status, body)) => {
            tokio::time::sleep(delay).await;
            Ok(resp(status, body))
          }
          Some(Outcome::Fail) | None => Err(eyre!("connection refused")),
        }
      }
    }
  }

  fn resp(status: u16, body: &[u8]) -> FetchResponse {
    FetchResponse {
      status,
      headers: vec![("content-type".to_string(), "text/html".to_string())],
      body: body.to_vec(),
      source: ResponseSource::Network,
    }
  }

  fn test_config() -> Config {
    Config {
      origin: "https://app.test".to_string(),
      cache_version: "v1".to_string(),
      offline_shell: "/index.html".to_string(),
      precache: vec!["/index.html".to_string()],
      network_timeout_ms: 100,
      routes: Routes::default(),
      cache_path: None,
    }
  }

  fn gateway(fetcher: FakeFetcher) -> Gateway<FakeFetcher, SqliteStore> {
    Gateway::new(fetcher, SqliteStore::open_in_memory().unwrap(), &test_config()).unwrap()
  }

  /// Gateway with the offline shell already installed.
  async fn installed_gateway(fetcher: FakeFetcher) -> Gateway<FakeFetcher, SqliteStore> {
    fetcher.set("https://app.test/index.html", Outcome::Respond(200, b"<shell>"));
    let gw = gateway(fetcher.clone());
    gw.install().await.unwrap();
    gw.activate().unwrap();
    fetcher.clear();
    gw
  }

  fn get(url: &str) -> FetchRequest {
    FetchRequest::get(Url::parse(url).unwrap())
  }

  fn nav(url: &str) -> FetchRequest {
    FetchRequest::navigate(Url::parse(url).unwrap())
  }

  #[tokio::test]
  async fn test_cross_origin_passes_through() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://ads.example/pixel.js", Outcome::Respond(200, b"px"));
    let ok = gw.handle(&get("https://ads.example/pixel.js")).await;
    assert_eq!(ok.status, 200);
    assert_eq!(ok.source, ResponseSource::Network);

    // Failure never reaches the shell or the cache fallback chain.
    fetcher.set("https://ads.example/pixel.js", Outcome::Fail);
    let failed = gw.handle(&get("https://ads.example/pixel.js")).await;
    assert_eq!(failed.status, 503);
    assert_eq!(failed.source, ResponseSource::Synthesized);
    assert_ne!(failed.body, b"<shell>");
  }

  #[tokio::test]
  async fn test_api_get_offline_serves_shell() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    // Network down for the API
    let resp = gw.handle(&get("https://app.test/api/data")).await;
    assert_eq!(resp.source, ResponseSource::OfflineShell);
    assert_eq!(resp.body, b"<shell>");
  }

  #[tokio::test]
  async fn test_api_get_offline_without_shell_is_json_503() {
    let gw = gateway(FakeFetcher::default());
    gw.activate().unwrap();

    let resp = gw.handle(&get("https://app.test/api/data")).await;
    assert_eq!(resp.status, 503);
    let value: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(value["offline"], serde_json::json!(true));
  }

  #[tokio::test]
  async fn test_api_mutation_offline_is_json_never_shell() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    for method in [Method::Post, Method::Put, Method::Delete] {
      let req = get("https://app.test/api/save").with_method(method);
      let resp = gw.handle(&req).await;
      assert_eq!(resp.status, 503);
      let value: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
      assert_eq!(value["offline"], serde_json::json!(true));
    }
  }

  #[tokio::test]
  async fn test_api_responses_are_never_cached() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://app.test/api/data", Outcome::Respond(200, b"live"));
    let live = gw.handle(&get("https://app.test/api/data")).await;
    assert_eq!(live.body, b"live");

    // Once the network drops, the earlier body must not come back.
    fetcher.set("https://app.test/api/data", Outcome::Fail);
    let offline = gw.handle(&get("https://app.test/api/data")).await;
    assert_ne!(offline.body, b"live");
    assert_eq!(offline.source, ResponseSource::OfflineShell);
  }

  #[tokio::test]
  async fn test_static_asset_cached_and_served_offline() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://app.test/assets/app.js", Outcome::Respond(200, b"js"));
    let first = gw.handle(&get("https://app.test/assets/app.js")).await;
    assert_eq!(first.source, ResponseSource::Network);

    fetcher.set("https://app.test/assets/app.js", Outcome::Fail);
    let second = gw.handle(&get("https://app.test/assets/app.js")).await;
    assert_eq!(second.status, 200);
    assert_eq!(second.body, b"js");
    assert_eq!(second.source, ResponseSource::Cache);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout_with_cold_cache_is_plain_503() {
    let fetcher = FakeFetcher::default();
    let gw = gateway(fetcher.clone());
    gw.activate().unwrap();

    // Network answers well past the 100ms window; the late response is
    // dropped with the race loser. Paused clock keeps the race
    // deterministic.
    fetcher.set(
      "https://app.test/assets/app.js",
      Outcome::Slow(Duration::from_millis(400), 200, b"late"),
    );
    let resp = gw.handle(&get("https://app.test/assets/app.js")).await;
    assert_eq!(resp.status, 503);
    assert_eq!(resp.body, b"Offline");
    assert_eq!(resp.source, ResponseSource::Synthesized);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout_with_warm_cache_serves_snapshot() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://app.test/assets/app.js", Outcome::Respond(200, b"v1"));
    gw.handle(&get("https://app.test/assets/app.js")).await;

    fetcher.set(
      "https://app.test/assets/app.js",
      Outcome::Slow(Duration::from_millis(400), 200, b"v2"),
    );
    let resp = gw.handle(&get("https://app.test/assets/app.js")).await;
    assert_eq!(resp.body, b"v1");
    assert_eq!(resp.source, ResponseSource::Cache);
  }

  #[tokio::test]
  async fn test_non_200_static_response_returned_as_is() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://app.test/assets/gone.js", Outcome::Respond(404, b"nope"));
    let resp = gw.handle(&get("https://app.test/assets/gone.js")).await;
    assert_eq!(resp.status, 404);

    // And the 404 was not cached as a snapshot.
    fetcher.set("https://app.test/assets/gone.js", Outcome::Fail);
    let offline = gw.handle(&get("https://app.test/assets/gone.js")).await;
    assert_eq!(offline.status, 503);
  }

  #[tokio::test]
  async fn test_navigation_200_is_returned_and_cloned_into_bucket() {
    let fetcher = FakeFetcher::default();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let gw = Gateway::with_store(fetcher.clone(), Arc::clone(&store), &test_config()).unwrap();
    gw.activate().unwrap();

    fetcher.set("https://app.test/dashboard", Outcome::Respond(200, b"<page>"));
    let req = nav("https://app.test/dashboard");
    let resp = gw.handle(&req).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"<page>");

    let stored = store.get(&gw.bucket_name(), &req.cache_key()).unwrap();
    assert_eq!(stored.unwrap().body, b"<page>");
  }

  #[tokio::test]
  async fn test_navigation_offline_prefers_own_entry_then_shell() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    // Cached navigation comes back verbatim
    fetcher.set("https://app.test/dashboard", Outcome::Respond(200, b"<page>"));
    gw.handle(&nav("https://app.test/dashboard")).await;
    fetcher.clear();
    let cached = gw.handle(&nav("https://app.test/dashboard")).await;
    assert_eq!(cached.body, b"<page>");
    assert_eq!(cached.source, ResponseSource::Cache);

    // Never-visited page falls back to the shell
    let shell = gw.handle(&nav("https://app.test/pricing")).await;
    assert_eq!(shell.body, b"<shell>");
    assert_eq!(shell.source, ResponseSource::OfflineShell);
  }

  #[tokio::test]
  async fn test_navigation_mutation_response_never_replayed() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    // A form POST with an HTML accept header classifies as a navigation.
    let req = nav("https://app.test/form").with_method(Method::Post);
    fetcher.set("https://app.test/form", Outcome::Respond(200, b"<receipt>"));
    let live = gw.handle(&req).await;
    assert_eq!(live.status, 200);
    assert_eq!(live.body, b"<receipt>");

    // Offline, the receipt must not come back from the bucket; the
    // fallback chain ends at the shell.
    fetcher.clear();
    let offline = gw.handle(&req).await;
    assert_ne!(offline.source, ResponseSource::Cache);
    assert_eq!(offline.source, ResponseSource::OfflineShell);
    assert_eq!(offline.body, b"<shell>");
  }

  #[tokio::test]
  async fn test_activate_is_idempotent_for_current_version() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    fetcher.set("https://app.test/assets/app.js", Outcome::Respond(200, b"js"));
    gw.handle(&get("https://app.test/assets/app.js")).await;
    fetcher.clear();

    // Re-activating the same version must not purge the active bucket.
    gw.activate().unwrap();
    let resp = gw.handle(&get("https://app.test/assets/app.js")).await;
    assert_eq!(resp.body, b"js");
    assert_eq!(resp.source, ResponseSource::Cache);
  }

  #[tokio::test]
  async fn test_activate_purges_superseded_buckets() {
    let fetcher = FakeFetcher::default();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let v1 = Gateway::with_store(fetcher.clone(), Arc::clone(&store), &test_config()).unwrap();
    v1.activate().unwrap();
    fetcher.set("https://app.test/assets/app.js", Outcome::Respond(200, b"js"));
    v1.handle(&get("https://app.test/assets/app.js")).await;

    let config_v2 = Config {
      cache_version: "v2".to_string(),
      ..test_config()
    };
    let v2 = Gateway::with_store(fetcher.clone(), Arc::clone(&store), &config_v2).unwrap();
    v2.activate().unwrap();

    assert_eq!(store.list_buckets().unwrap(), vec!["offgate-v2"]);
    assert_eq!(v2.state(), GatewayState::Active);
  }

  #[tokio::test]
  async fn test_install_precache_failures_are_non_fatal() {
    let fetcher = FakeFetcher::default();
    fetcher.set("https://app.test/index.html", Outcome::Respond(200, b"<shell>"));
    // /assets/app.js is in the precache list but unreachable
    let config = Config {
      precache: vec!["/index.html".to_string(), "/assets/app.js".to_string()],
      ..test_config()
    };
    let gw = Gateway::new(fetcher.clone(), SqliteStore::open_in_memory().unwrap(), &config)
      .unwrap();

    gw.install().await.unwrap();
    gw.activate().unwrap();
    fetcher.clear();

    // The shell made it in despite the failed asset.
    let resp = gw.handle(&nav("https://app.test/anywhere")).await;
    assert_eq!(resp.body, b"<shell>");
  }

  #[tokio::test]
  async fn test_skip_waiting_activates() {
    let gw = gateway(FakeFetcher::default());
    assert_eq!(gw.state(), GatewayState::Installing);

    let reply = gw.handle_message(&ControlMessage::SkipWaiting).unwrap();
    assert!(reply.is_none());
    assert_eq!(gw.state(), GatewayState::Active);
  }

  #[tokio::test]
  async fn test_clear_cache_acks_and_empties() {
    let fetcher = FakeFetcher::default();
    let gw = installed_gateway(fetcher.clone()).await;

    let reply = gw.handle_message(&ControlMessage::ClearCache).unwrap();
    assert_eq!(reply, Some(ControlReply::Ack));

    // Shell is gone; a dead-network navigation now synthesizes.
    let resp = gw.handle(&nav("https://app.test/anywhere")).await;
    assert_eq!(resp.status, 503);
    assert_eq!(resp.source, ResponseSource::Synthesized);
  }

  #[tokio::test]
  async fn test_get_version_reports_identifier() {
    let gw = gateway(FakeFetcher::default());
    let reply = gw.handle_message(&ControlMessage::GetVersion).unwrap();
    assert_eq!(
      reply,
      Some(ControlReply::Version {
        version: "v1".to_string()
      })
    );
  }

  #[test]
  fn test_control_message_wire_format() {
    let msg: ControlMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
    assert_eq!(msg, ControlMessage::SkipWaiting);

    let msg: ControlMessage = serde_json::from_str(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
    assert_eq!(msg, ControlMessage::ClearCache);

    let reply = serde_json::to_string(&ControlReply::Version {
      version: "v1".to_string(),
    })
    .unwrap();
    assert_eq!(reply, r#"{"type":"VERSION","version":"v1"}"#);
  }
}
