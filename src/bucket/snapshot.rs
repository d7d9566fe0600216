//! Stored response snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetch::{FetchResponse, ResponseSource};

/// A response captured into the cache bucket: status, headers, body and
/// the capture time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
  pub stored_at: DateTime<Utc>,
}

impl ResponseSnapshot {
  /// Capture a snapshot of a response, timestamped now.
  pub fn capture(resp: &FetchResponse) -> Self {
    Self {
      status: resp.status,
      headers: resp.headers.clone(),
      body: resp.body.clone(),
      stored_at: Utc::now(),
    }
  }

  /// Restore the snapshot as a servable response.
  pub fn into_response(self, source: ResponseSource) -> FetchResponse {
    FetchResponse {
      status: self.status,
      headers: self.headers,
      body: self.body,
      source,
    }
  }
}
