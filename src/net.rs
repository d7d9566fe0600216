//! Network seam: the gateway talks to the network through a `Fetcher`.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;

use crate::fetch::{FetchRequest, FetchResponse, Method, ResponseSource};

/// Network access seam.
///
/// `Err` means transport failure (connection refused, DNS, reset, ...).
/// Non-2xx statuses are `Ok` responses: a 404 is a real answer from the
/// server, not an offline condition, and is returned as-is.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, req: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Fetcher backed by a reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
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
    Method::Options => reqwest::Method::OPTIONS,
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, req: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send {
    let client = self.client.clone();
    let method = reqwest_method(req.method);
    let url = req.url.clone();
    let accept = req.accept.clone();

    async move {
      let mut builder = client.request(method, url.clone());
      if let Some(accept) = accept {
        builder = builder.header(reqwest::header::ACCEPT, accept);
      }

      let resp = builder
        .send()
        .await
        .map_err(|e| eyre!("Transport failure for {}: {}", url, e))?;

      let status = resp.status().as_u16();
      let headers = resp
        .headers()
        .iter()
        .filter_map(|(name, value)| {
          value
            .to_str()
            .ok()
            .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

      let body = resp
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read body from {}: {}", url, e))?
        .to_vec();

      Ok(FetchResponse {
        status,
        headers,
        body,
        source: ResponseSource::Network,
      })
    }
  }
}
