//! Service wrapper with explicit start/stop hooks.
//!
//! The gateway is owned by a spawned task and driven by events over a
//! channel: one named event per signal kind, each answered through a oneshot
//! the sender awaits. In-flight requests are independent of each other - a
//! slow fetch never blocks the next one.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::bucket::BucketStore;
use crate::fetch::{FetchRequest, FetchResponse};
use crate::gateway::{ControlMessage, ControlReply, Gateway};
use crate::net::Fetcher;

/// Events consumed by the service loop.
enum GatewayEvent {
  Fetch {
    req: FetchRequest,
    reply: oneshot::Sender<FetchResponse>,
  },
  Message {
    msg: ControlMessage,
    reply: oneshot::Sender<Option<ControlReply>>,
  },
  Shutdown,
}

/// Handle to a running gateway service.
pub struct GatewayHandle {
  tx: mpsc::UnboundedSender<GatewayEvent>,
  task: JoinHandle<()>,
}

impl GatewayHandle {
  /// Run one request through the gateway.
  pub async fn fetch(&self, req: FetchRequest) -> Result<FetchResponse> {
    let (reply, rx) = oneshot::channel();
    self
      .tx
      .send(GatewayEvent::Fetch { req, reply })
      .map_err(|_| eyre!("Gateway service stopped"))?;
    rx.await.map_err(|_| eyre!("Gateway dropped the request"))
  }

  /// Send a control message and wait for its reply, if it carries one.
  pub async fn message(&self, msg: ControlMessage) -> Result<Option<ControlReply>> {
    let (reply, rx) = oneshot::channel();
    self
      .tx
      .send(GatewayEvent::Message { msg, reply })
      .map_err(|_| eyre!("Gateway service stopped"))?;
    rx.await.map_err(|_| eyre!("Gateway dropped the message"))
  }

  /// Stop the service. The gateway instance is marked superseded.
  pub async fn stop(self) -> Result<()> {
    let _ = self.tx.send(GatewayEvent::Shutdown);
    self
      .task
      .await
      .map_err(|e| eyre!("Gateway service panicked: {}", e))
  }
}

/// Start the service loop for a gateway.
pub fn start<F, S>(gateway: Arc<Gateway<F, S>>) -> GatewayHandle
where
  F: Fetcher + 'static,
  S: BucketStore + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel();

  let task = tokio::spawn(async move {
    while let Some(event) = rx.recv().await {
      match event {
        GatewayEvent::Fetch { req, reply } => {
          // Each request runs independently; ordering between concurrent
          // requests is not guaranteed.
          let gateway = Arc::clone(&gateway);
          tokio::spawn(async move {
            let resp = gateway.handle(&req).await;
            let _ = reply.send(resp);
          });
        }
        GatewayEvent::Message { msg, reply } => match gateway.handle_message(&msg) {
          Ok(result) => {
            let _ = reply.send(result);
          }
          Err(e) => {
            warn!(?msg, error = %e, "control message failed");
            let _ = reply.send(None);
          }
        },
        GatewayEvent::Shutdown => break,
      }
    }
    gateway.supersede();
  });

  GatewayHandle { tx, task }
}
