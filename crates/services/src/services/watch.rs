//! Background freshness for the traveler's received-proposals view.
//!
//! Prefers the server's event stream; when the stream is unavailable or
//! drops, falls back to fixed-interval polling. Every refresh invalidates
//! the requests cache, refetches the viewer's requests and publishes the
//! snapshot on a watch channel. Dropping the handle cancels the task.

use std::time::Duration;

use api::{ApiClient, ApiError, Family, models::request::TravelRequest};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const STREAM_PATH: &str = "/document/requests/stream";

pub struct ReceivedWatch {
    rx: watch::Receiver<Vec<TravelRequest>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ReceivedWatch {
    /// Spawn the watcher on the current runtime.
    pub fn spawn(api: ApiClient, poll_interval: Duration) -> Self {
        let (tx, rx) = watch::channel(Vec::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(api, poll_interval, tx, cancel.clone()));
        Self {
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Channel of full request snapshots; the latest value wins.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TravelRequest>> {
        self.rx.clone()
    }

    /// Cancel the watcher and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ReceivedWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    api: ApiClient,
    poll_interval: Duration,
    tx: watch::Sender<Vec<TravelRequest>>,
    cancel: CancellationToken,
) {
    info!(poll_interval = ?poll_interval, "starting received-view watcher");

    match follow_event_stream(&api, &tx, &cancel).await {
        Ok(()) => {}
        Err(e) => {
            debug!("event stream unavailable ({e}), polling every {poll_interval:?}");
            poll(&api, poll_interval, &tx, &cancel).await;
        }
    }
}

/// Consume the push channel until cancelled. Any stream failure is returned
/// so the caller can fall back to polling.
async fn follow_event_stream(
    api: &ApiClient,
    tx: &watch::Sender<Vec<TravelRequest>>,
    cancel: &CancellationToken,
) -> Result<(), ApiError> {
    let response = api.stream(STREAM_PATH).await?;
    let mut events = response.bytes_stream().eventsource();

    if let Err(e) = refresh(api, tx).await {
        warn!("initial received-view fetch failed: {e}");
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = events.next() => match next {
                Some(Ok(_event)) => {
                    if let Err(e) = refresh(api, tx).await {
                        warn!("received-view refresh failed: {e}");
                    }
                }
                Some(Err(e)) => return Err(ApiError::Transport(e.to_string())),
                None => return Err(ApiError::Transport("event stream closed".to_string())),
            },
        }
    }
}

async fn poll(
    api: &ApiClient,
    poll_interval: Duration,
    tx: &watch::Sender<Vec<TravelRequest>>,
    cancel: &CancellationToken,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(e) = refresh(api, tx).await {
                    // Keep the previous snapshot; the next tick tries again.
                    warn!("received-view refresh failed: {e}");
                }
            }
        }
    }
}

async fn refresh(
    api: &ApiClient,
    tx: &watch::Sender<Vec<TravelRequest>>,
) -> Result<(), ApiError> {
    api.invalidate(Family::Requests);
    let requests = TravelRequest::list_mine(api).await?;
    tx.send_replace(requests);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use api::TokenStore;
    use url::Url;

    use super::*;

    #[tokio::test]
    async fn shutdown_cancels_the_background_task() {
        let api = ApiClient::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Arc::new(TokenStore::in_memory()),
        )
        .unwrap();

        let watcher = ReceivedWatch::spawn(api, Duration::from_millis(10));
        let rx = watcher.subscribe();
        assert!(rx.borrow().is_empty());

        watcher.shutdown().await;
    }
}
