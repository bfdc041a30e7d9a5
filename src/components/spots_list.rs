// src/components/spots_list.rs
use log::error;
use tokio::sync::broadcast;

use crate::components::api_client::{ApiClient, ClientError, ListOutcome};
use crate::components::signals::{drain, SignalHub, UiSignal};
use crate::dtos::error_dtos::ErrorBody;
use crate::models::spot::Spot;

/// Lifecycle of the feed. `Degraded` means the last fetch failed and the
/// empty list on screen is a fallback, not the truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Fetching,
    Rendered,
    Empty,
    Degraded,
}

/// Headless sidebar feed: the flat spot list in server order, refreshed on
/// mount and whenever a change signal arrives.
pub struct SpotsFeed {
    api: ApiClient,
    signals: broadcast::Receiver<UiSignal>,
    pub spots: Vec<Spot>,
    pub phase: FeedPhase,
    pub last_error: Option<ErrorBody>,
}

impl SpotsFeed {
    pub fn new(api: ApiClient, hub: &SignalHub) -> Self {
        Self {
            api,
            signals: hub.subscribe(),
            spots: Vec::new(),
            phase: FeedPhase::Idle,
            last_error: None,
        }
    }

    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Trusts server ordering; no client-side sort, no pagination.
    pub async fn refresh(&mut self) {
        self.phase = FeedPhase::Fetching;
        match self.api.list_spots().await {
            Ok(ListOutcome::Items(spots)) => {
                self.phase = if spots.is_empty() {
                    FeedPhase::Empty
                } else {
                    FeedPhase::Rendered
                };
                self.spots = spots;
                self.last_error = None;
            }
            Ok(ListOutcome::Failed(envelope)) => {
                error!(
                    "spots feed fetch failed: {} ({})",
                    envelope.error,
                    envelope.detail.as_deref().unwrap_or("")
                );
                self.degrade(envelope);
            }
            Err(e) => {
                error!("spots feed fetch failed: {}", e);
                let envelope = match e {
                    ClientError::Rejected(envelope) => envelope,
                    ClientError::Http(e) => ErrorBody::unexpected(e.to_string()),
                };
                self.degrade(envelope);
            }
        }
    }

    fn degrade(&mut self, envelope: ErrorBody) {
        self.spots.clear();
        self.last_error = Some(envelope);
        self.phase = FeedPhase::Degraded;
    }

    /// Apply pending signals; any number of change notifications collapses
    /// into a single refetch.
    pub async fn process_signals(&mut self) {
        let (signals, lagged) = drain(&mut self.signals);
        let changed = lagged
            || signals
                .iter()
                .any(|signal| matches!(signal, UiSignal::SpotsChanged));
        if changed {
            self.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
    }

    #[tokio::test]
    async fn empty_store_renders_empty_not_degraded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/spots"))
            .respond_with(listing("[]"))
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut feed = SpotsFeed::new(ApiClient::new(server.uri()), &hub);
        feed.mount().await;

        assert_eq!(feed.phase, FeedPhase::Empty);
        assert!(feed.spots.is_empty());
        assert!(feed.last_error.is_none());
    }

    #[tokio::test]
    async fn listed_spots_keep_server_order() {
        let server = MockServer::start().await;
        let body = r#"[
            {"id":"7a4f2c6e-1111-4222-8333-944455566677","user_id":null,
             "title":"newest","body":null,"latitude":1.0,"longitude":2.0,
             "created_at":"2026-08-22T10:00:00+00:00","images":[]},
            {"id":"7a4f2c6e-2222-4222-8333-944455566677","user_id":null,
             "title":"older","body":null,"latitude":3.0,"longitude":4.0,
             "created_at":"2026-08-21T10:00:00+00:00","images":[]}
        ]"#;
        Mock::given(method("GET"))
            .and(path("/api/spots"))
            .respond_with(listing(body))
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut feed = SpotsFeed::new(ApiClient::new(server.uri()), &hub);
        feed.mount().await;

        assert_eq!(feed.phase, FeedPhase::Rendered);
        let titles: Vec<&str> = feed.spots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "older"]);
    }

    #[tokio::test]
    async fn html_body_degrades_with_structured_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/spots"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_raw("<html><h1>Internal error</h1></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut feed = SpotsFeed::new(ApiClient::new(server.uri()), &hub);
        feed.mount().await;

        assert_eq!(feed.phase, FeedPhase::Degraded);
        assert!(feed.spots.is_empty());
        let envelope = feed.last_error.expect("degraded feed keeps the envelope");
        assert_eq!(envelope.error, "supabase_error");
    }

    #[tokio::test]
    async fn change_signal_burst_refetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/spots"))
            .respond_with(listing("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut feed = SpotsFeed::new(ApiClient::new(server.uri()), &hub);

        hub.emit(UiSignal::SpotsChanged);
        hub.emit(UiSignal::ComposerOpened);
        hub.emit(UiSignal::SpotsChanged);
        hub.emit(UiSignal::SpotsChanged);
        feed.process_signals().await;

        server.verify().await;
        assert_eq!(feed.phase, FeedPhase::Empty);
    }

    #[tokio::test]
    async fn unrelated_signals_do_not_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/spots"))
            .respond_with(listing("[]"))
            .expect(0)
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut feed = SpotsFeed::new(ApiClient::new(server.uri()), &hub);

        hub.emit(UiSignal::ComposerOpened);
        hub.emit(UiSignal::CompositionCancelled);
        feed.process_signals().await;

        server.verify().await;
        assert_eq!(feed.phase, FeedPhase::Idle);
    }
}
