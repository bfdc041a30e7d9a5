// src/components/composer.rs
use log::warn;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::components::api_client::{ApiClient, ClientError, ImageUpload};
use crate::components::signals::{drain, SignalHub, UiSignal};
use crate::dtos::spot_dtos::{validate_new_spot, NewSpotRequest};
use crate::models::spot::Spot;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Everything the user has typed so far. Coordinates arrive from the map
/// via [`UiSignal::CoordinateSelected`], not from typing.
#[derive(Debug, Default, Clone)]
pub struct SpotDraft {
    pub title: String,
    pub body: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image: Option<ImageUpload>,
}

/// Headless submission flow behind the compose dialog: gathers a draft,
/// validates before any network call, submits, and announces the result.
pub struct SpotComposer {
    api: ApiClient,
    hub: SignalHub,
    signals: broadcast::Receiver<UiSignal>,
    session_token: Option<String>,
    pub draft: SpotDraft,
    pub open: bool,
    pub error: Option<String>,
}

impl SpotComposer {
    pub fn new(api: ApiClient, hub: &SignalHub) -> Self {
        Self {
            api,
            hub: hub.clone(),
            signals: hub.subscribe(),
            session_token: None,
            draft: SpotDraft::default(),
            open: false,
            error: None,
        }
    }

    pub fn set_session_token(&mut self, token: Option<String>) {
        self.session_token = token;
    }

    /// Compose control pressed. The dialog itself stays closed until the map
    /// reports a coordinate; this only arms the map's placement click.
    pub fn request_compose(&self) {
        self.hub.emit(UiSignal::ComposerOpened);
    }

    /// Pick up pending signals: a selected coordinate fills the draft and
    /// opens the dialog.
    pub fn process_signals(&mut self) {
        let (signals, _) = drain(&mut self.signals);
        for signal in signals {
            if let UiSignal::CoordinateSelected {
                latitude,
                longitude,
            } = signal
            {
                self.draft.latitude = Some(latitude);
                self.draft.longitude = Some(longitude);
                self.open = true;
            }
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.draft.body = body.into();
    }

    pub fn attach_image(&mut self, image: ImageUpload) {
        self.draft.image = Some(image);
    }

    /// Dismiss without submitting: the dialog closes, the draft is thrown
    /// away, and the map is told to drop its transient pin.
    pub fn cancel(&mut self) {
        self.draft = SpotDraft::default();
        self.open = false;
        self.error = None;
        self.hub.emit(UiSignal::CompositionCancelled);
    }

    /// Submit the draft. On success the input state is cleared, the dialog
    /// closes and `SpotsChanged` goes out; on failure the draft stays put
    /// for retry and `error` holds the user-facing message.
    pub async fn submit(&mut self) -> Result<Spot, ComposerError> {
        let body = Some(self.draft.body.as_str()).filter(|b| !b.trim().is_empty());
        let validated = match validate_new_spot(
            Some(self.draft.title.as_str()),
            body,
            self.draft.latitude,
            self.draft.longitude,
        ) {
            Ok(v) => v,
            Err(msg) => {
                self.error = Some(msg.clone());
                return Err(ComposerError::Validation(msg));
            }
        };

        // No image and a session: plain JSON is enough. Otherwise the
        // multipart form carries the bytes and keeps anonymous submission
        // possible.
        let token = self.session_token.as_deref();
        let result = if self.draft.image.is_none() && token.is_some() {
            let request = NewSpotRequest {
                title: Some(validated.title.clone()),
                body: validated.body.clone(),
                latitude: Some(validated.latitude),
                longitude: Some(validated.longitude),
                images: None,
            };
            self.api.create_spot(token, &request).await
        } else {
            self.api
                .create_spot_multipart(token, &validated, self.draft.image.as_ref())
                .await
        };

        match result {
            Ok(spot) => {
                self.draft = SpotDraft::default();
                self.open = false;
                self.error = None;
                self.hub.emit(UiSignal::SpotsChanged);
                Ok(spot)
            }
            Err(e) => {
                warn!("spot submission failed: {}", e);
                self.error = Some(e.to_string());
                Err(ComposerError::Client(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> (SpotComposer, SignalHub) {
        let hub = SignalHub::new();
        let api = ApiClient::new("http://127.0.0.1:9");
        (SpotComposer::new(api, &hub), hub)
    }

    #[test]
    fn coordinate_signal_fills_draft_and_opens() {
        let (mut composer, hub) = composer();
        assert!(!composer.open);

        hub.emit(UiSignal::CoordinateSelected {
            latitude: 35.6812,
            longitude: 139.7671,
        });
        composer.process_signals();

        assert!(composer.open);
        assert_eq!(composer.draft.latitude, Some(35.6812));
        assert_eq!(composer.draft.longitude, Some(139.7671));
    }

    #[tokio::test]
    async fn submit_without_coordinates_fails_before_any_request() {
        // The API target is a closed port; reaching the network would error
        // differently than the validation failure asserted here.
        let (mut composer, _hub) = composer();
        composer.set_title("Bench");

        let err = composer.submit().await.unwrap_err();
        assert!(matches!(err, ComposerError::Validation(_)));
        assert_eq!(composer.draft.title, "Bench");
        assert!(composer.error.is_some());
    }

    #[test]
    fn cancel_clears_draft_and_signals_map() {
        let (mut composer, hub) = composer();
        let mut rx = hub.subscribe();
        composer.set_title("Bench");
        composer.open = true;

        composer.cancel();

        assert!(!composer.open);
        assert!(composer.draft.title.is_empty());
        let (signals, _) = drain(&mut rx);
        assert_eq!(signals, vec![UiSignal::CompositionCancelled]);
    }

    #[tokio::test]
    async fn successful_submit_clears_closes_and_announces() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let created = r#"{
            "id": "7a4f2c6e-1111-4222-8333-944455566677",
            "user_id": null,
            "title": "Bench",
            "body": "Nice spot",
            "latitude": 35.6812,
            "longitude": 139.7671,
            "created_at": "2026-08-22T09:00:00+00:00",
            "images": []
        }"#;
        Mock::given(method("POST"))
            .and(path("/api/spots"))
            .respond_with(ResponseTemplate::new(201).set_body_raw(created, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut rx = hub.subscribe();
        let mut composer = SpotComposer::new(ApiClient::new(server.uri()), &hub);
        composer.set_title("Bench");
        composer.set_body("Nice spot");
        composer.draft.latitude = Some(35.6812);
        composer.draft.longitude = Some(139.7671);
        composer.open = true;

        let spot = composer.submit().await.unwrap();
        assert_eq!(spot.title, "Bench");
        assert!(composer.draft.title.is_empty());
        assert!(!composer.open);
        assert!(composer.error.is_none());
        let (signals, _) = drain(&mut rx);
        assert!(signals.contains(&UiSignal::SpotsChanged));
    }

    #[tokio::test]
    async fn failed_submit_keeps_draft_for_retry() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let envelope = r#"{"error":"supabase_error","detail":"upstream down"}"#;
        Mock::given(method("POST"))
            .and(path("/api/spots"))
            .respond_with(ResponseTemplate::new(502).set_body_raw(envelope, "application/json"))
            .mount(&server)
            .await;

        let hub = SignalHub::new();
        let mut rx = hub.subscribe();
        let mut composer = SpotComposer::new(ApiClient::new(server.uri()), &hub);
        composer.set_title("Bench");
        composer.draft.latitude = Some(35.6812);
        composer.draft.longitude = Some(139.7671);
        composer.open = true;

        let err = composer.submit().await.unwrap_err();
        assert!(matches!(err, ComposerError::Client(ClientError::Rejected(_))));
        assert_eq!(composer.draft.title, "Bench");
        assert!(composer.open);
        assert!(composer.error.is_some());
        let (signals, _) = drain(&mut rx);
        assert!(!signals.contains(&UiSignal::SpotsChanged));
    }
}
