// src/components/map_view.rs
use chrono::{DateTime, Utc};
use log::error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::components::api_client::{ApiClient, ListOutcome};
use crate::components::signals::{drain, SignalHub, UiSignal};
use crate::models::spot::Spot;

pub const MARKER_DOT_SIZE_PX: u32 = 14;
/// Label sits to the right of the dot so it never covers it.
pub const MARKER_LABEL_OFFSET_PX: i32 = (MARKER_DOT_SIZE_PX / 2 + 8) as i32;
pub const MARKER_LABEL_MAX_WIDTH_PX: u32 = 160;

/// View model for one rendered spot: a fixed-size dot anchored at the
/// coordinate, an always-visible title label beside it, and a detail popup.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotMarker {
    pub spot_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPopup {
    pub title: String,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One-shot device location lookup. Denial or timeout is expressed as
/// `None`; the map treats that as "no location", never as an error.
pub trait Geolocator {
    fn locate(&self) -> Option<(f64, f64)>;
}

/// Headless map state: the user location, the marker set, and the one-shot
/// coordinate-placement mode the composer arms.
pub struct MapState {
    api: ApiClient,
    hub: SignalHub,
    signals: broadcast::Receiver<UiSignal>,
    pub markers: Vec<SpotMarker>,
    pub user_location: Option<(f64, f64)>,
    pub placement_armed: bool,
    pub pending_pin: Option<(f64, f64)>,
}

impl MapState {
    pub fn new(api: ApiClient, hub: &SignalHub) -> Self {
        Self {
            api,
            hub: hub.clone(),
            signals: hub.subscribe(),
            markers: Vec::new(),
            user_location: None,
            placement_armed: false,
            pending_pin: None,
        }
    }

    /// Best-effort centering on the device. Failure keeps the previous
    /// location (usually none).
    pub fn locate_user(&mut self, geolocator: &dyn Geolocator) {
        if let Some(location) = geolocator.locate() {
            self.user_location = Some(location);
        }
    }

    /// Map click. Armed: capture the coordinate, drop a transient pin,
    /// announce the selection and disarm. Not armed: plain map interaction,
    /// nothing happens here.
    pub fn select_coordinate(&mut self, latitude: f64, longitude: f64) -> bool {
        if !self.placement_armed {
            return false;
        }
        self.placement_armed = false;
        self.pending_pin = Some((latitude, longitude));
        self.hub.emit(UiSignal::CoordinateSelected {
            latitude,
            longitude,
        });
        true
    }

    /// Refetch and rebuild the marker set. Any failure is logged and leaves
    /// an empty map rather than a stale or half-rendered one.
    pub async fn refresh(&mut self) {
        match self.api.list_spots().await {
            Ok(ListOutcome::Items(spots)) => {
                self.markers = build_markers(&self.api, &spots);
            }
            Ok(ListOutcome::Failed(envelope)) => {
                error!(
                    "loading spots failed: {} ({})",
                    envelope.error,
                    envelope.detail.unwrap_or_default()
                );
                self.markers.clear();
            }
            Err(e) => {
                error!("loading spots failed: {}", e);
                self.markers.clear();
            }
        }
    }

    /// Apply pending signals, then do at most one refetch no matter how many
    /// change notifications piled up.
    pub async fn process_signals(&mut self) {
        let (signals, lagged) = drain(&mut self.signals);
        let mut refresh_needed = lagged;
        for signal in signals {
            match signal {
                UiSignal::ComposerOpened => self.placement_armed = true,
                UiSignal::SpotsChanged => {
                    self.pending_pin = None;
                    refresh_needed = true;
                }
                UiSignal::CompositionCancelled => self.pending_pin = None,
                // Our own click produced this; the pin is already placed.
                UiSignal::CoordinateSelected { .. } => {}
            }
        }
        if refresh_needed {
            self.refresh().await;
        }
    }
}

/// Markers for every spot with renderable coordinates. Rows with non-finite
/// values are dropped rather than drawn at garbage positions.
fn build_markers(api: &ApiClient, spots: &[Spot]) -> Vec<SpotMarker> {
    spots
        .iter()
        .filter(|spot| spot.latitude.is_finite() && spot.longitude.is_finite())
        .map(|spot| SpotMarker {
            spot_id: spot.id,
            latitude: spot.latitude,
            longitude: spot.longitude,
            label: spot.title.clone(),
            popup: MarkerPopup {
                title: spot.title.clone(),
                body: spot.body.clone(),
                image_url: spot
                    .images
                    .first()
                    .and_then(|image| api.image_url(&image.path)),
                created_at: spot.created_at,
            },
        })
        .collect()
}
