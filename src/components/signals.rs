// src/components/signals.rs
use tokio::sync::broadcast;

const SIGNAL_BUFFER: usize = 16;

/// Cross-component UI signals. One typed channel replaces the stringly-keyed
/// window events the components used to coordinate through.
#[derive(Debug, Clone, PartialEq)]
pub enum UiSignal {
    /// Compose control pressed; the map arms its one-shot placement click.
    ComposerOpened,
    /// A coordinate was picked on the map for the draft spot.
    CoordinateSelected { latitude: f64, longitude: f64 },
    /// A spot was written; readers should refetch.
    SpotsChanged,
    /// The composer was dismissed without submitting.
    CompositionCancelled,
}

/// Owner of the broadcast channel. Cloning shares the sender; every
/// component keeps its own receiver so signals fan out FIFO per subscriber.
#[derive(Clone)]
pub struct SignalHub {
    tx: broadcast::Sender<UiSignal>,
}

impl SignalHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiSignal> {
        self.tx.subscribe()
    }

    /// Fire and forget; having no subscribers is not an error.
    pub fn emit(&self, signal: UiSignal) {
        let _ = self.tx.send(signal);
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain everything pending without waiting. A lagged receiver has lost
/// signals; the flag tells callers to treat the gap as a possible data
/// change instead of silently missing one.
pub fn drain(rx: &mut broadcast::Receiver<UiSignal>) -> (Vec<UiSignal>, bool) {
    use tokio::sync::broadcast::error::TryRecvError;

    let mut signals = Vec::new();
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(signal) => signals.push(signal),
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    (signals, lagged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_arrive_in_emit_order() {
        let hub = SignalHub::new();
        let mut rx = hub.subscribe();

        hub.emit(UiSignal::ComposerOpened);
        hub.emit(UiSignal::CoordinateSelected {
            latitude: 35.6812,
            longitude: 139.7671,
        });
        hub.emit(UiSignal::SpotsChanged);

        let (signals, lagged) = drain(&mut rx);
        assert!(!lagged);
        assert_eq!(
            signals,
            vec![
                UiSignal::ComposerOpened,
                UiSignal::CoordinateSelected {
                    latitude: 35.6812,
                    longitude: 139.7671,
                },
                UiSignal::SpotsChanged,
            ]
        );
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let hub = SignalHub::new();
        hub.emit(UiSignal::SpotsChanged);
    }

    #[test]
    fn each_subscriber_sees_every_signal() {
        let hub = SignalHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.emit(UiSignal::SpotsChanged);

        let (got_a, _) = drain(&mut a);
        let (got_b, _) = drain(&mut b);
        assert_eq!(got_a, vec![UiSignal::SpotsChanged]);
        assert_eq!(got_b, vec![UiSignal::SpotsChanged]);
    }

    #[test]
    fn overflow_is_reported_as_lag() {
        let hub = SignalHub::new();
        let mut rx = hub.subscribe();

        for _ in 0..(SIGNAL_BUFFER * 3) {
            hub.emit(UiSignal::SpotsChanged);
        }

        let (signals, lagged) = drain(&mut rx);
        assert!(lagged);
        assert!(!signals.is_empty());
    }
}
