//! Reconciles received tracks with the presentation sink
//!
//! The sink holds at most one track per [`TrackKind`]. Attaching a track of
//! a kind that is already present detaches and stops the old one first, and
//! removing the last track releases the sink container.

use super::sink::PresentationSink;
use super::MediaTrack;
use std::sync::Arc;
use tracing::debug;

/// The only mutator of a [`PresentationSink`]'s source
#[derive(Clone)]
pub struct TrackSinkAdapter {
    sink: Arc<dyn PresentationSink>,
}

impl TrackSinkAdapter {
    pub fn new(sink: Arc<dyn PresentationSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn PresentationSink> {
        &self.sink
    }

    /// Add a track, replacing any other track of the same kind
    pub fn attach(&self, track: Arc<dyn MediaTrack>) {
        let id = track.id();
        let kind = track.kind();

        if let Some(current) = self.sink.source() {
            for old in current.iter().filter(|t| t.kind() == kind && t.id() != id) {
                debug!("Replacing {} track {} with {}", kind, old.id(), id);
                self.detach(old.as_ref());
            }
        }

        let mut source = self.sink.source().unwrap_or_default();
        if !source.iter().any(|t| t.id() == id) {
            debug!("Attaching {} track {}", kind, id);
            source.push(track);
        }
        self.sink.set_source(Some(source));
    }

    /// Stop a track and remove it; releases the container once it is empty
    ///
    /// Does nothing while the container is released.
    pub fn detach(&self, track: &dyn MediaTrack) {
        let Some(mut source) = self.sink.source() else {
            return;
        };

        track.stop();
        let id = track.id();
        source.retain(|t| t.id() != id);
        debug!("Detached {} track {}", track.kind(), id);

        if source.is_empty() {
            self.sink.set_source(None);
        } else {
            self.sink.set_source(Some(source));
        }
    }

    /// Detach every attached track
    pub fn detach_all(&self) {
        if let Some(current) = self.sink.source() {
            for track in current {
                self.detach(track.as_ref());
            }
        }
    }

    /// True if a video track is attached
    pub fn has_video(&self) -> bool {
        self.sink
            .source()
            .is_some_and(|s| s.iter().any(|t| t.kind() == super::TrackKind::Video))
    }
}

impl std::fmt::Debug for TrackSinkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSinkAdapter")
            .field("tracks", &self.sink.source().map(|s| s.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{HeadlessSink, TrackKind};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct StubTrack {
        id: String,
        kind: TrackKind,
        stopped: AtomicBool,
    }

    fn stub(id: &str, kind: TrackKind) -> Arc<StubTrack> {
        Arc::new(StubTrack {
            id: id.to_string(),
            kind,
            stopped: AtomicBool::new(false),
        })
    }

    impl MediaTrack for StubTrack {
        fn id(&self) -> String {
            self.id.clone()
        }
        fn kind(&self) -> TrackKind {
            self.kind
        }
        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
        fn is_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    fn adapter() -> (TrackSinkAdapter, Arc<HeadlessSink>) {
        let sink = Arc::new(HeadlessSink::new(640, 480));
        (TrackSinkAdapter::new(sink.clone()), sink)
    }

    #[test]
    fn test_second_video_track_replaces_first() {
        let (adapter, sink) = adapter();
        let v1 = stub("v1", TrackKind::Video);
        let v2 = stub("v2", TrackKind::Video);

        adapter.attach(v1.clone());
        adapter.attach(v2.clone());

        let source = sink.source().unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source[0].id(), "v2");
        assert!(v1.is_stopped());
        assert!(!v2.is_stopped());
    }

    #[test]
    fn test_one_track_per_kind() {
        let (adapter, sink) = adapter();
        adapter.attach(stub("v1", TrackKind::Video));
        adapter.attach(stub("a1", TrackKind::Audio));
        adapter.attach(stub("a2", TrackKind::Audio));

        let ids: Vec<String> = sink.source().unwrap().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["v1", "a2"]);
        assert!(adapter.has_video());
    }

    #[test]
    fn test_reattaching_same_track_is_a_no_op() {
        let (adapter, sink) = adapter();
        let v1 = stub("v1", TrackKind::Video);
        adapter.attach(v1.clone());
        adapter.attach(v1.clone());

        assert_eq!(sink.track_count(), 1);
        assert!(!v1.is_stopped());
    }

    #[test]
    fn test_detaching_last_track_releases_container() {
        let (adapter, sink) = adapter();
        let v1 = stub("v1", TrackKind::Video);
        let a1 = stub("a1", TrackKind::Audio);
        adapter.attach(v1.clone());
        adapter.attach(a1.clone());

        adapter.detach(v1.as_ref());
        assert_eq!(sink.track_count(), 1);
        assert!(sink.source().is_some());

        adapter.detach(a1.as_ref());
        assert!(sink.source().is_none());
        assert!(a1.is_stopped());
        assert!(!adapter.has_video());
    }

    #[test]
    fn test_detach_all_empties_sink() {
        let (adapter, sink) = adapter();
        let v1 = stub("v1", TrackKind::Video);
        let a1 = stub("a1", TrackKind::Audio);
        adapter.attach(v1.clone());
        adapter.attach(a1.clone());

        adapter.detach_all();
        assert!(sink.source().is_none());
        assert!(v1.is_stopped() && a1.is_stopped());

        // Released container: nothing to do
        adapter.detach_all();
        adapter.detach(v1.as_ref());
        assert!(sink.source().is_none());
    }
}
