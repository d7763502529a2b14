//! Periodic stream status sampling

use crate::media::PresentationSink;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Derives the status text from the sink's frame counter
///
/// The sampler owns the telemetry timer; at most one is pending at a time.
/// Its frame baseline starts at zero on every [`start`](Self::start).
///
/// ```
/// use remotemedia_webrtc_viewer::{HeadlessSink, TelemetrySampler};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let sink = HeadlessSink::new(1280, 720);
/// let mut sampler = TelemetrySampler::new(Duration::from_millis(10));
///
/// sampler.start();
/// assert_eq!(sampler.sample(&sink), "0 fps dynamic");
/// sampler.tick().await;
/// sampler.stop();
/// # });
/// ```
#[derive(Debug)]
pub struct TelemetrySampler {
    period: Duration,
    last_frames: u64,
    interval: Option<Interval>,
}

impl TelemetrySampler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_frames: 0,
            interval: None,
        }
    }

    /// (Re)arm the timer; the first tick fires one period from now
    pub fn start(&mut self) {
        self.stop();
        self.last_frames = 0;
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; never completes while stopped
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    /// Take one sample and return the status text
    ///
    /// Empty when the sink exposes no frame counter. The rate is the counter
    /// delta since the previous sample, clamped at zero if the counter went back.
    pub fn sample(&mut self, sink: &dyn PresentationSink) -> String {
        match sink.frame_counters().frames() {
            Some(frames) => {
                let rate = frames.saturating_sub(self.last_frames);
                self.last_frames = frames;
                format!("{} fps dynamic", rate)
            }
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::sink::TrackSet;
    use crate::media::{FrameCounters, SinkDimensions};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CounterSink {
        counters: Mutex<FrameCounters>,
    }

    impl CounterSink {
        fn set(&self, decoded: Option<u64>, painted: Option<u64>) {
            *self.counters.lock() = FrameCounters { decoded, painted };
        }
    }

    impl PresentationSink for CounterSink {
        fn source(&self) -> Option<TrackSet> {
            None
        }
        fn set_source(&self, _source: Option<TrackSet>) {}
        fn frame_counters(&self) -> FrameCounters {
            *self.counters.lock()
        }
        fn dimensions(&self) -> SinkDimensions {
            SinkDimensions::default()
        }
    }

    #[test]
    fn test_rate_from_counter_delta() {
        let sink = CounterSink::default();
        let mut sampler = TelemetrySampler::new(Duration::from_secs(1));

        sink.set(Some(30), None);
        assert_eq!(sampler.sample(&sink), "30 fps dynamic");
        sink.set(Some(55), None);
        assert_eq!(sampler.sample(&sink), "25 fps dynamic");
    }

    #[test]
    fn test_counter_reset_never_goes_negative() {
        let sink = CounterSink::default();
        let mut sampler = TelemetrySampler::new(Duration::from_secs(1));

        sink.set(Some(100), None);
        sampler.sample(&sink);
        sink.set(Some(4), None);
        assert_eq!(sampler.sample(&sink), "0 fps dynamic");
        sink.set(Some(10), None);
        assert_eq!(sampler.sample(&sink), "6 fps dynamic");
    }

    #[test]
    fn test_painted_counter_and_missing_counter() {
        let sink = CounterSink::default();
        let mut sampler = TelemetrySampler::new(Duration::from_secs(1));

        assert_eq!(sampler.sample(&sink), "");
        sink.set(None, Some(12));
        assert_eq!(sampler.sample(&sink), "12 fps dynamic");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_resets_baseline_and_ticks() {
        let sink = CounterSink::default();
        let mut sampler = TelemetrySampler::new(Duration::from_millis(1000));
        assert!(!sampler.is_running());

        sink.set(Some(50), None);
        sampler.sample(&sink);

        sampler.start();
        assert!(sampler.is_running());
        assert_eq!(sampler.sample(&sink), "50 fps dynamic");

        let before = Instant::now();
        sampler.tick().await;
        assert!(Instant::now() - before >= Duration::from_millis(1000));

        sampler.stop();
        assert!(!sampler.is_running());
        let stalled = tokio::time::timeout(Duration::from_secs(5), sampler.tick()).await;
        assert!(stalled.is_err());
    }
}
