//! # Size Reporter
//!
//! Tells the parent how tall the child's rendered content is. Reports go out
//! on three triggers and are not debounced:
//!
//! 1. once when the content mounts,
//! 2. on every resize,
//! 3. once more after a fixed delay, to catch content that finished loading
//!    without a resize.
//!
//! The reporter never measures anything itself; callers pass the current
//! height (or `None` when the root isn't laid out yet).

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::core::frame::{Envelope, FrameMessenger, SizeReport};

pub const DEFAULT_CATCH_ALL_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTrigger {
    Mount,
    Resize,
    CatchAll,
}

pub struct SizeReporter {
    messenger: FrameMessenger,
    catch_all_delay: Duration,
    catch_all_at: Option<Instant>,
    mounted: bool,
}

impl SizeReporter {
    pub fn new(messenger: FrameMessenger, catch_all_delay: Duration) -> Self {
        Self {
            messenger,
            catch_all_delay,
            catch_all_at: None,
            mounted: false,
        }
    }

    /// Report once and arm the deferred catch-all.
    pub fn mount(&mut self, now: Instant, height: Option<u32>) -> bool {
        self.mounted = true;
        self.catch_all_at = Some(now + self.catch_all_delay);
        self.report(SizeTrigger::Mount, height)
    }

    pub fn resize(&mut self, height: Option<u32>) -> bool {
        if !self.mounted {
            return false;
        }
        self.report(SizeTrigger::Resize, height)
    }

    /// Fire the catch-all if its deadline has passed. Fires at most once per mount.
    pub fn poll(&mut self, now: Instant, height: Option<u32>) -> bool {
        match self.catch_all_at {
            Some(deadline) if now >= deadline => {
                self.catch_all_at = None;
                self.report(SizeTrigger::CatchAll, height)
            }
            _ => false,
        }
    }

    /// Time left before the catch-all fires, if it is still pending.
    pub fn pending_catch_all(&self, now: Instant) -> Option<Duration> {
        self.catch_all_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.catch_all_at = None;
    }

    fn report(&self, trigger: SizeTrigger, height: Option<u32>) -> bool {
        let Some(height) = height else {
            debug!("Size report ({:?}) skipped: nothing rendered yet", trigger);
            return false;
        };
        debug!("Size report ({:?}): height={}", trigger, height);
        match self
            .messenger
            .send(&Envelope::IframeData(SizeReport { height }))
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to post size report: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{self, Inbox};

    fn heights(inbox: &mut Inbox) -> Vec<u32> {
        inbox
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Envelope::IframeData(r) => Some(r.height),
                _ => None,
            })
            .collect()
    }

    fn reporter() -> (SizeReporter, Inbox) {
        let (parent, child) = frame::channel();
        let reporter = SizeReporter::new(child.messenger, DEFAULT_CATCH_ALL_DELAY);
        (reporter, parent.inbox)
    }

    #[test]
    fn reports_on_mount_resize_and_catch_all_even_without_change() {
        let (mut reporter, mut inbox) = reporter();
        let t0 = Instant::now();

        assert!(reporter.mount(t0, Some(100)));
        assert!(reporter.resize(Some(100)));
        assert!(!reporter.poll(t0 + Duration::from_millis(2999), Some(100)));
        assert!(reporter.poll(t0 + Duration::from_millis(3000), Some(100)));

        assert_eq!(heights(&mut inbox), vec![100, 100, 100]);
    }

    #[test]
    fn catch_all_fires_once() {
        let (mut reporter, mut inbox) = reporter();
        let t0 = Instant::now();
        reporter.mount(t0, Some(10));
        assert!(reporter.poll(t0 + Duration::from_secs(5), Some(20)));
        assert!(!reporter.poll(t0 + Duration::from_secs(10), Some(30)));
        assert_eq!(heights(&mut inbox), vec![10, 20]);
    }

    #[test]
    fn unmeasured_root_reports_nothing() {
        let (mut reporter, mut inbox) = reporter();
        assert!(!reporter.mount(Instant::now(), None));
        assert!(heights(&mut inbox).is_empty());
    }

    #[test]
    fn resize_before_mount_is_ignored() {
        let (mut reporter, mut inbox) = reporter();
        assert!(!reporter.resize(Some(50)));
        assert!(heights(&mut inbox).is_empty());
    }

    #[test]
    fn unmount_cancels_catch_all() {
        let (mut reporter, mut inbox) = reporter();
        let t0 = Instant::now();
        reporter.mount(t0, Some(1));
        reporter.unmount();
        assert_eq!(reporter.pending_catch_all(t0), None);
        assert!(!reporter.poll(t0 + Duration::from_secs(4), Some(2)));
        assert!(!reporter.resize(Some(3)));
        assert_eq!(heights(&mut inbox), vec![1]);
    }

    #[test]
    fn pending_catch_all_counts_down() {
        let (mut reporter, _inbox) = reporter();
        let t0 = Instant::now();
        reporter.mount(t0, Some(1));
        assert_eq!(
            reporter.pending_catch_all(t0 + Duration::from_millis(1000)),
            Some(Duration::from_millis(2000))
        );
    }
}
