//! Randomized replay scheduling for non-loopable sounds
//!
//! `IntervalScheduler` only computes delays; the timer that waits for one
//! (`ReplayTimer`) belongs to the player that armed it.

use crate::error::{PlaybackError, Result};
use crate::player::{ChannelEvent, PlayerContext};
use lull_core::{SoundId, TimePeriod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Computes replay delays
///
/// Delays are uniform over `[min, max]` (inclusive) at millisecond
/// resolution. Seed it for reproducible tests.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    rng: StdRng,
}

impl IntervalScheduler {
    /// Scheduler seeded from OS entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic scheduler
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Scheduler drawing from the given random source
    pub fn from_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Next delay inside a validated window
    pub fn next_delay(&mut self, period: &TimePeriod) -> Duration {
        let min = period.min().as_millis() as u64;
        let max = period.max().as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    /// Next delay inside raw bounds
    ///
    /// # Errors
    /// Configuration error when `min > max` or a bound is out of range.
    pub fn delay_between(&mut self, min: Duration, max: Duration) -> Result<Duration> {
        let period = TimePeriod::new(min, max)?;
        Ok(self.next_delay(&period))
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellable timer posting `ChannelEvent::ReplayDue`
///
/// Each arm gets a generation number. `cancel` aborts the task and bumps the
/// generation, so an event that was already queued before cancellation is
/// rejected by `accept` instead of replaying.
#[derive(Debug, Default)]
pub struct ReplayTimer {
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl ReplayTimer {
    /// Create an idle timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending one
    ///
    /// Returns the generation the eventual event will carry.
    ///
    /// # Errors
    /// `NoRuntime` when called outside a tokio runtime.
    pub fn arm(&mut self, delay: Duration, sound_id: SoundId, context: &PlayerContext) -> Result<u64> {
        self.cancel();
        let runtime = Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;

        let generation = self.generation;
        let instance = context.instance;
        let events = context.events.clone();

        trace!(sound_id = %sound_id, ?delay, generation, "Arming replay timer");
        self.task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            events.send(ChannelEvent::ReplayDue {
                sound_id,
                instance,
                generation,
            });
        }));

        Ok(generation)
    }

    /// Cancel the pending replay, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a replay is pending
    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Consume a fired event
    ///
    /// Returns `true` exactly once for the current arm; stale or duplicate
    /// generations return `false`.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.task.is_none() || generation != self.generation {
            return false;
        }
        self.task = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }
}

impl Drop for ReplayTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::EventSender;
    use tokio::sync::mpsc;

    fn period(min: u64, max: u64) -> TimePeriod {
        TimePeriod::new(Duration::from_secs(min), Duration::from_secs(max)).unwrap()
    }

    #[test]
    fn delays_stay_inside_window() {
        let mut scheduler = IntervalScheduler::seeded(42);
        let window = period(5, 30);

        for _ in 0..1000 {
            let delay = scheduler.next_delay(&window);
            assert!(delay >= window.min() && delay <= window.max());
        }
    }

    #[test]
    fn fixed_window_yields_exact_delay() {
        let mut scheduler = IntervalScheduler::seeded(1);
        let window = TimePeriod::fixed(Duration::from_secs(12)).unwrap();
        assert_eq!(scheduler.next_delay(&window), Duration::from_secs(12));
    }

    #[test]
    fn same_seed_same_sequence() {
        let window = period(1, 300);
        let mut a = IntervalScheduler::seeded(7);
        let mut b = IntervalScheduler::seeded(7);

        let first: Vec<Duration> = (0..16).map(|_| a.next_delay(&window)).collect();
        let second: Vec<Duration> = (0..16).map(|_| b.next_delay(&window)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn inverted_bounds_are_a_configuration_error() {
        let mut scheduler = IntervalScheduler::seeded(0);
        let err = scheduler
            .delay_between(Duration::from_secs(30), Duration::from_secs(5))
            .unwrap_err();

        match err {
            PlaybackError::Core(core) => assert!(core.is_configuration_error()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn arming_without_runtime_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let context = PlayerContext {
            instance: 1,
            events: EventSender::new(tx),
        };

        let mut timer = ReplayTimer::new();
        let result = timer.arm(Duration::from_secs(1), SoundId::new("thunder"), &context);
        assert!(matches!(result, Err(PlaybackError::NoRuntime)));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn fired_event_is_accepted_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = PlayerContext {
            instance: 3,
            events: EventSender::new(tx),
        };

        let mut timer = ReplayTimer::new();
        let generation = timer
            .arm(Duration::from_secs(5), SoundId::new("thunder"), &context)
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ChannelEvent::ReplayDue {
                sound_id: SoundId::new("thunder"),
                instance: 3,
                generation,
            }
        );

        assert!(timer.accept(generation));
        assert!(!timer.accept(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = PlayerContext {
            instance: 3,
            events: EventSender::new(tx),
        };

        let mut timer = ReplayTimer::new();
        timer
            .arm(Duration::from_secs(5), SoundId::new("thunder"), &context)
            .unwrap();
        timer.cancel();

        let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err(), "cancelled timer fired");
    }

    #[tokio::test(start_paused = true)]
    async fn event_queued_before_cancel_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = PlayerContext {
            instance: 3,
            events: EventSender::new(tx),
        };

        let mut timer = ReplayTimer::new();
        let generation = timer
            .arm(Duration::from_secs(5), SoundId::new("thunder"), &context)
            .unwrap();

        // Timer wins the race: its event is already queued when we cancel.
        let event = rx.recv().await.unwrap();
        timer.cancel();

        let ChannelEvent::ReplayDue { generation: fired, .. } = event else {
            panic!("unexpected event");
        };
        assert_eq!(fired, generation);
        assert!(!timer.accept(fired));
    }
}
