//! Property-based tests for mix orchestration

mod common;

use common::*;
use lull_core::{ChannelSettings, Preset, SoundId, TimePeriod};
use lull_playback::{ChannelState, IntervalScheduler, MixState};
use proptest::prelude::*;
use std::time::Duration;

const SOUNDS: [&str; 4] = ["rain", "thunder", "wind", "birds"];

fn arb_period() -> impl Strategy<Value = TimePeriod> {
    (1_000u64..=300_000, 1_000u64..=300_000).prop_map(|(a, b)| {
        TimePeriod::new(Duration::from_millis(a.min(b)), Duration::from_millis(a.max(b))).unwrap()
    })
}

fn arb_preset() -> impl Strategy<Value = Preset> {
    proptest::sample::subsequence(SOUNDS.to_vec(), 0..=SOUNDS.len())
        .prop_flat_map(|sounds| {
            let n = sounds.len();
            (
                Just(sounds),
                proptest::collection::vec(0.0f32..=1.0, n),
                proptest::collection::vec(arb_period(), n),
            )
        })
        .prop_map(|(sounds, volumes, periods)| {
            let states = sounds
                .iter()
                .zip(volumes)
                .zip(periods)
                .map(|((sound, volume), period)| ChannelSettings::new(SoundId::new(*sound), volume, period))
                .collect();
            Preset::new("Generated", states)
        })
}

fn arb_channel_state() -> impl Strategy<Value = ChannelState> {
    prop_oneof![
        Just(ChannelState::Stopped),
        Just(ChannelState::Buffering),
        Just(ChannelState::Playing),
        Just(ChannelState::Paused),
        Just(ChannelState::Failed),
    ]
}

proptest! {
    #[test]
    fn prop_apply_preset_is_idempotent(preset in arb_preset()) {
        let engine = RecordingEngine::new();
        let mut manager = manager(&engine);
        let mut updates = manager.subscribe();

        manager.apply_preset(&preset).unwrap();
        let state = manager.state();
        let calls = engine.calls();
        drain(&mut updates);

        manager.apply_preset(&preset).unwrap();

        prop_assert_eq!(manager.state(), state);
        prop_assert_eq!(engine.calls(), calls);
        prop_assert!(drain(&mut updates).is_empty());
    }

    #[test]
    fn prop_snapshot_reapplies_to_same_mix(first in arb_preset(), second in arb_preset()) {
        let engine = RecordingEngine::new();
        let mut manager = manager(&engine);

        manager.apply_preset(&first).unwrap();
        let saved = Preset::new("Saved", manager.snapshot());

        manager.apply_preset(&second).unwrap();
        manager.apply_preset(&saved).unwrap();

        prop_assert!(first.has_same_mix(&manager.snapshot()));
    }

    #[test]
    fn prop_next_delay_within_period(period in arb_period(), seed in any::<u64>()) {
        let mut scheduler = IntervalScheduler::seeded(seed);
        for _ in 0..16 {
            let delay = scheduler.next_delay(&period);
            prop_assert!(delay >= period.min());
            prop_assert!(delay <= period.max());
        }
    }

    #[test]
    fn prop_first_abnormal_channel_wins(states in proptest::collection::vec(arb_channel_state(), 0..8)) {
        let derived = MixState::derive(states.iter().copied());
        let first_abnormal = states.iter().find(|s| !s.is_nominal());

        match first_abnormal {
            Some(ChannelState::Failed) => prop_assert_eq!(derived, MixState::Failed),
            Some(_) => prop_assert_eq!(derived, MixState::Buffering),
            None if states.iter().any(|s| *s == ChannelState::Playing) => {
                prop_assert_eq!(derived, MixState::Playing);
            }
            None if !states.is_empty() && states.iter().all(|s| *s == ChannelState::Paused) => {
                prop_assert_eq!(derived, MixState::Paused);
            }
            None => prop_assert_eq!(derived, MixState::Stopped),
        }
    }
}
