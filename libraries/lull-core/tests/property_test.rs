//! Property-based tests for core domain types
//!
//! Uses proptest to verify invariants across many random inputs.

use lull_core::{
    clamp_volume, ChannelSettings, Preset, SoundChannel, SoundId, SoundInfo, TimePeriod,
    MAX_VOLUME, MIN_VOLUME,
};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    /// Property: clamped volume is always inside the supported range
    #[test]
    fn clamped_volume_in_range(volume in proptest::num::f32::ANY) {
        let clamped = clamp_volume(volume);
        prop_assert!((MIN_VOLUME..=MAX_VOLUME).contains(&clamped));
    }

    /// Property: a channel volume setter never stores an out-of-range value
    #[test]
    fn channel_volume_in_range(volumes in prop::collection::vec(-2.0f32..3.0, 1..20)) {
        let mut channel = SoundChannel::new(&SoundInfo::looping("rain"));
        for volume in volumes {
            channel.set_volume(volume);
            prop_assert!((MIN_VOLUME..=MAX_VOLUME).contains(&channel.volume()));
        }
    }

    /// Property: valid bounds always construct, inverted bounds never do
    #[test]
    fn time_period_validation(a in 1u64..=300, b in 1u64..=300) {
        let result = TimePeriod::new(Duration::from_secs(a), Duration::from_secs(b));
        prop_assert_eq!(result.is_ok(), a <= b);
    }

    /// Property: a preset always matches any permutation of its own entries
    #[test]
    fn preset_matches_permutation(
        volumes in prop::collection::vec(0.0f32..=1.0, 0..8),
        rotate in 0usize..8,
    ) {
        let entries: Vec<ChannelSettings> = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| ChannelSettings::new(SoundId::new(format!("sound-{i}")), *v, TimePeriod::DEFAULT))
            .collect();
        let preset = Preset::new("p", entries.clone());

        let mut permuted = entries;
        if !permuted.is_empty() {
            let by = rotate % permuted.len();
            permuted.rotate_left(by);
        }

        prop_assert!(preset.has_same_mix(&permuted));
    }
}
