//! Simulated local rendering
//!
//! Stands in for a device audio engine: every call is logged, and
//! non-loopable sounds report the end of their clip after a fixed length.

use lull_core::{SoundChannel, SoundId};
use lull_playback::{RenderEngine, RenderError, RenderHandle, RenderSignals};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::info;

/// Engine whose clips are timers
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    clip_length: Duration,
}

impl SimulatedEngine {
    pub fn new(clip_length: Duration) -> Self {
        Self { clip_length }
    }
}

impl RenderEngine for SimulatedEngine {
    fn open(&self, channel: &SoundChannel, signals: RenderSignals) -> Result<Box<dyn RenderHandle>, RenderError> {
        let runtime = Handle::try_current().map_err(|e| RenderError::new(e.to_string()))?;
        info!(sound_id = %channel.id(), volume = channel.volume(), "Clip opened");

        Ok(Box::new(SimulatedHandle {
            sound_id: channel.id().clone(),
            loopable: channel.is_loopable(),
            clip_length: self.clip_length,
            signals,
            runtime,
            clip: None,
        }))
    }
}

struct SimulatedHandle {
    sound_id: SoundId,
    loopable: bool,
    clip_length: Duration,
    signals: RenderSignals,
    runtime: Handle,
    clip: Option<JoinHandle<()>>,
}

impl SimulatedHandle {
    fn cancel_clip(&mut self) {
        if let Some(clip) = self.clip.take() {
            clip.abort();
        }
    }
}

impl RenderHandle for SimulatedHandle {
    fn set_volume(&mut self, volume: f32) -> Result<(), RenderError> {
        info!(sound_id = %self.sound_id, volume, "Volume set");
        Ok(())
    }

    fn start(&mut self) -> Result<(), RenderError> {
        info!(sound_id = %self.sound_id, "Clip started");
        self.cancel_clip();

        // Clips restart from the top; loopable sounds never end.
        if !self.loopable {
            let signals = self.signals.clone();
            let length = self.clip_length;
            self.clip = Some(self.runtime.spawn(async move {
                tokio::time::sleep(length).await;
                signals.clip_finished();
            }));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RenderError> {
        info!(sound_id = %self.sound_id, "Clip paused");
        self.cancel_clip();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RenderError> {
        info!(sound_id = %self.sound_id, "Clip stopped");
        self.cancel_clip();
        Ok(())
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        self.cancel_clip();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lull_core::{ChannelSettings, Preset, SoundCatalog, SoundInfo, TimePeriod};
    use lull_playback::{ChannelEvent, LocalBackend, MixState, PlaybackConfig, PlayerManager};
    use std::sync::Arc;

    fn manager() -> PlayerManager {
        let catalog: SoundCatalog = [SoundInfo::looping("rain"), SoundInfo::one_shot("owl")]
            .into_iter()
            .collect();
        let engine = Arc::new(SimulatedEngine::new(Duration::from_secs(3)));
        PlayerManager::new(
            Arc::new(catalog),
            Arc::new(LocalBackend::new(engine)),
            &PlaybackConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_clip_reports_its_end() {
        let mut manager = manager();
        let owl = ChannelSettings::new(
            SoundId::new("owl"),
            0.4,
            TimePeriod::fixed(Duration::from_secs(2)).unwrap(),
        );
        manager.apply_preset(&Preset::new("Night", vec![owl])).unwrap();
        let started = tokio::time::Instant::now();

        let event = manager.next_event().await.unwrap();
        assert!(matches!(event, ChannelEvent::ClipFinished { .. }));
        assert!(started.elapsed() >= Duration::from_secs(3));
        manager.handle_event(event);

        // Replay after the fixed 2s window, then the clip ends again.
        let replay = manager.next_event().await.unwrap();
        assert!(matches!(replay, ChannelEvent::ReplayDue { .. }));
        manager.handle_event(replay);
        let again = manager.next_event().await.unwrap();
        assert!(matches!(again, ChannelEvent::ClipFinished { .. }));
        assert!(started.elapsed() >= Duration::from_secs(8));
        assert_eq!(manager.state(), MixState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_running_clip() {
        let mut manager = manager();
        let owl = ChannelSettings::new(SoundId::new("owl"), 0.4, TimePeriod::DEFAULT);
        manager.apply_preset(&Preset::new("Night", vec![owl])).unwrap();
        manager.pause_all().unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(manager.process_pending_events(), 0);
    }

    #[test]
    fn test_open_outside_runtime_fails() {
        let mut manager = manager();
        let rain = ChannelSettings::new(SoundId::new("rain"), 0.4, TimePeriod::DEFAULT);

        let result = manager.apply_preset(&Preset::new("Rain", vec![rain]));
        assert!(matches!(result, Err(lull_playback::PlaybackError::Render(_))));
    }
}
