//! Shared fakes for playback integration tests
#![allow(dead_code)]

use lull_core::{ChannelSettings, Preset, SoundCatalog, SoundChannel, SoundId, SoundInfo, TimePeriod};
use lull_playback::{
    DeliveryReceipt, LocalBackend, PlaybackConfig, PlayerManager, RemoteBackend, RemoteMessage,
    RemoteTransport, RenderEngine, RenderError, RenderHandle, RenderSignals, TransportError,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NAMESPACE: &str = "urn:x-cast:lull.test";

/// One call observed by the recording engine
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(String, f32),
    SetVolume(String, f32),
    Start(String),
    Pause(String),
    Stop(String),
}

#[derive(Default)]
struct EngineState {
    calls: Vec<Call>,
    signals: HashMap<String, RenderSignals>,
    failing: HashSet<String>,
}

/// Render engine that records every call
#[derive(Clone, Default)]
pub struct RecordingEngine {
    state: Arc<Mutex<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn starts(&self, sound: &str) -> usize {
        self.count(&Call::Start(sound.to_string()))
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make `start` fail for a sound
    pub fn fail_start(&self, sound: &str) {
        self.state.lock().unwrap().failing.insert(sound.to_string());
    }

    /// Simulate the clip of `sound` reaching its end
    pub fn finish_clip(&self, sound: &str) {
        let signals = self.state.lock().unwrap().signals.get(sound).cloned();
        signals.expect("sound was never opened").clip_finished();
    }

    pub fn buffering(&self, sound: &str, buffering: bool) {
        let signals = self.state.lock().unwrap().signals.get(sound).cloned();
        signals.expect("sound was never opened").buffering(buffering);
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl RenderEngine for RecordingEngine {
    fn open(&self, channel: &SoundChannel, signals: RenderSignals) -> Result<Box<dyn RenderHandle>, RenderError> {
        let sound = channel.id().to_string();
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Open(sound.clone(), channel.volume()));
            state.signals.insert(sound.clone(), signals);
        }
        Ok(Box::new(RecordingHandle {
            sound,
            engine: self.clone(),
        }))
    }
}

struct RecordingHandle {
    sound: String,
    engine: RecordingEngine,
}

impl RenderHandle for RecordingHandle {
    fn set_volume(&mut self, volume: f32) -> Result<(), RenderError> {
        self.engine.record(Call::SetVolume(self.sound.clone(), volume));
        Ok(())
    }

    fn start(&mut self) -> Result<(), RenderError> {
        if self.engine.state.lock().unwrap().failing.contains(&self.sound) {
            return Err(RenderError::new("device lost"));
        }
        self.engine.record(Call::Start(self.sound.clone()));
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RenderError> {
        self.engine.record(Call::Pause(self.sound.clone()));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RenderError> {
        self.engine.record(Call::Stop(self.sound.clone()));
        Ok(())
    }
}

/// Remote transport that records payloads and can be made to fail
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    receipts: Mutex<Vec<DeliveryReceipt>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn payloads(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn messages(&self) -> Vec<RemoteMessage> {
        self.payloads()
            .iter()
            .map(|p| RemoteMessage::decode(p).unwrap())
            .collect()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.receipts.lock().unwrap().clear();
    }

    /// Report the most recent message for `sound` as undeliverable
    pub fn fail_delivery(&self, sound: &str, reason: &str) {
        let receipts = self.receipts.lock().unwrap();
        let receipt = receipts
            .iter()
            .rev()
            .find(|r| r.sound_id().as_str() == sound)
            .unwrap_or_else(|| panic!("no message sent for {sound}"));
        receipt.failed(reason);
    }
}

impl RemoteTransport for RecordingTransport {
    fn send(&self, namespace: &str, payload: String, receipt: DeliveryReceipt) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("receiver went away".into()));
        }
        self.sent.lock().unwrap().push((namespace.to_string(), payload));
        self.receipts.lock().unwrap().push(receipt);
        Ok(())
    }
}

pub fn remote_backend(transport: &Arc<RecordingTransport>) -> Arc<RemoteBackend> {
    Arc::new(RemoteBackend::new(transport.clone(), NAMESPACE))
}

pub fn catalog() -> Arc<SoundCatalog> {
    Arc::new(
        [
            SoundInfo::looping("rain"),
            SoundInfo::one_shot("thunder"),
            SoundInfo::looping("wind"),
            SoundInfo::one_shot("birds"),
        ]
        .into_iter()
        .collect(),
    )
}

pub fn manager(engine: &RecordingEngine) -> PlayerManager {
    let config = PlaybackConfig {
        replay_seed: Some(7),
        ..PlaybackConfig::default()
    };
    PlayerManager::new(catalog(), Arc::new(LocalBackend::new(Arc::new(engine.clone()))), &config)
}

pub fn settings(sound: &str, volume: f32) -> ChannelSettings {
    ChannelSettings::new(SoundId::new(sound), volume, TimePeriod::default())
}

pub fn thunder(volume: f32, every: Duration) -> ChannelSettings {
    ChannelSettings::new(SoundId::new("thunder"), volume, TimePeriod::fixed(every).unwrap())
}

/// rain 0.8 + thunder 0.3 replaying every 5s
pub fn storm() -> Preset {
    Preset::new(
        "Storm",
        vec![settings("rain", 0.8), thunder(0.3, Duration::from_secs(5))],
    )
}

pub fn drain<T>(rx: &mut tokio::sync::mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}
