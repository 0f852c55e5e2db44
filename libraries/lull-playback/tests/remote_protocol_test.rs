//! Wire-level tests for the remote control protocol

mod common;

use common::*;
use lull_core::{Preset, SoundId};
use lull_playback::{
    ChannelTransport, MixState, PlaybackError, RemoteAction, RemoteBackend, RemoteMessage,
};
use std::sync::Arc;

#[test]
fn test_play_payload_is_bit_exact() {
    let engine = RecordingEngine::new();
    let transport = RecordingTransport::new();
    let mut manager = manager(&engine);
    manager.attach_remote(remote_backend(&transport)).unwrap();

    manager
        .apply_preset(&Preset::new("Rain", vec![settings("rain", 0.8)]))
        .unwrap();

    assert_eq!(
        transport.payloads(),
        vec![r#"{"soundKey":"rain","isLooping":true,"volume":0.8,"action":"play"}"#.to_string()]
    );
}

#[test]
fn test_one_message_per_mutating_call() {
    let engine = RecordingEngine::new();
    let transport = RecordingTransport::new();
    let mut manager = manager(&engine);
    manager.attach_remote(remote_backend(&transport)).unwrap();
    let rain = SoundId::new("rain");

    manager
        .apply_preset(&Preset::new("Rain", vec![settings("rain", 0.8)]))
        .unwrap();
    manager.set_channel_volume(&rain, 0.8).unwrap();
    manager.set_channel_volume(&rain, 0.4).unwrap();
    manager.pause_all().unwrap();
    manager.pause_all().unwrap();
    manager.stop_all().unwrap();

    assert_eq!(
        transport.payloads(),
        vec![
            r#"{"soundKey":"rain","isLooping":true,"volume":0.8,"action":"play"}"#.to_string(),
            r#"{"soundKey":"rain","isLooping":true,"volume":0.4}"#.to_string(),
            r#"{"soundKey":"rain","isLooping":true,"volume":0.4,"action":"pause"}"#.to_string(),
            r#"{"soundKey":"rain","isLooping":true,"volume":0.4,"action":"stop"}"#.to_string(),
        ]
    );
    assert_eq!(manager.state(), MixState::Stopped);
}

#[tokio::test]
async fn test_channel_transport_feeds_writer_task() {
    let engine = RecordingEngine::new();
    let (transport, mut outbound) = ChannelTransport::new(8);
    let mut manager = manager(&engine);
    manager
        .attach_remote(Arc::new(RemoteBackend::new(Arc::new(transport), NAMESPACE)))
        .unwrap();

    manager.apply_preset(&storm()).unwrap();
    manager.stop_all().unwrap();

    let mut actions = Vec::new();
    while let Ok(message) = outbound.try_recv() {
        assert_eq!(message.namespace, NAMESPACE);
        let decoded = RemoteMessage::decode(&message.payload).unwrap();
        actions.push((decoded.sound_key, decoded.action));
    }

    assert_eq!(
        actions,
        vec![
            ("rain".to_string(), Some(RemoteAction::Play)),
            ("thunder".to_string(), Some(RemoteAction::Play)),
            ("rain".to_string(), Some(RemoteAction::Stop)),
            ("thunder".to_string(), Some(RemoteAction::Stop)),
        ]
    );
}

#[test]
fn test_full_queue_fails_the_channel() {
    let engine = RecordingEngine::new();
    let (transport, _outbound) = ChannelTransport::new(1);
    let mut manager = manager(&engine);
    manager
        .attach_remote(Arc::new(RemoteBackend::new(Arc::new(transport), NAMESPACE)))
        .unwrap();

    let err = manager.apply_preset(&storm()).unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::Transport(lull_playback::TransportError::QueueFull)
    ));
    assert_eq!(manager.state(), MixState::Failed);
}
