//! Scripted end-to-end run of the whole pipeline.
//!
//! One simulated speaker says the wake phrase and then each utterance in
//! turn. The speech engine replays the words as partial results followed by
//! a final one, tracks come from a synthetic resolver, and nothing is played
//! out loud. Used by `voicedj simulate` to try out a command table and the
//! endpointing timers.

use crate::config::Config;
use crate::dispatch::{Cue, DispatchAction, Dispatcher, RecordingCues};
use crate::error::{Result, VoiceDjError};
use crate::player::actor::{self, PlayerSnapshot};
use crate::player::controller::{PlaybackController, PlaybackEvent};
use crate::player::resolver::MockResolver;
use crate::player::sink::MockSink;
use crate::recognition::engine::{HotwordEngine, MockHotwordEngine, MockSpeechEngine};
use crate::recognition::frame::AudioFrame;
use crate::recognition::listener::{RecognitionEvent, SpeakerId};
use crate::voice::VoiceSession;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Participant id of the simulated speaker.
pub const SPEAKER: &str = "speaker";
const BOT: &str = "voicedj";
const WAKE_LABEL: &str = "hey dj";

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub utterances: Vec<String>,
    /// Delay between successive transcript updates.
    pub step: Duration,
}

impl SimulationOptions {
    pub fn new(utterances: Vec<String>) -> Self {
        Self {
            utterances,
            step: Duration::from_millis(80),
        }
    }
}

/// One line of simulation output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SimulationEvent {
    Recognition(RecognitionEvent),
    Playback(PlaybackEvent),
    Cue { cue: Cue },
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub events: Vec<SimulationEvent>,
    /// Player state after the last utterance.
    pub final_state: PlayerSnapshot,
    /// Whether a `leave` command ended the run early.
    pub left: bool,
}

struct Collector {
    events: Vec<SimulationEvent>,
    cues: RecordingCues,
    playback: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl Collector {
    fn record(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Pulls in everything the dispatcher caused so far.
    fn flush(&mut self) {
        for cue in self.cues.take() {
            self.events.push(SimulationEvent::Cue { cue });
        }
        while let Ok(event) = self.playback.try_recv() {
            self.events.push(SimulationEvent::Playback(event));
        }
    }
}

/// Runs the utterances through a fresh voice session built from `config`.
pub async fn run(config: &Config, options: SimulationOptions) -> Result<SimulationReport> {
    config.validate()?;

    let speech = options
        .utterances
        .iter()
        .fold(MockSpeechEngine::new(), |engine, text| {
            engine.with_script(MockSpeechEngine::utterance(text), options.step)
        });

    let (playback_tx, playback) = mpsc::unbounded_channel();
    let (sink_tx, sink_rx) = mpsc::unbounded_channel();
    let controller = PlaybackController::new(
        Arc::new(MockResolver::synthetic()),
        Box::new(MockSink::new().with_events(sink_tx)),
        config.playback.clone(),
        playback_tx,
    );
    let (player, _player_task) = actor::spawn(controller, sink_rx);

    let cues = RecordingCues::new();
    let dispatcher = Dispatcher::new(player.clone(), Arc::new(cues.clone()));
    let hotwords = |_: &SpeakerId| -> Result<Box<dyn HotwordEngine>> {
        Ok(Box::new(MockHotwordEngine::new(WAKE_LABEL)))
    };
    let mut voice = VoiceSession::new(
        SpeakerId::from(BOT),
        config,
        Arc::new(hotwords),
        Arc::new(speech),
        dispatcher,
    );

    let frames = voice
        .join(SpeakerId::from(SPEAKER))?
        .ok_or_else(|| VoiceDjError::Other("simulated speaker was not registered".to_string()))?;

    let mut collector = Collector {
        events: Vec::new(),
        cues,
        playback,
    };
    let mut left = false;

    'utterances: for (sequence, text) in options.utterances.iter().enumerate() {
        debug!(%text, "simulating utterance");
        frames
            .send(AudioFrame::new(
                sequence as u64,
                MockHotwordEngine::marker_samples(),
            ))
            .await
            .map_err(|_| VoiceDjError::Other("listener stopped".to_string()))?;

        loop {
            let Some(event) = voice.next_event().await else {
                break 'utterances;
            };
            let finished = !matches!(event, RecognitionEvent::Hotword { .. });
            collector.record(SimulationEvent::Recognition(event.clone()));

            let action = voice.handle_event(event).await?;
            collector.flush();
            if action == DispatchAction::Leave {
                left = true;
                break 'utterances;
            }
            if finished {
                break;
            }
        }
    }

    let final_state = player.snapshot().await?;
    drop(frames);
    if !left {
        voice.disconnect().await?;
        collector.flush();
    }

    Ok(SimulationReport {
        events: collector.events,
        final_state,
        left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::controller::PlaybackStatus;

    fn options(utterances: &[&str]) -> SimulationOptions {
        SimulationOptions::new(utterances.iter().map(|u| u.to_string()).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_then_pause() {
        let report = run(&Config::default(), options(&["play daft punk", "pause"]))
            .await
            .unwrap();

        assert_eq!(report.final_state.status, PlaybackStatus::Paused);
        assert_eq!(report.final_state.current.unwrap().query, "daft punk");
        assert!(!report.left);

        let commands: Vec<_> = report
            .events
            .iter()
            .filter_map(|e| match e {
                SimulationEvent::Recognition(RecognitionEvent::Command { name, .. }) => {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(commands, vec!["play", "pause"]);
        assert!(report.events.contains(&SimulationEvent::Cue { cue: Cue::Wake }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_words_are_bad_commands() {
        let report = run(&Config::default(), options(&["what time is it"]))
            .await
            .unwrap();

        assert!(report.events.iter().any(|e| matches!(
            e,
            SimulationEvent::Recognition(RecognitionEvent::BadCommand { text, .. })
                if text == "what"
        )));
        assert!(report.events.contains(&SimulationEvent::Cue { cue: Cue::Failure }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_ends_run_early() {
        let report = run(
            &Config::default(),
            options(&["play something", "leave", "play never reached"]),
        )
        .await
        .unwrap();

        assert!(report.left);
        assert_eq!(report.final_state.status, PlaybackStatus::Stopped);
        assert!(!report.events.iter().any(|e| matches!(
            e,
            SimulationEvent::Recognition(RecognitionEvent::Command { argument, .. })
                if argument == "never reached"
        )));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(SimulationEvent::Cue { cue: Cue::Wake }).unwrap();
        assert_eq!(json["source"], "cue");
        assert_eq!(json["cue"], "wake");
    }
}
