//! Recognition pipeline: wake phrase, transcription, command matching.
//!
//! ```text
//! ┌────────────┐    ┌─────────────┐    ┌─────────────┐    ┌───────────┐
//! │  Speaker   │───▶│ HotwordGate │───▶│ Transcriber │───▶│  Matcher  │───▶ RecognitionEvent
//! │  frames    │    │ (idle)      │    │ (listening) │    │           │
//! └────────────┘    └─────────────┘    └─────────────┘    └───────────┘
//!                          ▲                  │
//!                          └── session end ───┘
//! ```

pub mod command;
pub mod engine;
pub mod frame;
pub mod gate;
pub mod listener;
pub mod matcher;
pub mod session;
pub mod transcriber;

pub use command::{Command, CommandTable};
pub use engine::{
    HotwordDetection, HotwordEngine, MockHotwordEngine, MockSpeechEngine, RecognitionRequest,
    SpeechEngine, SpeechEvent, SpeechStream, TranscriptUpdate,
};
pub use frame::AudioFrame;
pub use gate::{GateEvent, GateState, HotwordGate};
pub use listener::{Listener, RecognitionEvent, SpeakerId};
pub use matcher::{CommandMatcher, Evaluation, MatchState};
pub use session::{SessionEvent, SessionId};
pub use transcriber::{SessionOutcome, Transcriber, TranscriberConfig};
