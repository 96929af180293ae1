//! Playback of segment clips through an output device

pub mod mock;
pub mod output;
pub mod sequencer;

pub use mock::{MockOutput, MockPlayback, OutputEvent};
pub use output::{ClipHandle, ClipOutput};
pub use sequencer::{PlaybackOutcome, PlaybackSequencer, SequencerState};
