pub mod audio;
pub mod composition;
pub mod error;
pub mod events;
pub mod export;
pub mod playback;
pub mod settings;
pub mod speech;
pub mod studio;

pub use audio::{PcmFormat, RawAudio};
pub use composition::{Clip, Composition, Segment, SegmentId};
pub use error::{Result, StudioError};
pub use events::{EventSender, StudioEvent};
pub use playback::{ClipOutput, PlaybackOutcome, PlaybackSequencer, SequencerState};
pub use settings::{Settings, SettingsManager};
pub use speech::TextToSpeech;
pub use studio::{GenerationReport, Studio};
