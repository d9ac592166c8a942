pub mod compositor;
pub mod dissimilarity;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod frame_extractor;
pub mod frame_source;
pub mod keyframes;
pub mod peaks;
pub mod pipeline;
pub mod plot;
pub mod smoothing;

pub use error::StillsError;
pub use frame_source::{FrameSource, Frames};
