pub mod frame_extractor;
pub mod logger;

pub use frame_extractor::read_frames;
pub use frame_extractor::FrameExtractor;
pub use frame_extractor::Result;
pub use logger::ContextLogger;
