pub mod frame_source;
pub mod video;

pub use frame_source::FrameSource;
pub use video::VideoDecoder;
