use anyhow::Result;

/// Sequential source of decoded frames.
pub trait FrameSource {
    type Frame;

    /// Native frame rate as reported by the container.
    fn fps(&self) -> f64;

    /// Next frame in stream order, `None` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Self::Frame>>;

    /// Releases the underlying handle. Called once, after the read loop.
    fn release(&mut self) -> Result<()>;
}
