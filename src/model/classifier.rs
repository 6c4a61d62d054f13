use anyhow::Result;

/// Per-frame outcome of the posture model.
///
/// `bbox` is `[x1, y1, x2, y2]` in frame pixels and is all zeros when nothing
/// was detected. Only `class_index` feeds the report.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Prediction {
    pub bbox: [f32; 4],
    pub class_index: Option<usize>,
    pub confidence: f32,
}

impl Prediction {
    pub fn undetected() -> Self {
        Self::default()
    }
}

/// Inference seam. Loading, preprocessing and postprocessing stay behind it.
pub trait PostureModel {
    type Frame;
    type Output;

    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Runs the forward pass on one frame.
    fn predict(&mut self, frame: &Self::Frame) -> Result<Self::Output>;

    /// Reduces raw output to a single prediction.
    fn get_results(&self, output: &Self::Output) -> Result<Prediction>;
}
