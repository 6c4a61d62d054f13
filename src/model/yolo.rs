use anyhow::{anyhow, Context, Result};
use opencv::{core, dnn, prelude::*};
use std::path::{Path, PathBuf};

use super::classifier::{PostureModel, Prediction};
use super::postprocess::{self, RawOutput};
use crate::utils::settings::ModelSettings;

/// YOLO posture model executed through OpenCV's DNN module.
pub struct YoloPostureModel {
    net: dnn::Net,
    settings: ModelSettings,
}

/// OpenCV cannot read PyTorch checkpoints; prefer the ONNX export that
/// `yolo export format=onnx` leaves next to the `.pt` file.
pub fn resolve_model_path(path: &Path) -> PathBuf {
    let is_torch = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("pt"));

    if is_torch {
        let onnx = path.with_extension("onnx");
        if onnx.exists() {
            return onnx;
        }
    }
    path.to_path_buf()
}

impl YoloPostureModel {
    pub fn load(model_path: &str, settings: ModelSettings) -> Result<Self> {
        let resolved = resolve_model_path(Path::new(model_path));
        let resolved_str = resolved
            .to_str()
            .ok_or_else(|| anyhow!("model path is not valid UTF-8: {}", resolved.display()))?;

        crate::utils::logger::info(&format!(
            "Loading posture model {} (requested {}), input {}px, confidence >= {}",
            resolved_str, model_path, settings.input_size, settings.confidence_threshold
        ));

        let net = dnn::read_net(resolved_str, "", "")
            .with_context(|| format!("failed to load posture model {}", resolved_str))?;
        if net.empty()? {
            anyhow::bail!("posture model {} has no layers", resolved_str);
        }

        Ok(Self { net, settings })
    }
}

impl PostureModel for YoloPostureModel {
    type Frame = core::Mat;
    type Output = RawOutput;

    fn name(&self) -> &'static str {
        "opencv-dnn-yolo"
    }

    fn predict(&mut self, frame: &core::Mat) -> Result<RawOutput> {
        let size = self.settings.input_size as i32;
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            core::Size::new(size, size),
            core::Scalar::default(),
            true,  // BGR -> RGB
            false, // stretch, no crop
            core::CV_32F,
        )?;

        self.net.set_input(&blob, "", 1.0, core::Scalar::default())?;
        let out = self.net.forward_single("").context("posture model forward pass failed")?;

        let shape = out.mat_size().to_vec();
        let data = out
            .data_typed::<f32>()
            .context("posture model output is not a continuous f32 tensor")?
            .to_vec();

        Ok(RawOutput {
            shape,
            data,
            scale: (
                frame.cols() as f32 / size as f32,
                frame.rows() as f32 / size as f32,
            ),
        })
    }

    fn get_results(&self, output: &RawOutput) -> Result<Prediction> {
        postprocess::decode(output, self.settings.confidence_threshold)
    }
}
