use anyhow::{anyhow, Result};

use super::classifier::Prediction;

/// Raw tensor copied out of the network together with what is needed to map
/// boxes back into frame coordinates.
#[derive(Clone, Debug)]
pub struct RawOutput {
    pub shape: Vec<i32>,
    pub data: Vec<f32>,
    /// Frame size divided by network input size, per axis.
    pub scale: (f32, f32),
}

/// Decodes YOLO output into the best prediction.
///
/// - `[1, nc]`: classification head, plain argmax.
/// - `[1, 4 + nc, N]` (channel-major): YOLOv8 detection head, no objectness.
/// - `[1, N, 5 + nc]` (anchor-major): YOLOv5 detection head, score is
///   `objectness * class`.
///
/// Anchors always outnumber channels (8400 / 25200 vs a handful), which is
/// how the two detection layouts are told apart.
pub fn decode(output: &RawOutput, confidence_threshold: f32) -> Result<Prediction> {
    if output.shape.iter().any(|&d| d <= 0) {
        return Err(anyhow!("model output has a non-positive dimension: {:?}", output.shape));
    }
    let expected: usize = output.shape.iter().map(|&d| d as usize).product();
    if expected != output.data.len() {
        return Err(anyhow!(
            "model output shape {:?} does not match {} values",
            output.shape,
            output.data.len()
        ));
    }

    match output.shape.as_slice() {
        [1, classes] => decode_classification(&output.data, *classes as usize),
        [1, a, b] if a <= b => {
            let (channels, anchors) = (*a as usize, *b as usize);
            if channels <= 4 {
                return Err(anyhow!("detection output has no class channels: {:?}", output.shape));
            }
            Ok(decode_detection(
                &output.data,
                Layout::ChannelMajor { channels, anchors },
                output.scale,
                confidence_threshold,
            ))
        }
        [1, a, b] => {
            let (anchors, channels) = (*a as usize, *b as usize);
            if channels <= 5 {
                return Err(anyhow!("detection output has no class channels: {:?}", output.shape));
            }
            Ok(decode_detection(
                &output.data,
                Layout::AnchorMajor { channels, anchors },
                output.scale,
                confidence_threshold,
            ))
        }
        other => Err(anyhow!("unsupported model output shape {:?}", other)),
    }
}

#[derive(Clone, Copy, Debug)]
enum Layout {
    /// YOLOv8: `cx, cy, w, h, cls...` rows, one column per anchor.
    ChannelMajor { channels: usize, anchors: usize },
    /// YOLOv5: one `cx, cy, w, h, obj, cls...` row per anchor.
    AnchorMajor { channels: usize, anchors: usize },
}

impl Layout {
    fn anchors(self) -> usize {
        match self {
            Layout::ChannelMajor { anchors, .. } | Layout::AnchorMajor { anchors, .. } => anchors,
        }
    }

    /// First class channel.
    fn class_offset(self) -> usize {
        match self {
            Layout::ChannelMajor { .. } => 4,
            Layout::AnchorMajor { .. } => 5,
        }
    }

    fn channels(self) -> usize {
        match self {
            Layout::ChannelMajor { channels, .. } | Layout::AnchorMajor { channels, .. } => channels,
        }
    }

    fn at(self, data: &[f32], channel: usize, anchor: usize) -> f32 {
        match self {
            Layout::ChannelMajor { anchors, .. } => data[channel * anchors + anchor],
            Layout::AnchorMajor { channels, .. } => data[anchor * channels + channel],
        }
    }

    fn score(self, data: &[f32], channel: usize, anchor: usize) -> f32 {
        match self {
            Layout::ChannelMajor { .. } => self.at(data, channel, anchor),
            Layout::AnchorMajor { .. } => self.at(data, 4, anchor) * self.at(data, channel, anchor),
        }
    }
}

fn decode_classification(data: &[f32], classes: usize) -> Result<Prediction> {
    let best = data
        .iter()
        .take(classes)
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, score)| match best {
            Some((_, s)) if s >= score => best,
            _ => Some((idx, score)),
        });

    let (idx, score) = best.ok_or_else(|| anyhow!("classification output is empty"))?;
    Ok(Prediction {
        bbox: [0.0; 4],
        class_index: Some(idx),
        confidence: score,
    })
}

fn decode_detection(data: &[f32], layout: Layout, scale: (f32, f32), threshold: f32) -> Prediction {
    let offset = layout.class_offset();

    let mut best: Option<(usize, usize, f32)> = None; // (anchor, class, score)
    for a in 0..layout.anchors() {
        for c in offset..layout.channels() {
            let score = layout.score(data, c, a);
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((a, c - offset, score));
            }
        }
    }

    let Some((anchor, class, score)) = best else {
        return Prediction::undetected();
    };
    if score < threshold {
        return Prediction::undetected();
    }

    let (sx, sy) = scale;
    let cx = layout.at(data, 0, anchor) * sx;
    let cy = layout.at(data, 1, anchor) * sy;
    let w = layout.at(data, 2, anchor) * sx;
    let h = layout.at(data, 3, anchor) * sy;

    Prediction {
        bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        class_index: Some(class),
        confidence: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNELS: usize = 6; // cx, cy, w, h, class 0, class 1
    const ANCHORS: usize = 8;

    fn raw(shape: Vec<i32>, data: Vec<f32>) -> RawOutput {
        RawOutput { shape, data, scale: (1.0, 1.0) }
    }

    /// Channel-major `[1, 6, 8]` tensor with the given anchors filled in.
    fn detection_output(rows: &[(usize, [f32; CHANNELS])]) -> RawOutput {
        let mut data = vec![0.0; CHANNELS * ANCHORS];
        for (anchor, values) in rows {
            for (c, v) in values.iter().enumerate() {
                data[c * ANCHORS + anchor] = *v;
            }
        }
        raw(vec![1, CHANNELS as i32, ANCHORS as i32], data)
    }

    #[test]
    fn test_detection_picks_highest_class_score() {
        let output = detection_output(&[
            (0, [10.0, 10.0, 4.0, 4.0, 0.1, 0.05]),
            (3, [20.0, 20.0, 4.0, 4.0, 0.3, 0.2]),
            (5, [30.0, 30.0, 8.0, 8.0, 0.2, 0.9]),
        ]);
        let pred = decode(&output, 0.25).unwrap();
        assert_eq!(pred.class_index, Some(1));
        assert_eq!(pred.confidence, 0.9);
        assert_eq!(pred.bbox, [26.0, 26.0, 34.0, 34.0]);
    }

    #[test]
    fn test_detection_below_threshold_is_undetected() {
        let output = detection_output(&[(2, [1.0, 1.0, 1.0, 1.0, 0.1, 0.2])]);
        let pred = decode(&output, 0.25).unwrap();
        assert_eq!(pred, Prediction::undetected());
        assert_eq!(pred.class_index, None);
    }

    /// Anchor-major YOLOv5 `[1, 8, 7]` tensor: cx, cy, w, h, obj, class 0, class 1.
    fn objectness_output(rows: &[(usize, [f32; 7])]) -> RawOutput {
        let mut data = vec![0.0; ANCHORS * 7];
        for (anchor, values) in rows {
            data[anchor * 7..anchor * 7 + 7].copy_from_slice(values);
        }
        raw(vec![1, ANCHORS as i32, 7], data)
    }

    #[test]
    fn test_objectness_layout_skips_obj_channel() {
        let output = objectness_output(&[(7, [100.0, 100.0, 20.0, 40.0, 0.6, 0.05, 0.9])]);
        let pred = decode(&output, 0.25).unwrap();
        assert_eq!(pred.class_index, Some(1));
        assert!((pred.confidence - 0.54).abs() < 1e-6);
        assert_eq!(pred.bbox, [90.0, 80.0, 110.0, 120.0]);
    }

    #[test]
    fn test_objectness_weights_class_scores() {
        // A confident class on a low-objectness anchor loses to a weaker class
        // on a likely one.
        let mut output = objectness_output(&[
            (1, [10.0, 10.0, 4.0, 4.0, 0.2, 0.1, 0.95]),
            (4, [100.0, 100.0, 20.0, 40.0, 0.9, 0.7, 0.1]),
        ]);
        output.scale = (2.0, 0.5);
        let pred = decode(&output, 0.25).unwrap();
        assert_eq!(pred.class_index, Some(0));
        assert_eq!(pred.bbox, [180.0, 40.0, 220.0, 60.0]);
    }

    #[test]
    fn test_objectness_below_threshold_is_undetected() {
        let output = objectness_output(&[(0, [1.0, 1.0, 1.0, 1.0, 0.3, 0.5, 0.4])]);
        assert_eq!(decode(&output, 0.25).unwrap(), Prediction::undetected());
    }

    #[test]
    fn test_classification_argmax() {
        let pred = decode(&raw(vec![1, 3], vec![0.2, 0.1, 0.7]), 0.25).unwrap();
        assert_eq!(pred.class_index, Some(2));
        assert_eq!(pred.confidence, 0.7);
    }

    #[test]
    fn test_classification_ignores_threshold() {
        let pred = decode(&raw(vec![1, 2], vec![0.1, 0.2]), 0.25).unwrap();
        assert_eq!(pred.class_index, Some(1));
        assert_eq!(pred.confidence, 0.2);
    }

    #[test]
    fn test_bad_shapes_are_errors() {
        assert!(decode(&raw(vec![1, 6, 8], vec![0.0; 6]), 0.25).is_err());
        assert!(decode(&raw(vec![2, 2, 2, 2], vec![0.0; 16]), 0.25).is_err());
        assert!(decode(&raw(vec![1, 8, 4], vec![0.0; 32]), 0.25).is_err());
        assert!(decode(&raw(vec![1, 8, 5], vec![0.0; 40]), 0.25).is_err());
    }

    #[test]
    fn test_non_positive_dimensions_are_errors() {
        assert!(decode(&raw(vec![1, -1, 5], vec![]), 0.25).is_err());
        assert!(decode(&raw(vec![1, 0, 5], vec![]), 0.25).is_err());
        assert!(decode(&raw(vec![1, -2], vec![]), 0.25).is_err());
    }
}
