use anyhow::Result;

use super::tally::FrameTally;
use crate::decoder::FrameSource;
use crate::model::PostureModel;

/// Raw frames between two classified frames: `max(1, round(native / target))`.
///
/// Halves round to even. A rate the container could not report (zero, negative
/// or NaN) samples every frame.
pub fn sampling_interval(native_fps: f64, target_fps: u32) -> u64 {
    if target_fps == 0 {
        return 1;
    }
    let ratio = native_fps / target_fps as f64;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 1;
    }
    (ratio.round_ties_even() as u64).max(1)
}

/// Outcome of one pass over a video.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingRun {
    pub native_fps: f64,
    pub target_fps: u32,
    pub interval: u64,
    pub total_frames: u64,
    pub processed_frames: u64,
    pub tally: FrameTally,
}

/// Walks `source` to the end, classifying every `interval`-th frame.
///
/// The source is released once after the loop, whether the loop finished or
/// failed.
pub fn run<S, M>(source: &mut S, model: &mut M, target_fps: u32) -> Result<SamplingRun>
where
    S: FrameSource,
    M: PostureModel<Frame = S::Frame>,
{
    let native_fps = source.fps();
    let interval = sampling_interval(native_fps, target_fps);

    crate::utils::logger::info(&format!(
        "Sampling: native {} fps, target {} fps, every {} frame(s), backend {}",
        native_fps,
        target_fps,
        interval,
        model.name()
    ));

    let mut run = SamplingRun {
        native_fps,
        target_fps,
        interval,
        total_frames: 0,
        processed_frames: 0,
        tally: FrameTally::new(),
    };

    let looped = classify_frames(source, model, &mut run);
    let released = source.release();
    looped?;
    released?;

    crate::utils::logger::info(&format!(
        "Finished: {} frames read, {} classified",
        run.total_frames, run.processed_frames
    ));

    Ok(run)
}

fn classify_frames<S, M>(source: &mut S, model: &mut M, run: &mut SamplingRun) -> Result<()>
where
    S: FrameSource,
    M: PostureModel<Frame = S::Frame>,
{
    while let Some(frame) = source.read_frame()? {
        if run.total_frames % run.interval == 0 {
            let output = model.predict(&frame)?;
            let prediction = model.get_results(&output)?;
            let label = run.tally.record(prediction.class_index);
            run.processed_frames += 1;

            crate::utils::logger::debug(&format!(
                "frame {}: class={:?} conf={:.3} bbox={:?} -> {}",
                run.total_frames, prediction.class_index, prediction.confidence, prediction.bbox, label
            ));
        }
        run.total_frames += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::Prediction;
    use crate::shared::constants::{LABEL_SITTING_BAD, LABEL_SITTING_GOOD, LABEL_UNDETECTED};
    use anyhow::anyhow;

    /// Frames are just their stream index.
    struct FakeSource {
        fps: f64,
        frames: u64,
        next: u64,
        releases: u32,
        fail_at: Option<u64>,
    }

    impl FakeSource {
        fn new(fps: f64, frames: u64) -> Self {
            Self { fps, frames, next: 0, releases: 0, fail_at: None }
        }
    }

    impl FrameSource for FakeSource {
        type Frame = u64;

        fn fps(&self) -> f64 {
            self.fps
        }

        fn read_frame(&mut self) -> Result<Option<u64>> {
            if self.fail_at == Some(self.next) {
                return Err(anyhow!("corrupt packet at frame {}", self.next));
            }
            if self.next >= self.frames {
                return Ok(None);
            }
            self.next += 1;
            Ok(Some(self.next - 1))
        }

        fn release(&mut self) -> Result<()> {
            self.releases += 1;
            Ok(())
        }
    }

    /// Returns a class index chosen from the frame index.
    struct FakeModel<F: Fn(u64) -> Option<usize>> {
        classify: F,
        seen: Vec<u64>,
    }

    impl<F: Fn(u64) -> Option<usize>> FakeModel<F> {
        fn new(classify: F) -> Self {
            Self { classify, seen: Vec::new() }
        }
    }

    impl<F: Fn(u64) -> Option<usize>> PostureModel for FakeModel<F> {
        type Frame = u64;
        type Output = Option<usize>;

        fn name(&self) -> &'static str {
            "fake"
        }

        fn predict(&mut self, frame: &u64) -> Result<Option<usize>> {
            self.seen.push(*frame);
            Ok((self.classify)(*frame))
        }

        fn get_results(&self, output: &Option<usize>) -> Result<Prediction> {
            Ok(Prediction {
                bbox: [0.0; 4],
                class_index: *output,
                confidence: 0.5,
            })
        }
    }

    #[test]
    fn test_interval_rounding() {
        assert_eq!(sampling_interval(30.0, 5), 6);
        assert_eq!(sampling_interval(29.97, 5), 6);
        assert_eq!(sampling_interval(24.0, 5), 5);
        assert_eq!(sampling_interval(25.0, 10), 2); // 2.5 rounds to even
        assert_eq!(sampling_interval(35.0, 10), 4); // 3.5 rounds to even
        assert_eq!(sampling_interval(5.0, 5), 1);
    }

    #[test]
    fn test_interval_never_below_one() {
        assert_eq!(sampling_interval(1.0, 30), 1);
        assert_eq!(sampling_interval(0.0, 5), 1);
        assert_eq!(sampling_interval(-3.0, 5), 1);
        assert_eq!(sampling_interval(f64::NAN, 5), 1);
        assert_eq!(sampling_interval(f64::INFINITY, 5), 1);
        assert_eq!(sampling_interval(30.0, 0), 1);
    }

    #[test]
    fn test_thirty_fps_sixty_frames() {
        let mut source = FakeSource::new(30.0, 60);
        let mut model = FakeModel::new(|_| Some(0));

        let run = run(&mut source, &mut model, 5).unwrap();
        assert_eq!(run.interval, 6);
        assert_eq!(run.total_frames, 60);
        assert_eq!(run.processed_frames, 10);
        assert_eq!(model.seen, vec![0, 6, 12, 18, 24, 30, 36, 42, 48, 54]);
        assert_eq!(run.tally.get(LABEL_SITTING_GOOD), 10);
        assert_eq!(source.releases, 1);
    }

    #[test]
    fn test_processed_is_ceil_of_total_over_interval() {
        for (fps, frames, target) in [(30.0, 61, 5), (25.0, 1, 5), (60.0, 119, 7), (24.0, 100, 24)] {
            let mut source = FakeSource::new(fps, frames);
            let mut model = FakeModel::new(|i| Some((i % 3) as usize));

            let run = run(&mut source, &mut model, target).unwrap();
            assert_eq!(run.processed_frames, (frames + run.interval - 1) / run.interval);
            assert_eq!(run.tally.total(), run.processed_frames);
        }
    }

    #[test]
    fn test_empty_video() {
        let mut source = FakeSource::new(30.0, 0);
        let mut model = FakeModel::new(|_| Some(0));

        let run = run(&mut source, &mut model, 5).unwrap();
        assert_eq!(run.total_frames, 0);
        assert_eq!(run.processed_frames, 0);
        assert_eq!(run.tally.total(), 0);
        assert_eq!(source.releases, 1);
    }

    #[test]
    fn test_out_of_table_indices_are_undetected() {
        let mut source = FakeSource::new(10.0, 20);
        let mut model = FakeModel::new(|i| if i % 2 == 0 { Some(5) } else { None });

        let run = run(&mut source, &mut model, 5).unwrap();
        assert_eq!(run.processed_frames, 10);
        assert_eq!(run.tally.get(LABEL_UNDETECTED), 10);
        assert_eq!(run.tally.get(LABEL_SITTING_GOOD), 0);
        assert_eq!(run.tally.get(LABEL_SITTING_BAD), 0);
    }

    #[test]
    fn test_read_error_still_releases() {
        let mut source = FakeSource::new(30.0, 60);
        source.fail_at = Some(13);
        let mut model = FakeModel::new(|_| Some(1));

        let err = run(&mut source, &mut model, 5).unwrap_err();
        assert!(err.to_string().contains("frame 13"));
        assert_eq!(source.releases, 1);
    }
}
