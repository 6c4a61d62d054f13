use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::sampler::SamplingRun;
use crate::shared::constants;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub posture: &'static str,
    pub frames: u64,
    pub seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub video_fps: f64,
    pub total_frames: u64,
    pub processed_frames: u64,
    pub sampling_interval: u64,
    pub target_fps: u32,
    pub rows: Vec<ReportRow>,
}

/// Report rows in label order. Seconds assume each classified frame stands for
/// `1 / target_fps` of footage.
pub fn rows(run: &SamplingRun) -> Vec<ReportRow> {
    run.tally
        .iter()
        .map(|(posture, frames)| ReportRow {
            posture,
            frames,
            seconds: frames as f64 / run.target_fps.max(1) as f64,
        })
        .collect()
}

pub fn summary(run: &SamplingRun) -> RunSummary {
    RunSummary {
        video_fps: run.native_fps,
        total_frames: run.total_frames,
        processed_frames: run.processed_frames,
        sampling_interval: run.interval,
        target_fps: run.target_fps,
        rows: rows(run),
    }
}

pub fn render_console(run: &SamplingRun) -> String {
    let mut out = String::new();
    out.push_str(&format!("Video FPS: {:?}\n", run.native_fps));
    out.push_str(&format!("Total frames: {}\n", run.total_frames));
    out.push_str(&format!("Processed frames: {}\n", run.processed_frames));
    for row in rows(run) {
        out.push_str(&format!("{}: {} frames, {:.2} seconds\n", row.posture, row.frames, row.seconds));
    }
    out
}

/// Semicolon-delimited CSV with CRLF line endings.
pub fn render_csv(run: &SamplingRun) -> String {
    let delimiter = constants::CSV_DELIMITER.to_string();
    let mut out = constants::CSV_HEADER.join(delimiter.as_str());
    out.push_str("\r\n");
    for row in rows(run) {
        out.push_str(&format!(
            "{}{d}{}{d}{:.2}\r\n",
            row.posture,
            row.frames,
            row.seconds,
            d = delimiter
        ));
    }
    out
}

/// Overwrites `path` with the CSV report.
pub fn write_csv(path: &Path, run: &SamplingRun) -> Result<()> {
    fs::write(path, render_csv(run))
        .with_context(|| format!("failed to write report {}", path.display()))?;
    crate::utils::logger::info(&format!("Report written to {}", path.display()));
    Ok(())
}

pub fn render_json(run: &SamplingRun) -> Result<String> {
    serde_json::to_string_pretty(&summary(run)).context("failed to serialize run summary")
}
