mod core;
mod decoder;
mod model;
mod shared;
mod utils;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use opencv::core::Mat;
use std::path::Path;

use crate::core::{report, sampler};
use crate::decoder::VideoDecoder;
use crate::model::{PostureModel, YoloPostureModel};
use crate::shared::constants;
use crate::utils::settings::ModelSettings;

/// Samples a video, classifies posture on each sampled frame and writes a
/// per-posture summary to the console and posture_report.csv.
#[derive(Parser, Debug)]
#[command(name = "report_generator", author, version, about, long_about = None)]
struct Cli {
    /// Video file to analyse
    video_path: String,
    /// Posture model (a .pt reference resolves to its .onnx export)
    #[arg(default_value = constants::DEFAULT_MODEL_PATH)]
    model_path: String,
    /// Frames per second to classify
    #[arg(default_value_t = constants::DEFAULT_TARGET_FPS, value_parser = clap::value_parser!(u32).range(1..))]
    target_fps: u32,
    /// Also print the run summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Minimum class score for a detection (overrides the settings file)
    #[arg(long)]
    confidence: Option<f32>,
    /// Square network input size in pixels (overrides the settings file)
    #[arg(long)]
    input_size: Option<u32>,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(1);
            }
        },
    }
}

fn main() -> Result<()> {
    // 1. Initialize Logger (error.log / debug.log)
    crate::utils::logger::init();

    // 2. Arguments; usage errors exit 1
    let cli = parse_cli();
    crate::utils::logger::info(&format!("{:?}", cli));

    if let Err(err) = run(&cli) {
        crate::utils::logger::error(&format!("{:#}", err));
        return Err(err);
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let settings = ModelSettings::load(Path::new(constants::SETTINGS_FILE))?
        .with_overrides(cli.confidence, cli.input_size)?;

    // Model first; a bad video path is reported after the model is up
    let mut model = YoloPostureModel::load(&cli.model_path, settings)?;

    generate_report(&mut model, cli, Path::new(constants::REPORT_FILE))
}

/// Opens the video, samples it through `model` and writes the report to
/// `report_path`. Nothing is written unless the whole video was processed.
fn generate_report<M>(model: &mut M, cli: &Cli, report_path: &Path) -> Result<()>
where
    M: PostureModel<Frame = Mat>,
{
    let mut decoder = VideoDecoder::open(&cli.video_path)?;

    let run = sampler::run(&mut decoder, model, cli.target_fps)?;

    print!("{}", report::render_console(&run));

    report::write_csv(report_path, &run)?;
    println!("Report saved to {}", report_path.display());

    if cli.json {
        println!("{}", report::render_json(&run)?);
    }

    Ok(())
}
