use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use person_detect_core::detection::infrastructure::onnx_inference_engine::OrtEngineProvider;
use person_detect_core::pipeline::detection_config::DetectionConfig;
use person_detect_core::pipeline::detection_pipeline::DetectionPipeline;
use person_detect_core::shared::constants::{
    CONFIDENCE_THRESHOLD, IMAGE_EXTENSIONS, INPUT_WIDTH, NMS_IOU_THRESHOLD,
};
use person_detect_core::shared::detection::DetectionResult;
use person_detect_core::shared::frame::{Frame, PixelOrder};

/// Detect people in an image with an ONNX object-detection model.
#[derive(Parser)]
#[command(name = "person-detect")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// ONNX model file.
    #[arg(long)]
    model: PathBuf,

    /// Minimum confidence for a reported detection (0.0-1.0).
    #[arg(long, default_value_t = CONFIDENCE_THRESHOLD)]
    confidence: f32,

    /// IoU above which overlapping detections are suppressed (0.0-1.0).
    #[arg(long, default_value_t = NMS_IOU_THRESHOLD)]
    iou: f32,

    /// Square model input size in pixels.
    #[arg(long, default_value_t = INPUT_WIDTH)]
    input_size: u32,

    /// Only keep this class id when the model reports classes.
    #[arg(long)]
    class_id: Option<u32>,

    /// Print detections as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = DetectionConfig {
        input_width: cli.input_size,
        input_height: cli.input_size,
        confidence_threshold: cli.confidence,
        iou_threshold: cli.iou,
        person_class_id: cli.class_id,
        ..DetectionConfig::default()
    };

    let mut provider = OrtEngineProvider::new(&cli.model);
    let mut pipeline = DetectionPipeline::from_provider(&mut provider, config)?;

    let frame = read_frame(&cli.input)?;
    log::info!(
        "Read {} ({}x{})",
        cli.input.display(),
        frame.width(),
        frame.height()
    );

    let result = pipeline.detect(&frame)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if !is_image(&cli.input) {
        return Err(format!("Unsupported image file: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err("--confidence must be between 0.0 and 1.0".into());
    }
    if !(0.0..=1.0).contains(&cli.iou) {
        return Err("--iou must be between 0.0 and 1.0".into());
    }
    if cli.input_size == 0 {
        return Err("--input-size must be positive".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Decode an image file into an RGB frame.
fn read_frame(path: &Path) -> Result<Frame, Box<dyn Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, PixelOrder::Rgb)?)
}

fn print_result(result: &DetectionResult) {
    println!("{} detection(s)", result.count());
    for d in result {
        println!(
            "{} {:.2} x={:.0} y={:.0} w={:.0} h={:.0}",
            d.label, d.confidence, d.bbox.x, d.bbox.y, d.bbox.width, d.bbox.height
        );
    }
}
