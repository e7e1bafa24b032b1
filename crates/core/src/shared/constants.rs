/// Spatial size of the model input tensor.
pub const INPUT_WIDTH: u32 = 640;
pub const INPUT_HEIGHT: u32 = 640;

/// Minimum confidence a detection needs to be reported.
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Candidates below this confidence are dropped while decoding.
pub const EARLY_REJECT_THRESHOLD: f32 = 0.05;

/// NMS IoU threshold.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Boxes narrower or shorter than this (original-image pixels) are degenerate.
pub const MIN_BOX_SIZE: f32 = 4.0;

/// Boxes larger than this multiple of the original dimension are degenerate.
pub const MAX_BOX_RATIO: f32 = 2.0;

/// Number of leading candidates sampled to infer quantization parameters.
pub const QUANT_SAMPLE_CANDIDATES: usize = 100;

/// Raw values per candidate box: x1, y1, x2, y2.
pub const BOX_CHANNELS: usize = 4;

pub const PERSON_LABEL: &str = "Person";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
