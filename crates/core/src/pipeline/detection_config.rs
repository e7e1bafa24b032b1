use image::imageops::FilterType;

use crate::shared::constants::{
    CONFIDENCE_THRESHOLD, INPUT_HEIGHT, INPUT_WIDTH, NMS_IOU_THRESHOLD,
};

/// Tunables for a [`DetectionPipeline`](super::detection_pipeline::DetectionPipeline).
///
/// `Default` reproduces the fixed constants the model was calibrated with.
#[derive(Clone, Copy, Debug)]
pub struct DetectionConfig {
    pub input_width: u32,
    pub input_height: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Keep only this class id when the model emits a classes output.
    pub person_class_id: Option<u32>,
    pub resize_filter: FilterType,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            input_width: INPUT_WIDTH,
            input_height: INPUT_HEIGHT,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            iou_threshold: NMS_IOU_THRESHOLD,
            person_class_id: None,
            resize_filter: FilterType::Triangle,
        }
    }
}
