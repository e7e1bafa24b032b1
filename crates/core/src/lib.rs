//! Person detection post-processing for object-detection models.
//!
//! A [`pipeline::detection_pipeline::DetectionPipeline`] turns a decoded image
//! into a list of person bounding boxes: it resizes the image into the
//! model's NCHW input, runs an [`InferenceEngine`](detection::domain::inference_engine::InferenceEngine),
//! decodes quantized or float outputs, filters by confidence and applies
//! non-maximum suppression.

pub mod detection;
pub mod pipeline;
pub mod shared;
