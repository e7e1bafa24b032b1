use crate::detection::domain::confidence_filter::ConfidenceFilter;
use crate::detection::domain::image_preprocessor::ImagePreprocessor;
use crate::detection::domain::inference_engine::{EngineProvider, InferenceEngine};
use crate::detection::domain::non_max_suppressor::NonMaxSuppressor;
use crate::detection::domain::output_decoder::OutputDecoder;
use crate::shared::detection::DetectionResult;
use crate::shared::error::DetectionError;
use crate::shared::frame::Frame;

use super::detection_config::DetectionConfig;

/// Person detection: preprocess → infer → decode → filter → suppress.
///
/// Owns at most one inference engine and serves one `detect` call at a time.
/// Without a ready engine every call yields an empty result.
pub struct DetectionPipeline {
    engine: Option<Box<dyn InferenceEngine>>,
    config: DetectionConfig,
    preprocessor: ImagePreprocessor,
    decoder: OutputDecoder,
    filter: ConfidenceFilter,
    suppressor: NonMaxSuppressor,
}

impl DetectionPipeline {
    pub fn new(engine: Box<dyn InferenceEngine>, config: DetectionConfig) -> Self {
        Self::build(Some(engine), config)
    }

    /// A pipeline with no engine attached.
    pub fn unready(config: DetectionConfig) -> Self {
        Self::build(None, config)
    }

    /// Bring `provider` up if needed and take an engine from it. Bootstrap
    /// failures are returned, not deferred to `detect`.
    pub fn from_provider(
        provider: &mut dyn EngineProvider,
        config: DetectionConfig,
    ) -> Result<Self, DetectionError> {
        if !provider.is_ready() {
            let outcome = provider.ensure_ready();
            if !outcome.success {
                return Err(DetectionError::unavailable(
                    "inference engine failed to initialise",
                    outcome.error,
                ));
            }
        }
        let engine = provider.create_engine()?;
        Ok(Self::new(engine, config))
    }

    fn build(engine: Option<Box<dyn InferenceEngine>>, config: DetectionConfig) -> Self {
        Self {
            engine,
            preprocessor: ImagePreprocessor::new(config.resize_filter),
            decoder: OutputDecoder::new(config.input_width, config.input_height)
                .with_person_class(config.person_class_id),
            filter: ConfidenceFilter::new(config.confidence_threshold),
            suppressor: NonMaxSuppressor::new(config.iou_threshold),
            config,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_ready())
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::invalid_argument(format!(
                "frame has zero dimension ({}x{})",
                frame.width(),
                frame.height()
            )));
        }

        let Some(engine) = self.engine.as_mut().filter(|e| e.is_ready()) else {
            log::debug!("Inference engine not ready; returning no detections");
            return Ok(DetectionResult::empty());
        };

        let tensor = self.preprocessor.preprocess(
            frame,
            self.config.input_width,
            self.config.input_height,
        )?;

        let input_name = engine.input_name().to_string();
        let outputs = engine.run(&input_name, tensor)?;
        if outputs.is_empty() {
            log::debug!("Inference engine returned no outputs");
        }
        let candidates = self.decoder.decode(&outputs, frame.width(), frame.height());
        drop(outputs);

        let decoded = candidates.len();
        let confident = self.filter.filter(candidates);
        let confident_count = confident.len();
        let detections = self.suppressor.suppress(confident);
        log::debug!(
            "Decoded {decoded} candidates, {confident_count} confident, {} after NMS",
            detections.len()
        );

        Ok(DetectionResult::new(detections))
    }
}
