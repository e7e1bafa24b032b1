/// ONNX Runtime adapter for the [`InferenceEngine`] and [`EngineProvider`]
/// domain traits, via `ort`.
use std::fmt::Display;
use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::ValueType;

use crate::detection::domain::inference_engine::{
    EngineProvider, InferenceEngine, ReadinessOutcome,
};
use crate::shared::error::{BoxedError, DetectionError};
use crate::shared::tensor::{NamedTensorOutput, Tensor};

use super::execution_provider::{accelerator_name, preferred_execution_providers};

fn ort_error(e: impl Display) -> BoxedError {
    e.to_string().into()
}

/// Load a model with the platform's preferred execution providers.
fn load_session(model_path: &Path) -> Result<Session, BoxedError> {
    let session = Session::builder()
        .map_err(ort_error)?
        .with_execution_providers(preferred_execution_providers())
        .map_err(ort_error)?
        .commit_from_file(model_path)
        .map_err(ort_error)?;
    Ok(session)
}

/// Inference engine backed by an exclusively owned ONNX Runtime session.
///
/// The session is released when the engine is dropped.
pub struct OrtInferenceEngine {
    session: Session,
    input_name: String,
}

impl OrtInferenceEngine {
    pub fn new(model_path: &Path) -> Result<Self, DetectionError> {
        let session = load_session(model_path).map_err(|e| {
            DetectionError::unavailable(
                format!("failed to load model {}", model_path.display()),
                Some(e),
            )
        })?;
        Self::from_session(session)
    }

    /// Wrap a loaded session. The model must declare exactly one input.
    pub fn from_session(session: Session) -> Result<Self, DetectionError> {
        let names: Vec<String> = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();
        let input_name = single_input_name(names)?;
        Ok(Self {
            session,
            input_name,
        })
    }
}

fn single_input_name(mut names: Vec<String>) -> Result<String, DetectionError> {
    if names.len() != 1 {
        return Err(DetectionError::unavailable(
            format!("model must declare exactly one input, found {names:?}"),
            None,
        ));
    }
    Ok(names.remove(0))
}

impl InferenceEngine for OrtInferenceEngine {
    fn input_name(&self) -> &str {
        &self.input_name
    }

    fn run(
        &mut self,
        input_name: &str,
        tensor: Tensor,
    ) -> Result<NamedTensorOutput, DetectionError> {
        let value = match tensor {
            Tensor::U8(a) => ort::value::Tensor::from_array(a)
                .map_err(|e| DetectionError::inference(ort_error(e)))?
                .into_dyn(),
            Tensor::F32(a) => ort::value::Tensor::from_array(a)
                .map_err(|e| DetectionError::inference(ort_error(e)))?
                .into_dyn(),
        };

        let outputs = self
            .session
            .run(ort::inputs![input_name => value])
            .map_err(|e| DetectionError::inference(ort_error(e)))?;

        // Copy out before `outputs` (and the runtime memory behind it) drops.
        let mut named = NamedTensorOutput::new();
        for (name, value) in outputs.iter() {
            let tensor = match value.dtype() {
                ValueType::Tensor {
                    ty: TensorElementType::Uint8,
                    ..
                } => value
                    .try_extract_array::<u8>()
                    .map(|a| Tensor::U8(a.to_owned())),
                ValueType::Tensor {
                    ty: TensorElementType::Float32,
                    ..
                } => value
                    .try_extract_array::<f32>()
                    .map(|a| Tensor::F32(a.to_owned())),
                other => {
                    log::warn!("Skipping model output '{name}' of unsupported type {other:?}");
                    continue;
                }
            }
            .map_err(|e| DetectionError::inference(ort_error(e)))?;
            named.push(name, tensor);
        }
        Ok(named)
    }
}

/// Bootstraps ONNX Runtime for one model file and hands out an engine.
pub struct OrtEngineProvider {
    model_path: PathBuf,
    session: Option<Session>,
}

impl OrtEngineProvider {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            session: None,
        }
    }
}

impl EngineProvider for OrtEngineProvider {
    fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    fn ensure_ready(&mut self) -> ReadinessOutcome {
        if self.session.is_some() {
            return ReadinessOutcome::ready();
        }
        if !self.model_path.exists() {
            return ReadinessOutcome::failed(format!(
                "model file not found: {}",
                self.model_path.display()
            ));
        }
        match load_session(&self.model_path) {
            Ok(session) => {
                log::info!(
                    "Loaded {} ({} provider requested)",
                    self.model_path.display(),
                    accelerator_name()
                );
                self.session = Some(session);
                ReadinessOutcome::ready()
            }
            Err(e) => ReadinessOutcome::failed(e),
        }
    }

    fn create_engine(&mut self) -> Result<Box<dyn InferenceEngine>, DetectionError> {
        let session = self.session.take().ok_or_else(|| {
            DetectionError::unavailable("inference session has not been initialised", None)
        })?;
        Ok(Box::new(OrtInferenceEngine::from_session(session)?))
    }
}
