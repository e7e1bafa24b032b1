//! Turns the raw output tensors of a detection model into person candidates.
//!
//! Output names are not standardised across exports, so each tensor's role
//! (boxes, scores, classes) is guessed from its name with a positional
//! fallback. Byte and float outputs are classified separately and exactly one
//! numeric branch decodes a given call: the byte branch when a byte boxes
//! tensor exists, the float branch otherwise.

use ndarray::ArrayD;

use crate::shared::constants::{
    BOX_CHANNELS, EARLY_REJECT_THRESHOLD, INPUT_HEIGHT, INPUT_WIDTH, MAX_BOX_RATIO, MIN_BOX_SIZE,
    QUANT_SAMPLE_CANDIDATES,
};
use crate::shared::detection::{BoundingBox, Detection};
use crate::shared::error::DetectionError;
use crate::shared::tensor::{NamedTensorOutput, Tensor};

/// Role a model output plays in decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputRole {
    Boxes,
    Scores,
    Classes,
}

impl OutputRole {
    /// Role implied by an output name, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("box") {
            Some(OutputRole::Boxes)
        } else if name.contains("score") || name.contains("conf") {
            Some(OutputRole::Scores)
        } else if name.contains("class") || name.contains("label") {
            Some(OutputRole::Classes)
        } else {
            None
        }
    }
}

/// Outputs of one element type, sorted into roles.
#[derive(Debug)]
pub struct OutputRoles<'a, T> {
    pub boxes: Option<&'a ArrayD<T>>,
    pub scores: Option<&'a ArrayD<T>>,
    pub classes: Option<&'a ArrayD<T>>,
}

impl<T> Default for OutputRoles<'_, T> {
    fn default() -> Self {
        Self {
            boxes: None,
            scores: None,
            classes: None,
        }
    }
}

impl<'a, T> OutputRoles<'a, T> {
    /// Assign `tensor` by name; unnamed tensors fill the first empty slot in
    /// boxes, scores, classes order.
    fn assign(&mut self, name: &str, tensor: &'a ArrayD<T>) {
        match OutputRole::from_name(name) {
            Some(OutputRole::Boxes) => self.boxes = Some(tensor),
            Some(OutputRole::Scores) => self.scores = Some(tensor),
            Some(OutputRole::Classes) => self.classes = Some(tensor),
            None => {
                if self.boxes.is_none() {
                    self.boxes = Some(tensor);
                } else if self.scores.is_none() {
                    self.scores = Some(tensor);
                } else if self.classes.is_none() {
                    self.classes = Some(tensor);
                } else {
                    log::debug!("Ignoring surplus model output '{name}'");
                }
            }
        }
    }
}

/// Classify every output, keeping byte and float tensors apart.
pub fn classify_outputs(
    outputs: &NamedTensorOutput,
) -> (OutputRoles<'_, u8>, OutputRoles<'_, f32>) {
    let mut bytes = OutputRoles::default();
    let mut floats = OutputRoles::default();
    for (name, tensor) in outputs.iter() {
        match tensor {
            Tensor::U8(a) => bytes.assign(name, a),
            Tensor::F32(a) => floats.assign(name, a),
        }
    }
    (bytes, floats)
}

/// Affine dequantization inferred from the observed byte range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantization {
    pub scale: f32,
    pub zero_point: f32,
}

impl Quantization {
    /// Estimate parameters from the first [`QUANT_SAMPLE_CANDIDATES`] boxes of
    /// `raw` (four bytes per box), mapping the observed range onto
    /// `[0, target_width]`.
    ///
    /// A flat sample carries no range information; the full byte range is
    /// assumed instead.
    pub fn estimate(raw: &[u8], target_width: u32) -> Self {
        let sample_len = (raw.len() / BOX_CHANNELS).min(QUANT_SAMPLE_CANDIDATES) * BOX_CHANNELS;
        let sample = &raw[..sample_len];

        let min = sample.iter().copied().min().unwrap_or(0);
        let max = sample.iter().copied().max().unwrap_or(u8::MAX);
        if max <= min {
            return Self {
                scale: target_width as f32 / u8::MAX as f32,
                zero_point: 0.0,
            };
        }
        Self {
            scale: target_width as f32 / (max - min) as f32,
            zero_point: min as f32,
        }
    }

    pub fn dequantize(&self, raw: u8) -> f32 {
        (raw as f32 - self.zero_point) * self.scale
    }
}

/// Number of candidates in a `[1, N, 4]` boxes tensor.
fn candidate_count(shape: &[usize]) -> Result<usize, DetectionError> {
    match shape {
        [1, n, BOX_CHANNELS] => Ok(*n),
        _ => Err(DetectionError::MalformedModelOutput(format!(
            "boxes tensor has shape {shape:?}, expected [1, N, {BOX_CHANNELS}]"
        ))),
    }
}

/// Per-candidate reader over a `[1, N]` or `[1, N, K]` tensor, taking the
/// first column of the latter.
struct ColumnReader<'a, T> {
    data: &'a [T],
    stride: usize,
}

impl<'a, T: Copy> ColumnReader<'a, T> {
    fn new(tensor: &'a ArrayD<T>, candidates: usize, role: &str) -> Result<Self, DetectionError> {
        let stride = match tensor.shape() {
            [1, n] if *n >= candidates => 1,
            [1, n, k] if *n >= candidates && *k >= 1 => *k,
            shape => {
                return Err(DetectionError::MalformedModelOutput(format!(
                    "{role} tensor has shape {shape:?}, expected [1, {candidates}] or [1, {candidates}, K]"
                )));
            }
        };
        let data = tensor.as_slice().ok_or_else(|| {
            DetectionError::MalformedModelOutput(format!("{role} tensor is not contiguous"))
        })?;
        Ok(Self { data, stride })
    }

    fn get(&self, i: usize) -> T {
        self.data[i * self.stride]
    }
}

/// Decodes named model outputs into person detections in original-image
/// coordinates.
#[derive(Clone, Debug)]
pub struct OutputDecoder {
    input_width: u32,
    input_height: u32,
    early_reject: f32,
    min_box_size: f32,
    max_box_ratio: f32,
    person_class_id: Option<u32>,
}

impl Default for OutputDecoder {
    fn default() -> Self {
        Self::new(INPUT_WIDTH, INPUT_HEIGHT)
    }
}

impl OutputDecoder {
    pub fn new(input_width: u32, input_height: u32) -> Self {
        Self {
            input_width,
            input_height,
            early_reject: EARLY_REJECT_THRESHOLD,
            min_box_size: MIN_BOX_SIZE,
            max_box_ratio: MAX_BOX_RATIO,
            person_class_id: None,
        }
    }

    /// Keep only candidates of this class when a classes output exists.
    pub fn with_person_class(mut self, class_id: Option<u32>) -> Self {
        self.person_class_id = class_id;
        self
    }

    /// Decode all candidates. A boxes, scores or (when filtering by class)
    /// classes output that cannot be read yields no detections rather than an
    /// error. Confidence defaults to 1.0 only when there is no scores output.
    pub fn decode(
        &self,
        outputs: &NamedTensorOutput,
        orig_width: u32,
        orig_height: u32,
    ) -> Vec<Detection> {
        let (bytes, floats) = classify_outputs(outputs);

        let decoded = if let Some(boxes) = bytes.boxes {
            self.decode_quantized(boxes, &bytes, orig_width, orig_height)
        } else if let Some(boxes) = floats.boxes {
            self.decode_float(boxes, &floats, orig_width, orig_height)
        } else {
            log::debug!("No boxes output among {} model outputs", outputs.len());
            return Vec::new();
        };

        decoded.unwrap_or_else(|e| {
            log::warn!("{e}; producing no detections");
            Vec::new()
        })
    }

    fn decode_quantized(
        &self,
        boxes: &ArrayD<u8>,
        roles: &OutputRoles<'_, u8>,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Detection>, DetectionError> {
        let n = candidate_count(boxes.shape())?;
        let raw = contiguous(boxes)?;
        let quant = Quantization::estimate(raw, self.input_width);
        log::debug!(
            "Byte boxes: {n} candidates, scale={:.4} zero_point={}",
            quant.scale,
            quant.zero_point
        );

        let scores = roles
            .scores
            .map(|s| ColumnReader::new(s, n, "scores"))
            .transpose()?;
        let classes = self.class_reader(roles.classes, n)?;

        let mut detections = Vec::new();
        for (i, chunk) in raw.chunks_exact(BOX_CHANNELS).take(n).enumerate() {
            let corners = [
                quant.dequantize(chunk[0]),
                quant.dequantize(chunk[1]),
                quant.dequantize(chunk[2]),
                quant.dequantize(chunk[3]),
            ];
            let confidence = scores.as_ref().map_or(1.0, |s| s.get(i) as f32 / 255.0);
            let class_id = classes.as_ref().map(|c| c.get(i) as u32);
            if let Some(d) = self.candidate(corners, confidence, class_id, orig_width, orig_height)
            {
                detections.push(d);
            }
        }
        Ok(detections)
    }

    fn decode_float(
        &self,
        boxes: &ArrayD<f32>,
        roles: &OutputRoles<'_, f32>,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Detection>, DetectionError> {
        let n = candidate_count(boxes.shape())?;
        let raw = contiguous(boxes)?;
        log::debug!("Float boxes: {n} candidates");

        let scores = roles
            .scores
            .map(|s| ColumnReader::new(s, n, "scores"))
            .transpose()?;
        let classes = self.class_reader(roles.classes, n)?;
        let (iw, ih) = (self.input_width as f32, self.input_height as f32);

        let mut detections = Vec::new();
        for (i, chunk) in raw.chunks_exact(BOX_CHANNELS).take(n).enumerate() {
            let mut corners = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if corners.iter().all(|&v| v <= 1.0) {
                // normalised fractions of the model input
                corners[0] *= iw;
                corners[1] *= ih;
                corners[2] *= iw;
                corners[3] *= ih;
            }
            let confidence = scores.as_ref().map_or(1.0, |s| s.get(i).clamp(0.0, 1.0));
            let class_id = classes.as_ref().map(|c| c.get(i).round() as u32);
            if let Some(d) = self.candidate(corners, confidence, class_id, orig_width, orig_height)
            {
                detections.push(d);
            }
        }
        Ok(detections)
    }

    fn class_reader<'a, T: Copy>(
        &self,
        classes: Option<&'a ArrayD<T>>,
        n: usize,
    ) -> Result<Option<ColumnReader<'a, T>>, DetectionError> {
        if self.person_class_id.is_none() {
            return Ok(None);
        }
        classes
            .map(|c| ColumnReader::new(c, n, "classes"))
            .transpose()
    }

    /// Shared tail of both branches. `corners` are `(x1, y1, x2, y2)` in
    /// model-input pixels.
    fn candidate(
        &self,
        corners: [f32; 4],
        confidence: f32,
        class_id: Option<u32>,
        orig_width: u32,
        orig_height: u32,
    ) -> Option<Detection> {
        let (iw, ih) = (self.input_width as f32, self.input_height as f32);
        let x1 = corners[0].clamp(0.0, iw);
        let y1 = corners[1].clamp(0.0, ih);
        let x2 = corners[2].clamp(0.0, iw);
        let y2 = corners[3].clamp(0.0, ih);

        // negated so NaN is rejected too
        if !(confidence >= self.early_reject) {
            return None;
        }
        if let (Some(want), Some(got)) = (self.person_class_id, class_id) {
            if want != got {
                return None;
            }
        }

        let sx = orig_width as f32 / iw;
        let sy = orig_height as f32 / ih;
        let bbox = BoundingBox::from_corners(x1 * sx, y1 * sy, x2 * sx, y2 * sy);

        let max_w = orig_width as f32 * self.max_box_ratio;
        let max_h = orig_height as f32 * self.max_box_ratio;
        let plausible = bbox.width >= self.min_box_size
            && bbox.height >= self.min_box_size
            && bbox.x >= 0.0
            && bbox.y >= 0.0
            && bbox.width <= max_w
            && bbox.height <= max_h;
        if !plausible {
            return None;
        }

        Some(Detection::person(confidence, bbox))
    }
}

fn contiguous<T>(tensor: &ArrayD<T>) -> Result<&[T], DetectionError> {
    tensor.as_slice().ok_or_else(|| {
        DetectionError::MalformedModelOutput("boxes tensor is not contiguous".to_string())
    })
}
