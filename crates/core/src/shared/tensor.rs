use ndarray::{ArrayD, IxDyn};

use super::error::DetectionError;

/// Element type carried by a [`Tensor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    U8,
    F32,
}

/// Dense row-major tensor exchanged with the inference engine.
///
/// The element type is the variant tag, so consumers dispatch on it once
/// instead of probing types at every access.
#[derive(Clone, Debug, PartialEq)]
pub enum Tensor {
    U8(ArrayD<u8>),
    F32(ArrayD<f32>),
}

impl Tensor {
    pub fn from_u8(shape: &[usize], values: Vec<u8>) -> Result<Self, DetectionError> {
        shaped(shape, values).map(Tensor::U8)
    }

    pub fn from_f32(shape: &[usize], values: Vec<f32>) -> Result<Self, DetectionError> {
        shaped(shape, values).map(Tensor::F32)
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::U8(a) => a.shape(),
            Tensor::F32(a) => a.shape(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Tensor::U8(_) => ElementType::U8,
            Tensor::F32(_) => ElementType::F32,
        }
    }
}

fn shaped<T>(shape: &[usize], values: Vec<T>) -> Result<ArrayD<T>, DetectionError> {
    let len = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| {
        DetectionError::invalid_argument(format!(
            "buffer of {len} elements does not fit shape {shape:?}"
        ))
    })
}

/// Output tensors returned by one inference call, in the order the engine
/// reported them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamedTensorOutput {
    entries: Vec<(String, Tensor)>,
}

impl NamedTensorOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.entries.push((name.into(), tensor));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Tensor)> for NamedTensorOutput {
    fn from_iter<I: IntoIterator<Item = (S, Tensor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }
}
