use super::error::DetectionError;

/// Bytes per pixel of every frame handled by the pipeline.
pub const CHANNELS: usize = 3;

/// Byte order of the three interleaved channels of a pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelOrder {
    /// Blue, green, red. What most native bitmap decoders deliver.
    #[default]
    Bgr,
    /// Red, green, blue. What the `image` crate delivers.
    Rgb,
}

impl PixelOrder {
    /// Offsets of the red, green and blue bytes within one pixel.
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelOrder::Bgr => [2, 1, 0],
            PixelOrder::Rgb => [0, 1, 2],
        }
    }
}

/// A decoded raster image: contiguous interleaved 3-channel bytes in
/// row-major order.
///
/// Frames are immutable once built; the preprocessor only borrows them.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: PixelOrder,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<Self, DetectionError> {
        let expected = (width as usize) * (height as usize) * CHANNELS;
        if data.len() != expected {
            return Err(DetectionError::invalid_argument(format!(
                "frame data length {} does not match {width}x{height}x{CHANNELS} = {expected}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Convenience constructor for BGR pixel data.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32) -> Result<Self, DetectionError> {
        Self::new(data, width, height, PixelOrder::Bgr)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_order(&self) -> PixelOrder {
        self.order
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
