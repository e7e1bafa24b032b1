use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use ndarray::Array4;

use crate::shared::error::DetectionError;
use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::tensor::Tensor;

/// Converts a decoded frame into the NCHW byte tensor the model consumes.
///
/// Output planes are always ordered R, G, B regardless of the frame's pixel
/// order. Values are left in 0-255; the model does its own normalisation.
#[derive(Clone, Copy, Debug)]
pub struct ImagePreprocessor {
    filter: FilterType,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(FilterType::Triangle)
    }
}

impl ImagePreprocessor {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resize `frame` to `target_width` x `target_height` and lay it out as a
    /// `[1, 3, target_height, target_width]` uint8 tensor.
    pub fn preprocess(
        &self,
        frame: &Frame,
        target_width: u32,
        target_height: u32,
    ) -> Result<Tensor, DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::invalid_argument(format!(
                "frame has zero dimension ({}x{})",
                frame.width(),
                frame.height()
            )));
        }
        if target_width == 0 || target_height == 0 {
            return Err(DetectionError::invalid_argument(format!(
                "target size has zero dimension ({target_width}x{target_height})"
            )));
        }

        // The resampler treats the three bytes of a pixel independently, so
        // the source order survives resizing untouched.
        let resized;
        let pixels: &[u8] = if (frame.width(), frame.height()) == (target_width, target_height) {
            frame.data()
        } else {
            let src = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(
                frame.width(),
                frame.height(),
                frame.data(),
            )
            .ok_or_else(|| DetectionError::invalid_argument("frame buffer is too small"))?;
            resized = imageops::resize(&src, target_width, target_height, self.filter);
            resized.as_raw()
        };

        Ok(Tensor::U8(
            to_planar_rgb(pixels, frame, target_width, target_height).into_dyn(),
        ))
    }
}

/// Interleaved pixels → planar R, G, B.
fn to_planar_rgb(pixels: &[u8], frame: &Frame, width: u32, height: u32) -> Array4<u8> {
    let w = width as usize;
    let h = height as usize;
    let offsets = frame.pixel_order().rgb_offsets();

    let mut tensor = Array4::<u8>::zeros((1, CHANNELS, h, w));
    for (i, px) in pixels.chunks_exact(CHANNELS).enumerate().take(w * h) {
        let y = i / w;
        let x = i % w;
        for (c, &offset) in offsets.iter().enumerate() {
            tensor[[0, c, y, x]] = px[offset];
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelOrder;
    use rstest::rstest;

    fn uniform_bgr(width: u32, height: u32, bgr: [u8; 3]) -> Frame {
        let data = bgr.repeat((width * height) as usize);
        Frame::from_bgr(data, width, height).unwrap()
    }

    fn bytes(t: &Tensor) -> &ndarray::ArrayD<u8> {
        match t {
            Tensor::U8(a) => a,
            Tensor::F32(_) => panic!("expected uint8 tensor"),
        }
    }

    #[test]
    fn test_output_shape_is_nchw() {
        let frame = uniform_bgr(32, 16, [0, 0, 0]);
        let t = ImagePreprocessor::default()
            .preprocess(&frame, 64, 48)
            .unwrap();
        assert_eq!(t.shape(), &[1, 3, 48, 64]);
    }

    #[rstest]
    #[case::upscale(4, 2, 8, 8)]
    #[case::downscale(40, 30, 8, 6)]
    #[case::same_size(8, 8, 8, 8)]
    fn test_bgr_is_swapped_to_rgb_planes(
        #[case] w: u32,
        #[case] h: u32,
        #[case] tw: u32,
        #[case] th: u32,
    ) {
        let frame = uniform_bgr(w, h, [10, 20, 30]);
        let t = ImagePreprocessor::default()
            .preprocess(&frame, tw, th)
            .unwrap();
        let a = bytes(&t);
        for y in 0..th as usize {
            for x in 0..tw as usize {
                assert_eq!(a[[0, 0, y, x]], 30, "R plane");
                assert_eq!(a[[0, 1, y, x]], 20, "G plane");
                assert_eq!(a[[0, 2, y, x]], 10, "B plane");
            }
        }
    }

    #[test]
    fn test_same_size_copies_every_pixel() {
        // 2x2 BGR with distinct pixels
        let data = vec![
            1, 2, 3, 4, 5, 6, //
            7, 8, 9, 10, 11, 12,
        ];
        let frame = Frame::from_bgr(data, 2, 2).unwrap();
        let t = ImagePreprocessor::default().preprocess(&frame, 2, 2).unwrap();
        let a = bytes(&t);

        // pixel (x=1, y=0) is B=4 G=5 R=6
        assert_eq!(a[[0, 0, 0, 1]], 6);
        assert_eq!(a[[0, 1, 0, 1]], 5);
        assert_eq!(a[[0, 2, 0, 1]], 4);
        // pixel (x=0, y=1) is B=7 G=8 R=9
        assert_eq!(a[[0, 0, 1, 0]], 9);
        assert_eq!(a[[0, 2, 1, 0]], 7);
    }

    #[test]
    fn test_rgb_frame_is_not_swapped() {
        let frame = Frame::new(vec![10, 20, 30].repeat(4), 2, 2, PixelOrder::Rgb).unwrap();
        let t = ImagePreprocessor::default().preprocess(&frame, 2, 2).unwrap();
        let a = bytes(&t);
        assert_eq!(a[[0, 0, 0, 0]], 10);
        assert_eq!(a[[0, 2, 0, 0]], 30);
    }

    #[test]
    fn test_values_are_not_normalized() {
        let frame = uniform_bgr(4, 4, [255, 255, 255]);
        let t = ImagePreprocessor::new(FilterType::Nearest)
            .preprocess(&frame, 16, 16)
            .unwrap();
        assert!(bytes(&t).iter().all(|&v| v == 255));
    }

    #[test]
    fn test_source_frame_is_untouched() {
        let frame = uniform_bgr(10, 10, [1, 2, 3]);
        let before = frame.data().to_vec();
        ImagePreprocessor::default()
            .preprocess(&frame, 20, 20)
            .unwrap();
        assert_eq!(frame.data(), &before[..]);
    }

    #[rstest]
    #[case::zero_width(0, 10)]
    #[case::zero_height(10, 0)]
    fn test_zero_dimension_frame_is_invalid(#[case] w: u32, #[case] h: u32) {
        let frame = Frame::from_bgr(Vec::new(), w, h).unwrap();
        let err = ImagePreprocessor::default()
            .preprocess(&frame, 640, 640)
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_target_is_invalid() {
        let frame = uniform_bgr(4, 4, [0, 0, 0]);
        let err = ImagePreprocessor::default()
            .preprocess(&frame, 0, 640)
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidArgument(_)));
    }
}
