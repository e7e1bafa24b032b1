use crate::shared::constants::NMS_IOU_THRESHOLD;
use crate::shared::detection::Detection;

/// Greedy IoU-based non-maximum suppression.
#[derive(Clone, Copy, Debug)]
pub struct NonMaxSuppressor {
    iou_threshold: f32,
}

impl Default for NonMaxSuppressor {
    fn default() -> Self {
        Self::new(NMS_IOU_THRESHOLD)
    }
}

impl NonMaxSuppressor {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Accept the most confident remaining detection, drop everything that
    /// overlaps it by more than the threshold, repeat.
    ///
    /// Input is expected confidence-descending; it is stably re-sorted so the
    /// output order holds regardless.
    pub fn suppress(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let total = detections.len();
        let mut suppressed = vec![false; total];

        for i in 0..total {
            if suppressed[i] {
                continue;
            }
            for j in (i + 1)..total {
                if !suppressed[j] && detections[i].bbox.iou(&detections[j].bbox) > self.iou_threshold
                {
                    suppressed[j] = true;
                }
            }
        }

        let kept: Vec<Detection> = detections
            .into_iter()
            .zip(suppressed)
            .filter_map(|(d, s)| (!s).then_some(d))
            .collect();
        log::debug!("NMS kept {} of {total} detections", kept.len());
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::detection::BoundingBox;
    use approx::assert_relative_eq;

    fn det(confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::person(confidence, BoundingBox::new(x, y, w, h))
    }

    #[test]
    fn test_suppresses_overlapping() {
        let dets = vec![
            det(0.9, 0.0, 0.0, 100.0, 100.0),
            det(0.85, 5.0, 5.0, 100.0, 100.0),
        ];
        let kept = NonMaxSuppressor::default().suppress(dets);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_keeps_non_overlapping() {
        let dets = vec![
            det(0.9, 0.0, 0.0, 50.0, 50.0),
            det(0.85, 200.0, 200.0, 50.0, 50.0),
        ];
        assert_eq!(NonMaxSuppressor::default().suppress(dets).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(NonMaxSuppressor::default().suppress(Vec::new()).is_empty());
    }

    #[test]
    fn test_higher_confidence_wins_regardless_of_input_order() {
        let dets = vec![
            det(0.82, 0.0, 0.0, 100.0, 100.0),
            det(0.97, 2.0, 2.0, 100.0, 100.0),
        ];
        let kept = NonMaxSuppressor::default().suppress(dets);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.97);
    }

    #[test]
    fn test_iou_equal_to_threshold_is_kept() {
        // b is the top half of a: inter 5000, union 10000 → 0.5
        let dets = vec![
            det(0.9, 0.0, 0.0, 100.0, 100.0),
            det(0.85, 0.0, 0.0, 100.0, 50.0),
        ];
        let kept = NonMaxSuppressor::new(0.5).suppress(dets);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_overlapping_people_at_iou_point_six_in_wide_frame() {
        // 1280x720 image: a=[100,500]x[100,500], b shifted 100px right.
        // inter = 300*400 = 120000, union = 2*160000 - 120000 = 200000 → 0.6
        let a = det(0.95, 100.0, 100.0, 400.0, 400.0);
        let b = det(0.9, 200.0, 100.0, 400.0, 400.0);
        assert_relative_eq!(a.bbox.iou(&b.bbox), 0.6);

        let kept = NonMaxSuppressor::default().suppress(vec![b, a.clone()]);
        assert_eq!(kept, vec![a]);
    }

    #[test]
    fn test_suppressed_box_does_not_suppress_others() {
        // b overlaps a and c; a does not overlap c. b is removed by a, so c stays.
        let dets = vec![
            det(0.95, 0.0, 0.0, 100.0, 100.0),
            det(0.9, 50.0, 0.0, 100.0, 100.0),
            det(0.85, 100.0, 0.0, 100.0, 100.0),
        ];
        let kept = NonMaxSuppressor::new(0.3).suppress(dets);
        let xs: Vec<f32> = kept.iter().map(|d| d.bbox.x).collect();
        assert_eq!(xs, vec![0.0, 100.0]);
    }

    fn scattered(n: usize) -> Vec<Detection> {
        (0..n)
            .map(|i| {
                let f = i as f32;
                det(
                    1.0 - (f * 0.0031) % 0.5,
                    (f * 37.0) % 600.0,
                    (f * 53.0) % 400.0,
                    40.0 + (f * 7.0) % 80.0,
                    60.0 + (f * 11.0) % 120.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_output_is_confidence_descending_and_not_larger() {
        let input = scattered(300);
        let kept = NonMaxSuppressor::default().suppress(input.clone());
        assert!(kept.len() <= input.len());
        assert!(kept.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_idempotent() {
        let nms = NonMaxSuppressor::default();
        let once = nms.suppress(scattered(300));
        let twice = nms.suppress(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_kept_boxes_do_not_overlap_beyond_threshold() {
        let nms = NonMaxSuppressor::default();
        let kept = nms.suppress(scattered(200));
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.bbox.iou(&b.bbox) <= nms.iou_threshold());
            }
        }
    }
}
