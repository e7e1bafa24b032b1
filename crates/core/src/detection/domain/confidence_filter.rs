use crate::shared::constants::CONFIDENCE_THRESHOLD;
use crate::shared::detection::Detection;

/// Keeps confident detections, ordered by confidence descending.
#[derive(Clone, Copy, Debug)]
pub struct ConfidenceFilter {
    threshold: f32,
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self::new(CONFIDENCE_THRESHOLD)
    }
}

impl ConfidenceFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Drop detections below the threshold, then sort the rest. The sort is
    /// stable, so equal confidences keep their input order.
    pub fn filter(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let mut kept: Vec<Detection> = detections
            .into_iter()
            .filter(|d| d.confidence >= self.threshold)
            .collect();
        kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::detection::BoundingBox;
    use rstest::rstest;

    fn det(confidence: f32, x: f32) -> Detection {
        Detection::person(confidence, BoundingBox::new(x, 0.0, 10.0, 10.0))
    }

    fn confidences(dets: &[Detection]) -> Vec<f32> {
        dets.iter().map(|d| d.confidence).collect()
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(ConfidenceFilter::default().threshold(), 0.8);
    }

    #[test]
    fn test_keeps_at_or_above_threshold() {
        let dets = vec![det(0.79, 0.0), det(0.8, 1.0), det(0.95, 2.0)];
        let kept = ConfidenceFilter::default().filter(dets);
        assert_eq!(confidences(&kept), vec![0.95, 0.8]);
    }

    #[test]
    fn test_sorts_descending() {
        let dets = vec![det(0.81, 0.0), det(0.99, 1.0), det(0.9, 2.0)];
        let kept = ConfidenceFilter::default().filter(dets);
        assert_eq!(confidences(&kept), vec![0.99, 0.9, 0.81]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let dets = vec![det(0.9, 1.0), det(0.95, 0.0), det(0.9, 2.0), det(0.9, 3.0)];
        let kept = ConfidenceFilter::default().filter(dets);
        let xs: Vec<f32> = kept.iter().map(|d| d.bbox.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(ConfidenceFilter::default().filter(Vec::new()).is_empty());
    }

    #[rstest]
    #[case(0.1, 0.5)]
    #[case(0.5, 0.8)]
    #[case(0.8, 0.95)]
    #[case(0.95, 1.0)]
    fn test_raising_threshold_never_keeps_more(#[case] low: f32, #[case] high: f32) {
        let dets: Vec<Detection> = (0..50)
            .map(|i| det((i as f32 * 0.37) % 1.0, i as f32))
            .collect();
        let kept_low = ConfidenceFilter::new(low).filter(dets.clone()).len();
        let kept_high = ConfidenceFilter::new(high).filter(dets).len();
        assert!(kept_high <= kept_low);
    }
}
