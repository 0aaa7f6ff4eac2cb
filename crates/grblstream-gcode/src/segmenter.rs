//! Arc subdivision into linear moves

use crate::geometry::{Point, ResolvedArc};

/// Smallest angular step allowed, in radians
const MIN_STEP_RADIANS: f64 = 1e-6;

/// Splits resolved arcs into chords
///
/// The angular step is the smaller of the step that keeps every chord's
/// sagitta within `chord_tolerance` and `max_segment_degrees`. At least two
/// segments are always produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegmenter {
    /// Maximum distance between a chord and the true arc
    pub chord_tolerance: f64,
    /// Maximum angle swept by one chord, in degrees
    pub max_segment_degrees: f64,
    /// Fixed decimal places of emitted coordinates
    pub decimals: usize,
}

impl ArcSegmenter {
    /// Create a segmenter
    pub fn new(chord_tolerance: f64, max_segment_degrees: f64, decimals: usize) -> Self {
        Self {
            chord_tolerance,
            max_segment_degrees,
            decimals,
        }
    }

    /// Angular step used for an arc of the given radius
    pub fn angular_step(&self, radius: f64) -> f64 {
        let ratio = (1.0 - self.chord_tolerance / radius).clamp(-1.0, 1.0);
        let tolerance_step = 2.0 * ratio.acos();
        tolerance_step
            .min(self.max_segment_degrees.to_radians())
            .max(MIN_STEP_RADIANS)
    }

    /// Number of chords used for an arc
    pub fn segment_count(&self, arc: &ResolvedArc) -> usize {
        let step = self.angular_step(arc.radius);
        let steps = (arc.sweep.abs() / step).ceil() as usize;
        steps.max(2)
    }

    /// Chord end points along `arc`, finishing exactly at `end`
    pub fn points(&self, arc: &ResolvedArc, end: Point) -> Vec<Point> {
        let steps = self.segment_count(arc);
        let mut points = Vec::with_capacity(steps);
        for k in 1..steps {
            let angle = arc.start_angle + arc.sweep * (k as f64) / (steps as f64);
            points.push(arc.point_at(angle));
        }
        points.push(end);
        points
    }

    /// Format a linear move to `point`
    pub fn format_linear(&self, point: Point) -> String {
        format!(
            "G1 X{} Y{}",
            format_coordinate(point.x, self.decimals),
            format_coordinate(point.y, self.decimals)
        )
    }

    /// Linear moves approximating `arc`, finishing exactly at `end`
    pub fn segment(&self, arc: &ResolvedArc, end: Point) -> Vec<String> {
        self.points(arc, end)
            .into_iter()
            .map(|point| self.format_linear(point))
            .collect()
    }
}

/// Fixed-precision coordinate; negative zero prints without its sign
fn format_coordinate(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn half_circle() -> ResolvedArc {
        ResolvedArc {
            center: Point::new(5.0, 0.0),
            radius: 5.0,
            start_angle: PI,
            sweep: -PI,
        }
    }

    #[test]
    fn test_step_limited_by_max_degrees() {
        let segmenter = ArcSegmenter::new(0.01, 10.0, 4);
        // Tolerance step for r=5, e=0.01 is about 7.2 degrees.
        let step = segmenter.angular_step(5.0);
        assert!(step < 10f64.to_radians());
        assert!((step - 2.0 * (1.0 - 0.01 / 5.0f64).acos()).abs() < 1e-12);

        let coarse = ArcSegmenter::new(1.0, 10.0, 4);
        assert!((coarse.angular_step(5.0) - 10f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_tolerance_larger_than_diameter() {
        let segmenter = ArcSegmenter::new(100.0, 360.0, 4);
        assert!((segmenter.angular_step(1.0) - 2.0 * PI).abs() < 1e-12);
        assert_eq!(segmenter.segment_count(&half_circle()), 2);
    }

    #[test]
    fn test_zero_step_is_floored() {
        let segmenter = ArcSegmenter::new(0.01, 0.0, 4);
        assert_eq!(segmenter.angular_step(5.0), MIN_STEP_RADIANS);
    }

    #[test]
    fn test_half_circle_ends_exactly() {
        let segmenter = ArcSegmenter::new(0.01, 10.0, 4);
        let lines = segmenter.segment(&half_circle(), Point::new(10.0, 0.0));
        assert_eq!(lines.len(), segmenter.segment_count(&half_circle()));
        assert_eq!(lines.last().map(String::as_str), Some("G1 X10.0000 Y0.0000"));
        // Clockwise from (0,0) around (5,0) passes over the top.
        let points = segmenter.points(&half_circle(), Point::new(10.0, 0.0));
        for point in &points[..points.len() - 1] {
            assert!(point.y > 0.0);
            assert!((point.distance_to(&Point::new(5.0, 0.0)) - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_format_linear() {
        let segmenter = ArcSegmenter::new(0.01, 10.0, 3);
        assert_eq!(
            segmenter.format_linear(Point::new(1.23456, -2.0)),
            "G1 X1.235 Y-2.000"
        );
        assert_eq!(
            segmenter.format_linear(Point::new(-0.00001, -0.0)),
            "G1 X0.000 Y0.000"
        );
    }
}
