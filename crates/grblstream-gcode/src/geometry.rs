//! Arc geometry resolution
//!
//! Reconstructs center, radius, start angle and signed sweep of a circular
//! arc from either center-offset (`I`/`J`) or radius (`R`) notation. Angles
//! are right-handed: positive sweep is counter-clockwise.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Radius below which an arc is treated as a straight move
pub const MIN_ARC_RADIUS: f64 = 1e-9;

/// Chord length below which a radius arc is treated as a straight move
pub const MIN_CHORD_LENGTH: f64 = 1e-12;

/// A point in the XY plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle of this point as seen from `center`
    pub fn angle_from(&self, center: &Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x)
    }
}

/// How an arc's circle is specified
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcForm {
    /// `I`/`J` center offsets (interpreted per the arc-center mode)
    CenterOffset {
        /// X offset (or absolute center X)
        i: f64,
        /// Y offset (or absolute center Y)
        j: f64,
        /// Offsets are relative to the start point
        incremental: bool,
    },
    /// Signed radius; positive selects the minor arc, negative the major arc
    Radius(f64),
}

/// An arc as written in a program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSpec {
    /// Position before the move
    pub start: Point,
    /// Target of the move
    pub end: Point,
    /// `G2` (true) or `G3` (false)
    pub clockwise: bool,
    /// Center or radius data
    pub form: ArcForm,
}

/// A fully determined arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedArc {
    /// Circle center
    pub center: Point,
    /// Circle radius
    pub radius: f64,
    /// Angle of the start point around the center
    pub start_angle: f64,
    /// Signed sweep; negative for clockwise, `|sweep| <= 2π`
    pub sweep: f64,
}

impl ResolvedArc {
    /// Point on the circle at `angle`
    pub fn point_at(&self, angle: f64) -> Point {
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }
}

/// Normalize an angle into `(-π, π]`
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    while angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

/// Signed sweep from `start_angle` to `end_angle` turning the requested way
fn directed_sweep(start_angle: f64, end_angle: f64, clockwise: bool) -> f64 {
    let mut sweep = normalize_angle(end_angle - start_angle);
    if clockwise && sweep > 0.0 {
        sweep -= 2.0 * PI;
    }
    if !clockwise && sweep < 0.0 {
        sweep += 2.0 * PI;
    }
    sweep
}

fn arc_about(center: Point, radius: f64, spec: &ArcSpec) -> ResolvedArc {
    let start_angle = spec.start.angle_from(&center);
    let end_angle = spec.end.angle_from(&center);
    ResolvedArc {
        center,
        radius,
        start_angle,
        sweep: directed_sweep(start_angle, end_angle, spec.clockwise),
    }
}

/// Resolve an arc's circle and sweep
///
/// Returns `None` when the arc degenerates to a straight move (zero radius,
/// or coincident start and end in radius form); the caller then emits a
/// single linear move to the end point.
pub fn resolve_arc(spec: &ArcSpec) -> Option<ResolvedArc> {
    match spec.form {
        ArcForm::CenterOffset { i, j, incremental } => {
            let center = if incremental {
                Point::new(spec.start.x + i, spec.start.y + j)
            } else {
                Point::new(i, j)
            };
            let radius = spec.start.distance_to(&center);
            if radius <= MIN_ARC_RADIUS {
                return None;
            }
            let mut arc = arc_about(center, radius, spec);
            // Coincident endpoints with a center describe a full circle.
            if arc.sweep == 0.0 && spec.start.distance_to(&spec.end) <= MIN_CHORD_LENGTH {
                arc.sweep = if spec.clockwise { -2.0 * PI } else { 2.0 * PI };
            }
            Some(arc)
        }
        ArcForm::Radius(r) => resolve_radius_arc(spec, r),
    }
}

fn resolve_radius_arc(spec: &ArcSpec, r: f64) -> Option<ResolvedArc> {
    let dx = spec.end.x - spec.start.x;
    let dy = spec.end.y - spec.start.y;
    let chord = dx.hypot(dy);
    if chord <= MIN_CHORD_LENGTH {
        return None;
    }

    // An unreachable radius is widened to the half chord.
    let half_chord = chord / 2.0;
    let radius = r.abs().max(half_chord);
    if radius <= MIN_ARC_RADIUS {
        return None;
    }

    let mid = Point::new(
        (spec.start.x + spec.end.x) / 2.0,
        (spec.start.y + spec.end.y) / 2.0,
    );
    let h = (radius * radius - half_chord * half_chord).max(0.0).sqrt();
    let (nx, ny) = (-dy / chord, dx / chord);

    let first = arc_about(Point::new(mid.x + nx * h, mid.y + ny * h), radius, spec);
    let second = arc_about(Point::new(mid.x - nx * h, mid.y - ny * h), radius, spec);

    let chosen = if r > 0.0 {
        if first.sweep.abs() <= second.sweep.abs() {
            first
        } else {
            second
        }
    } else if first.sweep.abs() >= second.sweep.abs() {
        first
    } else {
        second
    };

    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < EPS);
        assert!((normalize_angle(-PI) - PI).abs() < EPS);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < EPS);
        assert!((normalize_angle(5.0 * PI / 2.0) - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_center_offset_half_circle_clockwise() {
        let spec = ArcSpec {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            clockwise: true,
            form: ArcForm::CenterOffset {
                i: 5.0,
                j: 0.0,
                incremental: true,
            },
        };
        let arc = resolve_arc(&spec).expect("arc should resolve");
        assert_eq!(arc.center, Point::new(5.0, 0.0));
        assert!((arc.radius - 5.0).abs() < EPS);
        assert!((arc.sweep + PI).abs() < EPS);
    }

    #[test]
    fn test_absolute_center_mode() {
        let spec = ArcSpec {
            start: Point::new(10.0, 0.0),
            end: Point::new(0.0, 10.0),
            clockwise: false,
            form: ArcForm::CenterOffset {
                i: 0.0,
                j: 0.0,
                incremental: false,
            },
        };
        let arc = resolve_arc(&spec).expect("arc should resolve");
        assert_eq!(arc.center, Point::new(0.0, 0.0));
        assert!((arc.sweep - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_zero_radius_degenerates() {
        let spec = ArcSpec {
            start: Point::new(1.0, 1.0),
            end: Point::new(2.0, 2.0),
            clockwise: true,
            form: ArcForm::CenterOffset {
                i: 0.0,
                j: 0.0,
                incremental: true,
            },
        };
        assert!(resolve_arc(&spec).is_none());
    }

    #[test]
    fn test_coincident_endpoints_make_full_circle() {
        let spec = ArcSpec {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, 0.0),
            clockwise: false,
            form: ArcForm::CenterOffset {
                i: 5.0,
                j: 0.0,
                incremental: true,
            },
        };
        let arc = resolve_arc(&spec).expect("arc should resolve");
        assert!((arc.sweep - 2.0 * PI).abs() < EPS);

        let cw = resolve_arc(&ArcSpec {
            clockwise: true,
            ..spec
        })
        .expect("arc should resolve");
        assert!((cw.sweep + 2.0 * PI).abs() < EPS);
    }

    #[test]
    fn test_radius_clamped_to_half_chord() {
        let spec = ArcSpec {
            start: Point::new(10.0, 0.0),
            end: Point::new(0.0, 10.0),
            clockwise: false,
            form: ArcForm::Radius(5.0),
        };
        let arc = resolve_arc(&spec).expect("arc should resolve");
        assert!((arc.radius - 50.0_f64.sqrt()).abs() < 1e-9);
        assert!((arc.center.x - 5.0).abs() < 1e-9);
        assert!((arc.center.y - 5.0).abs() < 1e-9);
        assert!((arc.sweep - PI).abs() < 1e-9);
    }

    #[test]
    fn test_radius_sign_selects_minor_or_major() {
        let base = ArcSpec {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            clockwise: true,
            form: ArcForm::Radius(10.0),
        };
        let minor = resolve_arc(&base).expect("minor arc");
        assert!(minor.sweep < 0.0);
        assert!(minor.sweep.abs() <= PI);

        let major = resolve_arc(&ArcSpec {
            form: ArcForm::Radius(-10.0),
            ..base
        })
        .expect("major arc");
        assert!(major.sweep < 0.0);
        assert!(major.sweep.abs() >= PI);
        assert!((minor.sweep.abs() + major.sweep.abs() - 2.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_radius_coincident_points_degenerate() {
        let spec = ArcSpec {
            start: Point::new(3.0, 3.0),
            end: Point::new(3.0, 3.0),
            clockwise: true,
            form: ArcForm::Radius(5.0),
        };
        assert!(resolve_arc(&spec).is_none());
    }
}
