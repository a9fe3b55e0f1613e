use super::core::{Point3, Tolerance, Vec3};
use super::curve::{
    Curve3, CurveError, Polyline3, curve_parameters_by_count, parallel_transport_frames,
};

#[derive(Debug, thiserror::Error)]
pub enum RibbonError {
    #[error("strip width must be positive and finite")]
    InvalidWidth,
    #[error("ribbon requires at least 2 spans, got {0}")]
    TooFewSpans(usize),
    #[error("rail points must be finite")]
    NonFiniteRail,
    #[error(transparent)]
    Curve(#[from] CurveError),
}

pub trait Surface {
    fn point_at(&self, u: f64, v: f64) -> Point3;

    #[must_use]
    fn domain_u(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn domain_v(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn partial_derivatives_at(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();

        let u_span = u1 - u0;
        let v_span = v1 - v0;

        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);

        let mut du = Vec3::ZERO;
        let mut dv = Vec3::ZERO;

        if u_span.is_finite() && u_span != 0.0 {
            let h = Tolerance::DERIVATIVE.relative_to(u_span);
            if h.is_finite() && h != 0.0 {
                let ua = (u - h).max(u0);
                let ub = (u + h).min(u1);
                if ua != ub {
                    let pa = self.point_at(ua, v);
                    let pb = self.point_at(ub, v);
                    du = pb.sub_point(pa).mul_scalar(1.0 / (ub - ua));
                }
            }
        }

        if v_span.is_finite() && v_span != 0.0 {
            let h = Tolerance::DERIVATIVE.relative_to(v_span);
            if h.is_finite() && h != 0.0 {
                let va = (v - h).max(v0);
                let vb = (v + h).min(v1);
                if va != vb {
                    let pa = self.point_at(u, va);
                    let pb = self.point_at(u, vb);
                    dv = pb.sub_point(pa).mul_scalar(1.0 / (vb - va));
                }
            }
        }

        (du, dv)
    }

    #[must_use]
    fn normal_at(&self, u: f64, v: f64) -> Option<Vec3> {
        let (du, dv) = self.partial_derivatives_at(u, v);
        du.cross(dv).normalized()
    }
}

/// Position and tangent frame sampled on a surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceFrame {
    pub position: Point3,
    pub tangent_u: Vec3,
    pub tangent_v: Vec3,
    pub normal: Vec3,
}

/// Samples position and unit tangents at a parametric point.
#[must_use]
pub fn surface_frame_at<S: Surface + ?Sized>(surface: &S, u: f64, v: f64) -> SurfaceFrame {
    let position = surface.point_at(u, v);
    let (du, dv) = surface.partial_derivatives_at(u, v);
    let tangent_u = du.normalized().unwrap_or(Vec3::ZERO);
    let tangent_v = dv.normalized().unwrap_or(Vec3::ZERO);
    let normal = tangent_u.cross(tangent_v).normalized().unwrap_or(Vec3::ZERO);
    SurfaceFrame {
        position,
        tangent_u,
        tangent_v,
        normal,
    }
}

/// Narrow ruled surface swept along a curve.
///
/// `u` runs along the curve over arc-length-uniform stations, `v` crosses the
/// strip from the left rail (`v = 0`) to the right rail (`v = 1`); the curve
/// itself lies on `v = 0.5`. Rail normals are parallel-transported so the
/// strip never flips along the sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RibbonSurface {
    left: Vec<Point3>,
    right: Vec<Point3>,
}

impl RibbonSurface {
    /// Reference up used to seed the sweep frames.
    const WORLD_UP: Vec3 = Vec3::Y;

    /// Station count used when scanning for closest points.
    const CLOSEST_SCAN_PER_SPAN: usize = 4;

    pub fn from_curve<C: Curve3>(curve: &C, width: f64, spans: usize) -> Result<Self, RibbonError> {
        if !(width > 0.0) || !width.is_finite() {
            return Err(RibbonError::InvalidWidth);
        }
        if spans < 2 {
            return Err(RibbonError::TooFewSpans(spans));
        }

        let params = curve_parameters_by_count(curve, spans, (spans * 16).max(256));
        let frames = parallel_transport_frames(curve, &params, Self::WORLD_UP);

        let half = width * 0.5;
        let mut left = Vec::with_capacity(frames.len());
        let mut right = Vec::with_capacity(frames.len());
        for frame in &frames {
            let offset = frame.z_axis.mul_scalar(half);
            left.push(frame.origin.sub_vec(offset));
            right.push(frame.origin.add_vec(offset));
        }

        Self::from_rails(left, right)
    }

    pub fn from_rails(left: Vec<Point3>, right: Vec<Point3>) -> Result<Self, RibbonError> {
        if left.len() < 3 || left.len() != right.len() {
            return Err(RibbonError::TooFewSpans(left.len().saturating_sub(1)));
        }
        if left.iter().chain(right.iter()).any(|p| !p.is_finite()) {
            return Err(RibbonError::NonFiniteRail);
        }
        Ok(Self { left, right })
    }

    #[must_use]
    pub fn spans(&self) -> usize {
        self.left.len() - 1
    }

    #[must_use]
    pub fn rails(&self) -> (&[Point3], &[Point3]) {
        (&self.left, &self.right)
    }

    /// Extracts the iso curve at the given `v` as a polyline riding the
    /// rails. Re-extracting after the rails moved yields the deformed curve,
    /// which is what keeps downstream length measurement live.
    pub fn iso_curve(&self, v: f64) -> Result<Polyline3, RibbonError> {
        let v = v.clamp(0.0, 1.0);
        let points: Vec<Point3> = self
            .left
            .iter()
            .zip(&self.right)
            .map(|(a, b)| a.lerp(*b, v))
            .collect();
        Ok(Polyline3::new(points)?)
    }

    /// Ruling segment endpoints at `u`.
    fn ruling_at(&self, u: f64) -> (Point3, Point3) {
        let n = self.left.len();
        let t = u.clamp(0.0, 1.0) * (n - 1) as f64;
        let i = (t.floor() as usize).min(n - 2);
        let frac = t - i as f64;
        (
            self.left[i].lerp(self.left[i + 1], frac),
            self.right[i].lerp(self.right[i + 1], frac),
        )
    }

    /// Distance from `point` to the ruling at `u`, along with the `v` of the
    /// closest point on that ruling.
    fn ruling_distance(&self, u: f64, point: Point3) -> (f64, f64) {
        let (a, b) = self.ruling_at(u);
        let axis = b.sub_point(a);
        let len_sq = axis.length_squared();
        let v = if len_sq > 0.0 {
            (point.sub_point(a).dot(axis) / len_sq).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let closest = a.lerp(b, v);
        (point.distance_to(closest), v)
    }

    /// Finds the `(u, v)` of the point on the surface nearest to `point`.
    ///
    /// Coarse scan over the rulings followed by a golden-section refinement
    /// of `u`; `v` follows exactly from projecting onto the winning ruling.
    #[must_use]
    pub fn closest_point(&self, point: Point3) -> (f64, f64) {
        let scan = self.spans() * Self::CLOSEST_SCAN_PER_SPAN;
        let mut best_u = 0.0;
        let mut best_dist = f64::INFINITY;
        for i in 0..=scan {
            let u = i as f64 / scan as f64;
            let (dist, _) = self.ruling_distance(u, point);
            if dist < best_dist {
                best_dist = dist;
                best_u = u;
            }
        }

        let step = 1.0 / scan as f64;
        let mut lo = (best_u - step).max(0.0);
        let mut hi = (best_u + step).min(1.0);

        // Golden-section refinement of the 1D distance profile.
        const INV_PHI: f64 = 0.618_033_988_749_894_9;
        let mut m1 = hi - (hi - lo) * INV_PHI;
        let mut m2 = lo + (hi - lo) * INV_PHI;
        let mut d1 = self.ruling_distance(m1, point).0;
        let mut d2 = self.ruling_distance(m2, point).0;
        for _ in 0..64 {
            if d1 <= d2 {
                hi = m2;
                m2 = m1;
                d2 = d1;
                m1 = hi - (hi - lo) * INV_PHI;
                d1 = self.ruling_distance(m1, point).0;
            } else {
                lo = m1;
                m1 = m2;
                d1 = d2;
                m2 = lo + (hi - lo) * INV_PHI;
                d2 = self.ruling_distance(m2, point).0;
            }
        }

        let u = 0.5 * (lo + hi);
        let (_, v) = self.ruling_distance(u, point);
        (u, v)
    }
}

impl Surface for RibbonSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (a, b) = self.ruling_at(u);
        a.lerp(b, v.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::curve::curve_arc_length;

    fn straight_ribbon() -> RibbonSurface {
        let curve = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        RibbonSurface::from_curve(&curve, 0.1, 10).unwrap()
    }

    #[test]
    fn from_curve_validates_inputs() {
        let curve = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        assert!(matches!(
            RibbonSurface::from_curve(&curve, 0.0, 10),
            Err(RibbonError::InvalidWidth)
        ));
        assert!(matches!(
            RibbonSurface::from_curve(&curve, 0.1, 1),
            Err(RibbonError::TooFewSpans(1))
        ));
    }

    #[test]
    fn ribbon_has_requested_span_count() {
        assert_eq!(straight_ribbon().spans(), 10);
    }

    #[test]
    fn centerline_follows_the_swept_curve() {
        let ribbon = straight_ribbon();
        let centerline = ribbon.iso_curve(0.5).unwrap();
        assert!((centerline.total_length() - 1.0).abs() < 1e-9);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let p = centerline.point_at(t);
            assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
            assert!((p.z - t).abs() < 1e-9);
        }
    }

    #[test]
    fn iso_curve_matches_rail_midpoints() {
        let ribbon = straight_ribbon();
        let (left, right) = ribbon.rails();
        let centerline = ribbon.iso_curve(0.5).unwrap();
        for ((a, b), p) in left.iter().zip(right).zip(centerline.points()) {
            assert!(a.lerp(*b, 0.5).distance_to(*p) < 1e-12);
        }
    }

    #[test]
    fn ribbon_width_is_constant_across_stations() {
        let ribbon = straight_ribbon();
        let (left, right) = ribbon.rails();
        for (a, b) in left.iter().zip(right) {
            assert!((a.distance_to(*b) - 0.1).abs() < 1e-9);
        }
    }

    #[test]
    fn closest_point_recovers_surface_samples() {
        let ribbon = straight_ribbon();
        for &(u, v) in &[(0.0, 0.5), (0.25, 0.1), (0.5, 0.5), (0.73, 0.9), (1.0, 0.5)] {
            let sample = ribbon.point_at(u, v);
            let (cu, cv) = ribbon.closest_point(sample);
            let recovered = ribbon.point_at(cu, cv);
            assert!(
                recovered.distance_to(sample) < 1e-6,
                "({u}, {v}) projected to ({cu}, {cv})"
            );
        }
    }

    #[test]
    fn closest_point_is_idempotent() {
        let ribbon = straight_ribbon();
        let probe = Point3::new(0.02, 0.01, 0.4);
        let first = ribbon.closest_point(probe);
        let second = ribbon.closest_point(probe);
        assert_eq!(first, second);
    }

    #[test]
    fn surface_frame_tangents_are_orthogonal_on_a_flat_strip() {
        let ribbon = straight_ribbon();
        let frame = surface_frame_at(&ribbon, 0.5, 0.5);
        assert!(frame.tangent_u.dot(frame.tangent_v).abs() < 1e-6);
        assert!((frame.tangent_u.length() - 1.0).abs() < 1e-9);
        assert!((frame.tangent_v.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn curved_sweep_keeps_centerline_length() {
        let points: Vec<Point3> = (0..=32)
            .map(|i| {
                let a = i as f64 / 32.0 * std::f64::consts::PI;
                Point3::new(a.cos(), 0.0, a.sin())
            })
            .collect();
        let curve = Polyline3::new(points).unwrap();
        let expected = curve_arc_length(&curve, 512);

        let ribbon = RibbonSurface::from_curve(&curve, 0.05, 24).unwrap();
        let centerline = ribbon.iso_curve(0.5).unwrap();
        // Station sampling straightens the arc slightly; stay within a percent.
        assert!((centerline.total_length() - expected).abs() / expected < 0.01);
    }
}
