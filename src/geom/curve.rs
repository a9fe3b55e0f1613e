use super::core::{Point3, Tolerance, Vec3, orthogonal_unit_vector};

#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("curve requires at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("curve points must be finite")]
    NonFinitePoints,
    #[error("degree must be at least 1")]
    BadDegree,
    #[error("knot vector must be non-decreasing with {expected} entries, got {got}")]
    BadKnots { expected: usize, got: usize },
    #[error("weight count must match control point count")]
    WeightCountMismatch,
    #[error("interpolation system is singular")]
    SingularInterpolation,
}

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::DERIVATIVE.relative_to(span);
        if !h.is_finite() || h == 0.0 {
            return Vec3::ZERO;
        }

        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    /// Returns the unit tangent vector at parameter `t`.
    /// Returns `None` if the derivative is zero or degenerate.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn direction(self) -> Vec3 {
        self.end.sub_point(self.start)
    }
}

impl Curve3 for Line3 {
    fn point_at(&self, t: f64) -> Point3 {
        self.start.add_vec(self.direction().mul_scalar(t))
    }

    fn derivative_at(&self, _t: f64) -> Vec3 {
        self.direction()
    }
}

/// Piecewise-linear curve parameterized by arc length: `point_at(t)` walks
/// the fraction `t` of the total length, so equal parameter steps are equal
/// distance steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3 {
    points: Vec<Point3>,
    cumulative_lengths: Vec<f64>,
    total_length: f64,
}

impl Polyline3 {
    pub fn new(points: Vec<Point3>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints {
                needed: 2,
                got: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFinitePoints);
        }

        let mut cumulative_lengths = Vec::with_capacity(points.len());
        cumulative_lengths.push(0.0);
        let mut total = 0.0;
        for window in points.windows(2) {
            total += window[1].sub_point(window[0]).length();
            cumulative_lengths.push(total);
        }

        Ok(Self {
            points,
            cumulative_lengths,
            total_length: total,
        })
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub const fn total_length(&self) -> f64 {
        self.total_length
    }
}

impl Curve3 for Polyline3 {
    fn point_at(&self, t: f64) -> Point3 {
        if self.total_length <= 0.0 || !self.total_length.is_finite() {
            return self.points[0];
        }

        let mut target = t.clamp(0.0, 1.0) * self.total_length;

        let last_index = self.points.len() - 1;
        if target >= self.cumulative_lengths[last_index] {
            return self.points[last_index];
        }

        let idx = match self
            .cumulative_lengths
            .binary_search_by(|value| value.total_cmp(&target))
        {
            Ok(i) => i,
            Err(i) => i.max(1) - 1,
        };

        let seg_start = self.points[idx];
        let seg_end = self.points[idx + 1];
        let seg_len = seg_end.sub_point(seg_start).length();
        if seg_len == 0.0 {
            return seg_start;
        }
        target -= self.cumulative_lengths[idx];
        seg_start.lerp(seg_end, (target / seg_len).clamp(0.0, 1.0))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NURBS curve
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct HPoint4 {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl HPoint4 {
    const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    fn lerp(self, rhs: Self, t: f64) -> Self {
        let s = 1.0 - t;
        Self::new(
            self.x * s + rhs.x * t,
            self.y * s + rhs.y * t,
            self.z * s + rhs.z * t,
            self.w * s + rhs.w * t,
        )
    }

    fn to_point3(self) -> Option<Point3> {
        if self.w.is_finite() && self.w != 0.0 {
            Some(Point3::new(self.x / self.w, self.y / self.w, self.z / self.w))
        } else {
            None
        }
    }
}

fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

fn de_boor(d: &mut [HPoint4], span: usize, p: usize, u: f64, knots: &[f64]) {
    for r in 1..=p {
        for j in (r..=p).rev() {
            let i = span - p + j;
            let denom = knots[i + p + 1 - r] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (u - knots[i]) / denom };
            d[j] = d[j - 1].lerp(d[j], alpha);
        }
    }
}

/// Non-vanishing B-spline basis functions at `u` for the given span.
fn basis_functions(span: usize, u: f64, p: usize, knots: &[f64]) -> Vec<f64> {
    let mut basis = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];
    basis[0] = 1.0;

    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let term = if denom == 0.0 { 0.0 } else { basis[r] / denom };
            basis[r] = saved + right[r + 1] * term;
            saved = left[j - r] * term;
        }
        basis[j] = saved;
    }

    basis
}

#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve3 {
    control_points: Vec<Point3>,
    weights: Vec<f64>,
    knots: Vec<f64>,
    degree: usize,
}

impl NurbsCurve3 {
    pub fn new(
        control_points: Vec<Point3>,
        weights: Vec<f64>,
        knots: Vec<f64>,
        degree: usize,
    ) -> Result<Self, CurveError> {
        if degree < 1 {
            return Err(CurveError::BadDegree);
        }
        if control_points.len() <= degree {
            return Err(CurveError::TooFewPoints {
                needed: degree + 1,
                got: control_points.len(),
            });
        }
        if control_points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFinitePoints);
        }
        if weights.len() != control_points.len() {
            return Err(CurveError::WeightCountMismatch);
        }
        let expected_knots = control_points.len() + degree + 1;
        if knots.len() != expected_knots || knots.windows(2).any(|w| w[0] > w[1]) {
            return Err(CurveError::BadKnots {
                expected: expected_knots,
                got: knots.len(),
            });
        }

        Ok(Self {
            control_points,
            weights,
            knots,
            degree,
        })
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Number of non-degenerate knot intervals.
    #[must_use]
    pub fn span_count(&self) -> usize {
        let n = self.control_points.len() - 1;
        self.knots[self.degree..=n + 1]
            .windows(2)
            .filter(|w| w[1] > w[0])
            .count()
    }

    /// Builds a clamped curve that passes through all input points, using
    /// chord-length parameterization and knot averaging.
    pub fn interpolate_through_points(
        points: &[Point3],
        degree: usize,
    ) -> Result<Self, CurveError> {
        if degree < 1 {
            return Err(CurveError::BadDegree);
        }
        if points.len() <= degree {
            return Err(CurveError::TooFewPoints {
                needed: degree + 1,
                got: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFinitePoints);
        }

        let n = points.len();

        // Chord-length parameters, uniform fallback for coincident samples.
        let mut params = vec![0.0; n];
        let mut total = 0.0;
        for i in 1..n {
            total += points[i].distance_to(points[i - 1]);
            params[i] = total;
        }
        if total > 0.0 {
            for param in params.iter_mut() {
                *param /= total;
            }
        } else {
            for (i, param) in params.iter_mut().enumerate() {
                *param = i as f64 / (n - 1) as f64;
            }
        }
        params[n - 1] = 1.0;

        // Averaged knot vector keeps the interpolation matrix well conditioned.
        let mut knots = vec![0.0; n + degree + 1];
        for knot in knots.iter_mut().skip(n) {
            *knot = 1.0;
        }
        for j in 1..n - degree {
            let avg: f64 = params[j..j + degree].iter().sum::<f64>() / degree as f64;
            knots[j + degree] = avg;
        }

        // Fill the banded collocation matrix row by row.
        let mut matrix = vec![vec![0.0; n]; n];
        for (i, &u) in params.iter().enumerate() {
            let span = find_span(n - 1, degree, u, &knots);
            let basis = basis_functions(span, u, degree, &knots);
            for (k, &b) in basis.iter().enumerate() {
                matrix[i][span - degree + k] = b;
            }
        }

        let control_points = solve_point_system(matrix, points)?;

        Self::new(control_points, vec![1.0; n], knots, degree)
    }
}

impl Curve3 for NurbsCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        let (t0, t1) = self.domain();
        let u = t.clamp(t0, t1);
        let n = self.control_points.len() - 1;
        let p = self.degree;

        let span = find_span(n, p, u, &self.knots);
        let mut d: Vec<HPoint4> = (span - p..=span)
            .map(|i| {
                let cp = self.control_points[i];
                let w = self.weights[i];
                HPoint4::new(cp.x * w, cp.y * w, cp.z * w, w)
            })
            .collect();
        de_boor(&mut d, span, p, u, &self.knots);

        d[p].to_point3().unwrap_or(self.control_points[span - p])
    }

    fn domain(&self) -> (f64, f64) {
        let n = self.control_points.len() - 1;
        (self.knots[self.degree], self.knots[n + 1])
    }
}

/// Gaussian elimination with partial pivoting, one solve per coordinate.
fn solve_point_system(
    mut matrix: Vec<Vec<f64>>,
    points: &[Point3],
) -> Result<Vec<Point3>, CurveError> {
    let n = points.len();
    let mut rhs: Vec<[f64; 3]> = points.iter().map(|p| p.to_array()).collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot_row][col].abs() < 1e-14 {
            return Err(CurveError::SingularInterpolation);
        }
        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            for k in 0..3 {
                rhs[row][k] -= factor * rhs[col][k];
            }
        }
    }

    let mut solution = vec![[0.0; 3]; n];
    for row in (0..n).rev() {
        let mut value = rhs[row];
        for col in row + 1..n {
            for k in 0..3 {
                value[k] -= matrix[row][col] * solution[col][k];
            }
        }
        for k in 0..3 {
            value[k] /= matrix[row][row];
        }
        solution[row] = value;
    }

    Ok(solution.into_iter().map(Point3::from_array).collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampling and measurement
// ─────────────────────────────────────────────────────────────────────────────

/// A point sampled on a curve together with its tangent and parameter.
#[derive(Debug, Clone, Copy)]
pub struct CurveSample {
    /// The point on the curve at the given parameter.
    pub point: Point3,
    /// The tangent vector at the given parameter (unit length if derivable, else zero).
    pub tangent: Vec3,
    /// The parameter value at which the sample was taken.
    pub parameter: f64,
}

/// Samples a curve at a given parameter value (clamped to the domain).
#[must_use]
pub fn sample_curve_at<C: Curve3>(curve: &C, t: f64) -> CurveSample {
    let (t0, t1) = curve.domain();
    let param = t.clamp(t0, t1);
    let point = curve.point_at(param);
    let tangent = curve.tangent_at(param).unwrap_or(Vec3::ZERO);
    CurveSample {
        point,
        tangent,
        parameter: param,
    }
}

/// Computes the approximate arc length of a curve by sampling.
#[must_use]
pub fn curve_arc_length<C: Curve3>(curve: &C, samples: usize) -> f64 {
    let samples = samples.max(1);
    let (t0, t1) = curve.domain();
    let span = t1 - t0;
    if !span.is_finite() || span == 0.0 {
        return 0.0;
    }

    let mut length = 0.0;
    let mut prev = curve.point_at(t0);
    for i in 1..=samples {
        let t = t0 + span * (i as f64 / samples as f64);
        let curr = curve.point_at(t);
        length += curr.sub_point(prev).length();
        prev = curr;
    }
    length
}

/// Cumulative arc lengths at `samples + 1` uniform parameters.
fn build_arc_length_table<C: Curve3>(curve: &C, samples: usize) -> Vec<f64> {
    let samples = samples.max(1);
    let (t0, t1) = curve.domain();
    let span = t1 - t0;

    let mut table = Vec::with_capacity(samples + 1);
    table.push(0.0);
    let mut total = 0.0;
    let mut prev = curve.point_at(t0);
    for i in 1..=samples {
        let t = t0 + span * (i as f64 / samples as f64);
        let curr = curve.point_at(t);
        total += curr.sub_point(prev).length();
        table.push(total);
        prev = curr;
    }
    table
}

/// Inverts an arc-length table: parameter at the given fraction of the total
/// length. The fraction is clamped to `[0, 1]`.
fn parameter_at_table_fraction(table: &[f64], t0: f64, t1: f64, fraction: f64) -> f64 {
    let total = *table.last().unwrap_or(&0.0);
    if !(total > 0.0) || !total.is_finite() {
        return t0;
    }

    let target = fraction.clamp(0.0, 1.0) * total;
    let idx = match table.binary_search_by(|value| value.total_cmp(&target)) {
        Ok(i) => return t0 + (t1 - t0) * (i as f64 / (table.len() - 1) as f64),
        Err(i) => i.clamp(1, table.len() - 1),
    };

    let seg_start = table[idx - 1];
    let seg_end = table[idx];
    let local = if seg_end > seg_start {
        (target - seg_start) / (seg_end - seg_start)
    } else {
        0.0
    };
    let steps = (table.len() - 1) as f64;
    t0 + (t1 - t0) * ((idx - 1) as f64 + local) / steps
}

/// Parameter at the given fraction of the curve's arc length.
#[must_use]
pub fn curve_parameter_at_fraction<C: Curve3>(curve: &C, fraction: f64, samples: usize) -> f64 {
    let (t0, t1) = curve.domain();
    let table = build_arc_length_table(curve, samples);
    parameter_at_table_fraction(&table, t0, t1, fraction)
}

/// `count + 1` parameters spaced at equal arc-length intervals
/// (`count` segments), always including both curve ends.
#[must_use]
pub fn curve_parameters_by_count<C: Curve3>(curve: &C, count: usize, samples: usize) -> Vec<f64> {
    let count = count.max(1);
    let (t0, t1) = curve.domain();
    let table = build_arc_length_table(curve, samples);

    let mut params = Vec::with_capacity(count + 1);
    params.push(t0);
    for i in 1..count {
        let fraction = i as f64 / count as f64;
        params.push(parameter_at_table_fraction(&table, t0, t1, fraction));
    }
    params.push(t1);
    params
}

/// Divides a curve into `count` equal arc-length segments.
#[must_use]
pub fn divide_curve_by_count<C: Curve3>(curve: &C, count: usize, samples: usize) -> Vec<CurveSample> {
    curve_parameters_by_count(curve, count, samples)
        .into_iter()
        .map(|t| sample_curve_at(curve, t))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Frames
// ─────────────────────────────────────────────────────────────────────────────

/// Oriented coordinate system at a point on a curve.
#[derive(Debug, Clone, Copy)]
pub struct CurveFrame {
    /// Origin of the frame (point on curve).
    pub origin: Point3,
    /// X-axis (tangent direction).
    pub x_axis: Vec3,
    /// Y-axis (normal direction).
    pub y_axis: Vec3,
    /// Z-axis (binormal direction).
    pub z_axis: Vec3,
}

/// Computes a frame at `t` whose normal stays as close as possible to
/// `reference_up`.
#[must_use]
pub fn parallel_frame_at<C: Curve3>(curve: &C, t: f64, reference_up: Vec3) -> CurveFrame {
    let point = curve.point_at(t);
    let tangent = curve
        .derivative_at(t)
        .normalized()
        .unwrap_or(Vec3::X);

    let cross = reference_up.cross(tangent);
    let binormal = if cross.length() > 1e-9 {
        cross.normalized().unwrap_or(Vec3::Z)
    } else {
        // reference_up is parallel to tangent, pick an orthogonal vector
        orthogonal_unit_vector(tangent)
    };

    let normal = tangent.cross(binormal).normalized().unwrap_or(Vec3::Y);
    let binormal = tangent.cross(normal).normalized().unwrap_or(binormal);

    CurveFrame {
        origin: point,
        x_axis: tangent,
        y_axis: normal,
        z_axis: binormal,
    }
}

/// Frames at the given parameters with the normal parallel-transported from
/// one station to the next, so the cross direction never flips along the
/// curve.
#[must_use]
pub fn parallel_transport_frames<C: Curve3>(
    curve: &C,
    params: &[f64],
    reference_up: Vec3,
) -> Vec<CurveFrame> {
    let mut frames = Vec::with_capacity(params.len());
    let Some(&first) = params.first() else {
        return frames;
    };

    let mut prev = parallel_frame_at(curve, first, reference_up);
    frames.push(prev);

    for &t in &params[1..] {
        let point = curve.point_at(t);
        let tangent = curve
            .derivative_at(t)
            .normalized()
            .unwrap_or(prev.x_axis);

        let normal = match prev.y_axis.rejected_from(tangent).normalized() {
            Some(n) => n,
            None => orthogonal_unit_vector(tangent),
        };
        let binormal = tangent.cross(normal).normalized().unwrap_or(prev.z_axis);

        prev = CurveFrame {
            origin: point,
            x_axis: tangent,
            y_axis: normal,
            z_axis: binormal,
        };
        frames.push(prev);
    }

    frames
}

// ─────────────────────────────────────────────────────────────────────────────
// CurveGeometry
// ─────────────────────────────────────────────────────────────────────────────

/// Concrete curve geometry as it travels through the evaluation graph.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveGeometry {
    Polyline(Polyline3),
    Nurbs(NurbsCurve3),
}

impl CurveGeometry {
    /// Sample density used for arc-length tables on analytic curves.
    const LENGTH_SAMPLES: usize = 256;

    /// Builds geometry from host control points. Degree 1 yields a polyline,
    /// higher degrees interpolate a NURBS curve through the points.
    pub fn from_points(points: &[Point3], degree: usize) -> Result<Self, CurveError> {
        if degree <= 1 || points.len() <= degree {
            Polyline3::new(points.to_vec()).map(Self::Polyline)
        } else {
            NurbsCurve3::interpolate_through_points(points, degree).map(Self::Nurbs)
        }
    }

    /// Rebuilds this curve to the given span count and degree: samples
    /// `spans + degree` points at equal arc-length intervals and
    /// interpolates through them.
    pub fn rebuilt(&self, spans: usize, degree: usize) -> Result<Self, CurveError> {
        let spans = spans.max(1);
        let segment_count = (spans + degree).saturating_sub(1).max(1);
        let samples = divide_curve_by_count(self, segment_count, Self::LENGTH_SAMPLES);
        let points: Vec<Point3> = samples.into_iter().map(|s| s.point).collect();
        Self::from_points(&points, degree)
    }

    /// Live arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Polyline(polyline) => polyline.total_length(),
            Self::Nurbs(curve) => curve_arc_length(curve, Self::LENGTH_SAMPLES),
        }
    }

    /// Sample at a fraction of the arc length (clamped to `[0, 1]`), the
    /// distance-based query attachment points ride on.
    #[must_use]
    pub fn sample_at_fraction(&self, fraction: f64) -> CurveSample {
        match self {
            // A polyline's parameter already walks arc length.
            Self::Polyline(polyline) => sample_curve_at(polyline, fraction.clamp(0.0, 1.0)),
            Self::Nurbs(curve) => {
                let t = curve_parameter_at_fraction(curve, fraction, Self::LENGTH_SAMPLES);
                sample_curve_at(curve, t)
            }
        }
    }
}

impl Curve3 for CurveGeometry {
    fn point_at(&self, t: f64) -> Point3 {
        match self {
            Self::Polyline(polyline) => polyline.point_at(t),
            Self::Nurbs(curve) => curve.point_at(t),
        }
    }

    fn domain(&self) -> (f64, f64) {
        match self {
            Self::Polyline(polyline) => polyline.domain(),
            Self::Nurbs(curve) => curve.domain(),
        }
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        match self {
            Self::Polyline(polyline) => polyline.derivative_at(t),
            Self::Nurbs(curve) => curve.derivative_at(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_z(len: f64) -> Polyline3 {
        Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, len),
        ])
        .unwrap()
    }

    #[test]
    fn polyline_parameter_walks_arc_length() {
        // Uneven segment spacing must not disturb fractional sampling.
        let polyline = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ])
        .unwrap();
        assert!((polyline.total_length() - 4.0).abs() < 1e-12);
        let mid = polyline.point_at(0.5);
        assert!(mid.distance_to(Point3::new(2.0, 0.0, 0.0)) < 1e-12);
    }

    #[test]
    fn polyline_requires_two_points() {
        let err = Polyline3::new(vec![Point3::ORIGIN]).unwrap_err();
        assert!(matches!(err, CurveError::TooFewPoints { needed: 2, got: 1 }));
    }

    #[test]
    fn arc_length_of_straight_line_is_exact() {
        let line = Line3::new(Point3::ORIGIN, Point3::new(0.0, 3.0, 4.0));
        assert!((curve_arc_length(&line, 64) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn parameters_by_count_hits_both_ends() {
        let polyline = straight_z(2.0);
        let params = curve_parameters_by_count(&polyline, 4, 128);
        assert_eq!(params.len(), 5);
        assert_eq!(params[0], 0.0);
        assert_eq!(params[4], 1.0);
        assert!((params[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn nurbs_interpolation_passes_through_samples() {
        let samples = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(3.0, -0.5, 1.0),
            Point3::new(4.0, 0.0, 1.5),
            Point3::new(5.0, 0.25, 2.0),
        ];
        let curve = NurbsCurve3::interpolate_through_points(&samples, 3).unwrap();

        // Interpolation must reproduce the samples at their chord parameters.
        for sample in &samples {
            let mut best = f64::INFINITY;
            for i in 0..=400 {
                let t = i as f64 / 400.0;
                best = best.min(curve.point_at(t).distance_to(*sample));
            }
            assert!(best < 1e-3, "sample {sample:?} missed by {best}");
        }
        assert_eq!(curve.degree(), 3);
    }

    #[test]
    fn nurbs_interpolation_of_straight_samples_stays_straight() {
        let samples: Vec<Point3> = (0..8)
            .map(|i| Point3::new(0.0, 0.0, i as f64 / 7.0))
            .collect();
        let curve = NurbsCurve3::interpolate_through_points(&samples, 3).unwrap();
        for i in 0..=32 {
            let p = curve.point_at(i as f64 / 32.0);
            assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
        }
    }

    #[test]
    fn rebuilt_curve_has_requested_span_count_and_degree() {
        let source = CurveGeometry::from_points(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, -1.0, 0.5),
                Point3::new(3.0, 0.0, 1.0),
                Point3::new(4.0, 1.0, 1.5),
            ],
            1,
        )
        .unwrap();

        let rebuilt = source.rebuilt(8, 3).unwrap();
        match &rebuilt {
            CurveGeometry::Nurbs(curve) => {
                assert_eq!(curve.degree(), 3);
                assert_eq!(curve.span_count(), 8);
            }
            CurveGeometry::Polyline(_) => panic!("rebuild at degree 3 must produce a NURBS curve"),
        }

        // Ends are preserved.
        let (t0, t1) = rebuilt.domain();
        assert!(rebuilt.point_at(t0).distance_to(source.point_at(0.0)) < 1e-9);
        assert!(rebuilt.point_at(t1).distance_to(source.point_at(1.0)) < 1e-9);
    }

    #[test]
    fn sample_at_fraction_is_uniform_in_distance() {
        let geometry = CurveGeometry::from_points(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.1),
                Point3::new(0.0, 0.0, 1.0),
            ],
            1,
        )
        .unwrap();

        for i in 0..=10 {
            let fraction = i as f64 / 10.0;
            let sample = geometry.sample_at_fraction(fraction);
            assert!((sample.point.z - fraction).abs() < 1e-9);
        }
    }

    #[test]
    fn sample_at_fraction_clamps_out_of_range_input() {
        let geometry = CurveGeometry::from_points(
            &[Point3::ORIGIN, Point3::new(0.0, 0.0, 1.0)],
            1,
        )
        .unwrap();
        assert!(geometry.sample_at_fraction(-0.5).point.z.abs() < 1e-12);
        assert!((geometry.sample_at_fraction(1.5).point.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_transport_keeps_cross_direction_stable() {
        // Gentle arc in the XZ plane.
        let points: Vec<Point3> = (0..=16)
            .map(|i| {
                let a = i as f64 / 16.0 * std::f64::consts::FRAC_PI_2;
                Point3::new(a.cos(), 0.0, a.sin())
            })
            .collect();
        let polyline = Polyline3::new(points).unwrap();
        let params: Vec<f64> = (0..=16).map(|i| i as f64 / 16.0).collect();

        let frames = parallel_transport_frames(&polyline, &params, Vec3::Z);
        for pair in frames.windows(2) {
            // Successive binormals must never flip.
            assert!(pair[0].z_axis.dot(pair[1].z_axis) > 0.5);
        }
    }
}
