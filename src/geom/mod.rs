mod core;
mod curve;
mod surface;

pub use self::core::{Point3, Tolerance, Transform, Vec3, orthogonal_unit_vector};
pub use curve::{
    Curve3, CurveError, CurveFrame, CurveGeometry, CurveSample, Line3, NurbsCurve3, Polyline3,
    curve_arc_length, curve_parameter_at_fraction, curve_parameters_by_count,
    divide_curve_by_count, parallel_frame_at, parallel_transport_frames, sample_curve_at,
};
pub use surface::{RibbonError, RibbonSurface, Surface, SurfaceFrame, surface_frame_at};
