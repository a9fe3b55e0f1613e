//! Surface-afleiding en de per-punt attachmentketen.

use std::collections::BTreeMap;

use crate::geom::{Point3, RibbonSurface, Transform, Vec3, surface_frame_at};
use crate::graph::node::{MetaMap, MetaValue};
use crate::graph::value::Value;

use super::{Component, ComponentError, ComponentResult};

pub const PIN_INPUT_CURVE: &str = "Curve";
pub const PIN_INPUT_SURFACE: &str = "Surface";
pub const PIN_INPUT_POINT: &str = "Point";
pub const PIN_INPUT_U: &str = "U";
pub const PIN_INPUT_V: &str = "V";
pub const PIN_INPUT_POSITION: &str = "Position";
pub const PIN_INPUT_AIM: &str = "Aim";
pub const PIN_INPUT_UP: &str = "Up";
pub const PIN_INPUT_TRANSFORM: &str = "Transform";

pub const PIN_OUTPUT_SURFACE: &str = "Surface";
pub const PIN_OUTPUT_CURVE: &str = "Curve";
pub const PIN_OUTPUT_U: &str = "U";
pub const PIN_OUTPUT_V: &str = "V";
pub const PIN_OUTPUT_POSITION: &str = "Position";
pub const PIN_OUTPUT_TANGENT_U: &str = "TangentU";
pub const PIN_OUTPUT_TANGENT_V: &str = "TangentV";
pub const PIN_OUTPUT_NORMAL: &str = "Normal";
pub const PIN_OUTPUT_TRANSFORM: &str = "Transform";

/// Beschikbare componenten binnen deze module.
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    /// Veegt de ribbonsurface langs de inkomende curve; volgt de curve dus
    /// passief bij elke evaluatie.
    RibbonFromCurve,
    /// Extraheert de iso-curve op een vaste `v`, standaard de middenlijn.
    IsoCurve,
    /// Dichtstbijzijnde `(u, v)` op de surface voor een wereldpunt.
    ClosestPoint,
    /// Positie en tangentframe op een parametrische plek.
    SurfaceFrame,
    /// Look-at oriëntatie uit een positie, aim- en up-vector.
    AimOrient,
    /// Volgt een transform één-op-één (constraint zonder offset).
    Follow,
}

/// Volledige lijst met componentregistraties voor de attachmentketen.
pub const REGISTRATIONS: &[super::Registration] = &[
    super::Registration {
        names: &["Ribbon From Curve"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::RibbonFromCurve),
    },
    super::Registration {
        names: &["Iso Curve"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::IsoCurve),
    },
    super::Registration {
        names: &["Closest Point"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::ClosestPoint),
    },
    super::Registration {
        names: &["Surface Frame"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::SurfaceFrame),
    },
    super::Registration {
        names: &["Aim Orient"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::AimOrient),
    },
    super::Registration {
        names: &["Follow"],
        kind: super::ComponentKind::SurfaceAttach(ComponentKind::Follow),
    },
];

impl ComponentKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RibbonFromCurve => "Ribbon From Curve",
            Self::IsoCurve => "Iso Curve",
            Self::ClosestPoint => "Closest Point",
            Self::SurfaceFrame => "Surface Frame",
            Self::AimOrient => "Aim Orient",
            Self::Follow => "Follow",
        }
    }
}

impl Component for ComponentKind {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        match self {
            Self::RibbonFromCurve => evaluate_ribbon_from_curve(inputs, meta),
            Self::IsoCurve => evaluate_iso_curve(inputs, meta),
            Self::ClosestPoint => evaluate_closest_point(inputs),
            Self::SurfaceFrame => evaluate_surface_frame(inputs),
            Self::AimOrient => evaluate_aim_orient(inputs),
            Self::Follow => evaluate_follow(inputs),
        }
    }
}

fn surface_input<'a>(inputs: &'a [Value]) -> Result<&'a RibbonSurface, ComponentError> {
    inputs
        .first()
        .ok_or_else(|| ComponentError::new("surface-input ontbreekt"))?
        .expect_surface()
        .map_err(ComponentError::from)
}

fn evaluate_ribbon_from_curve(inputs: &[Value], meta: &MetaMap) -> ComponentResult {
    let curve = inputs
        .first()
        .ok_or_else(|| ComponentError::new("curve-input ontbreekt"))?
        .expect_curve()?;

    let width = meta
        .get("Width")
        .and_then(MetaValue::as_number)
        .ok_or_else(|| ComponentError::new("ribbonnode mist meta `Width`"))?;
    let spans = meta
        .get("Spans")
        .and_then(MetaValue::as_integer)
        .ok_or_else(|| ComponentError::new("ribbonnode mist meta `Spans`"))?
        .max(0) as usize;

    let surface = RibbonSurface::from_curve(curve, width, spans)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_SURFACE.to_owned(), Value::Surface(surface));
    Ok(outputs)
}

fn evaluate_iso_curve(inputs: &[Value], meta: &MetaMap) -> ComponentResult {
    let surface = surface_input(inputs)?;
    let v = meta
        .get("Isoparm")
        .and_then(MetaValue::as_number)
        .unwrap_or(0.5);

    let iso = surface.iso_curve(v)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(
        PIN_OUTPUT_CURVE.to_owned(),
        Value::Curve(crate::geom::CurveGeometry::Polyline(iso)),
    );
    Ok(outputs)
}

fn evaluate_closest_point(inputs: &[Value]) -> ComponentResult {
    let surface = surface_input(inputs)?;
    let point = inputs
        .get(1)
        .ok_or_else(|| ComponentError::new("puntinput ontbreekt"))?
        .expect_point()?;

    let (u, v) = surface.closest_point(Point3::from_array(point));
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_U.to_owned(), Value::Number(u));
    outputs.insert(PIN_OUTPUT_V.to_owned(), Value::Number(v));
    Ok(outputs)
}

fn evaluate_surface_frame(inputs: &[Value]) -> ComponentResult {
    let surface = surface_input(inputs)?;
    let u = inputs
        .get(1)
        .ok_or_else(|| ComponentError::new("u-input ontbreekt"))?
        .expect_number()?;
    let v = inputs
        .get(2)
        .ok_or_else(|| ComponentError::new("v-input ontbreekt"))?
        .expect_number()?;

    let frame = surface_frame_at(surface, u, v);
    let mut outputs = BTreeMap::new();
    outputs.insert(
        PIN_OUTPUT_POSITION.to_owned(),
        Value::Point(frame.position.to_array()),
    );
    outputs.insert(
        PIN_OUTPUT_TANGENT_U.to_owned(),
        Value::Vector(frame.tangent_u.to_array()),
    );
    outputs.insert(
        PIN_OUTPUT_TANGENT_V.to_owned(),
        Value::Vector(frame.tangent_v.to_array()),
    );
    outputs.insert(
        PIN_OUTPUT_NORMAL.to_owned(),
        Value::Vector(frame.normal.to_array()),
    );
    Ok(outputs)
}

fn evaluate_aim_orient(inputs: &[Value]) -> ComponentResult {
    if inputs.len() < 3 {
        return Err(ComponentError::new(
            "aim-oriëntatie vereist positie, aim en up",
        ));
    }
    let position = Point3::from_array(inputs[0].expect_point()?);
    let aim = Vec3::from_array(inputs[1].expect_vector()?);
    let up = Vec3::from_array(inputs[2].expect_vector()?);

    let transform = Transform::aim_frame(position, aim, up);
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_TRANSFORM.to_owned(), Value::Transform(transform));
    Ok(outputs)
}

fn evaluate_follow(inputs: &[Value]) -> ComponentResult {
    let transform = inputs
        .first()
        .ok_or_else(|| ComponentError::new("volgnode mist transform"))?
        .expect_transform()?;

    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_TRANSFORM.to_owned(), Value::Transform(transform));
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::CurveGeometry;

    fn unit_z_curve() -> Value {
        Value::Curve(
            CurveGeometry::from_points(
                &[Point3::ORIGIN, Point3::new(0.0, 0.0, 1.0)],
                1,
            )
            .unwrap(),
        )
    }

    fn ribbon_meta() -> MetaMap {
        let mut meta = MetaMap::new();
        meta.insert("Width".to_owned(), MetaValue::Number(0.1));
        meta.insert("Spans".to_owned(), MetaValue::Integer(10));
        meta
    }

    fn unit_ribbon() -> Value {
        ComponentKind::RibbonFromCurve
            .evaluate(&[unit_z_curve()], &ribbon_meta())
            .unwrap()
            .remove(PIN_OUTPUT_SURFACE)
            .unwrap()
    }

    #[test]
    fn ribbon_from_curve_requires_width_meta() {
        let mut meta = ribbon_meta();
        meta.remove("Width");
        assert!(ComponentKind::RibbonFromCurve
            .evaluate(&[unit_z_curve()], &meta)
            .is_err());
    }

    #[test]
    fn iso_curve_extracts_centerline_by_default() {
        let outputs = ComponentKind::IsoCurve
            .evaluate(&[unit_ribbon()], &MetaMap::new())
            .unwrap();
        let curve = outputs[PIN_OUTPUT_CURVE].expect_curve().unwrap();
        assert!((curve.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn closest_point_finds_on_surface_parameters() {
        let surface_value = unit_ribbon();
        let surface = surface_value.expect_surface().unwrap();
        let probe = {
            use crate::geom::Surface as _;
            surface.point_at(0.3, 0.5)
        };

        let outputs = ComponentKind::ClosestPoint
            .evaluate(
                &[surface_value.clone(), Value::Point(probe.to_array())],
                &MetaMap::new(),
            )
            .unwrap();
        let u = outputs[PIN_OUTPUT_U].expect_number().unwrap();
        let v = outputs[PIN_OUTPUT_V].expect_number().unwrap();
        assert!((u - 0.3).abs() < 1e-4);
        assert!((v - 0.5).abs() < 1e-4);
    }

    #[test]
    fn surface_frame_reports_unit_tangents() {
        let outputs = ComponentKind::SurfaceFrame
            .evaluate(
                &[unit_ribbon(), Value::Number(0.5), Value::Number(0.5)],
                &MetaMap::new(),
            )
            .unwrap();
        let tangent_u = Vec3::from_array(outputs[PIN_OUTPUT_TANGENT_U].expect_vector().unwrap());
        let tangent_v = Vec3::from_array(outputs[PIN_OUTPUT_TANGENT_V].expect_vector().unwrap());
        assert!((tangent_u.length() - 1.0).abs() < 1e-9);
        assert!((tangent_v.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aim_orient_aims_x_axis_along_aim_vector() {
        let outputs = ComponentKind::AimOrient
            .evaluate(
                &[
                    Value::Point([1.0, 2.0, 3.0]),
                    Value::Vector([0.0, 0.0, 4.0]),
                    Value::Vector([0.0, 1.0, 0.0]),
                ],
                &MetaMap::new(),
            )
            .unwrap();
        let transform = outputs[PIN_OUTPUT_TRANSFORM].expect_transform().unwrap();
        assert!((transform.x_axis().z - 1.0).abs() < 1e-12);
        assert_eq!(transform.translation(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn follow_passes_the_transform_through() {
        let transform = Transform::translate(Vec3::new(0.0, 1.0, 0.0));
        let outputs = ComponentKind::Follow
            .evaluate(&[Value::Transform(transform)], &MetaMap::new())
            .unwrap();
        assert_eq!(outputs[PIN_OUTPUT_TRANSFORM], Value::Transform(transform));
    }
}
