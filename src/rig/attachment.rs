//! De per-punt attachmentketen: schaal → slide → afstandssample →
//! dichtstbijzijnd punt → surfaceframe → oriëntatie.

use crate::components::{curve_measure, scalar, surface_attach};
use crate::geom::{CurveGeometry, RibbonSurface, Transform, surface_frame_at};
use crate::graph::node::{Node, NodeId};
use crate::graph::value::Value;
use crate::graph::wire::Wire;
use crate::graph::{Graph, GraphError};

/// Handles van één levende attachmentketen.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPoint {
    /// Basisparameter `t0` van dit punt.
    pub base_parameter: f64,
    /// Weergaveschaal van de locator, puur cosmetisch.
    pub locator_scale: f64,
    /// Multiply: `t0 * stretchratio`.
    pub scale_node: NodeId,
    /// Add: schaalresultaat + slide.
    pub slide_node: NodeId,
    /// Point At Fraction op de middenlijn.
    pub path_node: NodeId,
    /// Closest Point op de surface.
    pub closest_node: NodeId,
    /// Surface Frame op de gevonden `(u, v)`.
    pub frame_node: NodeId,
    /// Aim Orient die de uiteindelijke transform produceert.
    pub orient_node: NodeId,
}

/// Bouwt een levende attachmentketen voor één punt en verbindt die met de
/// surface-, middenlijn- en rationode. De slide-pin houdt standaard 0 en
/// wordt later vanaf de mastercontrol aangestuurd.
pub fn build_attachment(
    graph: &mut Graph,
    locator_name: &str,
    surface_node: NodeId,
    centerline_node: NodeId,
    ratio_node: NodeId,
    base_parameter: f64,
    locator_scale: f64,
) -> Result<AttachmentPoint, GraphError> {
    let mut scale = Node::component("Multiply").with_nickname(format!("{locator_name}StretchCtrl"));
    scale.set_input(scalar::PIN_INPUT_A, Value::Number(base_parameter));
    scale.add_input_pin(scalar::PIN_INPUT_B);
    let scale_node = graph.add_node(scale)?;
    graph.add_wire(Wire::new(
        ratio_node,
        scalar::PIN_OUTPUT,
        scale_node,
        scalar::PIN_INPUT_B,
    ))?;

    let mut slide = Node::component("Add").with_nickname(format!("{locator_name}Slider"));
    slide.add_input_pin(scalar::PIN_INPUT_A);
    slide.set_input(scalar::PIN_INPUT_B, Value::Number(0.0));
    let slide_node = graph.add_node(slide)?;
    graph.add_wire(Wire::new(
        scale_node,
        scalar::PIN_OUTPUT,
        slide_node,
        scalar::PIN_INPUT_A,
    ))?;

    let mut path = Node::component("Point At Fraction").with_nickname(format!("{locator_name}MoPath"));
    path.add_input_pin(curve_measure::PIN_INPUT_CURVE);
    path.add_input_pin(curve_measure::PIN_INPUT_FRACTION);
    let path_node = graph.add_node(path)?;
    graph.add_wire(Wire::new(
        centerline_node,
        surface_attach::PIN_OUTPUT_CURVE,
        path_node,
        curve_measure::PIN_INPUT_CURVE,
    ))?;
    graph.add_wire(Wire::new(
        slide_node,
        scalar::PIN_OUTPUT,
        path_node,
        curve_measure::PIN_INPUT_FRACTION,
    ))?;

    let mut closest = Node::component("Closest Point").with_nickname(format!("{locator_name}ClsPnt"));
    closest.add_input_pin(surface_attach::PIN_INPUT_SURFACE);
    closest.add_input_pin(surface_attach::PIN_INPUT_POINT);
    let closest_node = graph.add_node(closest)?;
    graph.add_wire(Wire::new(
        surface_node,
        surface_attach::PIN_OUTPUT_SURFACE,
        closest_node,
        surface_attach::PIN_INPUT_SURFACE,
    ))?;
    graph.add_wire(Wire::new(
        path_node,
        curve_measure::PIN_OUTPUT_POSITION,
        closest_node,
        surface_attach::PIN_INPUT_POINT,
    ))?;

    let mut frame = Node::component("Surface Frame").with_nickname(format!("{locator_name}SurfInfo"));
    frame.add_input_pin(surface_attach::PIN_INPUT_SURFACE);
    frame.add_input_pin(surface_attach::PIN_INPUT_U);
    frame.add_input_pin(surface_attach::PIN_INPUT_V);
    let frame_node = graph.add_node(frame)?;
    graph.add_wire(Wire::new(
        surface_node,
        surface_attach::PIN_OUTPUT_SURFACE,
        frame_node,
        surface_attach::PIN_INPUT_SURFACE,
    ))?;
    graph.add_wire(Wire::new(
        closest_node,
        surface_attach::PIN_OUTPUT_U,
        frame_node,
        surface_attach::PIN_INPUT_U,
    ))?;
    graph.add_wire(Wire::new(
        closest_node,
        surface_attach::PIN_OUTPUT_V,
        frame_node,
        surface_attach::PIN_INPUT_V,
    ))?;

    // Aim langs de v-tangent met de u-tangent als up-referentie; beide komen
    // uit hetzelfde lokale frame, dus een aparte up-vector is niet nodig.
    let mut orient = Node::component("Aim Orient").with_nickname(format!("{locator_name}Cns"));
    orient.add_input_pin(surface_attach::PIN_INPUT_POSITION);
    orient.add_input_pin(surface_attach::PIN_INPUT_AIM);
    orient.add_input_pin(surface_attach::PIN_INPUT_UP);
    let orient_node = graph.add_node(orient)?;
    graph.add_wire(Wire::new(
        frame_node,
        surface_attach::PIN_OUTPUT_POSITION,
        orient_node,
        surface_attach::PIN_INPUT_POSITION,
    ))?;
    graph.add_wire(Wire::new(
        frame_node,
        surface_attach::PIN_OUTPUT_TANGENT_V,
        orient_node,
        surface_attach::PIN_INPUT_AIM,
    ))?;
    graph.add_wire(Wire::new(
        frame_node,
        surface_attach::PIN_OUTPUT_TANGENT_U,
        orient_node,
        surface_attach::PIN_INPUT_UP,
    ))?;

    Ok(AttachmentPoint {
        base_parameter,
        locator_scale,
        scale_node,
        slide_node,
        path_node,
        closest_node,
        frame_node,
        orient_node,
    })
}

/// Dezelfde berekening als de levende keten, maar eenmalig. Controls worden
/// hiermee geplaatst en daarna losgelaten.
#[must_use]
pub fn solve_attachment(
    surface: &RibbonSurface,
    centerline: &CurveGeometry,
    base_parameter: f64,
    stretch_ratio: f64,
    slide_amount: f64,
) -> Transform {
    let fraction = base_parameter * stretch_ratio + slide_amount;
    let sample = centerline.sample_at_fraction(fraction);
    let (u, v) = surface.closest_point(sample.point);
    let frame = surface_frame_at(surface, u, v);
    Transform::aim_frame(frame.position, frame.tangent_v, frame.tangent_u)
}

/// Plaatsing zonder stretch of slide, zoals bij de bouw van controls.
#[must_use]
pub fn solve_attachment_at_rest(
    surface: &RibbonSurface,
    centerline: &CurveGeometry,
    base_parameter: f64,
) -> Transform {
    solve_attachment(surface, centerline, base_parameter, 1.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use crate::geom::Point3;
    use crate::graph::evaluator::evaluate;
    use crate::rig::stretch::build_stretch_network;

    struct TestNetwork {
        graph: Graph,
        attachment: AttachmentPoint,
    }

    fn attachment_network(base_parameter: f64) -> TestNetwork {
        let mut graph = Graph::new();

        let mut curve = Node::component("Curve").with_nickname("cable");
        curve.set_input(
            "Points",
            Value::List(vec![
                Value::Point([0.0, 0.0, 0.0]),
                Value::Point([0.0, 0.0, 1.0]),
            ]),
        );
        curve.insert_meta("Degree", 1i64);
        let curve_node = graph.add_node(curve).unwrap();

        let mut ribbon = Node::component("Ribbon From Curve");
        ribbon.add_input_pin("Curve");
        ribbon.insert_meta("Width", 0.1);
        ribbon.insert_meta("Spans", 10i64);
        let ribbon_node = graph.add_node(ribbon).unwrap();
        graph
            .add_wire(Wire::new(curve_node, "Curve", ribbon_node, "Curve"))
            .unwrap();

        let mut iso = Node::component("Iso Curve");
        iso.add_input_pin("Surface");
        iso.insert_meta("Isoparm", 0.5);
        let iso_node = graph.add_node(iso).unwrap();
        graph
            .add_wire(Wire::new(ribbon_node, "Surface", iso_node, "Surface"))
            .unwrap();

        let stretch = build_stretch_network(&mut graph, "cable", iso_node, 1.0).unwrap();
        let attachment = build_attachment(
            &mut graph,
            "cabledriverLoc00",
            ribbon_node,
            iso_node,
            stretch.ratio_node,
            base_parameter,
            0.1,
        )
        .unwrap();

        TestNetwork { graph, attachment }
    }

    fn orient_translation(network: &TestNetwork) -> Point3 {
        let registry = ComponentRegistry::default();
        let result = evaluate(&network.graph, &registry).expect("keten evalueert");
        result
            .output(network.attachment.orient_node, surface_attach::PIN_OUTPUT_TRANSFORM)
            .unwrap()
            .expect_transform()
            .unwrap()
            .translation()
    }

    #[test]
    fn attachment_lands_on_the_curve_at_its_parameter() {
        for t0 in [0.0, 0.3, 0.5, 1.0] {
            let network = attachment_network(t0);
            let position = orient_translation(&network);
            assert!(position.x.abs() < 1e-6);
            assert!(position.y.abs() < 1e-6);
            assert!((position.z - t0).abs() < 1e-4, "t0 {t0} gaf z {}", position.z);
        }
    }

    #[test]
    fn slide_shifts_the_attachment_along_the_curve() {
        let network = attachment_network(0.25);
        let registry = ComponentRegistry::default();

        let mut slid = network.graph.clone();
        slid.node_mut(network.attachment.slide_node)
            .unwrap()
            .set_input(scalar::PIN_INPUT_B, Value::Number(0.25));

        let base = evaluate(&network.graph, &registry).unwrap();
        let shifted = evaluate(&slid, &registry).unwrap();

        let base_z = base
            .output(network.attachment.orient_node, surface_attach::PIN_OUTPUT_TRANSFORM)
            .unwrap()
            .expect_transform()
            .unwrap()
            .translation()
            .z;
        let shifted_z = shifted
            .output(network.attachment.orient_node, surface_attach::PIN_OUTPUT_TRANSFORM)
            .unwrap()
            .expect_transform()
            .unwrap()
            .translation()
            .z;

        assert!((shifted_z - base_z - 0.25).abs() < 1e-4);
    }

    #[test]
    fn repeated_evaluation_is_bit_identical() {
        let network = attachment_network(0.4);
        let registry = ComponentRegistry::default();
        let first = evaluate(&network.graph, &registry).unwrap();
        let second = evaluate(&network.graph, &registry).unwrap();

        let pin = surface_attach::PIN_OUTPUT_TRANSFORM;
        assert_eq!(
            first.output(network.attachment.orient_node, pin),
            second.output(network.attachment.orient_node, pin)
        );
    }

    #[test]
    fn one_shot_solve_matches_the_live_chain() {
        let network = attachment_network(0.6);
        let live = orient_translation(&network);

        let curve = CurveGeometry::from_points(
            &[Point3::ORIGIN, Point3::new(0.0, 0.0, 1.0)],
            1,
        )
        .unwrap();
        let surface = RibbonSurface::from_curve(&curve, 0.1, 10).unwrap();
        let centerline =
            CurveGeometry::Polyline(surface.iso_curve(0.5).unwrap());
        let solved = solve_attachment_at_rest(&surface, &centerline, 0.6);

        assert!(solved.translation().distance_to(live) < 1e-9);
    }
}
