//! Opbouw van een complete rig uit één curve: verdeling, jointketen,
//! controls, stretchnetwerk en bindingen.

use crate::components::{curve_measure, params, scalar, surface_attach};
use crate::geom::{CurveGeometry, Point3, RibbonSurface};
use crate::graph::node::{Node, NodeId};
use crate::graph::value::Value;
use crate::graph::wire::Wire;
use crate::graph::{Graph, GraphError};

use super::distribution::ParameterDistribution;
use super::{
    Binding, Control, InternalGroup, Joint, RigRoot, attachment, cube_outline, names, stretch,
};

/// Bouwopties voor een kabelrig.
#[derive(Debug, Clone, PartialEq)]
pub struct RigOptions {
    /// Aantal skinjoints (minimaal 2).
    pub joint_count: usize,
    /// Aantal controls (minimaal 2).
    pub control_count: usize,
    /// Zijde van de controlkubussen.
    pub control_size: f64,
    /// Aantal spans van de ribbonsurface.
    pub span_count: usize,
    /// Breedte van de ribbonsurface.
    pub strip_width: f64,
    /// Ondergrens van het sub-bereik voor jointverdeling.
    pub u_min: f64,
    /// Bovengrens van het sub-bereik voor jointverdeling.
    pub u_max: f64,
    /// Doelgeometrie voor de wire-binding, indien aanwezig.
    pub target_geometry: Option<String>,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            joint_count: 10,
            control_count: 4,
            control_size: 0.1,
            span_count: 10,
            strip_width: 0.1,
            u_min: 0.0,
            u_max: 1.0,
            target_geometry: None,
        }
    }
}

/// Foutsoorten van de rigbouw, synchroon gemeld en nooit intern herkanst.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("ongeldige input: {0}")]
    InvalidInput(String),
    #[error("naamconflict: `{0}` bestaat al in de scene")]
    NameCollision(String),
    #[error("`{name}` niet gevonden in de scene{hint}")]
    NotFound { name: String, hint: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl RigError {
    #[must_use]
    pub fn not_found(name: impl Into<String>, suggestion: Option<&str>) -> Self {
        let hint = suggestion
            .map(|s| format!(" (bedoelde je `{s}`?)"))
            .unwrap_or_default();
        Self::NotFound {
            name: name.into(),
            hint,
        }
    }
}

/// Dichtstbijzijnde bekende naam voor een lookup die niets opleverde.
#[must_use]
pub fn nearest_name<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.trim().to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| {
            (
                levenshtein::levenshtein(&target, &candidate.trim().to_lowercase()),
                candidate,
            )
        })
        .filter(|(distance, _)| *distance <= target.len().max(4) / 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Bouwt een volledige rig op de genoemde curve. Alle validatie gebeurt
/// vooraf; een gedeeltelijke bouw wordt bij latere graphfouten niet
/// teruggedraaid.
pub fn build_rig(
    graph: &mut Graph,
    curve_name: &str,
    options: &RigOptions,
) -> Result<RigRoot, RigError> {
    let curve_node = find_curve_node(graph, curve_name)?;
    validate_options(options)?;
    ensure_names_free(graph, curve_name)?;

    // Bouwtijdgeometrie: nodig voor de rustlengte en de controlplaatsing.
    let geometry = curve_geometry_of(graph, curve_node)?;
    let ribbon = RibbonSurface::from_curve(&geometry, options.strip_width, options.span_count)
        .map_err(|err| RigError::InvalidInput(err.to_string()))?;
    let centerline_polyline = ribbon
        .iso_curve(0.5)
        .map_err(|err| RigError::InvalidInput(err.to_string()))?;
    let rest_length = centerline_polyline.total_length();
    let centerline_geometry = CurveGeometry::Polyline(centerline_polyline);

    log::debug!(
        "start rigbouw voor `{curve_name}`: {} joints, {} controls, rustlengte {rest_length}",
        options.joint_count,
        options.control_count
    );

    // Surface- en middenlijnnodes; de surface volgt de curve vanaf nu live.
    let mut ribbon_node = Node::component("Ribbon From Curve")
        .with_nickname(names::driver_surface(curve_name));
    ribbon_node.add_input_pin(surface_attach::PIN_INPUT_CURVE);
    ribbon_node.insert_meta("Width", options.strip_width);
    ribbon_node.insert_meta("Spans", options.span_count);
    let surface_node = graph.add_node(ribbon_node)?;
    graph.add_wire(Wire::new(
        curve_node,
        params::PIN_OUTPUT_CURVE,
        surface_node,
        surface_attach::PIN_INPUT_CURVE,
    ))?;

    let mut iso_node = Node::component("Iso Curve").with_nickname(names::centerline(curve_name));
    iso_node.add_input_pin(surface_attach::PIN_INPUT_SURFACE);
    iso_node.insert_meta("Isoparm", 0.5);
    let centerline_node = graph.add_node(iso_node)?;
    graph.add_wire(Wire::new(
        surface_node,
        surface_attach::PIN_OUTPUT_SURFACE,
        centerline_node,
        surface_attach::PIN_INPUT_SURFACE,
    ))?;

    let stretch_state =
        stretch::build_stretch_network(graph, curve_name, centerline_node, rest_length)?;

    // Skinjoints: verdeling met randvrijstelling, elk permanent aan de
    // surface gekoppeld, als keten geparent.
    let joint_distribution = ParameterDistribution::new(
        options.joint_count,
        options.u_min,
        options.u_max,
        true,
    );
    let mut skin_joints = Vec::with_capacity(options.joint_count);
    for i in 0..options.joint_count {
        let base_parameter = joint_distribution.parameter_at(i);
        let locator_name = names::locator(curve_name, i);
        let point = attachment::build_attachment(
            graph,
            &locator_name,
            surface_node,
            centerline_node,
            stretch_state.ratio_node,
            base_parameter,
            options.strip_width,
        )?;

        let joint_name = names::skin_joint(curve_name, i);
        let mut follow = Node::component("Follow").with_nickname(joint_name.as_str());
        follow.add_input_pin(surface_attach::PIN_INPUT_TRANSFORM);
        let joint_node = graph.add_node(follow)?;
        graph.add_wire(Wire::new(
            point.orient_node,
            surface_attach::PIN_OUTPUT_TRANSFORM,
            joint_node,
            surface_attach::PIN_INPUT_TRANSFORM,
        ))?;

        skin_joints.push(Joint {
            name: joint_name,
            node: joint_node,
            radius: options.strip_width,
            attachment: Some(point),
        });
    }

    // Controls: uniforme verdeling, eenmalige plaatsing, daarna vrijstaand.
    // De eerste control is groter en draagt de stretch- en slide-pinnen.
    let control_distribution = ParameterDistribution::uniform(options.control_count);
    let mut controls = Vec::with_capacity(options.control_count);
    let mut strip_joints = Vec::with_capacity(options.control_count);
    for j in 0..options.control_count {
        let base_parameter = control_distribution.parameter_at(j);
        let zero = attachment::solve_attachment_at_rest(
            &ribbon,
            &centerline_geometry,
            base_parameter,
        );

        let size = if j == 0 {
            options.control_size * 1.8
        } else {
            options.control_size
        };
        let control_name = names::control(curve_name, j);
        let mut control_node = Node::component("Control").with_nickname(control_name.as_str());
        control_node.set_input(params::PIN_INPUT_TRANSFORM, Value::Transform(zero));
        if j == 0 {
            control_node.set_input(params::PIN_INPUT_NO_STRETCH, Value::Number(0.0));
            control_node.set_input(params::PIN_INPUT_SLIDE_AMOUNT, Value::Number(0.0));
        }
        let control_id = graph.add_node(control_node)?;

        let proxy = cube_outline(size).map_err(|err| RigError::InvalidInput(err.to_string()))?;
        controls.push(Control {
            name: control_name.clone(),
            node: control_id,
            zero,
            proxy,
            size,
        });

        let strip_name = names::strip_joint(&control_name);
        let mut strip = Node::component("Follow").with_nickname(strip_name.as_str());
        strip.add_input_pin(surface_attach::PIN_INPUT_TRANSFORM);
        let strip_node = graph.add_node(strip)?;
        graph.add_wire(Wire::new(
            control_id,
            params::PIN_OUTPUT_TRANSFORM,
            strip_node,
            surface_attach::PIN_INPUT_TRANSFORM,
        ))?;

        strip_joints.push(Joint {
            name: strip_name,
            node: strip_node,
            radius: options.strip_width * 1.3,
            attachment: None,
        });
    }

    // De mastercontrol stuurt het gedeelde stretch/slide-netwerk.
    let master = controls[0].node;
    graph.add_wire(Wire::new(
        master,
        params::PIN_OUTPUT_NO_STRETCH,
        stretch_state.blend_node,
        scalar::PIN_INPUT_BLENDER,
    ))?;
    for joint in &skin_joints {
        if let Some(point) = &joint.attachment {
            graph.add_wire(Wire::new(
                master,
                params::PIN_OUTPUT_SLIDE_AMOUNT,
                point.slide_node,
                scalar::PIN_INPUT_B,
            ))?;
        }
    }

    // Herbouwde curve die op de skinjoints rijdt.
    let wire_curve_name = names::wire_curve(curve_name);
    let mut wire_node = Node::component("Rebuild Curve").with_nickname(wire_curve_name.as_str());
    wire_node.add_input_pin(curve_measure::PIN_INPUT_CURVE);
    wire_node.insert_meta("Spans", options.joint_count.saturating_sub(2).max(1));
    wire_node.insert_meta("Degree", 3usize);
    let wire_curve_node = graph.add_node(wire_node)?;
    graph.add_wire(Wire::new(
        curve_node,
        params::PIN_OUTPUT_CURVE,
        wire_curve_node,
        curve_measure::PIN_INPUT_CURVE,
    ))?;

    // Bindingen: stripjoints dragen de surface, skinjoints dragen de
    // herbouwde curve, en die curve stuurt optioneel doelgeometrie aan.
    let mut bindings = vec![
        Binding::Skin {
            joints: strip_joints.iter().map(|joint| joint.node).collect(),
            target: surface_node,
        },
        Binding::Skin {
            joints: skin_joints.iter().map(|joint| joint.node).collect(),
            target: wire_curve_node,
        },
    ];
    if let Some(geometry) = &options.target_geometry {
        bindings.push(Binding::Wire {
            guide: wire_curve_node,
            target: geometry.clone(),
            dropoff: (0.0, 10.0),
            envelope: 1.0,
        });
    }

    log::debug!("rigbouw voor `{curve_name}` compleet");

    Ok(RigRoot {
        name: names::rig_root(curve_name),
        curve_name: curve_name.to_owned(),
        curve_node,
        internal: InternalGroup {
            name: names::internal_group(curve_name),
            surface_node,
            centerline_node,
        },
        stretch: stretch_state,
        skin_joints,
        strip_joints,
        controls,
        wire_curve_node,
        wire_curve_name,
        bindings,
    })
}

/// Voegt een wire-binding toe aan een al gebouwde rig.
pub fn wire_geometry(
    graph: &Graph,
    rig: &mut RigRoot,
    geometry_name: &str,
) -> Result<Binding, RigError> {
    if geometry_name.trim().is_empty() {
        return Err(RigError::InvalidInput(
            "doelgeometrie voor de wire-binding ontbreekt".to_owned(),
        ));
    }

    // De interne groep en de herbouwde curve moeten nog bestaan; de rig kan
    // na de bouw immers deels opgeruimd zijn.
    if graph.node(rig.internal.surface_node).is_none()
        || graph.node(rig.internal.centerline_node).is_none()
    {
        return Err(RigError::not_found(rig.internal.name.clone(), None));
    }
    if graph.node(rig.wire_curve_node).is_none() {
        let suggestion = nearest_name(&rig.wire_curve_name, graph.known_names());
        return Err(RigError::not_found(rig.wire_curve_name.clone(), suggestion));
    }

    let binding = Binding::Wire {
        guide: rig.wire_curve_node,
        target: geometry_name.to_owned(),
        dropoff: (0.0, 10.0),
        envelope: 1.0,
    };
    rig.bindings.push(binding.clone());
    log::debug!("wire-binding toegevoegd: `{geometry_name}` volgt `{}`", rig.wire_curve_name);
    Ok(binding)
}

fn find_curve_node(graph: &Graph, curve_name: &str) -> Result<NodeId, RigError> {
    let id = graph
        .nodes_with_name(curve_name)
        .and_then(|ids| ids.first().copied())
        .ok_or_else(|| {
            RigError::InvalidInput(format!("`{curve_name}` niet gevonden in de scene"))
        })?;

    let node = graph
        .node(id)
        .ok_or_else(|| RigError::InvalidInput(format!("`{curve_name}` niet gevonden in de scene")))?;
    if node.name.as_deref() != Some("Curve") {
        return Err(RigError::InvalidInput(format!(
            "`{curve_name}` is geen curve"
        )));
    }
    Ok(id)
}

fn validate_options(options: &RigOptions) -> Result<(), RigError> {
    if options.joint_count < 2 {
        return Err(RigError::InvalidInput(format!(
            "minstens 2 joints vereist, kreeg {}",
            options.joint_count
        )));
    }
    if options.control_count < 2 {
        return Err(RigError::InvalidInput(format!(
            "minstens 2 controls vereist, kreeg {}",
            options.control_count
        )));
    }
    if options.span_count < 2 {
        return Err(RigError::InvalidInput(format!(
            "minstens 2 spans vereist, kreeg {}",
            options.span_count
        )));
    }
    if !(options.strip_width > 0.0) || !options.strip_width.is_finite() {
        return Err(RigError::InvalidInput(
            "stripbreedte moet positief en eindig zijn".to_owned(),
        ));
    }
    if !(options.control_size > 0.0) || !options.control_size.is_finite() {
        return Err(RigError::InvalidInput(
            "controlgrootte moet positief en eindig zijn".to_owned(),
        ));
    }
    if !(0.0..=1.0).contains(&options.u_min)
        || !(0.0..=1.0).contains(&options.u_max)
        || options.u_min > options.u_max
    {
        return Err(RigError::InvalidInput(format!(
            "ongeldig sub-bereik [{}, {}]",
            options.u_min, options.u_max
        )));
    }
    Ok(())
}

fn ensure_names_free(graph: &Graph, curve_name: &str) -> Result<(), RigError> {
    let derived = [
        names::rig_root(curve_name),
        names::driver_surface(curve_name),
        names::centerline(curve_name),
        names::wire_curve(curve_name),
    ];
    for name in derived {
        if graph.nodes_with_name(&name).is_some() {
            return Err(RigError::NameCollision(name));
        }
    }
    Ok(())
}

fn curve_geometry_of(graph: &Graph, curve_node: NodeId) -> Result<CurveGeometry, RigError> {
    let node = graph
        .node(curve_node)
        .ok_or(RigError::Graph(GraphError::UnknownNode(curve_node)))?;

    let points_value = node
        .inputs
        .get(params::PIN_INPUT_POINTS)
        .ok_or_else(|| RigError::InvalidInput("curvenode heeft geen controlepunten".to_owned()))?;
    let points: Vec<Point3> = points_value
        .expect_list()
        .map_err(|err| RigError::InvalidInput(err.to_string()))?
        .iter()
        .map(|value| value.expect_point().map(Point3::from_array))
        .collect::<Result<_, _>>()
        .map_err(|err| RigError::InvalidInput(err.to_string()))?;

    let degree = node
        .meta("Degree")
        .and_then(crate::graph::node::MetaValue::as_integer)
        .unwrap_or(3)
        .max(1) as usize;

    CurveGeometry::from_points(&points, degree)
        .map_err(|err| RigError::InvalidInput(err.to_string()))
}
