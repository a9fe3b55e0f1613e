#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod geom;
pub mod graph;
pub mod rig;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use components::ComponentRegistry;
use geom::Transform;
use graph::Graph;
use graph::evaluator::{
    self, EvaluationError, EvaluationPlan, EvaluationResult, evaluate_with_plan,
};
use graph::node::{Node, NodeId};
use graph::value::Value;
use rig::assembler::{self, nearest_name};
use rig::{RigError, RigOptions, RigRoot, names};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    log::set_logger(&DEFAULT_LOGGER).expect("error initializing logger");
    log::set_max_level(LevelFilter::Debug);
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Geserialiseerde jointstand voor hosts.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct JointExport {
    pub name: String,
    pub position: [f64; 3],
    pub rotation: [[f64; 3]; 3],
    pub radius: f64,
}

/// Geserialiseerde controlstand voor hosts.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ControlExport {
    pub name: String,
    pub position: [f64; 3],
    pub size: f64,
}

/// Volledige rigstand na evaluatie.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RigExport {
    pub name: String,
    pub curve: String,
    pub stretch_ratio: f64,
    pub joints: Vec<JointExport>,
    pub controls: Vec<ControlExport>,
}

/// Bouwopties zoals ze over de wasm-grens binnenkomen.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RigOptionsImport {
    joint_count: Option<usize>,
    control_count: Option<usize>,
    control_size: Option<f64>,
    span_count: Option<usize>,
    strip_width: Option<f64>,
    u_min: Option<f64>,
    u_max: Option<f64>,
    target_geometry: Option<String>,
}

impl From<RigOptionsImport> for RigOptions {
    fn from(import: RigOptionsImport) -> Self {
        let defaults = RigOptions::default();
        RigOptions {
            joint_count: import.joint_count.unwrap_or(defaults.joint_count),
            control_count: import.control_count.unwrap_or(defaults.control_count),
            control_size: import.control_size.unwrap_or(defaults.control_size),
            span_count: import.span_count.unwrap_or(defaults.span_count),
            strip_width: import.strip_width.unwrap_or(defaults.strip_width),
            u_min: import.u_min.unwrap_or(defaults.u_min),
            u_max: import.u_max.unwrap_or(defaults.u_max),
            target_geometry: import.target_geometry,
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct RigEngine {
    initialized: bool,
    registry: ComponentRegistry,
    graph: Graph,
    rigs: BTreeMap<String, RigRoot>,
    evaluation_plan: Option<EvaluationPlan>,
    last_result: Option<EvaluationResult>,
    dirty_nodes: HashSet<NodeId>,
    result_dirty: bool,
}

impl Default for RigEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl RigEngine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> RigEngine {
        RigEngine {
            initialized: true,
            registry: ComponentRegistry::default(),
            graph: Graph::new(),
            rigs: BTreeMap::new(),
            evaluation_plan: None,
            last_result: None,
            dirty_nodes: HashSet::new(),
            result_dirty: false,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registreer een host-curve; `points` is een array van `[x, y, z]`.
    #[wasm_bindgen(js_name = addCurve)]
    pub fn add_curve_js(
        &mut self,
        name: &str,
        points: JsValue,
        degree: usize,
    ) -> Result<(), JsValue> {
        let points: Vec<[f64; 3]> =
            serde_wasm_bindgen::from_value(points).map_err(|err| js_error(&err.to_string()))?;
        self.add_curve(name, &points, degree).map_err(to_js_error)?;
        Ok(())
    }

    /// Schrijf nieuwe controlepunten naar een bestaande curve.
    #[wasm_bindgen(js_name = setCurvePoints)]
    pub fn set_curve_points_js(&mut self, name: &str, points: JsValue) -> Result<(), JsValue> {
        let points: Vec<[f64; 3]> =
            serde_wasm_bindgen::from_value(points).map_err(|err| js_error(&err.to_string()))?;
        self.set_curve_points(name, &points).map_err(to_js_error)
    }

    /// Bouw een rig op de genoemde curve.
    #[wasm_bindgen(js_name = buildRig)]
    pub fn build_rig_js(&mut self, curve_name: &str, options: JsValue) -> Result<(), JsValue> {
        let options: RigOptions = if options.is_undefined() || options.is_null() {
            RigOptions::default()
        } else {
            serde_wasm_bindgen::from_value::<RigOptionsImport>(options)
                .map_err(|err| js_error(&err.to_string()))?
                .into()
        };
        self.build_rig(curve_name, &options).map_err(to_js_error)?;
        Ok(())
    }

    /// Verbind doelgeometrie met een al gebouwde rig.
    #[wasm_bindgen(js_name = wireGeometry)]
    pub fn wire_geometry_js(&mut self, curve_name: &str, geometry: &str) -> Result<(), JsValue> {
        self.wire_geometry(curve_name, geometry).map_err(to_js_error)
    }

    /// Zet de stretchweging op de mastercontrol (0 = rustlengte telt,
    /// 1 = ratio altijd 1).
    #[wasm_bindgen(js_name = setStretchAmount)]
    pub fn set_stretch_amount_js(&mut self, curve_name: &str, amount: f64) -> Result<(), JsValue> {
        self.set_stretch_amount(curve_name, amount).map_err(to_js_error)
    }

    /// Zet de slide op de mastercontrol.
    #[wasm_bindgen(js_name = setSlideAmount)]
    pub fn set_slide_amount_js(&mut self, curve_name: &str, amount: f64) -> Result<(), JsValue> {
        self.set_slide_amount(curve_name, amount).map_err(to_js_error)
    }

    /// Evalueer de graph (incrementeel waar mogelijk).
    #[wasm_bindgen(js_name = evaluate)]
    pub fn evaluate_js(&mut self) -> Result<(), JsValue> {
        self.evaluate().map_err(to_js_error)
    }

    /// Haal de volledige rigstand op van de laatste evaluatie.
    #[wasm_bindgen(js_name = getRig)]
    pub fn get_rig_js(&self, curve_name: &str) -> Result<JsValue, JsValue> {
        let export = self.rig_export(curve_name).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&export).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Haalt een tekstuele weergave op van de topologisch gesorteerde graaf.
    #[wasm_bindgen(js_name = getTopologyMap)]
    pub fn get_topology_map(&self) -> Result<JsValue, JsValue> {
        let plan = self
            .evaluation_plan
            .as_ref()
            .ok_or_else(|| js_error("graph is niet voorbereid voor evaluatie"))?;

        let map = plan
            .order()
            .iter()
            .map(|id| id.0.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");

        Ok(JsValue::from_str(&map))
    }
}

impl RigEngine {
    /// Registreer een host-curve als parameternode in de scene.
    pub fn add_curve(
        &mut self,
        name: &str,
        points: &[[f64; 3]],
        degree: usize,
    ) -> Result<NodeId, RigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RigError::InvalidInput("curvenaam ontbreekt".to_owned()));
        }
        if self.graph.nodes_with_name(name).is_some() {
            return Err(RigError::NameCollision(name.to_owned()));
        }
        if points.len() < 2 {
            return Err(RigError::InvalidInput(format!(
                "curve `{name}` heeft minstens 2 punten nodig, kreeg {}",
                points.len()
            )));
        }

        let mut node = Node::component("Curve").with_nickname(name);
        node.set_input(
            components::params::PIN_INPUT_POINTS,
            points_value(points),
        );
        node.insert_meta("Degree", degree.max(1));
        let id = self.graph.add_node(node)?;

        self.invalidate_plan();
        Ok(id)
    }

    /// Schrijf nieuwe controlepunten naar een bestaande curve; de rig volgt
    /// bij de volgende evaluatie.
    pub fn set_curve_points(&mut self, name: &str, points: &[[f64; 3]]) -> Result<(), RigError> {
        if points.len() < 2 {
            return Err(RigError::InvalidInput(format!(
                "curve `{name}` heeft minstens 2 punten nodig, kreeg {}",
                points.len()
            )));
        }

        let id = self.find_node(name)?;
        let node = self
            .graph
            .node_mut(id)
            .ok_or(RigError::Graph(graph::GraphError::UnknownNode(id)))?;
        if node.name.as_deref() != Some("Curve") {
            return Err(RigError::InvalidInput(format!("`{name}` is geen curve")));
        }

        node.set_input(components::params::PIN_INPUT_POINTS, points_value(points));
        self.mark_dirty(id);
        Ok(())
    }

    /// Bouw een rig op de genoemde curve. Eén rig per curve; opnieuw bouwen
    /// botst op naam.
    pub fn build_rig(
        &mut self,
        curve_name: &str,
        options: &RigOptions,
    ) -> Result<&RigRoot, RigError> {
        if self.rigs.contains_key(curve_name) {
            return Err(RigError::NameCollision(names::rig_root(curve_name)));
        }

        let rig = assembler::build_rig(&mut self.graph, curve_name, options)?;
        self.invalidate_plan();
        let entry = self.rigs.entry(curve_name.to_owned()).or_insert(rig);
        Ok(entry)
    }

    /// Verbind doelgeometrie met een al gebouwde rig via de herbouwde curve.
    pub fn wire_geometry(&mut self, curve_name: &str, geometry: &str) -> Result<(), RigError> {
        if !self.rigs.contains_key(curve_name) {
            let suggestion = nearest_name(curve_name, self.rigs.keys().map(String::as_str));
            return Err(RigError::not_found(names::rig_root(curve_name), suggestion));
        }

        let rig = self
            .rigs
            .get_mut(curve_name)
            .ok_or_else(|| RigError::not_found(names::rig_root(curve_name), None))?;
        assembler::wire_geometry(&self.graph, rig, geometry)?;
        Ok(())
    }

    /// Zet de wereldtransform van een control.
    pub fn set_control_transform(
        &mut self,
        control_name: &str,
        transform: Transform,
    ) -> Result<(), RigError> {
        let id = self.find_node(control_name)?;
        let node = self
            .graph
            .node_mut(id)
            .ok_or(RigError::Graph(graph::GraphError::UnknownNode(id)))?;
        if node.name.as_deref() != Some("Control") {
            return Err(RigError::InvalidInput(format!(
                "`{control_name}` is geen control"
            )));
        }

        node.set_input(
            components::params::PIN_INPUT_TRANSFORM,
            Value::Transform(transform),
        );
        self.mark_dirty(id);
        Ok(())
    }

    /// Zet de stretchweging; loopt altijd via de mastercontrol van de rig.
    pub fn set_stretch_amount(&mut self, curve_name: &str, amount: f64) -> Result<(), RigError> {
        self.set_master_pin(
            curve_name,
            components::params::PIN_INPUT_NO_STRETCH,
            amount.clamp(0.0, 1.0),
        )
    }

    /// Zet de slide; loopt altijd via de mastercontrol van de rig.
    pub fn set_slide_amount(&mut self, curve_name: &str, amount: f64) -> Result<(), RigError> {
        self.set_master_pin(curve_name, components::params::PIN_INPUT_SLIDE_AMOUNT, amount)
    }

    /// Evalueer de graph: volledig na structurele wijzigingen, anders alleen
    /// de nodes stroomafwaarts van de dirty-verzameling.
    pub fn evaluate(&mut self) -> Result<(), EvaluationError> {
        if self.evaluation_plan.is_none() {
            let plan = EvaluationPlan::new(&self.graph)?;
            let result = evaluate_with_plan(&self.graph, &self.registry, &plan)?;
            self.evaluation_plan = Some(plan);
            self.last_result = Some(result);
            self.dirty_nodes.clear();
            self.result_dirty = false;
            return Ok(());
        }

        if !self.result_dirty && self.dirty_nodes.is_empty() {
            return Ok(());
        }

        let dirty_nodes = std::mem::take(&mut self.dirty_nodes);
        let plan = self
            .evaluation_plan
            .as_ref()
            .unwrap_or_else(|| unreachable!("plan is zojuist gecontroleerd"));

        match evaluator::evaluate_with_plan_incremental(
            &self.graph,
            &self.registry,
            plan,
            self.last_result.as_ref(),
            &dirty_nodes,
        ) {
            Ok((result, _changed)) => {
                self.last_result = Some(result);
                self.result_dirty = false;
                Ok(())
            }
            Err(error) => {
                self.dirty_nodes = dirty_nodes;
                Err(error)
            }
        }
    }

    /// De rig op de genoemde curve, indien gebouwd.
    #[must_use]
    pub fn rig(&self, curve_name: &str) -> Option<&RigRoot> {
        self.rigs.get(curve_name)
    }

    /// Wereldtransforms van de skinjoints, in ketenvolgorde.
    pub fn joint_world_transforms(&self, curve_name: &str) -> Result<Vec<Transform>, RigError> {
        let rig = self.find_rig(curve_name)?;
        let result = self.evaluated_result()?;

        rig.skin_joints
            .iter()
            .map(|joint| transform_output(result, joint.node))
            .collect()
    }

    /// Lokale transforms van de skinjointketen: elke joint relatief aan zijn
    /// voorganger, de eerste relatief aan de wereld.
    pub fn joint_local_transforms(&self, curve_name: &str) -> Result<Vec<Transform>, RigError> {
        let world = self.joint_world_transforms(curve_name)?;
        let mut locals = Vec::with_capacity(world.len());
        for (i, transform) in world.iter().enumerate() {
            if i == 0 {
                locals.push(*transform);
            } else {
                locals.push(world[i - 1].rigid_inverse().compose(transform));
            }
        }
        Ok(locals)
    }

    /// Wereldtransforms van de stripjoints (één per control).
    pub fn strip_joint_transforms(&self, curve_name: &str) -> Result<Vec<Transform>, RigError> {
        let rig = self.find_rig(curve_name)?;
        let result = self.evaluated_result()?;

        rig.strip_joints
            .iter()
            .map(|joint| transform_output(result, joint.node))
            .collect()
    }

    /// Wereldtransforms van de controls.
    pub fn control_transforms(&self, curve_name: &str) -> Result<Vec<Transform>, RigError> {
        let rig = self.find_rig(curve_name)?;
        let result = self.evaluated_result()?;

        rig.controls
            .iter()
            .map(|control| transform_output(result, control.node))
            .collect()
    }

    /// Actuele stretchratio van de rig.
    pub fn stretch_ratio(&self, curve_name: &str) -> Result<f64, RigError> {
        let rig = self.find_rig(curve_name)?;
        let result = self.evaluated_result()?;

        result
            .output(rig.stretch.ratio_node, components::scalar::PIN_OUTPUT)
            .ok_or_else(|| missing_output_error(rig.stretch.ratio_node))?
            .expect_number()
            .map_err(|err| RigError::InvalidInput(err.to_string()))
    }

    /// Volledige geserialiseerde rigstand.
    pub fn rig_export(&self, curve_name: &str) -> Result<RigExport, RigError> {
        let rig = self.find_rig(curve_name)?;
        let result = self.evaluated_result()?;
        let stretch_ratio = self.stretch_ratio(curve_name)?;

        let joints = rig
            .skin_joints
            .iter()
            .map(|joint| {
                let transform = transform_output(result, joint.node)?;
                Ok(JointExport {
                    name: joint.name.clone(),
                    position: transform.translation().to_array(),
                    rotation: transform.rotation_rows(),
                    radius: joint.radius,
                })
            })
            .collect::<Result<Vec<_>, RigError>>()?;

        let controls = rig
            .controls
            .iter()
            .map(|control| {
                let transform = transform_output(result, control.node)?;
                Ok(ControlExport {
                    name: control.name.clone(),
                    position: transform.translation().to_array(),
                    size: control.size,
                })
            })
            .collect::<Result<Vec<_>, RigError>>()?;

        Ok(RigExport {
            name: rig.name.clone(),
            curve: rig.curve_name.clone(),
            stretch_ratio,
            joints,
            controls,
        })
    }

    fn set_master_pin(&mut self, curve_name: &str, pin: &str, value: f64) -> Result<(), RigError> {
        if !value.is_finite() {
            return Err(RigError::InvalidInput(format!(
                "waarde voor `{pin}` moet eindig zijn"
            )));
        }

        let master = self.find_rig(curve_name)?.master_control().node;
        let node = self
            .graph
            .node_mut(master)
            .ok_or(RigError::Graph(graph::GraphError::UnknownNode(master)))?;
        node.set_input(pin, Value::Number(value));
        self.mark_dirty(master);
        Ok(())
    }

    fn find_rig(&self, curve_name: &str) -> Result<&RigRoot, RigError> {
        self.rigs.get(curve_name).ok_or_else(|| {
            let suggestion = nearest_name(curve_name, self.rigs.keys().map(String::as_str));
            RigError::not_found(names::rig_root(curve_name), suggestion)
        })
    }

    fn find_node(&self, name: &str) -> Result<NodeId, RigError> {
        self.graph
            .nodes_with_name(name)
            .and_then(|ids| ids.first().copied())
            .ok_or_else(|| {
                let suggestion = nearest_name(name, self.graph.known_names());
                RigError::not_found(name, suggestion)
            })
    }

    fn evaluated_result(&self) -> Result<&EvaluationResult, RigError> {
        if self.result_dirty || self.evaluation_plan.is_none() {
            return Err(RigError::InvalidInput(
                "graph is nog niet geëvalueerd".to_owned(),
            ));
        }
        self.last_result.as_ref().ok_or_else(|| {
            RigError::InvalidInput("graph is nog niet geëvalueerd".to_owned())
        })
    }

    fn mark_dirty(&mut self, id: NodeId) {
        self.dirty_nodes.insert(id);
        self.result_dirty = true;
    }

    fn invalidate_plan(&mut self) {
        self.evaluation_plan = None;
        self.last_result = None;
        self.dirty_nodes.clear();
        self.result_dirty = true;
    }
}

fn points_value(points: &[[f64; 3]]) -> Value {
    Value::List(points.iter().map(|p| Value::Point(*p)).collect())
}

fn transform_output(result: &EvaluationResult, node: NodeId) -> Result<Transform, RigError> {
    result
        .output(node, components::surface_attach::PIN_OUTPUT_TRANSFORM)
        .ok_or_else(|| missing_output_error(node))?
        .expect_transform()
        .map_err(|err| RigError::InvalidInput(err.to_string()))
}

fn missing_output_error(node: NodeId) -> RigError {
    RigError::InvalidInput(format!("node {} heeft nog geen output", node.0))
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point3;

    fn unit_curve_points() -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn engine_initializes() {
        let engine = RigEngine::new();
        assert!(engine.is_initialized());
    }

    #[test]
    fn duplicate_curve_names_collide() {
        let mut engine = RigEngine::new();
        engine.add_curve("cable", &unit_curve_points(), 1).unwrap();
        let err = engine
            .add_curve("cable", &unit_curve_points(), 1)
            .unwrap_err();
        assert!(matches!(err, RigError::NameCollision(_)));
    }

    #[test]
    fn reads_require_evaluation_first() {
        let mut engine = RigEngine::new();
        engine.add_curve("cable", &unit_curve_points(), 1).unwrap();
        engine
            .build_rig("cable", &RigOptions::default())
            .unwrap();

        assert!(engine.joint_world_transforms("cable").is_err());
        engine.evaluate().unwrap();
        assert!(engine.joint_world_transforms("cable").is_ok());
    }

    #[test]
    fn unknown_rig_lookup_suggests_nearest_name() {
        let mut engine = RigEngine::new();
        engine.add_curve("cable", &unit_curve_points(), 1).unwrap();
        engine.build_rig("cable", &RigOptions::default()).unwrap();

        let err = engine.wire_geometry("cabel", "geo").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cabel_Rig"), "{message}");
        assert!(message.contains("cable"), "{message}");
    }

    #[test]
    fn rig_export_carries_joint_and_control_state() {
        let mut engine = RigEngine::new();
        engine.add_curve("cable", &unit_curve_points(), 1).unwrap();
        engine.build_rig("cable", &RigOptions::default()).unwrap();
        engine.evaluate().unwrap();

        let export = engine.rig_export("cable").unwrap();
        assert_eq!(export.name, "cable_Rig");
        assert_eq!(export.joints.len(), 10);
        assert_eq!(export.controls.len(), 4);
        assert!((export.stretch_ratio - 1.0).abs() < 1e-9);

        let first = &export.joints[0];
        assert_eq!(first.name, "cable_driverJoint00");
        assert!(Point3::from_array(first.position).distance_to(Point3::ORIGIN) < 1e-6);
    }
}
