//! Datamodel van een opgebouwde rig: typed handles in plaats van losse
//! scene-namen. Namen blijven alleen aan de buitenkant bestaan, afgeleid van
//! de curvenaam.

use crate::geom::{Point3, Polyline3, Transform};
use crate::graph::node::NodeId;

pub mod assembler;
pub mod attachment;
pub mod distribution;
pub mod stretch;

pub use assembler::{RigError, RigOptions};
pub use attachment::AttachmentPoint;
pub use distribution::ParameterDistribution;
pub use stretch::StretchState;

/// Rig-bot. Skinjoints vormen een strikte parent-keten; stripjoints staan los
/// en volgen elk hun control.
#[derive(Debug, Clone)]
pub struct Joint {
    /// Afgeleide scene-naam.
    pub name: String,
    /// Follow-node die de wereldtransform van dit bot produceert.
    pub node: NodeId,
    /// Weergavestraal, puur cosmetisch.
    pub radius: f64,
    /// Levende attachmentketen; alleen aanwezig op skinjoints.
    pub attachment: Option<AttachmentPoint>,
}

/// Door de gebruiker beweegbare control met kubusproxy en zero-transform.
#[derive(Debug, Clone)]
pub struct Control {
    /// Afgeleide scene-naam.
    pub name: String,
    /// Parameternode waarop de host de transform schrijft.
    pub node: NodeId,
    /// Neutrale plaatsing, opgevangen door de zero-parent zodat de control
    /// zelf op identiteit begint.
    pub zero: Transform,
    /// Kubusomtrek als visuele proxy.
    pub proxy: Polyline3,
    /// Zijde van de kubus.
    pub size: f64,
}

/// Opgenomen deformatiebinding. De binding zelf is een capaciteit van de
/// host; hier staat alleen wie eraan meedoet.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Skinbinding van joints op een door een node gedragen doel.
    Skin { joints: Vec<NodeId>, target: NodeId },
    /// Wire-deformer die doelgeometrie langs een gidscurve laat meebuigen.
    Wire {
        guide: NodeId,
        target: String,
        dropoff: (f64, f64),
        envelope: f64,
    },
}

/// Verborgen interne subtree: surface, middenlijn en attachment-plumbing.
/// Nooit gebruikersgericht.
#[derive(Debug, Clone)]
pub struct InternalGroup {
    pub name: String,
    pub surface_node: NodeId,
    pub centerline_node: NodeId,
}

/// Eigenaar van alle delen van één rig, één per broncurve.
#[derive(Debug, Clone)]
pub struct RigRoot {
    /// Afgeleide naam van de rigroot.
    pub name: String,
    /// Naam van de broncurve waarvan alles is afgeleid.
    pub curve_name: String,
    /// Parameternode van de broncurve.
    pub curve_node: NodeId,
    /// Verborgen interne subtree.
    pub internal: InternalGroup,
    /// Het gedeelde stretch/slide-netwerk.
    pub stretch: StretchState,
    /// Skinjoints, index 0..J-1, strikte parent-keten.
    pub skin_joints: Vec<Joint>,
    /// Stripjoints, één per control; deze drijven de surface.
    pub strip_joints: Vec<Joint>,
    /// Controls, index 0 is de master.
    pub controls: Vec<Control>,
    /// Herbouwde curve die op de skinjoints rijdt.
    pub wire_curve_node: NodeId,
    /// Afgeleide naam van de herbouwde curve.
    pub wire_curve_name: String,
    /// Opgenomen bindingen.
    pub bindings: Vec<Binding>,
}

impl RigRoot {
    /// De eerste control draagt de stretch- en slide-attributen.
    #[must_use]
    pub fn master_control(&self) -> &Control {
        &self.controls[0]
    }
}

/// Afgeleide naamgeving, gedeeld met de host-scene.
pub mod names {
    #[must_use]
    pub fn rig_root(curve: &str) -> String {
        format!("{curve}_Rig")
    }

    #[must_use]
    pub fn internal_group(curve: &str) -> String {
        format!("{curve}_NOTOUCH")
    }

    #[must_use]
    pub fn driver_surface(curve: &str) -> String {
        format!("{curve}_driverSurf")
    }

    #[must_use]
    pub fn centerline(curve: &str) -> String {
        format!("{curve}_driverSurfCrv")
    }

    #[must_use]
    pub fn arc_length(curve: &str) -> String {
        format!("{curve}_driverSurfCrvInfo")
    }

    #[must_use]
    pub fn stretch_blend(curve: &str) -> String {
        format!("{curve}_driverSurfCrvStretchBlender")
    }

    #[must_use]
    pub fn stretch_ratio(curve: &str) -> String {
        format!("{curve}_driverSurfCrvStretch")
    }

    #[must_use]
    pub fn skin_joint(curve: &str, index: usize) -> String {
        format!("{curve}_driverJoint{index:02}")
    }

    #[must_use]
    pub fn locator(curve: &str, index: usize) -> String {
        format!("{curve}driverLoc{index:02}")
    }

    #[must_use]
    pub fn control(curve: &str, index: usize) -> String {
        format!("{curve}_Ctrl{index:02}")
    }

    #[must_use]
    pub fn strip_joint(control: &str) -> String {
        format!("{control}StripJnt")
    }

    #[must_use]
    pub fn wire_curve(curve: &str) -> String {
        format!("{curve}_skinned")
    }

    #[must_use]
    pub fn wire_deformer(curve: &str) -> String {
        format!("{curve}_wire")
    }
}

/// Kubusomtrek voor controlproxies: één doorlopende polyline over alle twaalf
/// ribben. Faalt alleen op een niet-eindige zijde.
pub fn cube_outline(size: f64) -> Result<Polyline3, crate::geom::CurveError> {
    let wd = 0.5 * size;
    let corners = [
        Point3::new(-wd, wd, -wd),
        Point3::new(wd, wd, -wd),
        Point3::new(wd, -wd, -wd),
        Point3::new(-wd, -wd, -wd),
        Point3::new(-wd, wd, wd),
        Point3::new(wd, wd, wd),
        Point3::new(wd, -wd, wd),
        Point3::new(-wd, -wd, wd),
    ];
    let path = [
        0, 1, 2, 3, 0, 4, 5, 6, 7, 4, 5, 1, 0, 4, 7, 3, 0, 1, 2, 6,
    ];
    let points = path.iter().map(|&i| corners[i]).collect();
    Polyline3::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_follow_the_curve_name() {
        assert_eq!(names::rig_root("cable"), "cable_Rig");
        assert_eq!(names::internal_group("cable"), "cable_NOTOUCH");
        assert_eq!(names::skin_joint("cable", 3), "cable_driverJoint03");
        assert_eq!(names::locator("cable", 12), "cabledriverLoc12");
        assert_eq!(names::control("cable", 0), "cable_Ctrl00");
        assert_eq!(names::strip_joint("cable_Ctrl01"), "cable_Ctrl01StripJnt");
        assert_eq!(names::wire_curve("cable"), "cable_skinned");
    }

    #[test]
    fn cube_outline_walks_all_corners() {
        let outline = cube_outline(2.0).unwrap();
        assert_eq!(outline.points().len(), 20);
        for p in outline.points() {
            assert!(p.x.abs() <= 1.0 + 1e-12);
            assert!(p.y.abs() <= 1.0 + 1e-12);
            assert!(p.z.abs() <= 1.0 + 1e-12);
        }
    }
}
