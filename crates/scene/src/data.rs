use kinspace_common::ResourceLocator;
use serde::{Deserialize, Serialize};

use crate::error::SceneGraphError;
use crate::graph::SceneGraph;
use crate::joint::Joint;
use crate::link::{Geometry, Link};

/// Flat, serializable description of a kinematic graph.
///
/// This is the hand-off format between a description parser and the
/// environment. Nothing here is checked until it is assembled into a
/// [`SceneGraph`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraphData {
    #[serde(default)]
    pub name: String,
    /// Root link name. When absent, the single link without a parent joint
    /// is used if there is exactly one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub joints: Vec<Joint>,
}

impl SceneGraphData {
    /// Rewrite every mesh uri (visual and collision) through `locator`.
    ///
    /// Stops at the first uri that cannot be resolved; uris already rewritten
    /// stay rewritten.
    pub fn resolve_resources(&mut self, locator: &dyn ResourceLocator) -> Result<(), SceneGraphError> {
        for link in &mut self.links {
            let geometries = link
                .visual
                .iter_mut()
                .map(|v| &mut v.geometry)
                .chain(link.collision.iter_mut().map(|c| &mut c.geometry));
            for geometry in geometries {
                if let Geometry::Mesh { uri, .. } = geometry {
                    let path = locator.locate(uri).map_err(|e| {
                        SceneGraphError::UnresolvedResource {
                            url: uri.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    *uri = path.to_string_lossy().into_owned();
                }
            }
        }
        Ok(())
    }

    fn inferred_root(&self) -> Option<&str> {
        let mut candidates = self
            .links
            .iter()
            .filter(|l| !self.joints.iter().any(|j| j.child_link_name == l.name));
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only.name.as_str()),
            _ => None,
        }
    }
}

impl TryFrom<SceneGraphData> for SceneGraph {
    type Error = SceneGraphError;

    /// Assemble a graph, rejecting duplicate names and joints that reference
    /// unknown links. Tree shape is left to [`SceneGraph::validate_tree`].
    fn try_from(data: SceneGraphData) -> Result<Self, Self::Error> {
        let root = data
            .root
            .clone()
            .or_else(|| data.inferred_root().map(str::to_string));
        let mut graph = SceneGraph::new(data.name);
        for link in data.links {
            graph.add_link(link)?;
        }
        for joint in data.joints {
            graph.add_joint(joint)?;
        }
        if let Some(root) = root {
            graph.set_root(&root)?;
        }
        Ok(graph)
    }
}

impl From<&SceneGraph> for SceneGraphData {
    fn from(graph: &SceneGraph) -> Self {
        Self {
            name: graph.name().to_string(),
            root: graph.root_link_name().map(str::to_string),
            links: graph.links().cloned().collect(),
            joints: graph.joints().cloned().collect(),
        }
    }
}
