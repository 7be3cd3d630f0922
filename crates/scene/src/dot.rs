use std::fmt::Write;

use crate::graph::SceneGraph;

impl SceneGraph {
    /// Render the graph in Graphviz DOT format for debugging.
    ///
    /// Links are boxes (the root is doubled), joints are edges labelled with
    /// their name and type.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", escape(self.name()));
        let _ = writeln!(out, "  rankdir=TB;");
        for link in self.links() {
            let peripheries = if self.root_link_name() == Some(link.name.as_str()) {
                2
            } else {
                1
            };
            let _ = writeln!(
                out,
                "  \"{}\" [shape=box, peripheries={peripheries}];",
                escape(&link.name)
            );
        }
        for joint in self.joints() {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"{}\\n{}\"];",
                escape(&joint.parent_link_name),
                escape(&joint.child_link_name),
                escape(&joint.name),
                joint.joint_type.as_str()
            );
        }
        out.push_str("}\n");
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
