use std::fmt;

use kinspace_collision::ContactManager;
use kinspace_environment::Environment;
use kinspace_scene::JointType;
use serde::Serialize;

/// Read-only queries against an [`Environment`] for debugging and the CLI.
pub struct EnvironmentInspector;

impl EnvironmentInspector {
    pub fn summary(env: &Environment) -> EnvironmentSummary {
        EnvironmentSummary {
            name: env
                .scene_graph()
                .map(|g| g.name().to_string())
                .unwrap_or_default(),
            initialized: env.is_initialized(),
            root: env.root_link_name().map(str::to_string),
            links: env.link_count(),
            joints: env.joint_count(),
            active_links: env.active_link_names().len(),
            allowed_pairs: env.allowed_collision_matrix().len(),
            revision: env.revision(),
            pending_events: env.events().len(),
            discrete_manager: env.discrete_contact_manager().is_some(),
            continuous_manager: env.continuous_contact_manager().is_some(),
        }
    }

    pub fn inspect_link(env: &Environment, name: &str) -> Option<LinkInfo> {
        let graph = env.scene_graph()?;
        let link = graph.link(name)?;
        let parent = graph.parent_joint(name);
        Some(LinkInfo {
            name: link.name.clone(),
            parent_joint: parent.map(|j| j.name.clone()),
            joint_type: parent.map(|j| j.joint_type),
            children: graph
                .child_joints(name)
                .into_iter()
                .map(|j| j.child_link_name.clone())
                .collect(),
            collision_shapes: link.collision.len(),
            active: env.active_link_names().iter().any(|n| n == name),
            collision_enabled: env.is_link_collision_enabled(name),
        })
    }

    /// Links in depth-first order from the root, each with its depth.
    pub fn tree(env: &Environment) -> Vec<(usize, String)> {
        let Some(graph) = env.scene_graph() else {
            return Vec::new();
        };
        let mut rows: Vec<(usize, String)> = Vec::new();
        for name in graph.depth_first_link_names() {
            let depth = graph
                .parent_joint(&name)
                .and_then(|j| rows.iter().rev().find(|(_, n)| *n == j.parent_link_name))
                .map_or(0, |(d, _)| d + 1);
            rows.push((depth, name));
        }
        rows
    }

    /// Compare every attached manager against the environment.
    pub fn check_consistency(env: &Environment) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();
        if let Some(m) = env.discrete_contact_manager() {
            check_manager(env, "discrete", m, &mut report);
        }
        if let Some(m) = env.continuous_contact_manager() {
            check_manager(env, "continuous", m, &mut report);
        }
        if !report.is_consistent() {
            tracing::warn!(issues = report.issues.len(), "contact managers out of sync");
        }
        report
    }
}

fn check_manager<M>(env: &Environment, kind: &'static str, manager: &M, report: &mut ConsistencyReport)
where
    M: ContactManager + ?Sized,
{
    report.managers_checked += 1;
    if manager.active_collision_objects() != env.active_link_names() {
        report.issues.push(ConsistencyIssue::ActiveMismatch {
            manager: kind,
            expected: env.active_link_names().to_vec(),
            actual: manager.active_collision_objects().to_vec(),
        });
    }

    let Some(graph) = env.scene_graph() else {
        return;
    };
    for link in graph.links().filter(|l| l.has_collision()) {
        match manager.is_collision_object_enabled(&link.name) {
            None => report.issues.push(ConsistencyIssue::MissingObject {
                manager: kind,
                link: link.name.clone(),
            }),
            Some(enabled) if enabled != env.is_link_collision_enabled(&link.name) => {
                report.issues.push(ConsistencyIssue::EnabledMismatch {
                    manager: kind,
                    link: link.name.clone(),
                    enabled,
                })
            }
            Some(_) => {}
        }
    }
    for name in manager.collision_object_names() {
        let tracked = graph.link(&name).is_some_and(|l| l.has_collision());
        if !tracked {
            report.issues.push(ConsistencyIssue::StaleObject { manager: kind, name });
        }
    }
}

/// Summary of environment state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentSummary {
    pub name: String,
    pub initialized: bool,
    pub root: Option<String>,
    pub links: usize,
    pub joints: usize,
    pub active_links: usize,
    pub allowed_pairs: usize,
    pub revision: u64,
    pub pending_events: usize,
    pub discrete_manager: bool,
    pub continuous_manager: bool,
}

impl fmt::Display for EnvironmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.initialized {
            return write!(f, "Environment: uninitialized");
        }
        write!(
            f,
            "Environment '{}': root={} links={} joints={} active={} allowed_pairs={} revision={} managers=[{}{}]",
            self.name,
            self.root.as_deref().unwrap_or("-"),
            self.links,
            self.joints,
            self.active_links,
            self.allowed_pairs,
            self.revision,
            if self.discrete_manager { "discrete " } else { "" },
            if self.continuous_manager { "continuous" } else { "" },
        )
    }
}

/// Detailed info about a single link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    pub name: String,
    pub parent_joint: Option<String>,
    pub joint_type: Option<JointType>,
    pub children: Vec<String>,
    pub collision_shapes: usize,
    pub active: bool,
    pub collision_enabled: bool,
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joint = match (&self.parent_joint, self.joint_type) {
            (Some(name), Some(kind)) => format!("{name} ({})", kind.as_str()),
            _ => "root".to_string(),
        };
        write!(
            f,
            "Link '{}' via {} children={:?} shapes={} active={} enabled={}",
            self.name, joint, self.children, self.collision_shapes, self.active, self.collision_enabled
        )
    }
}

/// One way a manager disagrees with the environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConsistencyIssue {
    ActiveMismatch {
        manager: &'static str,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    MissingObject { manager: &'static str, link: String },
    StaleObject { manager: &'static str, name: String },
    EnabledMismatch {
        manager: &'static str,
        link: String,
        enabled: bool,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveMismatch { manager, expected, actual } => write!(
                f,
                "{manager}: active list {actual:?} differs from {expected:?}"
            ),
            Self::MissingObject { manager, link } => {
                write!(f, "{manager}: no collision object for link '{link}'")
            }
            Self::StaleObject { manager, name } => {
                write!(f, "{manager}: object '{name}' has no link in the tree")
            }
            Self::EnabledMismatch { manager, link, enabled } => {
                write!(f, "{manager}: link '{link}' enabled={enabled} disagrees with environment")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub managers_checked: usize,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "{} manager(s) in sync", self.managers_checked);
        }
        writeln!(f, "{} issue(s):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}
