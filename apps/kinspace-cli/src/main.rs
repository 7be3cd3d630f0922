use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use kinspace_collision::{SimpleCastManager, SimpleDiscreteManager};
use kinspace_common::PackageLocator;
use kinspace_environment::{Environment, EnvironmentConfig};
use kinspace_scene::samples::serial_arm;
use kinspace_scene::{Joint, Link, SceneGraph, SceneGraphData};
use kinspace_tools::EnvironmentInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kinspace-cli", about = "CLI tool for kinspace environments")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Environment config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a scene description and report on the resulting environment
    Inspect {
        /// Scene description (JSON)
        path: PathBuf,
        /// Package root for package:// mesh uris, as NAME=PATH
        #[arg(short, long = "package", value_parser = parse_package)]
        packages: Vec<(String, PathBuf)>,
        /// Allow collisions between adjacent links
        #[arg(long)]
        adjacent: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a scripted edit sequence on a sample arm
    Demo {
        /// Number of revolute joints in the sample arm
        #[arg(short, long, default_value = "7")]
        dof: usize,
    },
    /// Print a Graphviz diagram of a description or the sample arm
    Dot {
        /// Scene description (JSON); the sample arm when omitted
        path: Option<PathBuf>,
        #[arg(short, long, default_value = "7")]
        dof: usize,
    },
}

fn parse_package(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, root)) if !name.is_empty() && !root.is_empty() => {
            Ok((name.to_string(), PathBuf::from(root)))
        }
        _ => Err(format!("expected NAME=PATH, got '{arg}'")),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EnvironmentConfig> {
    match path {
        Some(path) => EnvironmentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EnvironmentConfig::default()),
    }
}

fn load_description(path: &Path) -> anyhow::Result<SceneGraphData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn with_managers(config: EnvironmentConfig) -> Environment {
    let mut env = Environment::new(config);
    env.set_discrete_contact_manager(Box::new(SimpleDiscreteManager::new()));
    env.set_continuous_contact_manager(Box::new(SimpleCastManager::new()));
    env
}

fn print_active(label: &str, env: &Environment) {
    println!("{label}: active=[{}]", env.active_link_names().join(", "));
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("kinspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("config: {config:?}");
            let env = Environment::new(config);
            println!("{}", EnvironmentInspector::summary(&env));
        }
        Commands::Inspect {
            path,
            packages,
            adjacent,
            json,
        } => {
            let mut data = load_description(&path)?;
            let mut locator = PackageLocator::new();
            for (name, root) in packages {
                locator.insert(name, root);
            }
            data.resolve_resources(&locator)?;
            tracing::info!(
                path = %path.display(),
                links = data.links.len(),
                joints = data.joints.len(),
                "loaded description"
            );

            let mut env = with_managers(config);
            env.init_from_description(data)
                .with_context(|| format!("initializing from {}", path.display()))?;
            if adjacent {
                env.add_adjacent_allowed_collisions()?;
            }

            let summary = EnvironmentInspector::summary(&env);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            println!("{summary}");
            for (depth, name) in EnvironmentInspector::tree(&env) {
                if let Some(info) = EnvironmentInspector::inspect_link(&env, &name) {
                    println!("{}{info}", "  ".repeat(depth));
                }
            }
            println!("{}", EnvironmentInspector::check_consistency(&env));
        }
        Commands::Demo { dof } => {
            if dof == 0 {
                anyhow::bail!("the demo arm needs at least one joint");
            }
            println!("Edit demo on a {dof}-axis arm");

            let mut env = with_managers(config);
            env.init(serial_arm(dof)?)?;
            print_active("init", &env);

            env.add_link(Link::new("link_n1"), None)?;
            env.add_link(
                Link::new("link_n2"),
                Some(Joint::fixed("joint_n1", "link_n1", "link_n2")),
            )?;
            print_active("after add", &env);

            env.move_joint("joint_n1", "tool0")?;
            print_active("after move", &env);

            let mut planner = env.clone();
            let removed = planner.remove_link(&format!("link_{dof}"))?;
            println!("clone removed {:?}", removed.link_names());
            print_active("clone", &planner);
            print_active("source", &env);

            for (label, e) in [("source", &env), ("clone", &planner)] {
                println!("{label}: {}", EnvironmentInspector::check_consistency(e));
            }
            println!("events: {}", env.events().len());
        }
        Commands::Dot { path, dof } => {
            let graph = match path {
                Some(path) => SceneGraph::try_from(load_description(&path)?)?,
                None => serial_arm(dof)?,
            };
            print!("{}", graph.to_dot());
        }
    }

    Ok(())
}
