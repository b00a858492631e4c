//! Construct Tree - Command line entry point
//!
//! Loads blueprint files and runs one command against the classes they
//! declare.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use glam::Vec3;

use construct_tree::blueprints::{ClassRegistry, Owner};
use construct_tree::construction::{spawn, SpawnParams};
use construct_tree::core::config::{set_config, ConstructionConfig};
use construct_tree::core::error::{ConstructError, Result};
use construct_tree::core::types::{InstanceId, Transform};
use construct_tree::scs::{ConstructionNode, DataValidation};

/// Inspect and run blueprint construction trees
#[derive(Parser, Debug)]
#[command(name = "construct-tree")]
#[command(about = "Inspect, validate and spawn blueprint construction trees")]
struct Args {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a class's construction tree in pre-order
    Tree {
        /// Blueprint file or directory
        path: PathBuf,
        #[arg(long)]
        class: String,
    },
    /// Validate every class in a blueprint file or directory
    Validate { path: PathBuf },
    /// Spawn an owner and print its component graph
    Spawn {
        path: PathBuf,
        #[arg(long)]
        class: String,
        /// Cook the class chain before spawning
        #[arg(long)]
        cook: bool,
        /// Explicit owner location (overrides authored root fields)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        location: Option<Vec<f32>>,
    },
    /// Print a class's construction tree as JSON
    Export {
        path: PathBuf,
        #[arg(long)]
        class: String,
    },
}

fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "construct_tree=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.config {
        let loaded = ConstructionConfig::load(path)?;
        if set_config(loaded).is_err() {
            tracing::warn!("configuration already initialised, ignoring {}", path.display());
        }
    }

    match args.command {
        Command::Tree { path, class } => {
            let registry = load_registry(&path)?;
            let generated = registry
                .class(&class)
                .ok_or_else(|| ConstructError::ClassNotFound(class.clone()))?;
            println!("{}", generated.name);
            for root in generated.construction.roots() {
                print_node(root, 1);
            }
        }
        Command::Validate { path } => {
            let registry = load_registry(&path)?;
            let mut failures = 0;
            for name in registry.class_names() {
                match registry.validate_class(name)? {
                    DataValidation::Valid => println!("{}: ok", name),
                    DataValidation::NotValidated => println!("{}: empty", name),
                    DataValidation::Invalid(errors) => {
                        failures += 1;
                        println!("{}: {} problem(s)", name, errors.len());
                        for error in errors {
                            println!("  - {}", error);
                        }
                    }
                }
            }
            if failures > 0 {
                std::process::exit(2);
            }
        }
        Command::Spawn {
            path,
            class,
            cook,
            location,
        } => {
            let mut registry = load_registry(&path)?;
            if cook {
                let chain: Vec<String> = registry
                    .ancestors(&class)
                    .iter()
                    .map(|c| c.name.clone())
                    .collect();
                for name in chain {
                    registry.cook_class(&name)?;
                }
            }
            let params = match location.as_deref() {
                Some([x, y, z]) => SpawnParams::at(Transform::from_location(Vec3::new(*x, *y, *z))),
                _ => SpawnParams::default(),
            };
            let (owner, report) = spawn(&registry, &class, &format!("{}_0", class), &params)?;

            println!("{} ({})", owner.name, owner.class);
            match owner.root_component() {
                Some(root) => print_instance(&owner, root, 1),
                None => println!("  <no root component>"),
            }
            for component in owner.components() {
                if component.attachment.is_none() && Some(component.id) != owner.root_component() {
                    println!("  [unattached] {} ({})", component.name, component.class);
                }
            }
            println!(
                "{} created, {} cooked, {} failed, {} unresolved parent(s)",
                report.created.len(),
                report.cooked_instances,
                report.failed_nodes.len(),
                report.unresolved_parents.len()
            );
        }
        Command::Export { path, class } => {
            let registry = load_registry(&path)?;
            let generated = registry
                .class(&class)
                .ok_or_else(|| ConstructError::ClassNotFound(class.clone()))?;
            println!("{}", serde_json::to_string_pretty(&generated.construction)?);
        }
    }
    Ok(())
}

fn load_registry(path: &Path) -> Result<ClassRegistry> {
    let mut registry = ClassRegistry::new();
    let names = if path.is_dir() {
        registry.load_directory(path)?
    } else {
        registry.load_file(path)?
    };
    tracing::info!(path = %path.display(), classes = names.len(), "loaded blueprints");
    Ok(registry)
}

fn print_node(node: &ConstructionNode, depth: usize) {
    let socket = node
        .attach_to
        .as_deref()
        .map(|s| format!(" @{}", s))
        .unwrap_or_default();
    let parent = node
        .parent
        .name()
        .map(|p| format!(" -> {}", p))
        .unwrap_or_default();
    println!(
        "{}{} ({}){}{}",
        "  ".repeat(depth),
        node.variable_name(),
        node.component_class(),
        socket,
        parent
    );
    for child in node.children() {
        print_node(child, depth + 1);
    }
}

fn print_instance(owner: &Owner, id: InstanceId, depth: usize) {
    let Some(component) = owner.component(id) else {
        return;
    };
    let socket = component
        .attachment
        .as_ref()
        .and_then(|a| a.socket.as_deref())
        .map(|s| format!(" @{}", s))
        .unwrap_or_default();
    let location = component.transform.location;
    println!(
        "{}{} ({}){} at ({}, {}, {})",
        "  ".repeat(depth),
        component.name,
        component.class,
        socket,
        location.x,
        location.y,
        location.z
    );
    for child in owner.children_of(id) {
        print_instance(owner, child, depth + 1);
    }
}
