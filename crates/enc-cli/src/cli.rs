//! Subcommand definitions and dispatch. Mirrors the action/nodegroup/node
//! shape of the original `go-enc` CLI, ported from hand-rolled positional
//! arguments to `clap`-derived subcommands.

use enc_core::{value::Map, Nodegroup, Registry, Value};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, clap::Parser)]
#[command(version, author, about)]
pub struct Opts {
    /// Glob pattern selecting the ENC files to load
    #[arg(long, env = "ENC_GLOB")]
    pub glob: String,

    /// Name of the active cluster (ENC file stem) to operate against
    #[arg(long, env = "ENC_CLUSTER")]
    pub cluster: String,

    /// Output format for commands that print a nodegroup or resolved node
    #[arg(long, value_enum, default_value = "yaml")]
    pub output: OutputFormat,

    /// Log filter, using env_logger-like syntax
    #[arg(long, env = "ENC_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Create, remove, or inspect a nodegroup
    Nodegroup {
        #[command(subcommand)]
        action: NodegroupAction,
    },
    /// Add, remove, or resolve a single node
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Bulk node operations
    Nodes {
        #[command(subcommand)]
        action: NodesAction,
    },
    /// Free-form parameters on a nodegroup
    Param {
        #[command(subcommand)]
        action: ParamAction,
    },
    /// Classes on a nodegroup
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },
    /// Parameters inside a class
    ClassParam {
        #[command(subcommand)]
        action: ClassParamAction,
    },
    /// Set a nodegroup's parent (empty string clears it)
    Parent { nodegroup: String, new_parent: String },
    /// Set a nodegroup's environment (empty string clears it)
    Environment { nodegroup: String, new_environment: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum NodegroupAction {
    Add {
        name: String,
        #[arg(default_value = "")]
        parent: String,
    },
    Remove {
        name: String,
    },
    Get {
        name: String,
    },
}

#[derive(Debug, clap::Subcommand)]
pub enum NodeAction {
    Add { nodegroup: String, node: String },
    Remove { nodegroup: String, node: String },
    Get { node: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum NodesAction {
    Add { nodegroup: String, nodes: Vec<String> },
}

#[derive(Debug, clap::Subcommand)]
pub enum ParamAction {
    Add { nodegroup: String, param_name: String, param_value: String },
    Set { nodegroup: String, param_name: String, param_value: String },
    Remove { nodegroup: String, param_name: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum ClassAction {
    Add { nodegroup: String, class_name: String },
    Remove { nodegroup: String, class_name: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum ClassParamAction {
    Add { nodegroup: String, class_name: String, param_name: String, param_value: String },
    Set { nodegroup: String, class_name: String, param_name: String, param_value: String },
    Remove { nodegroup: String, class_name: String, param_name: String },
}

#[instrument(level = "error", skip(opts))]
pub fn run(opts: Opts) -> Result {
    let Opts { glob, cluster, output, log_filter: _, command } = opts;

    let mut registry =
        enc_loader::load(&glob).with_context(|| format!("failed to load ENCs from {glob:?}"))?;

    match command {
        Command::Nodegroup { action } => nodegroup(&mut registry, &cluster, output, action)?,
        Command::Node { action } => node(&mut registry, &cluster, output, action)?,
        Command::Nodes { action } => nodes(&mut registry, &cluster, action)?,
        Command::Param { action } => param(&mut registry, &cluster, action)?,
        Command::Class { action } => class(&mut registry, &cluster, action)?,
        Command::ClassParam { action } => class_param(&mut registry, &cluster, action)?,
        Command::Parent { nodegroup, new_parent } => {
            registry
                .set_parent(&cluster, &nodegroup, &new_parent)
                .with_context(|| format!("failed to set parent of {nodegroup:?}"))?;
            persist(&registry, &cluster)?;
            print_nodegroup(&registry, &cluster, &nodegroup, output)?;
        },
        Command::Environment { nodegroup, new_environment } => {
            registry
                .set_environment(&cluster, &nodegroup, &new_environment)
                .with_context(|| format!("failed to set environment of {nodegroup:?}"))?;
            persist(&registry, &cluster)?;
            print_nodegroup(&registry, &cluster, &nodegroup, output)?;
        },
    }

    Ok(())
}

fn nodegroup(registry: &mut Registry, cluster: &str, output: OutputFormat, action: NodegroupAction) -> Result {
    match action {
        NodegroupAction::Add { name, parent } => {
            registry
                .add_nodegroup(cluster, &name, &parent, Map::new(), Vec::new(), Map::new())
                .with_context(|| format!("failed to add nodegroup {name:?}"))?;
            persist(registry, cluster)?;
            print_nodegroup(registry, cluster, &name, output)?;
        },
        NodegroupAction::Remove { name } => {
            registry
                .remove_nodegroup(cluster, &name)
                .with_context(|| format!("failed to remove nodegroup {name:?}"))?;
            persist(registry, cluster)?;
            info!("removed nodegroup {name:?}");
        },
        NodegroupAction::Get { name } => print_nodegroup(registry, cluster, &name, output)?,
    }
    Ok(())
}

fn node(registry: &mut Registry, cluster: &str, output: OutputFormat, action: NodeAction) -> Result {
    match action {
        NodeAction::Add { nodegroup, node } => {
            registry
                .add_node(cluster, &nodegroup, &node)
                .with_context(|| format!("failed to add node {node:?} to {nodegroup:?}"))?;
            persist(registry, cluster)?;
        },
        NodeAction::Remove { nodegroup, node } => {
            registry
                .remove_node(cluster, &nodegroup, &node)
                .with_context(|| format!("failed to remove node {node:?} from {nodegroup:?}"))?;
            persist(registry, cluster)?;
        },
        NodeAction::Get { node } => {
            let resolved = registry
                .get_node(cluster, &node)
                .with_context(|| format!("failed to resolve node {node:?}"))?;
            print_value(&resolved, output)?;
        },
    }
    Ok(())
}

fn nodes(registry: &mut Registry, cluster: &str, action: NodesAction) -> Result {
    match action {
        NodesAction::Add { nodegroup, nodes } => {
            registry
                .add_nodes(cluster, &nodegroup, &nodes)
                .with_context(|| format!("failed to add nodes to {nodegroup:?}"))?;
            persist(registry, cluster)?;
        },
    }
    Ok(())
}

fn param(registry: &mut Registry, cluster: &str, action: ParamAction) -> Result {
    match action {
        ParamAction::Add { nodegroup, param_name, param_value } => {
            registry.add_parameter(cluster, &nodegroup, &param_name, Value::from(param_value))?;
            persist(registry, cluster)?;
        },
        ParamAction::Set { nodegroup, param_name, param_value } => {
            registry.set_parameter(cluster, &nodegroup, &param_name, Value::from(param_value))?;
            persist(registry, cluster)?;
        },
        ParamAction::Remove { nodegroup, param_name } => {
            registry.remove_parameter(cluster, &nodegroup, &param_name)?;
            persist(registry, cluster)?;
        },
    }
    Ok(())
}

fn class(registry: &mut Registry, cluster: &str, action: ClassAction) -> Result {
    match action {
        ClassAction::Add { nodegroup, class_name } => {
            registry.add_class(cluster, &nodegroup, &class_name)?;
            persist(registry, cluster)?;
        },
        ClassAction::Remove { nodegroup, class_name } => {
            registry.remove_class(cluster, &nodegroup, &class_name)?;
            persist(registry, cluster)?;
        },
    }
    Ok(())
}

fn class_param(registry: &mut Registry, cluster: &str, action: ClassParamAction) -> Result {
    match action {
        ClassParamAction::Add { nodegroup, class_name, param_name, param_value } => {
            registry.add_class_parameter(
                cluster,
                &nodegroup,
                &class_name,
                &param_name,
                Value::from(param_value),
            )?;
            persist(registry, cluster)?;
        },
        ClassParamAction::Set { nodegroup, class_name, param_name, param_value } => {
            registry.set_class_parameter(
                cluster,
                &nodegroup,
                &class_name,
                &param_name,
                Value::from(param_value),
            )?;
            persist(registry, cluster)?;
        },
        ClassParamAction::Remove { nodegroup, class_name, param_name } => {
            registry.remove_class_parameter(cluster, &nodegroup, &class_name, &param_name)?;
            persist(registry, cluster)?;
        },
    }
    Ok(())
}

fn persist(registry: &Registry, cluster: &str) -> Result {
    let enc = registry.enc(cluster).context("cluster vanished after a successful mutation")?;
    enc_loader::write(enc).with_context(|| format!("failed to write cluster {cluster:?} back to disk"))
}

fn print_nodegroup(registry: &Registry, cluster: &str, name: &str, output: OutputFormat) -> Result {
    let enc = registry.enc(cluster)?;
    let ng = enc.get_nodegroup(name).with_context(|| format!("no such nodegroup {name:?}"))?;
    print_value(ng, output)
}

/// A serializable view of a resolved or stored [`Nodegroup`], independent of
/// `enc-loader`'s on-disk `RawNodegroup` projection — this one never elides
/// empty fields, since the CLI's job is to show the caller exactly what the
/// engine computed.
#[derive(serde::Serialize)]
struct NodegroupView<'a> {
    parent: &'a str,
    environment: &'a str,
    classes: &'a Map,
    parameters: &'a Map,
    nodes: &'a [String],
}

fn print_value(ng: &Nodegroup, output: OutputFormat) -> Result {
    let view = NodegroupView {
        parent: ng.parent.as_str(),
        environment: ng.environment.as_str(),
        classes: &ng.classes,
        parameters: &ng.parameters,
        nodes: ng.nodes.as_slice(),
    };
    let rendered = match output {
        OutputFormat::Yaml => serde_yaml::to_string(&view).context("failed to render YAML output")?,
        OutputFormat::Json => {
            serde_json::to_string_pretty(&view).context("failed to render JSON output")?
        },
    };
    println!("{rendered}");
    Ok(())
}
