//! Scopes a set of named [`Enc`]s so a nodegroup's parent can cross cluster
//! boundaries (`name@cluster`).

use hashbrown::{HashMap, HashSet};

use crate::{
    enc::Enc,
    error::{Error, Result},
    nodegroup::Nodegroup,
    resolver,
    split_cluster,
    value::Value,
    SEP,
};

/// A named collection of `Enc`s. Every cross-cluster-aware operation lives
/// here rather than on `Enc` itself: an `Enc` has no back-reference to its
/// owning registry, so anything that might need to cross a cluster boundary
/// is driven from the context that actually holds every cluster.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    encs: HashMap<String, Enc>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Inserts (or replaces) the `Enc` under its own `name`.
    pub fn insert(&mut self, enc: Enc) { self.encs.insert(enc.name.clone(), enc); }

    pub fn enc(&self, cluster: &str) -> Result<&Enc> {
        self.encs.get(cluster).ok_or_else(|| Error::ClusterNotFound(cluster.to_owned()))
    }

    pub fn enc_mut(&mut self, cluster: &str) -> Result<&mut Enc> {
        self.encs.get_mut(cluster).ok_or_else(|| Error::ClusterNotFound(cluster.to_owned()))
    }

    pub fn clusters(&self) -> impl Iterator<Item = &str> { self.encs.keys().map(String::as_str) }

    /// Resolves `name` (bare, looked up in `cluster`, or `local@cluster`)
    /// to its owning cluster and nodegroup.
    pub fn get_nodegroup<'a>(&'a self, cluster: &str, name: &str) -> Result<(&'a str, &'a Nodegroup)> {
        let (local, explicit) = split_cluster(name);
        let target = explicit.unwrap_or(cluster);
        let enc = self.enc(target)?;
        Ok((&enc.name, enc.get_nodegroup(local)?))
    }

    /// Child-to-root `local@cluster`-qualified parent names, starting with
    /// `start` in `cluster`. Every token is qualified, even same-cluster
    /// ones, so chain keys stay unambiguous once a registry is involved.
    fn parent_tokens(&self, cluster: &str, start: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        let mut current_cluster = cluster.to_owned();
        let mut current_name = start.to_owned();
        loop {
            let key = format!("{current_name}{}{current_cluster}", crate::CLUSTER_SEP);
            if !seen.insert(key.clone()) {
                return Err(Error::CycleDetected(start.to_owned()));
            }
            let ng = self.enc(&current_cluster)?.get_nodegroup(&current_name)?;
            tokens.push(key);
            if !ng.has_parent() {
                break;
            }
            let (local, explicit) = split_cluster(&ng.parent);
            current_name = local.to_owned();
            if let Some(c) = explicit {
                current_cluster = c.to_owned();
            }
        }
        Ok(tokens)
    }

    pub fn add_node(&mut self, cluster: &str, ng: &str, node: &str) -> Result<()> {
        if !self.enc(cluster)?.nodegroups().contains_key(ng) {
            return Err(Error::NodegroupNotFound(ng.to_owned()));
        }
        let mut tokens = self.parent_tokens(cluster, ng)?;
        tokens.reverse();
        let chain = format!("{node}{SEP}{}", tokens.join(SEP));
        self.enc_mut(cluster)?.register_membership(ng, node, &chain)
    }

    pub fn add_nodes(&mut self, cluster: &str, ng: &str, nodes: &[String]) -> Result<()> {
        for node in nodes {
            self.add_node(cluster, ng, node)?;
        }
        Ok(())
    }

    pub fn remove_node(&mut self, cluster: &str, ng: &str, node: &str) -> Result<()> {
        self.enc_mut(cluster)?.remove_node(ng, node)
    }

    pub fn add_nodegroup(
        &mut self,
        cluster: &str,
        name: &str,
        parent: &str,
        classes: crate::value::Map,
        nodes: Vec<String>,
        parameters: crate::value::Map,
    ) -> Result<()> {
        self.enc_mut(cluster)?.add_nodegroup(name, parent, classes, nodes, parameters).map(|_| ())
    }

    pub fn remove_nodegroup(&mut self, cluster: &str, name: &str) -> Result<()> {
        self.enc_mut(cluster)?.remove_nodegroup(name).map(|_| ())
    }

    pub fn add_parameter(&mut self, cluster: &str, ng: &str, key: &str, value: Value) -> Result<()> {
        self.enc_mut(cluster)?.add_parameter(ng, key, value)
    }

    pub fn set_parameter(&mut self, cluster: &str, ng: &str, key: &str, value: Value) -> Result<()> {
        self.enc_mut(cluster)?.set_parameter(ng, key, value)
    }

    pub fn remove_parameter(&mut self, cluster: &str, ng: &str, key: &str) -> Result<()> {
        self.enc_mut(cluster)?.remove_parameter(ng, key)
    }

    pub fn add_class(&mut self, cluster: &str, ng: &str, class: &str) -> Result<()> {
        self.enc_mut(cluster)?.add_class(ng, class)
    }

    pub fn remove_class(&mut self, cluster: &str, ng: &str, class: &str) -> Result<()> {
        self.enc_mut(cluster)?.remove_class(ng, class)
    }

    pub fn add_class_parameter(
        &mut self,
        cluster: &str,
        ng: &str,
        class: &str,
        key: &str,
        value: Value,
    ) -> Result<()> {
        self.enc_mut(cluster)?.add_class_parameter(ng, class, key, value)
    }

    pub fn set_class_parameter(
        &mut self,
        cluster: &str,
        ng: &str,
        class: &str,
        key: &str,
        value: Value,
    ) -> Result<()> {
        self.enc_mut(cluster)?.set_class_parameter(ng, class, key, value)
    }

    pub fn remove_class_parameter(&mut self, cluster: &str, ng: &str, class: &str, key: &str) -> Result<()> {
        self.enc_mut(cluster)?.remove_class_parameter(ng, class, key)
    }

    /// `parent` may be empty, bare (resolved in `cluster`), or
    /// `local@cluster`; validated cross-cluster before being written.
    pub fn set_parent(&mut self, cluster: &str, ng: &str, parent: &str) -> Result<()> {
        if !parent.is_empty() {
            let (local, explicit) = split_cluster(parent);
            let target = explicit.unwrap_or(cluster);
            if !self.enc(target)?.nodegroups().contains_key(local) {
                return Err(Error::NodegroupNotFound(parent.to_owned()));
            }
        }
        self.enc_mut(cluster)?.set_parent_unchecked(ng, parent)
    }

    pub fn set_environment(&mut self, cluster: &str, ng: &str, environment: &str) -> Result<()> {
        self.enc_mut(cluster)?.set_environment(ng, environment)
    }

    /// Resolves `node` within `cluster`, following cross-cluster parents
    /// wherever a nodegroup's `parent` carries a `@cluster` suffix.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_node(&self, cluster: &str, node: &str) -> Result<Nodegroup> {
        let enc = self.enc(cluster)?;
        resolver::get_node(node, enc.chains(), |tok| {
            let (local, explicit) = split_cluster(tok);
            let target = explicit.unwrap_or(cluster);
            self.enc(target)?.get_nodegroup(local).cloned()
        })
    }
}
