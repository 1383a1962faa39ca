//! A single cluster's worth of nodegroups, plus the chain index recording
//! how nodes inherit through them.

use hashbrown::HashMap;

use crate::{
    chain::ChainIndex,
    error::{Error, Result},
    nodegroup::Nodegroup,
    resolver,
    value::{Map, Value},
    SEP,
};

/// The on-disk format an [`Enc`] was loaded from, preserved so `enc-loader`
/// can write it back out the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    Json,
    Yaml,
}

/// One cluster's nodegroup store and chain index.
///
/// Standalone (outside a [`crate::Registry`]), an `Enc` resolves parents and
/// nodes entirely within itself and never qualifies a chain token with a
/// cluster suffix. A `Registry` drives the qualified, cross-cluster-aware
/// variants of the same operations by calling the `pub(crate)` seams below
/// instead of duplicating this module's bookkeeping.
#[derive(Debug, Clone)]
pub struct Enc {
    pub name: String,
    pub file_name: String,
    pub config_type: ConfigType,
    nodegroups: HashMap<String, Nodegroup>,
    chains: ChainIndex,
}

impl Enc {
    #[must_use]
    pub fn new(name: impl Into<String>, file_name: impl Into<String>, config_type: ConfigType) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            config_type,
            nodegroups: HashMap::new(),
            chains: ChainIndex::new(),
        }
    }

    #[must_use]
    pub fn nodegroups(&self) -> &HashMap<String, Nodegroup> { &self.nodegroups }

    #[must_use]
    pub fn chains(&self) -> &ChainIndex { &self.chains }

    pub fn add_nodegroup(
        &mut self,
        name: &str,
        parent: &str,
        classes: Map,
        nodes: Vec<String>,
        parameters: Map,
    ) -> Result<&Nodegroup> {
        if self.nodegroups.contains_key(name) {
            return Err(Error::NodegroupAlreadyExists(name.to_owned()));
        }
        self.nodegroups
            .insert(name.to_owned(), Nodegroup::new(parent, classes, Vec::new(), parameters));
        if !nodes.is_empty() {
            self.add_nodes(name, &nodes)?;
        }
        Ok(self.nodegroups.get(name).expect("just inserted"))
    }

    /// Removes `name`, refusing while any chain still threads through it —
    /// the chain index has no mechanism to cascade a removal to its
    /// dependents, so the caller must remove those first.
    pub fn remove_nodegroup(&mut self, name: &str) -> Result<Nodegroup> {
        if !self.nodegroups.contains_key(name) {
            return Err(Error::NodegroupNotFound(name.to_owned()));
        }
        if self.nodegroup_in_use(name) {
            return Err(Error::NodegroupInUse(name.to_owned()));
        }
        Ok(self.nodegroups.remove(name).expect("checked above"))
    }

    fn nodegroup_in_use(&self, name: &str) -> bool {
        self.chains.fuzzy_search(name).into_iter().any(|chain| {
            chain.split(SEP).skip(1).any(|tok| {
                let (local, _) = crate::split_cluster(tok);
                local == name
            })
        })
    }

    pub fn get_nodegroup(&self, name: &str) -> Result<&Nodegroup> {
        self.nodegroups.get(name).ok_or_else(|| Error::NodegroupNotFound(name.to_owned()))
    }

    fn nodegroup_mut(&mut self, name: &str) -> Result<&mut Nodegroup> {
        self.nodegroups.get_mut(name).ok_or_else(|| Error::NodegroupNotFound(name.to_owned()))
    }

    /// Child-to-root unqualified parent names, starting with `start` itself.
    /// Errs on a missing link or a cycle.
    pub(crate) fn parent_tokens(&self, start: &str) -> Result<Vec<String>> {
        let mut seen = hashbrown::HashSet::new();
        let mut tokens = Vec::new();
        let mut current = start.to_owned();
        loop {
            if !seen.insert(current.clone()) {
                return Err(Error::CycleDetected(start.to_owned()));
            }
            let ng = self.get_nodegroup(&current)?;
            tokens.push(current.clone());
            if !ng.has_parent() {
                break;
            }
            current = ng.parent.clone();
        }
        Ok(tokens)
    }

    /// Records that `node` is a (possibly indirect) member reached through
    /// `chain`, and that it directly belongs to `ng`. Used both by
    /// [`Self::add_node`] and by `Registry::add_node`, which computes the
    /// qualified cross-cluster chain itself and hands it in ready-made.
    pub(crate) fn register_membership(&mut self, ng: &str, node: &str, chain: &str) -> Result<()> {
        let g = self.nodegroup_mut(ng)?;
        if !g.nodes.iter().any(|n| n == node) {
            g.nodes.push(node.to_owned());
        }
        self.chains.insert_node(node);
        self.chains.insert_chain(chain);
        Ok(())
    }

    pub fn add_node(&mut self, ng: &str, node: &str) -> Result<()> {
        let mut tokens = self.parent_tokens(ng)?;
        tokens.reverse();
        let chain = format!("{node}{SEP}{}", tokens.join(SEP));
        self.register_membership(ng, node, &chain)
    }

    pub fn add_nodes(&mut self, ng: &str, nodes: &[String]) -> Result<()> {
        for node in nodes {
            self.add_node(ng, node)?;
        }
        Ok(())
    }

    /// Drops `node` from `ng`'s member list, and drops the chain key for
    /// that membership unless a deeper chain for the same node still
    /// extends past it — per the chain-retention policy, a shallow chain
    /// can outlive the membership it was built from once that happens.
    pub fn remove_node(&mut self, ng: &str, node: &str) -> Result<()> {
        {
            let g = self.nodegroup_mut(ng)?;
            g.nodes.retain(|n| n != node);
        }
        let mut tokens = self.parent_tokens(ng)?;
        tokens.reverse();
        let chain = format!("{node}{SEP}{}", tokens.join(SEP));
        if !self.chains.has_descendant_chain(&chain) {
            self.chains.remove_chain(&chain);
        }
        Ok(())
    }

    pub fn add_parameter(&mut self, ng: &str, key: &str, value: Value) -> Result<()> {
        self.nodegroup_mut(ng)?.parameters.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn set_parameter(&mut self, ng: &str, key: &str, value: Value) -> Result<()> {
        self.add_parameter(ng, key, value)
    }

    pub fn remove_parameter(&mut self, ng: &str, key: &str) -> Result<()> {
        let g = self.nodegroup_mut(ng)?;
        if g.parameters.shift_remove(key).is_none() {
            return Err(Error::ParameterNotFound { nodegroup: ng.to_owned(), key: key.to_owned() });
        }
        Ok(())
    }

    /// Adding a class that already exists clobbers its body with an empty
    /// map rather than erroring — there is no `ClassAlreadyExists` variant.
    pub fn add_class(&mut self, ng: &str, class: &str) -> Result<()> {
        self.nodegroup_mut(ng)?.classes.insert(class.to_owned(), Value::empty_map());
        Ok(())
    }

    pub fn remove_class(&mut self, ng: &str, class: &str) -> Result<()> {
        let g = self.nodegroup_mut(ng)?;
        if g.classes.shift_remove(class).is_none() {
            return Err(Error::ClassNotFound { nodegroup: ng.to_owned(), class: class.to_owned() });
        }
        Ok(())
    }

    fn class_body_mut(&mut self, ng: &str, class: &str) -> Result<&mut Map> {
        let g = self.nodegroup_mut(ng)?;
        let body = g
            .classes
            .get_mut(class)
            .ok_or_else(|| Error::ClassNotFound { nodegroup: ng.to_owned(), class: class.to_owned() })?;
        if body.as_map().is_none() {
            *body = Value::empty_map();
        }
        Ok(body.as_map_mut().expect("just normalized to a map"))
    }

    pub fn add_class_parameter(&mut self, ng: &str, class: &str, key: &str, value: Value) -> Result<()> {
        self.class_body_mut(ng, class)?.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn set_class_parameter(&mut self, ng: &str, class: &str, key: &str, value: Value) -> Result<()> {
        self.add_class_parameter(ng, class, key, value)
    }

    pub fn remove_class_parameter(&mut self, ng: &str, class: &str, key: &str) -> Result<()> {
        let body = self.class_body_mut(ng, class)?;
        if body.shift_remove(key).is_none() {
            return Err(Error::ParameterNotFound { nodegroup: ng.to_owned(), key: key.to_owned() });
        }
        Ok(())
    }

    /// `parent` may be empty (clear the parent) or name another nodegroup in
    /// this same `Enc`; cross-cluster parents go through
    /// `Registry::set_parent` instead.
    pub fn set_parent(&mut self, ng: &str, parent: &str) -> Result<()> {
        if !parent.is_empty() && !self.nodegroups.contains_key(parent) {
            return Err(Error::NodegroupNotFound(parent.to_owned()));
        }
        self.set_parent_unchecked(ng, parent)
    }

    /// Sets `parent` without validating it exists — used by
    /// `Registry::set_parent` once it has already resolved (possibly
    /// cross-cluster) that the parent is real.
    pub(crate) fn set_parent_unchecked(&mut self, ng: &str, parent: &str) -> Result<()> {
        self.nodegroup_mut(ng)?.parent = parent.to_owned();
        Ok(())
    }

    pub fn set_environment(&mut self, ng: &str, environment: &str) -> Result<()> {
        self.nodegroup_mut(ng)?.environment = environment.to_owned();
        Ok(())
    }

    /// Resolves `node`'s fully-merged [`Nodegroup`] within this cluster
    /// alone. Use `Registry::get_node` if any nodegroup in the chain might
    /// have a cross-cluster parent.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_node(&self, node: &str) -> Result<Nodegroup> {
        resolver::get_node(node, &self.chains, |tok| self.get_nodegroup(tok).cloned())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn enc() -> Enc { Enc::new("test", "test.yaml", ConfigType::Yaml) }

    #[test]
    fn linear_inheritance_merges_and_node_gets_direct_parameters() {
        let mut e = enc();
        e.add_nodegroup("globals", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_class("globals", "base").unwrap();
        e.add_class_parameter("globals", "base", "env", Value::from("prod")).unwrap();

        e.add_nodegroup("web", "globals", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_class("web", "nginx").unwrap();
        e.add_class_parameter("web", "nginx", "port", Value::Int(443)).unwrap();

        e.add_node("web", "node-0001").unwrap();

        let resolved = e.get_node("node-0001").unwrap();
        assert_eq!(
            resolved.classes.get("base").and_then(Value::as_map).and_then(|m| m.get("env")),
            Some(&Value::from("prod"))
        );
        assert_eq!(
            resolved.classes.get("nginx").and_then(Value::as_map).and_then(|m| m.get("port")),
            Some(&Value::Int(443))
        );
    }

    #[test]
    fn missing_node_errors() {
        let e = enc();
        assert!(matches!(e.get_node("ghost"), Err(Error::NodeNotFound(n)) if n == "ghost"));
    }

    #[test]
    fn cycle_in_parent_chain_is_detected() {
        let mut e = enc();
        e.add_nodegroup("a", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_nodegroup("b", "a", Map::new(), Vec::new(), Map::new()).unwrap();
        e.set_parent("a", "b").unwrap();
        assert!(matches!(e.add_node("b", "node-0001"), Err(Error::CycleDetected(_))));
    }

    #[test]
    fn remove_nodegroup_refuses_while_in_use() {
        let mut e = enc();
        e.add_nodegroup("globals", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_nodegroup("web", "globals", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_node("web", "node-0001").unwrap();
        assert!(matches!(e.remove_nodegroup("globals"), Err(Error::NodegroupInUse(_))));
        e.remove_node("web", "node-0001").unwrap();
        e.remove_nodegroup("web").unwrap();
        e.remove_nodegroup("globals").unwrap();
    }

    #[test]
    fn remove_node_keeps_deeper_chain_intact() {
        let mut e = enc();
        e.add_nodegroup("parent", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_nodegroup("child", "parent", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_node("parent", "node-0001").unwrap();
        e.add_node("child", "node-0001").unwrap();

        e.remove_node("parent", "node-0001").unwrap();

        assert!(e.get_node("node-0001").is_ok());
    }

    #[test]
    fn add_class_clobbers_existing_body() {
        let mut e = enc();
        e.add_nodegroup("web", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_class("web", "nginx").unwrap();
        e.add_class_parameter("web", "nginx", "port", Value::Int(80)).unwrap();
        e.add_class("web", "nginx").unwrap();
        let body = e.get_nodegroup("web").unwrap().classes.get("nginx").unwrap();
        assert!(body.is_empty_map());
    }

    #[test]
    fn divergent_chains_with_conflicting_parameters_error() {
        let mut e = enc();
        e.add_nodegroup("a", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_parameter("a", "k", Value::from("x")).unwrap();
        e.add_nodegroup("b", "", Map::new(), Vec::new(), Map::new()).unwrap();
        e.add_parameter("b", "k", Value::from("y")).unwrap();

        e.add_node("a", "node-0001").unwrap();
        e.add_node("b", "node-0001").unwrap();

        let err = e.get_node("node-0001").unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }
}
