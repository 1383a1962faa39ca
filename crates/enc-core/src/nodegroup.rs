use crate::{
    merge,
    value::{Map, Value},
};

/// A named bundle of classes, parameters, nodes, and environment, with an
/// optional parent.
///
/// `parent` and `environment` use the empty string to mean "unset /
/// inherit"; `parent` may additionally carry a `@cluster` suffix (see
/// [`crate::split_cluster`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nodegroup {
    pub parent: String,
    pub classes: Map,
    pub parameters: Map,
    pub environment: String,
    pub nodes: Vec<String>,
}

impl Nodegroup {
    #[must_use]
    pub fn new(
        parent: impl Into<String>,
        classes: Map,
        nodes: Vec<String>,
        parameters: Map,
    ) -> Self {
        Self {
            parent: parent.into(),
            classes,
            parameters,
            environment: String::new(),
            nodes,
        }
    }

    #[must_use]
    pub fn has_parent(&self) -> bool { !self.parent.is_empty() }

    /// Overlays `other` on top of `self`, per the resolver's nodegroup-merge
    /// rule: `other`'s environment and parent win outright (if set), node
    /// lists are last-wins rather than unioned, and classes/parameters are
    /// deep-merged.
    #[must_use]
    pub fn overlaid_by(self, other: Self) -> Self {
        Self {
            parent: other.parent,
            classes: into_map(merge(self.classes.into(), other.classes.into())),
            parameters: into_map(merge(self.parameters.into(), other.parameters.into())),
            environment: if other.environment.is_empty() {
                self.environment
            } else {
                other.environment
            },
            nodes: other.nodes,
        }
    }
}

fn into_map(v: Value) -> Map {
    match v {
        Value::Map(m) => m,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ng(parent: &str, env: &str) -> Nodegroup {
        Nodegroup {
            parent: parent.to_owned(),
            environment: env.to_owned(),
            ..Nodegroup::default()
        }
    }

    #[test]
    fn overlay_prefers_non_empty_environment() {
        let base = ng("", "env_one");
        let over = ng("sub", "");
        let merged = base.overlaid_by(over);
        assert_eq!(merged.environment, "env_one");
        assert_eq!(merged.parent, "sub");
    }

    #[test]
    fn overlay_replaces_environment_when_set() {
        let base = ng("", "env_one");
        let over = ng("sub", "env_two");
        assert_eq!(base.overlaid_by(over).environment, "env_two");
    }

    #[test]
    fn overlay_does_not_union_nodes() {
        let mut base = Nodegroup::default();
        base.nodes = vec!["a".to_owned()];
        let mut over = Nodegroup::default();
        over.nodes = vec!["b".to_owned()];
        assert_eq!(base.overlaid_by(over).nodes, vec!["b".to_owned()]);
    }
}
