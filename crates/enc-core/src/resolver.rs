//! The `GetNode` algorithm: discover every inheritance chain rooted at a
//! node, merge the common prefix once, merge each divergent tail in
//! isolation, conflict-check the tails against each other, then overlay the
//! collapsed tail result on the common-prefix merge.

use crate::{
    chain::ChainIndex,
    error::{ConflictKind, Error, Result},
    nodegroup::Nodegroup,
    value::Map,
    SEP,
};

/// `lookup` resolves a single chain token (a nodegroup name, possibly
/// `local@cluster`-qualified) to its [`Nodegroup`]. Abstracting over the
/// lookup this way lets [`crate::Enc`] and [`crate::Registry`] share this
/// whole algorithm instead of each re-implementing it with their own
/// cross-cluster rules baked in.
#[tracing::instrument(level = "debug", skip(chains, lookup))]
pub(crate) fn get_node(
    node: &str,
    chains: &ChainIndex,
    mut lookup: impl FnMut(&str) -> Result<Nodegroup>,
) -> Result<Nodegroup> {
    if !chains.contains_node(node) {
        return Err(Error::NodeNotFound(node.to_owned()));
    }

    let mut raw_chains = chains.chains_for(node);
    raw_chains.sort_unstable();
    if raw_chains.is_empty() {
        return Err(Error::NodeNotFound(node.to_owned()));
    }
    tracing::trace!(chains = raw_chains.len(), "discovered inheritance chains");

    let token_lists: Vec<Vec<&str>> =
        raw_chains.iter().map(|chain| chain.split(SEP).collect()).collect();

    let common_len = common_prefix_len(&token_lists);

    let mut base = Nodegroup::default();
    for tok in &token_lists[0][1..common_len] {
        base = base.overlaid_by(lookup(tok)?);
    }

    let mut tails = Vec::with_capacity(token_lists.len());
    for tokens in &token_lists {
        let mut tail = Nodegroup::default();
        for tok in &tokens[common_len..] {
            tail = tail.overlaid_by(lookup(tok)?);
        }
        tails.push(tail);
    }

    for i in 0..tails.len() {
        for j in (i + 1)..tails.len() {
            check_conflicts(&tails[i], &tails[j])?;
        }
    }

    let collapsed = tails.into_iter().fold(Nodegroup::default(), Nodegroup::overlaid_by);

    Ok(base.overlaid_by(collapsed))
}

/// The node token (index 0) is always shared since every chain starts with
/// the same node; walk ancestor tokens from the root until one diverges.
fn common_prefix_len(token_lists: &[Vec<&str>]) -> usize {
    let min_len = token_lists.iter().map(Vec::len).min().unwrap_or(1);
    let mut len = 1;
    while len < min_len && token_lists.iter().all(|toks| toks[len] == token_lists[0][len]) {
        len += 1;
    }
    len
}

fn check_conflicts(a: &Nodegroup, b: &Nodegroup) -> Result<()> {
    check_class_conflicts(&a.classes, &b.classes)?;
    check_parameter_conflicts(&a.parameters, &b.parameters)
}

fn check_class_conflicts(a: &Map, b: &Map) -> Result<()> {
    for (class, a_body) in a {
        let Some(b_body) = b.get(class) else { continue };
        let (Some(a_params), Some(b_params)) = (a_body.as_map(), b_body.as_map()) else {
            continue;
        };
        for (key, a_val) in a_params {
            let Some(b_val) = b_params.get(key) else { continue };
            if a_val != b_val {
                return Err(Error::Conflict {
                    kind: ConflictKind::Class,
                    class: Some(class.clone()),
                    key: key.clone(),
                    lhs: a_val.clone(),
                    rhs: b_val.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_parameter_conflicts(a: &Map, b: &Map) -> Result<()> {
    for (key, a_val) in a {
        let Some(b_val) = b.get(key) else { continue };
        if a_val != b_val {
            return Err(Error::Conflict {
                kind: ConflictKind::Parameter,
                class: None,
                key: key.clone(),
                lhs: a_val.clone(),
                rhs: b_val.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn ng(parent: &str, classes: Map, parameters: Map) -> Nodegroup {
        Nodegroup::new(parent, classes, Vec::new(), parameters)
    }

    fn map(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Map {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn linear_chain_merges_root_to_leaf() {
        let mut chains = ChainIndex::new();
        chains.insert_node("node-0001");
        chains.insert_chain(&format!("node-0001{SEP}globals{SEP}sub{SEP}subsub"));

        let groups: Map = map([
            (
                "globals",
                Value::Map(map([("c", Value::Map(map([("override_me", "bad".into())])))])),
            ),
            (
                "sub",
                Value::Map(map([("c", Value::Map(map([("unique", "keep".into())])))])),
            ),
            (
                "subsub",
                Value::Map(map([("c", Value::Map(map([("override_me", "good".into())])))])),
            ),
        ]);

        let got = get_node("node-0001", &chains, |tok| match groups.get(tok) {
            Some(Value::Map(body)) => Ok(ng(
                "",
                body.get("c").and_then(Value::as_map).cloned().map_or_else(Map::new, |m| {
                    map([("c", Value::Map(m))])
                }),
                Map::new(),
            )),
            _ => Err(Error::NodegroupNotFound(tok.to_owned())),
        })
        .unwrap();

        let c = got.classes.get("c").and_then(Value::as_map).unwrap();
        assert_eq!(c.get("override_me"), Some(&Value::from("good")));
        assert_eq!(c.get("unique"), Some(&Value::from("keep")));
    }

    #[test]
    fn disjoint_multi_chain_unions() {
        let mut chains = ChainIndex::new();
        chains.insert_node("node-0001");
        chains.insert_chain(&format!("node-0001{SEP}a"));
        chains.insert_chain(&format!("node-0001{SEP}b"));

        let a = ng("", map([("cls", Value::Map(map([("k1", "v1".into())])))]), Map::new());
        let b = ng("", map([("cls", Value::Map(map([("k2", "v2".into())])))]), Map::new());

        let got = get_node("node-0001", &chains, |tok| match tok {
            "a" => Ok(a.clone()),
            "b" => Ok(b.clone()),
            _ => Err(Error::NodegroupNotFound(tok.to_owned())),
        })
        .unwrap();

        let cls = got.classes.get("cls").and_then(Value::as_map).unwrap();
        assert_eq!(cls.get("k1"), Some(&Value::from("v1")));
        assert_eq!(cls.get("k2"), Some(&Value::from("v2")));
    }

    #[test]
    fn conflicting_multi_chain_errors() {
        let mut chains = ChainIndex::new();
        chains.insert_node("node-0001");
        chains.insert_chain(&format!("node-0001{SEP}a"));
        chains.insert_chain(&format!("node-0001{SEP}b"));

        let a = ng("", map([("cls", Value::Map(map([("k", "x".into())])))]), Map::new());
        let b = ng("", map([("cls", Value::Map(map([("k", "y".into())])))]), Map::new());

        let err = get_node("node-0001", &chains, |tok| match tok {
            "a" => Ok(a.clone()),
            "b" => Ok(b.clone()),
            _ => Err(Error::NodegroupNotFound(tok.to_owned())),
        })
        .unwrap_err();

        match err {
            Error::Conflict { kind: ConflictKind::Class, class, key, lhs, rhs } => {
                assert_eq!(class.as_deref(), Some("cls"));
                assert_eq!(key, "k");
                assert_eq!(lhs, Value::from("x"));
                assert_eq!(rhs, Value::from("y"));
            },
            other => panic!("expected a class conflict, got {other:?}"),
        }
    }

    #[test]
    fn missing_node_errors() {
        let chains = ChainIndex::new();
        let err = get_node("nope", &chains, |_| unreachable!()).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(n) if n == "nope"));
    }
}
