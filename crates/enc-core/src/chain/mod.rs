//! The node-to-chain index: a trie over the node name concatenated with its
//! ancestor-nodegroup path.

mod trie;

use trie::{Node, Trie};

use crate::SEP;

/// Records every root-to-leaf inheritance path reachable from each node.
///
/// Two kinds of keys share the same trie: bare node identifiers
/// (`"node-0001"`), marking that a node exists, and chain keys
/// (`"node-0001$$sub$$globals"`), each describing one path from the node
/// through its directly-owning nodegroup up to the root.
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    trie: Trie,
}

impl ChainIndex {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Marks `node` as existing, independent of any particular chain.
    pub fn insert_node(&mut self, node: &str) { self.trie.insert(node); }

    /// Inserts a fully-qualified chain key.
    pub fn insert_chain(&mut self, chain: &str) { self.trie.insert(chain); }

    /// Removes a chain key. Returns `true` if it was present.
    pub fn remove_chain(&mut self, chain: &str) -> bool { self.trie.remove(chain) }

    #[must_use]
    pub fn contains_node(&self, node: &str) -> bool { self.trie.contains(node) }

    #[must_use]
    pub fn prefix_search(&self, prefix: &str) -> Vec<String> { self.trie.prefix_search(prefix) }

    #[must_use]
    pub fn fuzzy_search(&self, needle: &str) -> Vec<String> { self.trie.fuzzy_search(needle) }

    /// `true` if any chain key extends past `node || SEP || ng`, i.e. some
    /// node resolves through `ng` at a deeper level than `ng` itself. Used
    /// to decide whether removing `ng` (or a node's membership in it) is
    /// safe: a chain is only dropped once nothing beneath it still needs it.
    #[must_use]
    pub fn has_descendant_chain(&self, prefix: &str) -> bool {
        let marker = format!("{prefix}{SEP}");
        self.trie
            .prefix_search(&marker)
            .into_iter()
            .any(|k| k.len() > marker.len())
    }

    /// Every full chain rooted at `node`: the trie keys starting with `node`
    /// that actually continue past it with a `SEP`-delimited ancestor path.
    /// The bare `node` marker itself is skipped whenever real continuations
    /// exist — it exists only to answer `contains_node`, not to stand in as
    /// an (empty) chain of its own. A chain that is itself a prefix of a
    /// longer one (the node is a direct member of `ng` and, separately, a
    /// member of one of `ng`'s descendants) is a distinct membership and is
    /// still reported — only the depth-0 bare marker gets this treatment.
    #[must_use]
    pub fn chains_for(&self, node: &str) -> Vec<String> {
        let Some(root) = self.trie.node_at(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if root.terminal && root.children.is_empty() {
            out.push(node.to_owned());
        }
        let mut acc = node.to_owned();
        for (&ch, child) in &root.children {
            acc.push(ch);
            collect_chains(child, &mut acc, &mut out);
            acc.pop();
        }
        out
    }
}

fn collect_chains(node: &Node, acc: &mut String, out: &mut Vec<String>) {
    if node.terminal {
        out.push(acc.clone());
    }
    for (&ch, child) in &node.children {
        acc.push(ch);
        collect_chains(child, acc, out);
        acc.pop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chains_for_skips_bare_marker_when_chain_exists() {
        let mut idx = ChainIndex::new();
        idx.insert_node("node-0001");
        idx.insert_chain(&format!("node-0001{SEP}sub{SEP}globals"));
        let chains = idx.chains_for("node-0001");
        assert_eq!(chains, vec![format!("node-0001{SEP}sub{SEP}globals")]);
    }

    #[test]
    fn chains_for_multiple_memberships() {
        let mut idx = ChainIndex::new();
        idx.insert_node("node-0001");
        idx.insert_chain(&format!("node-0001{SEP}a"));
        idx.insert_chain(&format!("node-0001{SEP}b"));
        let mut chains = idx.chains_for("node-0001");
        chains.sort();
        let mut want = vec![format!("node-0001{SEP}a"), format!("node-0001{SEP}b")];
        want.sort();
        assert_eq!(chains, want);
    }

    #[test]
    fn chains_for_reports_a_chain_even_when_a_longer_one_extends_past_it() {
        let mut idx = ChainIndex::new();
        idx.insert_node("node-0001");
        idx.insert_chain(&format!("node-0001{SEP}parent"));
        idx.insert_chain(&format!("node-0001{SEP}parent{SEP}child"));
        let mut chains = idx.chains_for("node-0001");
        chains.sort();
        let mut want = vec![
            format!("node-0001{SEP}parent"),
            format!("node-0001{SEP}parent{SEP}child"),
        ];
        want.sort();
        assert_eq!(chains, want);
    }

    #[test]
    fn has_descendant_chain() {
        let mut idx = ChainIndex::new();
        idx.insert_chain(&format!("node-0001{SEP}parent"));
        idx.insert_chain(&format!("node-0001{SEP}parent{SEP}child"));
        assert!(idx.has_descendant_chain(&format!("node-0001{SEP}parent")));
        assert!(!idx.has_descendant_chain(&format!("node-0001{SEP}parent{SEP}child")));
    }
}
