//! Inheritance resolution engine for external node classifiers.
//!
//! An [`Enc`] owns a flat map of [`Nodegroup`]s and a [`chain::ChainIndex`]
//! recording every root-to-leaf path from a node through the nodegroups it
//! belongs to. A [`Registry`] scopes a set of named `Enc`s so a nodegroup in
//! one cluster can name a parent in another (`name@cluster`).

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chain;
mod enc;
mod error;
mod merge;
mod nodegroup;
mod registry;
mod resolver;
pub mod value;

pub use chain::ChainIndex;
pub use enc::{ConfigType, Enc};
pub use error::{ConflictKind, Error};
pub use merge::merge;
pub use nodegroup::Nodegroup;
pub use registry::Registry;
pub use value::Value;

/// Separator joining a node identifier to its ancestor chain, and joining
/// each ancestor to the next, inside a chain-index key.
pub const SEP: &str = "$$";

/// Separator between a nodegroup (or parent) name and its owning cluster in
/// `name@cluster` syntax.
pub const CLUSTER_SEP: char = '@';

/// Splits a possibly cluster-qualified name (`foo@bar`) into `(local,
/// cluster)`. Absent a separator, `cluster` is `None`.
#[must_use]
pub fn split_cluster(name: &str) -> (&str, Option<&str>) {
    match name.split_once(CLUSTER_SEP) {
        Some((local, cluster)) => (local, Some(cluster)),
        None => (name, None),
    }
}
