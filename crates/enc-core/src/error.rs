use crate::value::Value;

/// Which bag a [`Error::Conflict`] was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Class,
    Parameter,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Class => write!(f, "class"),
            ConflictKind::Parameter => write!(f, "parameter"),
        }
    }
}

/// Every way the core can fail, per its error-handling design: mutators
/// return this and leave state untouched, the resolver aborts on the first
/// conflict, and no variant is ever swallowed.
///
/// Display is hand-rolled below rather than derived from per-variant
/// `#[error(...)]` strings, since `Conflict`'s message depends on `kind`
/// (a class conflict names the class; a parameter conflict has none).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    NodegroupAlreadyExists(String),
    NodegroupNotFound(String),
    NodegroupInUse(String),
    ClassNotFound { nodegroup: String, class: String },
    ParameterNotFound { nodegroup: String, key: String },
    NodeNotFound(String),
    CycleDetected(String),
    Conflict {
        kind: ConflictKind,
        class: Option<String>,
        key: String,
        lhs: Value,
        rhs: Value,
    },
    ClusterNotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NodegroupAlreadyExists(name) => write!(f, "nodegroup {name:?} already exists"),
            Error::NodegroupNotFound(name) => write!(f, "no such nodegroup {name:?}"),
            Error::NodegroupInUse(name) => write!(
                f,
                "nodegroup {name:?} is still referenced by one or more chains; remove its \
                 descendants first"
            ),
            Error::ClassNotFound { nodegroup, class } => {
                write!(f, "nodegroup {nodegroup:?} has no class {class:?}")
            },
            Error::ParameterNotFound { nodegroup, key } => {
                write!(f, "nodegroup {nodegroup:?} has no parameter {key:?}")
            },
            Error::NodeNotFound(name) => write!(f, "no such node {name:?}"),
            Error::CycleDetected(name) => {
                write!(f, "cycle detected while walking the parent chain of {name:?}")
            },
            Error::Conflict { kind: ConflictKind::Class, class: Some(class), key, lhs, rhs } => {
                write!(
                    f,
                    "conflicting class {class:?} parameter {key:?}: {lhs:?} vs {rhs:?} across \
                     divergent inheritance chains"
                )
            },
            Error::Conflict { kind: ConflictKind::Class, class: None, key, lhs, rhs } => {
                write!(
                    f,
                    "conflicting class parameter {key:?}: {lhs:?} vs {rhs:?} across divergent \
                     inheritance chains"
                )
            },
            Error::Conflict { kind: ConflictKind::Parameter, key, lhs, rhs, .. } => {
                write!(
                    f,
                    "conflicting parameter {key:?}: {lhs:?} vs {rhs:?} across divergent \
                     inheritance chains"
                )
            },
            Error::ClusterNotFound(name) => write!(f, "no such cluster {name:?}"),
        }
    }
}

/// Convenience alias for fallible core operations.
pub type Result<T> = std::result::Result<T, Error>;
