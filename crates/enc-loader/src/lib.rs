//! File discovery, YAML/JSON parsing, and write-back for [`enc_core`]
//! clusters.
//!
//! The core consumes an already-parsed tree of [`enc_core::Value`]s and
//! knows nothing about files, globs, or serialization formats; this crate
//! is the external collaborator that bridges the two. [`load`] walks a glob
//! pattern, builds one [`enc_core::Enc`] per matching file, and folds them
//! into a [`enc_core::Registry`]; [`write`] projects a single `Enc` back
//! out to disk in the format it was loaded from.

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::{fs, path::Path};

use enc_core::{value::Map, ConfigType, Enc, Registry, Value};

/// Everything that can go wrong discovering, parsing, or writing an ENC
/// file. Kept distinct from [`enc_core::Error`] since these are all
/// failures the core never sees — they happen before an `Enc` exists, or
/// while serializing one back out.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("glob pattern {0:?} matched no files")]
    EmptyGlob(String),

    #[error("invalid glob pattern {0:?}: {1}")]
    Glob(String, #[source] glob::PatternError),

    #[error("failed to enumerate a glob match: {0}")]
    GlobIter(#[from] glob::GlobError),

    #[error("{path}: unrecognised extension, expected json|yaml|yml")]
    UnrecognizedExtension { path: String },

    #[error("{path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("{path}: {source}")]
    Json { path: String, #[source] source: serde_json::Error },

    #[error("{path}: {source}")]
    Yaml { path: String, #[source] source: serde_yaml::Error },

    #[error("{path}: top-level value is not a mapping of nodegroup name to attributes")]
    NotAMapping { path: String },

    #[error(transparent)]
    Core(#[from] enc_core::Error),
}

/// Convenience alias for fallible loader/writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Builds a [`Registry`] from every file matched by `glob_pattern`.
///
/// Construction is two-pass, per the spec: every file first contributes its
/// nodegroup skeletons with empty `nodes` lists, then every file's `nodes`
/// are registered in a second pass — so a `parent` qualified with
/// `@cluster` always resolves, regardless of which file's nodes happen to
/// be processed first.
pub fn load(glob_pattern: &str) -> Result<Registry> {
    let paths = glob::glob(glob_pattern)
        .map_err(|e| Error::Glob(glob_pattern.to_owned(), e))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if paths.is_empty() {
        return Err(Error::EmptyGlob(glob_pattern.to_owned()));
    }

    let mut registry = Registry::new();
    let mut pending_nodes = Vec::new();

    for path in &paths {
        let (enc, nodes) = load_file(path)?;
        let cluster = enc.name.clone();
        registry.insert(enc);
        pending_nodes.push((cluster, nodes));
    }

    for (cluster, nodes) in pending_nodes {
        for (ng, node_names) in nodes {
            registry.add_nodes(&cluster, &ng, &node_names)?;
        }
    }

    Ok(registry)
}

/// One file's nodegroup skeletons, plus the `(nodegroup, nodes)` pairs
/// deferred to the second pass.
fn load_file(path: &Path) -> Result<(Enc, Vec<(String, Vec<String>)>)> {
    let display = path.display().to_string();
    let config_type = match path.extension().and_then(std::ffi::OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigType::Json,
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            ConfigType::Yaml
        },
        _ => return Err(Error::UnrecognizedExtension { path: display }),
    };

    let raw = fs::read_to_string(path)
        .map_err(|source| Error::Io { path: display.clone(), source })?;

    let parsed: Map = match config_type {
        ConfigType::Json => serde_json::from_str(&raw)
            .map_err(|source| Error::Json { path: display.clone(), source })?,
        ConfigType::Yaml => serde_yaml::from_str(&raw)
            .map_err(|source| Error::Yaml { path: display.clone(), source })?,
    };

    let stem = path
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or(&display)
        .to_owned();

    let mut enc = Enc::new(stem, display.clone(), config_type);
    let mut pending_nodes = Vec::new();

    for (name, attrs) in parsed {
        let attrs = attrs.as_map().ok_or_else(|| Error::NotAMapping { path: display.clone() })?;

        let parent = attrs.get("parent").and_then(Value::as_str).unwrap_or("").to_owned();
        let environment =
            attrs.get("environment").and_then(Value::as_str).unwrap_or("").to_owned();
        let classes = attrs.get("classes").and_then(Value::as_map).cloned().unwrap_or_default();
        let parameters =
            attrs.get("parameters").and_then(Value::as_map).cloned().unwrap_or_default();
        let nodes = attrs.get("nodes").map(Value::as_str_seq).unwrap_or_default();

        enc.add_nodegroup(&name, &parent, classes, Vec::new(), parameters)?;
        if !environment.is_empty() {
            enc.set_environment(&name, &environment)?;
        }
        if !nodes.is_empty() {
            pending_nodes.push((name, nodes));
        }
    }

    tracing::debug!(path = %display, nodegroups = enc.nodegroups().len(), "loaded cluster");

    Ok((enc, pending_nodes))
}

/// Serializable projection of a [`enc_core::Nodegroup`] matching the
/// on-disk shape: empty optional fields are elided rather than written out
/// as `""`/`{}`/`[]`.
#[derive(serde::Serialize)]
struct RawNodegroup<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    parent: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    environment: &'a str,
    #[serde(skip_serializing_if = "Map::is_empty")]
    classes: &'a Map,
    #[serde(skip_serializing_if = "Map::is_empty")]
    parameters: &'a Map,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: &'a [String],
}

/// Writes `enc` back out to its `file_name`, in its original
/// [`ConfigType`]. The top-level value is the `nodegroups` map directly,
/// with no wrapping object.
pub fn write(enc: &Enc) -> Result<()> {
    let raw: indexmap::IndexMap<&str, RawNodegroup<'_>> = enc
        .nodegroups()
        .iter()
        .map(|(name, ng)| {
            (name.as_str(), RawNodegroup {
                parent: ng.parent.as_str(),
                environment: ng.environment.as_str(),
                classes: &ng.classes,
                parameters: &ng.parameters,
                nodes: ng.nodes.as_slice(),
            })
        })
        .collect();

    let path = &enc.file_name;
    match enc.config_type {
        ConfigType::Json => {
            let body = serde_json::to_string_pretty(&raw)
                .map_err(|source| Error::Json { path: path.clone(), source })?;
            fs::write(path, body).map_err(|source| Error::Io { path: path.clone(), source })?;
        },
        ConfigType::Yaml => {
            let body = serde_yaml::to_string(&raw)
                .map_err(|source| Error::Yaml { path: path.clone(), source })?;
            fs::write(path, body).map_err(|source| Error::Io { path: path.clone(), source })?;
        },
    }
    tracing::debug!(path, "wrote cluster");
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn empty_glob_errors() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.nonexistent", dir.path().display());
        assert!(matches!(load(&pattern), Err(Error::EmptyGlob(_))));
    }

    #[test]
    fn loads_yaml_and_resolves_a_node() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(
            &dir,
            "site.yaml",
            "globals:\n  classes:\n    base:\n      env: prod\nweb:\n  parent: globals\n  \
             nodes:\n    - node-0001\n",
        );
        let pattern = format!("{}/*.yaml", dir.path().display());
        let registry = load(&pattern).unwrap();
        let resolved = registry.get_node("site", "node-0001").unwrap();
        assert_eq!(
            resolved.classes.get("base").and_then(Value::as_map).and_then(|m| m.get("env")),
            Some(&Value::from("prod"))
        );
    }

    #[test]
    fn unrecognised_extension_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "site.toml", "web: {}\n");
        let pattern = format!("{}/*.toml", dir.path().display());
        assert!(matches!(load(&pattern), Err(Error::UnrecognizedExtension { .. })));
    }

    #[test]
    fn write_round_trips_and_elides_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "site.yaml", "web:\n  environment: prod\n");
        let pattern = format!("{}/*.yaml", dir.path().display());
        let registry = load(&pattern).unwrap();
        let enc = registry.enc("site").unwrap();

        write(enc).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("environment: prod"));
        assert!(!body.contains("parent"));
        assert!(!body.contains("nodes"));
    }
}
