#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, clippy::cargo, missing_docs)]

//! Command-line front end for the external node classifier resolution
//! engine. Parses a glob of YAML/JSON ENC files into a [`enc_core::Registry`]
//! via [`enc_loader`], dispatches one mutating or read-only subcommand
//! against the named cluster, and (for mutations) writes the touched
//! cluster back out.

mod cli;
mod entry;

pub(crate) mod prelude {
    pub use anyhow::{Context as _, Error};
    pub use tracing::{debug, error, info, instrument, trace, warn};
    pub use tracing_subscriber::prelude::*;

    pub type Result<T = (), E = Error> = std::result::Result<T, E>;
}

fn main() { entry::main(); }
