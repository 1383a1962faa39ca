use tracing_subscriber::EnvFilter;

use crate::{cli::Opts, prelude::*};

macro_rules! init_error {
    ($($args:tt)*) => ({
        ::tracing::error!($($args)*);
        ::std::process::exit(1);
    })
}

fn fmt_layer<S>() -> tracing_subscriber::fmt::Layer<S> {
    // configure log format here
    tracing_subscriber::fmt::layer()
}

#[allow(clippy::inline_always)]
#[inline(always)]
pub fn main() {
    let tmp_logger =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(fmt_layer()));
    let span = tracing::error_span!("boot").entered();

    [
        ".env.local",
        if cfg!(debug_assertions) {
            ".env.dev"
        } else {
            ".env.prod"
        },
        ".env",
    ]
    .into_iter()
    .try_for_each(|p| match dotenv::from_filename(p) {
        Ok(p) => {
            trace!("Loaded env from {p:?}");
            Ok(())
        },
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to load {p:?}")),
    })
    .unwrap_or_else(|e| init_error!("Loading .env files failed: {e:?}"));

    let opts: Opts = clap::Parser::parse();
    std::mem::drop(span);
    let span = tracing::error_span!("boot", ?opts).entered();

    let log_filter = opts.log_filter.as_deref().unwrap_or("info");

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(log_filter)
                .unwrap_or_else(|e| init_error!("Invalid log filter {log_filter:?}: {e}")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .unwrap_or_else(|e| init_error!("Failed to initialize logger: {e}"));

    std::mem::drop((span, tmp_logger));

    std::process::exit(match crate::cli::run(opts) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:?}");
            1
        },
    });
}
