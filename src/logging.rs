//! Logger bootstrap for the simulation binary and tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Filter applied when `RUST_LOG` is unset.
///
/// Verbose mode only lowers the threshold for this crate, so thinker
/// spawns, stasis changes and save/load section boundaries show up without
/// debug output from dependencies.
#[must_use]
pub fn default_filter(verbose: bool) -> String {
    let crate_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    format!("{},{}={crate_level}", LevelFilter::Info, env!("CARGO_CRATE_NAME"))
}

/// Initializes the global logger. `RUST_LOG` still wins when set.
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));
    let mut builder = Builder::from_env(env);
    builder.format_timestamp(None).format_module_path(false);

    // Only fails if a logger is already installed; tests call this repeatedly.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, "INFO,gloom=INFO")]
    #[case(true, "INFO,gloom=DEBUG")]
    fn verbose_only_lowers_this_crate(#[case] verbose: bool, #[case] expected: &str) {
        assert_eq!(default_filter(verbose), expected);
    }

    #[rstest]
    fn repeated_init_is_harmless() {
        init(false);
        init(true);
    }
}
