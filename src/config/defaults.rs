//! Default configuration values

use std::num::NonZeroUsize;

/// Target invoked when neither the command line nor the config names one
pub const DEFAULT_TARGET: &str = "Build";

/// Default upper bound on concurrent builds: one per CPU
pub fn default_max_parallelism() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}
