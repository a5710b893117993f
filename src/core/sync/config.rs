/*!
 * Synchronization Configuration
 *
 * Compile-time and runtime selection of the default thread policy
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, warn};

/// Environment variable consulted by [`SigslotConfig::from_env`]
pub const POLICY_ENV: &str = "SIGSLOT_POLICY";

/// Thread-safety policy for a signal or slot owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ThreadPolicy {
    /// All signal/slot objects are created, used and dropped on one thread
    SingleThreaded = 0,
    /// Each signal and slot owner carries its own mutex
    MultiThreadedLocal = 1,
    /// Registry operations additionally serialise on one process-wide lock
    MultiThreadedGlobal = 2,
}

impl ThreadPolicy {
    /// Policy selected by cargo features
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "single-threaded") {
            ThreadPolicy::SingleThreaded
        } else if cfg!(feature = "global-lock") {
            ThreadPolicy::MultiThreadedGlobal
        } else {
            ThreadPolicy::MultiThreadedLocal
        }
    }

    /// Parse a policy name as accepted in `SIGSLOT_POLICY`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "st" | "single" | "single_threaded" => Some(ThreadPolicy::SingleThreaded),
            "mt" | "local" | "multi_threaded_local" => Some(ThreadPolicy::MultiThreadedLocal),
            "mtg" | "global" | "multi_threaded_global" => Some(ThreadPolicy::MultiThreadedGlobal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThreadPolicy::SingleThreaded => "single_threaded",
            ThreadPolicy::MultiThreadedLocal => "multi_threaded_local",
            ThreadPolicy::MultiThreadedGlobal => "multi_threaded_global",
        }
    }

    /// Policy used by `Signal::new` and `Slots::new`
    pub fn current_default() -> Self {
        Self::from_repr(DEFAULT_POLICY.load(Ordering::Acquire))
    }

    fn from_repr(raw: u8) -> Self {
        match raw {
            0 => ThreadPolicy::SingleThreaded,
            2 => ThreadPolicy::MultiThreadedGlobal,
            _ => ThreadPolicy::MultiThreadedLocal,
        }
    }
}

impl Default for ThreadPolicy {
    fn default() -> Self {
        Self::current_default()
    }
}

static DEFAULT_POLICY: AtomicU8 = AtomicU8::new(ThreadPolicy::compiled_default() as u8);

/// Crate-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigslotConfig {
    /// Policy given to signals and slot owners built without an explicit one
    pub default_policy: ThreadPolicy,
}

impl Default for SigslotConfig {
    fn default() -> Self {
        Self {
            default_policy: ThreadPolicy::compiled_default(),
        }
    }
}

impl SigslotConfig {
    /// Configuration for programs that never share signals across threads
    pub const fn single_threaded() -> Self {
        Self {
            default_policy: ThreadPolicy::SingleThreaded,
        }
    }

    /// Configuration with one process-wide lock (fewest OS resources)
    pub const fn global_lock() -> Self {
        Self {
            default_policy: ThreadPolicy::MultiThreadedGlobal,
        }
    }

    /// Read overrides from the environment
    ///
    /// `SIGSLOT_POLICY` accepts `st`, `mt`, `mtg` or the long policy names.
    /// Unknown values fall back to the compiled default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(POLICY_ENV) {
            match ThreadPolicy::from_name(&raw) {
                Some(policy) => config.default_policy = policy,
                None => warn!(value = %raw, "Ignoring unknown {}", POLICY_ENV),
            }
        }
        config
    }

    /// Make this configuration the process default
    ///
    /// Only affects objects constructed afterwards.
    pub fn install(&self) {
        DEFAULT_POLICY.store(self.default_policy as u8, Ordering::Release);
        debug!(policy = self.default_policy.name(), "Installed default thread policy");
    }
}
