//! Runtime configuration for context binders
//!
//! Settings come from code (`TrapConfig::default()` plus `with_*` builders) or
//! from the environment:
//!
//! - `TAILTRAP_WORKER_THREADS` - worker count for the pooled binder (default: CPU count)
//! - `TAILTRAP_STACK_SIZE` - stack size in bytes for binder threads (default: platform default)
//! - `TAILTRAP_THREAD_PREFIX` - name prefix for binder threads (default: `tailtrap`)
//! - `TAILTRAP_DEFAULT_BINDER` - `thread`, `inline` or `pool` (default: `thread`)

use std::fmt;
use std::str::FromStr;

/// Which binder the global registry falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinderKind {
    /// Dedicated thread per top-level call
    #[default]
    Thread,
    /// Caller's own thread
    Inline,
    /// Persistent worker pool
    Pool,
}

impl FromStr for BinderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread" => Ok(BinderKind::Thread),
            "inline" => Ok(BinderKind::Inline),
            "pool" => Ok(BinderKind::Pool),
            other => Err(format!("unknown binder kind '{}'", other)),
        }
    }
}

impl fmt::Display for BinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinderKind::Thread => write!(f, "thread"),
            BinderKind::Inline => write!(f, "inline"),
            BinderKind::Pool => write!(f, "pool"),
        }
    }
}

/// Binder and worker settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapConfig {
    /// Number of workers in a pooled binder
    pub worker_threads: usize,
    /// Stack size for binder threads; `None` keeps the platform default
    pub stack_size: Option<usize>,
    /// Prefix for binder thread names
    pub thread_prefix: String,
    /// Binder used when no key (or an unknown key) is given
    pub default_binder: BinderKind,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(1),
            stack_size: None,
            thread_prefix: "tailtrap".to_string(),
            default_binder: BinderKind::Thread,
        }
    }
}

impl TrapConfig {
    /// Defaults overridden by any `TAILTRAP_*` variables that parse
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_threads: env_parse("TAILTRAP_WORKER_THREADS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.worker_threads),
            stack_size: env_parse("TAILTRAP_STACK_SIZE")
                .filter(|n: &usize| *n > 0)
                .or(defaults.stack_size),
            thread_prefix: std::env::var("TAILTRAP_THREAD_PREFIX")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.thread_prefix),
            default_binder: env_parse("TAILTRAP_DEFAULT_BINDER").unwrap_or(defaults.default_binder),
        }
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn with_thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    pub fn with_default_binder(mut self, kind: BinderKind) -> Self {
        self.default_binder = kind;
        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
