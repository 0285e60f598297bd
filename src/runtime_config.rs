//! Environment-driven runtime configuration.
//!
//! `MINIBIND_STACK_SIZE` sets the coroutine stack size in bytes, accepted
//! in decimal (`16384`) or hex (`0x4000`). Larger stacks support deeper
//! call chains; smaller stacks keep many concurrent coroutines cheap.

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x8000; // 32 KB

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for connection coroutines in bytes.
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults on absent or unparseable values.
    pub fn from_env() -> Self {
        let stack_size = env::var("MINIBIND_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }

    /// Apply this configuration to the may runtime.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(v: &str) -> Option<usize> {
    if let Some(hex) = v.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        v.parse().ok()
    }
}
