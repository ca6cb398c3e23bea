//! Execution tuning knobs
//!
//! The element-count threshold that gates parallel fan-out is platform
//! dependent, so it is configurable rather than baked into the kernels.
//! Values can be set in code or picked up from the environment:
//!
//! - `VOLTA_PARALLEL_THRESHOLD`: minimum element count for the parallel path
//! - `VOLTA_NUM_THREADS`: size of a dedicated worker pool (unset = rayon's
//!   global pool)

use crate::error::{Result, VoltaError};

/// Default minimum element count before an apply call fans out
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 5000;

pub const THRESHOLD_ENV: &str = "VOLTA_PARALLEL_THRESHOLD";
pub const THREADS_ENV: &str = "VOLTA_NUM_THREADS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyConfig {
    /// Contiguous calls with at least this many elements may run on the pool
    pub parallel_threshold: usize,
    /// Worker count for a dedicated pool; `None` uses the global rayon pool
    pub num_threads: Option<usize>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        ApplyConfig {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            num_threads: None,
        }
    }
}

impl ApplyConfig {
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Read overrides from the process environment
    ///
    /// # Errors
    /// `InvalidParameter` if a variable is set but is not a valid count.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApplyConfig::from_env`] with a caller-supplied lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(THRESHOLD_ENV) {
            config.parallel_threshold = parse_count(THRESHOLD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(THREADS_ENV) {
            config.num_threads = Some(parse_count(THREADS_ENV, &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `InvalidParameter` for a zero-sized worker pool.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(VoltaError::InvalidParameter(
                "worker pool needs at least one thread".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| VoltaError::InvalidParameter(format!("{key}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApplyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApplyConfig::default());
        assert_eq!(config.parallel_threshold, 5000);
        assert_eq!(config.num_threads, None);
    }

    #[test]
    fn test_overrides() {
        let config =
            ApplyConfig::from_lookup(lookup(&[(THRESHOLD_ENV, " 128 "), (THREADS_ENV, "3")]))
                .unwrap();
        assert_eq!(config.parallel_threshold, 128);
        assert_eq!(config.num_threads, Some(3));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ApplyConfig::from_lookup(lookup(&[(THRESHOLD_ENV, "lots")])).is_err());
        assert!(ApplyConfig::from_lookup(lookup(&[(THREADS_ENV, "0")])).is_err());
        assert!(ApplyConfig::from_lookup(lookup(&[(THREADS_ENV, "-2")])).is_err());
    }

    #[test]
    fn test_builder() {
        let config = ApplyConfig::default()
            .with_parallel_threshold(0)
            .with_num_threads(2);
        assert_eq!(config.parallel_threshold, 0);
        assert_eq!(config.num_threads, Some(2));
        assert!(config.validate().is_ok());
    }
}
