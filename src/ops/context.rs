use crate::config::ApplyConfig;
use crate::error::{Result, VoltaError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Execution strategy chosen for one apply call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Offsets computed per tensor from strides, single-threaded
    Strided,
    /// Flat index loop on the calling thread
    FlatSerial,
    /// Flat index range split into chunks run on the worker pool
    FlatParallel,
}

/// Where and how apply calls may run.
///
/// Every kernel and apply call takes a context explicitly. Work that is
/// already executing on a pool worker must pass a [`nested`](Self::nested)
/// context so that it never fans out a second time.
#[derive(Clone)]
pub struct ExecContext {
    config: ApplyConfig,
    pool: Option<Arc<ThreadPool>>,
    allow_parallel: bool,
    nested: bool,
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("config", &self.config)
            .field("dedicated_pool", &self.pool.is_some())
            .field("allow_parallel", &self.allow_parallel)
            .field("nested", &self.nested)
            .finish()
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        ExecContext {
            config: ApplyConfig::default(),
            pool: None,
            allow_parallel: true,
            nested: false,
        }
    }
}

impl ExecContext {
    /// Build a context, spawning a dedicated pool if `num_threads` is set
    ///
    /// # Errors
    /// `InvalidParameter` for an invalid config, `ThreadPool` if the pool
    /// cannot be spawned.
    pub fn new(config: ApplyConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.num_threads {
            Some(threads) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("volta-apply-{idx}"))
                    .build()
                    .map_err(|e| VoltaError::ThreadPool(e.to_string()))?,
            )),
            None => None,
        };
        Ok(ExecContext {
            config,
            pool,
            allow_parallel: true,
            nested: false,
        })
    }

    /// Context configured from `VOLTA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ApplyConfig::from_env()?)
    }

    /// Context that never uses the worker pool
    pub fn serial() -> Self {
        ExecContext {
            allow_parallel: false,
            ..Self::default()
        }
    }

    /// Copy of this context marked as running inside a parallel region
    #[must_use]
    pub fn nested(&self) -> Self {
        ExecContext {
            nested: true,
            ..self.clone()
        }
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// True when fanning out now would nest parallel regions.
    ///
    /// The explicit flag is authoritative; running on any rayon worker
    /// thread also counts.
    pub fn in_parallel(&self) -> bool {
        self.nested || rayon::current_thread_index().is_some()
    }

    /// Number of workers a parallel call would be split across
    pub fn num_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
            .max(1)
    }

    /// Strategy for a call over `numel` elements, from layout facts alone.
    ///
    /// Non-contiguous operands, or any operand of rank <= 1, always take the
    /// strided path. Aliasing is not considered here; callers outside the
    /// engine ask [`dispatch_for`](crate::ops::dispatch_for).
    pub(crate) fn plan(&self, numel: usize, all_contiguous: bool, min_rank: usize) -> Dispatch {
        if !all_contiguous || min_rank <= 1 {
            Dispatch::Strided
        } else if self.allow_parallel
            && !self.in_parallel()
            && numel >= self.config.parallel_threshold
        {
            Dispatch::FlatParallel
        } else {
            Dispatch::FlatSerial
        }
    }

    /// Run `f` on this context's pool (or the global pool)
    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_strided_for_views_and_vectors() {
        let ctx = ExecContext::default();
        assert_eq!(ctx.plan(10_000, false, 2), Dispatch::Strided);
        assert_eq!(ctx.plan(10_000, true, 1), Dispatch::Strided);
        assert_eq!(ctx.plan(10_000, true, 0), Dispatch::Strided);
    }

    #[test]
    fn test_plan_threshold() {
        let ctx = ExecContext::default();
        assert_eq!(ctx.plan(4999, true, 2), Dispatch::FlatSerial);
        assert_eq!(ctx.plan(5000, true, 2), Dispatch::FlatParallel);
    }

    #[test]
    fn test_plan_nested_and_serial() {
        let ctx = ExecContext::default();
        assert!(!ctx.is_nested());
        assert_eq!(ctx.nested().plan(1 << 20, true, 3), Dispatch::FlatSerial);
        assert_eq!(ExecContext::serial().plan(1 << 20, true, 3), Dispatch::FlatSerial);
    }

    #[test]
    fn test_plan_on_worker_thread_is_serial() {
        let ctx = ExecContext::new(ApplyConfig::default().with_num_threads(2)).unwrap();
        let inner = ctx.install(|| ctx.plan(1 << 20, true, 2));
        assert_eq!(inner, Dispatch::FlatSerial);
    }

    #[test]
    fn test_dedicated_pool_size() {
        let ctx = ExecContext::new(ApplyConfig::default().with_num_threads(3)).unwrap();
        assert_eq!(ctx.num_threads(), 3);
        assert!(ExecContext::new(ApplyConfig::default().with_num_threads(0)).is_err());
    }
}
