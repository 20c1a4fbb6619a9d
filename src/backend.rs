//! Process-wide compute backend.
//!
//! All projections run on a dedicated `rayon` thread pool, which must be set
//! up once, before the first projection, by `simple_init` or `init`. The
//! outcome of the first initialization is final: later calls return the same
//! backend, or the same failure.

use std::sync::OnceLock;

use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::error::{Error, Result};

static BACKEND: OnceLock<Result<Backend>> = OnceLock::new();

#[derive(Debug)]
pub struct Backend {
    pool: rayon::ThreadPool,
    job_size: Option<usize>,
}

impl Backend {
    fn build(config: &BackendConfig) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("lightfield-{i}"));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        let job_size = config.job_size.filter(|&n| n > 0);
        info!(threads = pool.current_num_threads(), ?job_size, "compute backend initialized");
        Ok(Self { pool, job_size })
    }

    pub fn threads(&self) -> usize { self.pool.current_num_threads() }

    /// Run `op` on the backend's thread pool
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Number of consecutive items handled by each job when `n` items are
    /// scattered into per-job accumulators.
    pub fn job_size(&self, n: usize) -> usize {
        // Rayon is too eager in spawning small jobs, each of which requires
        // its own whole-view accumulator. Default to one job per thread.
        self.job_size.unwrap_or_else(|| n.div_ceil(self.threads())).max(1)
    }
}

/// Initialize the backend with default settings: one thread per core.
pub fn simple_init() -> Result<&'static Backend> {
    init(&BackendConfig::default())
}

/// Initialize the backend. Only the first call's `config` has any effect.
pub fn init(config: &BackendConfig) -> Result<&'static Backend> {
    let mut fresh = false;
    let outcome = BACKEND.get_or_init(|| { fresh = true; Backend::build(config) });
    if !fresh { debug!(?config, "compute backend already initialized, ignoring configuration") }
    outcome.as_ref().map_err(Clone::clone)
}

/// The backend set up by an earlier `init`
pub fn get() -> Result<&'static Backend> {
    match BACKEND.get() {
        Some(outcome) => outcome.as_ref().map_err(Clone::clone),
        None => Err(Error::BackendUnavailable("not initialized: call `backend::simple_init` first".into())),
    }
}
