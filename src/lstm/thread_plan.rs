use tracing::debug;

/// Input-phase thread cap when `hidden_size <= 256`
const SMALL_HIDDEN_INPUT_THREAD_CAP: usize = 16;

/// Input-phase thread cap regardless of problem size
const INPUT_THREAD_CAP: usize = 24;

/// Column-parallel thread caps by hidden-size band: `(max hidden_size, max threads)`.
/// Hidden sizes above the last band are not capped.
const COLUMN_THREAD_BANDS: [(usize, usize); 4] = [(128, 2), (256, 5), (512, 7), (1024, 11)];

/// Source of the hardware concurrency used by [`HeuristicPartition`]
///
/// Wrapping the process-wide query lets tests pin the thread count.
pub trait HardwareConcurrency: Send + Sync {
    /// Number of hardware threads available to the process
    fn hardware_concurrency(&self) -> usize;
}

/// Reads the concurrency of the running machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConcurrency;

impl HardwareConcurrency for SystemConcurrency {
    fn hardware_concurrency(&self) -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// A fixed, injected concurrency value
#[derive(Debug, Clone, Copy)]
pub struct FixedConcurrency(pub usize);

impl HardwareConcurrency for FixedConcurrency {
    fn hardware_concurrency(&self) -> usize {
        self.0
    }
}

/// How the hidden-state phase of one timestep is split across tasks
///
/// # Variants
///
/// - `BatchParallel` - Each task owns a contiguous slice of batch rows and walks every timestep for them
/// - `ColumnParallel` - One task group walks the timesteps; within a timestep the `4 * hidden_size` gate columns of the recurrent transform are split across tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenParallelism {
    BatchParallel,
    ColumnParallel,
}

/// Task counts for the two phases of a `compute` call
///
/// Task counts affect performance only; results are the same (up to summation order
/// inside the matrix multiply) for any plan.
///
/// # Fields
///
/// - `input_threads` - Number of row ranges for the input projection
/// - `hidden_threads` - Number of row slices (batch-parallel) or column blocks (column-parallel)
/// - `hidden_parallelism` - Which split the hidden phase uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadPlan {
    pub input_threads: usize,
    pub hidden_threads: usize,
    pub hidden_parallelism: HiddenParallelism,
}

impl ThreadPlan {
    /// A plan that runs every phase as a single task
    pub fn single_threaded() -> Self {
        ThreadPlan {
            input_threads: 1,
            hidden_threads: 1,
            hidden_parallelism: HiddenParallelism::BatchParallel,
        }
    }

    /// Derives the plan from hardware concurrency and problem dimensions.
    ///
    /// One hardware thread is left for the caller. The input phase is capped at 16 tasks for
    /// `hidden_size <= 256` and 24 tasks overall. The hidden phase is batch-parallel when
    /// `batch_size > 4`, or when `batch_size >= 2` and `hidden_size <= 256`; otherwise it is
    /// column-parallel with the task count capped by hidden-size band.
    ///
    /// # Parameters
    ///
    /// - `hardware_concurrency` - Hardware threads available
    /// - `batch_size` - Number of batch rows
    /// - `hidden_size` - Number of LSTM units
    ///
    /// # Returns
    ///
    /// * `ThreadPlan` - The derived plan
    pub fn derive(hardware_concurrency: usize, batch_size: usize, hidden_size: usize) -> Self {
        let threads = hardware_concurrency.saturating_sub(1).max(1);

        let mut input_threads = threads;
        if input_threads > SMALL_HIDDEN_INPUT_THREAD_CAP && hidden_size <= 256 {
            input_threads = SMALL_HIDDEN_INPUT_THREAD_CAP;
        }
        input_threads = input_threads.min(INPUT_THREAD_CAP);

        let (hidden_threads, hidden_parallelism) =
            if batch_size > 4 || (batch_size >= 2 && hidden_size <= 256) {
                (threads, HiddenParallelism::BatchParallel)
            } else {
                let mut hidden_threads = threads;
                for (band_limit, cap) in COLUMN_THREAD_BANDS {
                    if hidden_threads > cap && hidden_size <= band_limit {
                        hidden_threads = cap;
                    }
                }
                (hidden_threads, HiddenParallelism::ColumnParallel)
            };

        debug!(
            input_threads,
            hidden_threads,
            ?hidden_parallelism,
            "derived LSTM thread plan"
        );

        ThreadPlan {
            input_threads,
            hidden_threads,
            hidden_parallelism,
        }
    }
}

/// Pluggable thread-plan policy
///
/// Production code uses [`HeuristicPartition`]; tests can force deterministic
/// single-task execution with [`SingleThreadPartition`].
pub trait PartitionStrategy: Send + Sync {
    /// Chooses a plan for the given problem dimensions
    fn plan(&self, batch_size: usize, hidden_size: usize) -> ThreadPlan;
}

/// The profiling-derived heuristic of [`ThreadPlan::derive`] over an injectable concurrency source
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPartition<C = SystemConcurrency> {
    concurrency: C,
}

impl<C: HardwareConcurrency> HeuristicPartition<C> {
    /// Creates the heuristic over the given concurrency source
    pub fn new(concurrency: C) -> Self {
        HeuristicPartition { concurrency }
    }
}

impl<C: HardwareConcurrency> PartitionStrategy for HeuristicPartition<C> {
    fn plan(&self, batch_size: usize, hidden_size: usize) -> ThreadPlan {
        ThreadPlan::derive(
            self.concurrency.hardware_concurrency(),
            batch_size,
            hidden_size,
        )
    }
}

/// Runs every phase as one task
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleThreadPartition;

impl PartitionStrategy for SingleThreadPartition {
    fn plan(&self, _batch_size: usize, _hidden_size: usize) -> ThreadPlan {
        ThreadPlan::single_threaded()
    }
}
