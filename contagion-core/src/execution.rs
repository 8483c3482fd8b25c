//! Execution strategy selection for embarrassingly parallel work.
//!
//! Rollout trials and greedy probes each own their graph copy and random
//! stream, so they may run on a Rayon pool. Results are always gathered in
//! index order, which keeps aggregation independent of completion order.

use crate::Result;

/// Indicates how independent trials and probes are scheduled.
///
/// `Auto` resolves deterministically: it uses the Rayon pool when the
/// `parallel` feature is compiled in and runs sequentially otherwise.
///
/// # Examples
/// ```
/// use contagion_core::ExecutionStrategy;
///
/// let strategy = ExecutionStrategy::default();
/// assert!(matches!(strategy, ExecutionStrategy::Auto));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Allow the library to select the scheduler automatically.
    #[default]
    Auto,
    /// Run every unit on the calling thread.
    Sequential,
    /// Spread units across the Rayon thread pool.
    Parallel,
}

/// Scheduler resolved from an [`ExecutionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Sequential,
    #[cfg(feature = "parallel")]
    Parallel,
}

impl ExecutionStrategy {
    pub(crate) fn backend(self) -> Result<Backend> {
        match self {
            Self::Sequential => Ok(Backend::Sequential),
            #[cfg(feature = "parallel")]
            Self::Auto | Self::Parallel => Ok(Backend::Parallel),
            #[cfg(not(feature = "parallel"))]
            Self::Auto => Ok(Backend::Sequential),
            #[cfg(not(feature = "parallel"))]
            Self::Parallel => Err(crate::error::ContagionError::BackendUnavailable {
                requested: Self::Parallel,
            }),
        }
    }
}

/// Evaluates `unit` for every index in `0..count`, returning results in
/// index order.
pub(crate) fn collect_indexed<T, F>(backend: Backend, count: usize, unit: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    match backend {
        Backend::Sequential => (0..count).map(unit).collect(),
        #[cfg(feature = "parallel")]
        Backend::Parallel => {
            use rayon::prelude::*;
            (0..count).into_par_iter().map(unit).collect()
        }
    }
}

/// Like [`collect_indexed`], but threads per-worker scratch state built by
/// `init` through every call of `unit`.
///
/// The sequential backend builds the state once. The parallel backend builds
/// one per Rayon work split, so `unit` must not depend on what earlier calls
/// left behind.
pub(crate) fn collect_indexed_with<T, W, I, F>(
    backend: Backend,
    count: usize,
    init: I,
    unit: F,
) -> Vec<T>
where
    T: Send,
    I: Fn() -> W + Sync + Send,
    F: Fn(&mut W, usize) -> T + Sync + Send,
{
    match backend {
        Backend::Sequential => {
            let mut scratch = init();
            (0..count).map(|index| unit(&mut scratch, index)).collect()
        }
        #[cfg(feature = "parallel")]
        Backend::Parallel => {
            use rayon::prelude::*;
            (0..count).into_par_iter().map_init(init, unit).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_is_always_available() {
        assert_eq!(
            ExecutionStrategy::Sequential.backend(),
            Ok(Backend::Sequential)
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_collection_preserves_order() {
        let backend = ExecutionStrategy::Parallel
            .backend()
            .expect("parallel feature is enabled");
        let squares = collect_indexed(backend, 64, |index| index * index);
        let expected: Vec<usize> = (0..64).map(|index| index * index).collect();
        assert_eq!(squares, expected);
    }

    #[test]
    fn scratch_state_is_reused_sequentially() {
        let calls = collect_indexed_with(
            Backend::Sequential,
            4,
            Vec::new,
            |seen: &mut Vec<usize>, index| {
                seen.push(index);
                seen.len()
            },
        );
        assert_eq!(calls, vec![1, 2, 3, 4]);
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn parallel_is_unavailable_without_feature() {
        use crate::error::ContagionError;

        let err = ExecutionStrategy::Parallel
            .backend()
            .expect_err("parallel feature is disabled");
        assert!(matches!(err, ContagionError::BackendUnavailable { .. }));
    }
}
