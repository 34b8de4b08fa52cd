//! Scoped worker threads for the per-vertex loops.

use std::ops::Range;
use std::thread::ScopedJoinHandle;

/// Below this many items the loop runs on the calling thread.
const MIN_PARALLEL_LEN: usize = 1024;

/// Resolves a configured thread count: 0 means every logical core.
pub fn worker_count(requested: u32) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested as usize
    }
}

enum Chunk<'scope, T> {
    Spawned(ScopedJoinHandle<'scope, Vec<T>>),
    Inline(Range<usize>),
}

/// Evaluates `f(0..len)` across up to `threads` scoped workers.
///
/// Indices are split into contiguous chunks and results are concatenated in
/// index order, so the output is identical to a sequential map. If a worker
/// cannot be spawned its chunk runs on the calling thread. A panicking worker
/// re-raises its panic here.
pub fn par_map<T, F>(len: usize, threads: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let threads = threads.clamp(1, len.max(1));
    if threads == 1 || len < MIN_PARALLEL_LEN {
        return (0..len).map(f).collect();
    }

    let chunk_len = len.div_ceil(threads);
    let f = &f;
    std::thread::scope(|scope| {
        let chunks: Vec<Chunk<'_, T>> = (0..threads)
            .map(|t| {
                let range = (t * chunk_len).min(len)..((t + 1) * chunk_len).min(len);
                let work = range.clone();
                let spawned = std::thread::Builder::new()
                    .name(format!("terrain-worker-{t}"))
                    .spawn_scoped(scope, move || work.map(f).collect::<Vec<T>>());
                match spawned {
                    Ok(handle) => Chunk::Spawned(handle),
                    Err(err) => {
                        tracing::warn!("failed to spawn terrain worker {t}: {err}");
                        Chunk::Inline(range)
                    }
                }
            })
            .collect();

        let mut out = Vec::with_capacity(len);
        for chunk in chunks {
            match chunk {
                Chunk::Spawned(handle) => match handle.join() {
                    Ok(values) => out.extend(values),
                    Err(payload) => std::panic::resume_unwind(payload),
                },
                Chunk::Inline(range) => out.extend(range.map(f)),
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_par_map_matches_sequential() {
        let sequential: Vec<u64> = (0..10_000).map(|i| (i as u64).wrapping_mul(2654435761)).collect();
        for threads in [1, 2, 3, 8] {
            let parallel = par_map(10_000, threads, |i| (i as u64).wrapping_mul(2654435761));
            assert_eq!(parallel, sequential, "mismatch with {threads} threads");
        }
    }

    #[test]
    fn test_par_map_small_and_empty() {
        assert!(par_map(0, 4, |i| i).is_empty());
        assert_eq!(par_map(3, 16, |i| i * 2), vec![0, 2, 4]);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }
}
