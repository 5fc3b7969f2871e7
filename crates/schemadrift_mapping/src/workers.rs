//! Fixed-size pool of named worker threads over a borrowed work list.
//!
//! Items are split into one contiguous chunk per worker and the outputs are
//! concatenated in input order, so results never depend on scheduling.

use crate::error::{MappingError, Result};
use std::thread;

/// Worker count for `jobs` units of work. `requested == 0` means one worker
/// per available CPU. Never more workers than jobs, never fewer than one.
pub fn worker_count(requested: usize, jobs: usize) -> usize {
    let wanted = if requested == 0 {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        requested
    };
    wanted.min(jobs).max(1)
}

/// Apply `work` to every item on up to `workers` threads named `{name}-{n}`
/// and return the outputs in input order.
pub fn map_in_parallel<I, T, F>(name: &str, items: &[I], workers: usize, work: F) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let workers = worker_count(workers, items.len());
    let chunk_size = items.len().div_ceil(workers);
    let work = &work;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for (index, chunk) in items.chunks(chunk_size).enumerate() {
            let handle = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn_scoped(scope, move || chunk.iter().map(work).collect::<Vec<_>>())
                .map_err(MappingError::WorkerSpawn)?;
            handles.push(handle);
        }

        // Join every handle before reporting a panic.
        let mut out = Vec::with_capacity(items.len());
        let mut panicked = false;
        for handle in handles {
            match handle.join() {
                Ok(part) => out.extend(part),
                Err(_) => panicked = true,
            }
        }
        if panicked {
            return Err(MappingError::WorkerPanicked);
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_bounds() {
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(2, 0), 1);
        assert!(worker_count(0, 100) >= 1);
    }

    #[test]
    fn test_order_preserved_across_workers() {
        let items: Vec<u32> = (0..50).collect();
        let out = map_in_parallel("square", &items, 4, |n| n * n).unwrap();
        assert_eq!(out.len(), 50);
        assert_eq!(&out[..3], &[0, 1, 4]);
        assert_eq!(out[49], 49 * 49);
    }

    #[test]
    fn test_threads_are_named() {
        let items = [(); 3];
        let names = map_in_parallel("resolve", &items, 3, |_| {
            thread::current().name().map(str::to_string)
        })
        .unwrap();
        assert_eq!(
            names,
            vec![
                Some("resolve-0".to_string()),
                Some("resolve-1".to_string()),
                Some("resolve-2".to_string())
            ]
        );
    }

    #[test]
    fn test_panicking_worker_is_an_error() {
        let items: Vec<u32> = (0..4).collect();
        let err = map_in_parallel("boom", &items, 2, |n| {
            if *n == 3 {
                panic!("unit {n}");
            }
            *n
        })
        .unwrap_err();
        assert!(matches!(err, MappingError::WorkerPanicked));
    }
}
