//! Per-unit decoding on the shared worker pool.

use crate::error::Result;
use schemadrift_mapping::workers::map_in_parallel;

/// Decode every item on up to `workers` threads (0 means one per CPU) and
/// concatenate the outputs in input order.
///
/// Every item is decoded; the error returned is the one for the earliest
/// failing item, so the reported failure does not depend on scheduling.
pub(crate) fn decode_all<I, T, F>(
    name: &str,
    items: &[I],
    workers: usize,
    decode: F,
) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<Vec<T>> + Sync,
{
    let mut out = Vec::new();
    for result in map_in_parallel(name, items, workers, decode)? {
        out.extend(result?);
    }
    Ok(out)
}
