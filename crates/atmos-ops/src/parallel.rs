//! Row-parallel iteration helpers.
//!
//! Stages that compute each output row from a read-only snapshot of their
//! input go through [`for_each_row`]. With the `parallel` feature the rows are
//! processed by rayon; without it they run in order on the calling thread.
//! Rows are disjoint slices of the destination, so both paths produce the
//! same bytes.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Calls `f(y, row)` for every `row_len`-sized row of `dst`.
#[cfg(feature = "parallel")]
pub fn for_each_row<T, F>(dst: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    dst.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Calls `f(y, row)` for every `row_len`-sized row of `dst` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn for_each_row<T, F>(dst: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    dst.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_row_visits_every_row_once() {
        let mut data = vec![0u32; 5 * 3];
        for_each_row(&mut data, 3, |y, row| {
            for v in row.iter_mut() {
                *v += y as u32 + 1;
            }
        });
        assert_eq!(data, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5]);
    }
}
