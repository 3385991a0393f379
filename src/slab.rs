use crate::SweepError;
use crate::segment::{SEGMENT_BYTES, Segment};
use crate::store::PagedStore;
use itertools::Itertools;

/// One contiguous strip of the x-domain, with the byte range its verticals
/// occupy in the x-sorted stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    pub index: usize,
    pub init_x: f64,
    pub final_x: f64,
    pub initial_offset: u64,
    pub final_offset: u64,
}

/// Partition the x-sorted vertical range `[begin, end)` into at most
/// `fan_out` slabs holding `ceil(V/k)` or `floor(V/k)` verticals each.
///
/// Slabs are contiguous and cover the observed x-span. With no verticals in
/// range a single unbounded slab is returned; with fewer verticals than the
/// fan-out, each vertical gets its own slab.
pub fn generate_slabs(
    x_store: &PagedStore<Segment>,
    begin: u64,
    end: u64,
    fan_out: usize,
    records_per_page: usize,
) -> Result<Vec<Slab>, SweepError> {
    let verticals = end.saturating_sub(begin) / SEGMENT_BYTES;
    if verticals == 0 {
        return Ok(vec![Slab {
            index: 0,
            init_x: f64::NEG_INFINITY,
            final_x: f64::INFINITY,
            initial_offset: begin,
            final_offset: begin,
        }]);
    }

    let fan_out = fan_out.max(2) as u64;
    let quota = verticals / fan_out;
    let remainder = verticals % fan_out;
    let mut chunk_starts = Vec::new();
    let mut acc = 0u64;
    for chunk in 0..fan_out {
        let size = quota + u64::from(chunk < remainder);
        if size == 0 {
            break;
        }
        chunk_starts.push(acc);
        acc += size;
    }

    // One scan: the boundary of each slab is the x of the first vertical of
    // its chunk; the sentinel closes the last slab at the maximal vertical.
    let mut boundaries: Vec<(f64, u64)> = Vec::with_capacity(chunk_starts.len() + 1);
    let mut next_start = chunk_starts.into_iter().peekable();
    let mut cursor = x_store.pages_range(begin, end, records_per_page)?;
    let mut record_index = 0u64;
    let mut last_x = 0.0f64;
    while let Some((batch, _)) = cursor.next_page()? {
        for seg in batch {
            if next_start.peek() == Some(&record_index) {
                boundaries.push((seg.x(), begin + record_index * SEGMENT_BYTES));
                next_start.next();
            }
            last_x = seg.x();
            record_index += 1;
        }
    }
    boundaries.push((last_x, end));

    Ok(boundaries
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(index, (&(init_x, initial_offset), &(final_x, final_offset)))| Slab {
            index,
            init_x,
            final_x,
            initial_offset,
            final_offset,
        })
        .collect())
}

/// Resolve the slab owning `x`: the rightmost slab whose `init_x` does not
/// exceed it. The final slab's upper bound is inclusive, so the maximal
/// vertical resolves. `None` means `x` is outside the partition's coverage.
pub fn slab_of(slabs: &[Slab], x: f64) -> Option<usize> {
    let idx = slabs.partition_point(|s| s.init_x <= x);
    if idx == 0 {
        return None;
    }
    let i = idx - 1;
    (x <= slabs[i].final_x).then_some(i)
}

/// Slab lookup for horizontal endpoints, clamped to the covered span.
pub fn slab_of_clamped(slabs: &[Slab], x: f64) -> usize {
    slabs.partition_point(|s| s.init_x <= x).saturating_sub(1)
}
