use crate::SweepError;
use crate::segment::{Intersection, Orientation, Segment};
use crate::store::PagedStore;
use rustc_hash::FxHashSet;

/// Quadratic reference: every crossing (vertical, horizontal) pair.
///
/// Used by tests and the `verify` command as ground truth; never by the
/// sweep itself.
pub fn brute_force_intersections(segments: &[Segment]) -> Result<Vec<Intersection>, SweepError> {
    let mut verticals = Vec::new();
    let mut horizontals = Vec::new();
    for seg in segments {
        match seg.classify()? {
            Orientation::Vertical => verticals.push(*seg),
            Orientation::Horizontal => horizontals.push(*seg),
        }
    }

    let mut found = Vec::new();
    for v in &verticals {
        for h in &horizontals {
            if h.min_x() <= v.x()
                && v.x() <= h.max_x()
                && v.low_y() <= h.y()
                && h.y() <= v.high_y()
            {
                found.push(Intersection { x: v.x(), y: h.y() });
            }
        }
    }
    Ok(found)
}

/// Bit-exact set view of intersection points, for comparisons that must not
/// go through float equality.
pub fn intersection_set(points: &[Intersection]) -> FxHashSet<(u64, u64)> {
    points
        .iter()
        .map(|p| (p.x.to_bits(), p.y.to_bits()))
        .collect()
}

/// Read every intersection record out of an answer store.
pub fn read_answers(store: &PagedStore<Intersection>) -> Result<Vec<Intersection>, SweepError> {
    let mut cursor = store.pages(0, 128)?;
    let mut out = Vec::new();
    while let Some((batch, _)) = cursor.next_page()? {
        out.extend(batch);
    }
    Ok(out)
}
