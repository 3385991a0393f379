use crate::SweepError;
use crate::segment::{Intersection, Orientation, Segment};
use crate::store::PagedStore;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Totally ordered f64 key for the active map.
#[derive(Debug, Clone, Copy, PartialEq)]
struct XKey(f64);

impl Eq for XKey {}

impl PartialOrd for XKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Terminal in-memory sweep for sub-problems that fit the memory budget.
///
/// Segments are sorted by the shared sweep order; active verticals live in an
/// ordered map keyed by x. A horizontal scans the buckets in its x-range,
/// evicting verticals whose far endpoint lies below its y and reporting the
/// rest. Returns the number of intersections written.
pub fn plane_sweep(
    mut segments: Vec<Segment>,
    answers: &mut PagedStore<Intersection>,
) -> Result<u64, SweepError> {
    segments.sort_by(Segment::sweep_cmp);

    let mut active: BTreeMap<XKey, SmallVec<[Segment; 2]>> = BTreeMap::new();
    let mut reported = 0u64;
    let mut emptied: Vec<XKey> = Vec::new();

    for seg in &segments {
        match seg.classify()? {
            Orientation::Vertical => {
                active.entry(XKey(seg.x())).or_default().push(*seg);
            }
            Orientation::Horizontal => {
                let y = seg.y();
                emptied.clear();
                let range = XKey(seg.min_x())..=XKey(seg.max_x());
                for (key, bucket) in active.range_mut(range) {
                    bucket.retain(|v| v.high_y() >= y);
                    for vertical in bucket.iter() {
                        if vertical.low_y() <= y {
                            answers.append(&Intersection {
                                x: vertical.x(),
                                y,
                            })?;
                            reported += 1;
                        }
                    }
                    if bucket.is_empty() {
                        emptied.push(*key);
                    }
                }
                for key in &emptied {
                    active.remove(key);
                }
            }
        }
    }

    Ok(reported)
}
