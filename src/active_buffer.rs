use crate::SweepError;
use crate::segment::Segment;
use crate::store::PagedStore;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Per-slab buffer of verticals active at the sweep position.
///
/// Holds up to `capacity` entries in memory; a full window is flushed
/// wholesale to a sequential overflow store. Iteration visits overflow pages
/// before the window and applies the eviction rule as it goes: a vertical
/// whose far endpoint lies below the sweep position can never intersect a
/// later horizontal and is dropped. Window entries are evicted in place;
/// surviving overflow entries are rewritten to a fresh store, so the
/// overflow never holds expired records across scans and is never
/// materialized in memory.
pub struct ActiveVerticalBuffer {
    window: VecDeque<Segment>,
    capacity: usize,
    overflow: Option<PagedStore<Segment>>,
    dir: PathBuf,
    slab_index: usize,
    spill_seq: usize,
    records_per_page: usize,
}

impl ActiveVerticalBuffer {
    pub fn new(
        dir: impl Into<PathBuf>,
        slab_index: usize,
        capacity: usize,
        records_per_page: usize,
    ) -> Self {
        ActiveVerticalBuffer {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            overflow: None,
            dir: dir.into(),
            slab_index,
            spill_seq: 0,
            records_per_page,
        }
    }

    pub fn append(&mut self, seg: Segment) -> Result<(), SweepError> {
        if self.window.len() >= self.capacity {
            self.spill()?;
        }
        self.window.push_back(seg);
        Ok(())
    }

    /// Entries currently buffered, in memory and spilled.
    pub fn len(&self) -> usize {
        let spilled = self
            .overflow
            .as_ref()
            .map_or(0, |store| store.record_count() as usize);
        self.window.len() + spilled
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spill(&mut self) -> Result<(), SweepError> {
        if self.overflow.is_none() {
            self.overflow = Some(PagedStore::create(self.overflow_path())?);
        }
        if let Some(store) = self.overflow.as_mut() {
            for seg in self.window.drain(..) {
                store.append(&seg)?;
            }
        }
        Ok(())
    }

    fn overflow_path(&self) -> PathBuf {
        self.dir
            .join(format!("active_{}_{:04}.bin", self.slab_index, self.spill_seq))
    }

    /// Visit every entry still active at `sweep_y`, evicting expired ones.
    ///
    /// The overflow store is streamed page by page; live entries are handed
    /// to `visit` and rewritten to a replacement store, expired ones are
    /// dropped with the old file.
    pub fn for_each_active<F>(&mut self, sweep_y: f64, mut visit: F) -> Result<(), SweepError>
    where
        F: FnMut(&Segment) -> Result<(), SweepError>,
    {
        if let Some(mut old) = self.overflow.take() {
            old.flush()?;
            self.spill_seq += 1;
            let mut survivors: PagedStore<Segment> = PagedStore::create(self.overflow_path())?;
            let mut cursor = old.pages(0, self.records_per_page)?;
            while let Some((batch, _)) = cursor.next_page()? {
                for seg in batch {
                    if seg.high_y() >= sweep_y {
                        visit(&seg)?;
                        survivors.append(&seg)?;
                    }
                }
            }
            old.delete()?;
            if survivors.record_count() > 0 {
                self.overflow = Some(survivors);
            } else {
                survivors.delete()?;
            }
        }

        let mut failure = None;
        self.window.retain(|seg| {
            if seg.high_y() < sweep_y {
                return false;
            }
            if failure.is_none() {
                if let Err(e) = visit(seg) {
                    failure = Some(e);
                }
            }
            true
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop the buffer, removing any overflow file.
    pub fn cleanup(mut self) -> Result<(), SweepError> {
        if let Some(store) = self.overflow.take() {
            store.delete()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_at(buffer: &mut ActiveVerticalBuffer, sweep_y: f64) -> Vec<Segment> {
        let mut seen = Vec::new();
        buffer
            .for_each_active(sweep_y, |seg| {
                seen.push(*seg);
                Ok(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn test_append_and_iterate_without_spill() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 0, 8, 4);
        buffer.append(Segment::vertical(1.0, 0.0, 10.0)).unwrap();
        buffer.append(Segment::vertical(2.0, 0.0, 5.0)).unwrap();

        let seen = active_at(&mut buffer, 3.0);
        assert_eq!(seen.len(), 2);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_eviction_removes_expired_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 0, 8, 4);
        buffer.append(Segment::vertical(1.0, 0.0, 2.0)).unwrap();
        buffer.append(Segment::vertical(2.0, 0.0, 9.0)).unwrap();

        let seen = active_at(&mut buffer, 5.0);
        assert_eq!(seen, vec![Segment::vertical(2.0, 0.0, 9.0)]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_entry_expiring_exactly_at_sweep_position_stays() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 0, 8, 4);
        buffer.append(Segment::vertical(1.0, 0.0, 5.0)).unwrap();

        // Far endpoint equal to the sweep position still intersects.
        let seen = active_at(&mut buffer, 5.0);
        assert_eq!(seen.len(), 1);
        let seen = active_at(&mut buffer, 5.1);
        assert!(seen.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_spill_keeps_all_entries_visible() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 3, 4, 2);
        for i in 0..11 {
            buffer
                .append(Segment::vertical(i as f64, 0.0, 100.0))
                .unwrap();
        }
        assert_eq!(buffer.len(), 11);

        let seen = active_at(&mut buffer, 50.0);
        assert_eq!(seen.len(), 11);
        let mut xs: Vec<f64> = seen.iter().map(|s| s.x()).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, (0..11).map(|i| i as f64).collect::<Vec<f64>>());
    }

    #[test]
    fn test_overflow_compaction_drops_expired_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 0, 2, 2);
        buffer.append(Segment::vertical(1.0, 0.0, 1.0)).unwrap();
        buffer.append(Segment::vertical(2.0, 0.0, 2.0)).unwrap();
        buffer.append(Segment::vertical(3.0, 0.0, 30.0)).unwrap();
        buffer.append(Segment::vertical(4.0, 0.0, 30.0)).unwrap();
        buffer.append(Segment::vertical(5.0, 0.0, 30.0)).unwrap();

        let seen = active_at(&mut buffer, 10.0);
        assert_eq!(seen.len(), 3);
        // The expired spilled entries are gone from the replacement store.
        assert_eq!(buffer.len(), 3);

        let seen = active_at(&mut buffer, 10.0);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_cleanup_removes_overflow_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 7, 2, 2);
        for i in 0..6 {
            buffer
                .append(Segment::vertical(i as f64, 0.0, 10.0))
                .unwrap();
        }
        buffer.cleanup().unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty());
    }
}
