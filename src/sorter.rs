use crate::SweepError;
use crate::memory_config::MemoryConfig;
use crate::segment::{Orientation, Segment};
use crate::store::{PageCursor, PagedStore};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAxis {
    X,
    Y,
}

/// External merge sort over segment stores.
///
/// Run formation reads the input page by page and never holds more than the
/// memory budget's worth of records; runs are merged with a binary heap of
/// page cursors.
pub struct ExternalSorter<'a> {
    config: &'a MemoryConfig,
}

impl<'a> ExternalSorter<'a> {
    pub fn new(config: &'a MemoryConfig) -> Self {
        ExternalSorter { config }
    }

    /// Sort `input` along `axis` into a fresh store at `output_path`.
    ///
    /// Axis X keeps vertical segments only (the slab partitioner's stream,
    /// keyed by x); axis Y keeps every segment in sweep order. Malformed
    /// records reject the whole run here, before any sweep state exists.
    pub fn sort(
        &self,
        input: &PagedStore<Segment>,
        axis: SortAxis,
        output_path: &Path,
    ) -> Result<PagedStore<Segment>, SweepError> {
        let run_records = self.config.base_case_records() as usize;
        let records_per_page = self.config.records_per_page();

        let mut runs: Vec<PagedStore<Segment>> = Vec::new();
        let mut buffer: Vec<Segment> = Vec::new();
        let mut cursor = input.pages(0, records_per_page)?;
        while let Some((batch, _)) = cursor.next_page()? {
            for seg in batch {
                let orientation = seg.classify()?;
                if axis == SortAxis::X && orientation == Orientation::Horizontal {
                    continue;
                }
                buffer.push(seg);
                if buffer.len() >= run_records {
                    let run = self.write_run(&mut buffer, axis, output_path, runs.len())?;
                    runs.push(run);
                }
            }
        }
        if !buffer.is_empty() {
            let run = self.write_run(&mut buffer, axis, output_path, runs.len())?;
            runs.push(run);
        }

        self.merge_runs(runs, axis, output_path)
    }

    fn write_run(
        &self,
        buffer: &mut Vec<Segment>,
        axis: SortAxis,
        output_path: &Path,
        run_index: usize,
    ) -> Result<PagedStore<Segment>, SweepError> {
        buffer.sort_by(|a, b| axis_cmp(a, b, axis));
        let mut run = PagedStore::create(run_path(output_path, run_index))?;
        for seg in buffer.drain(..) {
            run.append(&seg)?;
        }
        run.close()?;
        Ok(run)
    }

    fn merge_runs(
        &self,
        runs: Vec<PagedStore<Segment>>,
        axis: SortAxis,
        output_path: &Path,
    ) -> Result<PagedStore<Segment>, SweepError> {
        if runs.is_empty() {
            let mut output = PagedStore::create(output_path)?;
            output.flush()?;
            return Ok(output);
        }
        if runs.len() == 1 {
            // A single sorted run is the result; adopt the file.
            fs::rename(runs[0].pathname(), output_path)?;
            return PagedStore::open(output_path);
        }

        let records_per_page = self.config.records_per_page();
        let mut output = PagedStore::create(output_path)?;
        let mut readers = Vec::with_capacity(runs.len());
        let mut heap = BinaryHeap::new();
        for (run_index, run) in runs.iter().enumerate() {
            let mut reader = RunReader::new(run.pages(0, records_per_page)?);
            if let Some(seg) = reader.next()? {
                heap.push(Reverse(MergeEntry {
                    seg,
                    axis,
                    run: run_index,
                }));
            }
            readers.push(reader);
        }

        while let Some(Reverse(entry)) = heap.pop() {
            output.append(&entry.seg)?;
            if let Some(seg) = readers[entry.run].next()? {
                heap.push(Reverse(MergeEntry {
                    seg,
                    axis,
                    run: entry.run,
                }));
            }
        }
        output.flush()?;

        for run in runs {
            run.delete()?;
        }
        Ok(output)
    }
}

fn run_path(output_path: &Path, run_index: usize) -> PathBuf {
    output_path.with_extension(format!("run{:04}", run_index))
}

fn axis_cmp(a: &Segment, b: &Segment, axis: SortAxis) -> Ordering {
    match axis {
        SortAxis::X => a
            .x()
            .total_cmp(&b.x())
            .then_with(|| a.low_y().total_cmp(&b.low_y()))
            .then_with(|| a.high_y().total_cmp(&b.high_y())),
        SortAxis::Y => a.sweep_cmp(b),
    }
}

struct RunReader {
    cursor: PageCursor<Segment>,
    batch: std::vec::IntoIter<Segment>,
}

impl RunReader {
    fn new(cursor: PageCursor<Segment>) -> Self {
        RunReader {
            cursor,
            batch: Vec::new().into_iter(),
        }
    }

    fn next(&mut self) -> Result<Option<Segment>, SweepError> {
        if let Some(seg) = self.batch.next() {
            return Ok(Some(seg));
        }
        match self.cursor.next_page()? {
            Some((batch, _)) => {
                self.batch = batch.into_iter();
                Ok(self.batch.next())
            }
            None => Ok(None),
        }
    }
}

struct MergeEntry {
    seg: Segment,
    axis: SortAxis,
    run: usize,
}

impl MergeEntry {
    fn order(&self, other: &MergeEntry) -> Ordering {
        axis_cmp(&self.seg, &other.seg, self.axis).then_with(|| self.run.cmp(&other.run))
    }
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.order(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.order(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order(other)
    }
}
