use crate::SweepError;
use crate::active_buffer::ActiveVerticalBuffer;
use crate::memory_config::MemoryConfig;
use crate::plane_sweep::plane_sweep;
use crate::segment::{Intersection, Orientation, Segment};
use crate::slab::{self, Slab};
use crate::sorter::{ExternalSorter, SortAxis};
use crate::store::PagedStore;
use fixedbitset::FixedBitSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Machine-readable result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub segments: u64,
    pub verticals: u64,
    pub horizontals: u64,
    pub intersections: u64,
    pub max_depth: usize,
    pub sweep_passes: usize,
    pub base_case_passes: usize,
}

/// Recursive distribution sweep over a segment store.
///
/// Each level partitions the x-domain into slabs balanced by vertical count,
/// makes one y-ascending pass over the level's input, reports every
/// (vertical, horizontal) crossing the level can resolve, and hands each
/// incomplete slab a self-contained sub-problem: the slab's byte range of
/// the x-sorted stream plus a y-ordered temporary store of its verticals and
/// archived horizontals. Sub-problems at or below the memory threshold are
/// swept in memory.
pub struct DistributionSweep {
    config: MemoryConfig,
    work_dir: PathBuf,
}

impl DistributionSweep {
    pub fn new(config: MemoryConfig, work_dir: impl Into<PathBuf>) -> Self {
        DistributionSweep {
            config,
            work_dir: work_dir.into(),
        }
    }

    /// Sort both streams, sweep recursively, close the answer store.
    ///
    /// Any I/O or malformed-record failure aborts the run and removes the
    /// answer store: a run either completes with a closed, correct output
    /// or leaves none. Temporary state lives under the work directory and
    /// is removed as it is consumed.
    pub fn find_intersections(
        &self,
        input: &PagedStore<Segment>,
        answer_path: &Path,
    ) -> Result<RunSummary, SweepError> {
        let result = self.run(input, answer_path);
        if result.is_err() {
            let _ = fs::remove_file(answer_path);
        }
        result
    }

    fn run(
        &self,
        input: &PagedStore<Segment>,
        answer_path: &Path,
    ) -> Result<RunSummary, SweepError> {
        fs::create_dir_all(&self.work_dir)?;

        let sorter = ExternalSorter::new(&self.config);
        let x_sorted = sorter.sort(input, SortAxis::X, &self.work_dir.join("x_sorted.bin"))?;
        let y_sorted = sorter.sort(input, SortAxis::Y, &self.work_dir.join("y_sorted.bin"))?;

        let segments = y_sorted.record_count();
        let verticals = x_sorted.record_count();
        println!(
            "[sweep] {} segments ({} vertical), fan-out {}, base case at {} records",
            segments,
            verticals,
            self.config.fan_out(),
            self.config.base_case_records()
        );

        let mut answers: PagedStore<Intersection> = PagedStore::create(answer_path)?;
        let mut pass = SweepPass {
            config: &self.config,
            work_dir: &self.work_dir,
            x_sorted: &x_sorted,
            answers: &mut answers,
            max_depth: 0,
            sweep_passes: 0,
            base_case_passes: 0,
            temp_seq: 0,
        };
        pass.recurse(0, x_sorted.byte_len(), y_sorted, 0)?;

        let max_depth = pass.max_depth;
        let sweep_passes = pass.sweep_passes;
        let base_case_passes = pass.base_case_passes;

        let intersections = answers.record_count();
        answers.close()?;
        x_sorted.delete()?;

        let summary = RunSummary {
            segments,
            verticals,
            horizontals: segments - verticals,
            intersections,
            max_depth,
            sweep_passes,
            base_case_passes,
        };
        println!(
            "[sweep] done: {} intersections, max depth {}, {} sweep passes, {} base cases",
            summary.intersections, summary.max_depth, summary.sweep_passes, summary.base_case_passes
        );
        Ok(summary)
    }
}

struct SlabContext {
    slab: Slab,
    active: ActiveVerticalBuffer,
    archive: PagedStore<Segment>,
}

struct SweepPass<'a> {
    config: &'a MemoryConfig,
    work_dir: &'a Path,
    x_sorted: &'a PagedStore<Segment>,
    answers: &'a mut PagedStore<Intersection>,
    max_depth: usize,
    sweep_passes: usize,
    base_case_passes: usize,
    temp_seq: usize,
}

impl<'a> SweepPass<'a> {
    /// One recursion level: `[x_begin, x_end)` bounds the sub-problem's
    /// verticals in the x-sorted stream, `y_input` is its y-ordered segment
    /// store. Consumes and deletes `y_input`.
    fn recurse(
        &mut self,
        x_begin: u64,
        x_end: u64,
        y_input: PagedStore<Segment>,
        depth: usize,
    ) -> Result<(), SweepError> {
        self.max_depth = self.max_depth.max(depth);
        let count = y_input.record_count();

        if count == 0 || x_end.saturating_sub(x_begin) == 0 {
            // Without verticals (or any records) nothing can cross.
            y_input.delete()?;
            return Ok(());
        }
        if count <= self.config.base_case_records() {
            return self.solve_in_memory(y_input);
        }

        self.sweep_passes += 1;
        let slabs = slab::generate_slabs(
            self.x_sorted,
            x_begin,
            x_end,
            self.config.fan_out(),
            self.config.records_per_page(),
        )?;
        println!(
            "[sweep] level {}: {} records over {} slabs",
            depth,
            count,
            slabs.len()
        );

        let window = self.config.window_records(slabs.len());
        let mut arena: Vec<SlabContext> = Vec::with_capacity(slabs.len());
        for s in &slabs {
            let archive_path = self
                .work_dir
                .join(format!("archive_{:02}_{:06}.bin", depth, self.temp_seq));
            self.temp_seq += 1;
            arena.push(SlabContext {
                slab: s.clone(),
                active: ActiveVerticalBuffer::new(
                    self.work_dir,
                    s.index,
                    window,
                    self.config.records_per_page(),
                ),
                archive: PagedStore::create(archive_path)?,
            });
        }
        let mut incomplete = FixedBitSet::with_capacity(slabs.len());

        let mut cursor = y_input.pages(0, self.config.records_per_page())?;
        while let Some((batch, _)) = cursor.next_page()? {
            for seg in batch {
                match seg.classify()? {
                    Orientation::Vertical => {
                        let idx = slab::slab_of(&slabs, seg.x()).ok_or_else(|| {
                            SweepError::SlabCoverage(format!(
                                "vertical at x={} outside partition [{}, {}]",
                                seg.x(),
                                slabs[0].init_x,
                                slabs[slabs.len() - 1].final_x
                            ))
                        })?;
                        arena[idx].active.append(seg)?;
                        // Forward to the slab's archive so an incomplete
                        // slab's sub-problem carries its own verticals.
                        arena[idx].archive.append(&seg)?;
                    }
                    Orientation::Horizontal => {
                        place_horizontal(&seg, &slabs, &mut arena, &mut incomplete, self.answers)?;
                    }
                }
            }
        }
        y_input.delete()?;

        let mut tasks = Vec::new();
        for ctx in arena {
            let SlabContext {
                slab,
                active,
                mut archive,
            } = ctx;
            active.cleanup()?;
            if incomplete.contains(slab.index) {
                archive.close()?;
                tasks.push((slab.initial_offset, slab.final_offset, archive));
            } else {
                archive.delete()?;
            }
        }
        for (begin, end, archive) in tasks {
            self.recurse(begin, end, archive, depth + 1)?;
        }
        Ok(())
    }

    fn solve_in_memory(&mut self, y_input: PagedStore<Segment>) -> Result<(), SweepError> {
        self.base_case_passes += 1;
        let mut segments = Vec::with_capacity(y_input.record_count() as usize);
        let mut cursor = y_input.pages(0, self.config.records_per_page())?;
        while let Some((batch, _)) = cursor.next_page()? {
            segments.extend(batch);
        }
        y_input.delete()?;
        plane_sweep(segments, self.answers)?;
        Ok(())
    }
}

/// Classify one horizontal against the level's slabs: archive it to any
/// partially covered end slab (marking the slab incomplete) and report it
/// against the active verticals of every slab it fully spans.
fn place_horizontal(
    seg: &Segment,
    slabs: &[Slab],
    arena: &mut [SlabContext],
    incomplete: &mut FixedBitSet,
    answers: &mut PagedStore<Intersection>,
) -> Result<(), SweepError> {
    let min_x = seg.min_x();
    let max_x = seg.max_x();

    // Entirely outside the sub-problem's vertical span: no vertical at this
    // level or below can lie in the segment's x-range.
    if max_x < slabs[0].init_x || min_x > slabs[slabs.len() - 1].final_x {
        return Ok(());
    }

    let mut i = slab::slab_of_clamped(slabs, min_x);
    let mut j = slab::slab_of_clamped(slabs, max_x);

    if i == j && !(min_x <= slabs[i].init_x && max_x >= slabs[i].final_x) {
        arena[i].archive.append(seg)?;
        incomplete.insert(i);
        return Ok(());
    }
    if min_x > slabs[i].init_x {
        arena[i].archive.append(seg)?;
        incomplete.insert(i);
        i += 1;
    }
    if max_x < slabs[j].final_x {
        arena[j].archive.append(seg)?;
        incomplete.insert(j);
        j -= 1;
    }

    let y = seg.y();
    for s in i..=j {
        arena[s].active.for_each_active(y, |v| {
            if v.low_y() <= y {
                answers.append(&Intersection { x: v.x(), y })?;
            }
            Ok(())
        })?;
    }
    Ok(())
}
