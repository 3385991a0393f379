use distsweep::brute_force::{brute_force_intersections, intersection_set, read_answers};
use distsweep::generator::{SegmentGenerator, XDistribution};
use distsweep::memory_config::MemoryConfig;
use distsweep::segment::{Intersection, Segment};
use distsweep::store::PagedStore;
use distsweep::sweep::{DistributionSweep, RunSummary};

fn run_sweep(segments: &[Segment], config: MemoryConfig) -> (RunSummary, Vec<Intersection>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut input: PagedStore<Segment> =
        PagedStore::create(temp_dir.path().join("input.bin")).unwrap();
    for seg in segments {
        input.append(seg).unwrap();
    }
    input.flush().unwrap();

    let answer_path = temp_dir.path().join("answers.bin");
    let sweep = DistributionSweep::new(config, temp_dir.path().join("work"));
    let summary = sweep.find_intersections(&input, &answer_path).unwrap();

    let answers: PagedStore<Intersection> = PagedStore::open(&answer_path).unwrap();
    let found = read_answers(&answers).unwrap();
    (summary, found)
}

fn random_segments(count: usize, seed: u64) -> Vec<Segment> {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut store: PagedStore<Segment> =
        PagedStore::create(temp_dir.path().join("generated.bin")).unwrap();
    SegmentGenerator::new(count, 0.5, XDistribution::Uniform)
        .generate(seed, &mut store)
        .unwrap();

    let mut cursor = store.pages(0, 256).unwrap();
    let mut out = Vec::new();
    while let Some((batch, _)) = cursor.next_page().unwrap() {
        out.extend(batch);
    }
    out
}

/// Scenario D: 4096 uniform random segments, memory budget forced small
/// enough for at least two recursion levels; the result must match the
/// quadratic reference pair for pair.
#[test]
fn test_forced_deep_recursion_matches_brute_force() {
    let segments = random_segments(4096, 99);
    let expected = brute_force_intersections(&segments).unwrap();

    let config = MemoryConfig::new(1024, 128);
    let (summary, found) = run_sweep(&segments, config);

    assert!(summary.max_depth >= 2, "max depth {}", summary.max_depth);
    assert_eq!(found.len(), expected.len());
    assert_eq!(intersection_set(&found), intersection_set(&expected));
}

#[test]
fn test_output_set_is_deterministic() {
    let segments = random_segments(512, 7);
    let config = MemoryConfig::new(1024, 128);

    let (_, first) = run_sweep(&segments, config.clone());
    let (_, second) = run_sweep(&segments, config);

    assert_eq!(first.len(), second.len());
    assert_eq!(intersection_set(&first), intersection_set(&second));
}

/// With distinct vertical x and distinct horizontal y coordinates every
/// crossing pair has a unique point, so any duplicate report would show up
/// as a repeated record.
#[test]
fn test_no_pair_is_reported_twice_across_levels() {
    let mut segments = Vec::new();
    for i in 0..128 {
        segments.push(Segment::vertical(
            i as f64 + 0.25,
            0.0,
            (i % 29 + 3) as f64,
        ));
    }
    for i in 0..128 {
        let x1 = (i % 31) as f64;
        segments.push(Segment::horizontal(
            x1,
            x1 + 40.0,
            i as f64 / 128.0 * 30.0 + 0.125 + i as f64 * 1e-6,
        ));
    }

    let expected = brute_force_intersections(&segments).unwrap();
    let config = MemoryConfig::new(1024, 128);
    let (summary, found) = run_sweep(&segments, config);

    assert!(summary.max_depth >= 1);
    assert_eq!(found.len(), intersection_set(&found).len());
    assert_eq!(found.len(), expected.len());
    assert_eq!(intersection_set(&found), intersection_set(&expected));
}

/// The in-memory base case alone must satisfy the no-miss/no-duplicate
/// properties whenever the whole problem fits the budget.
#[test]
fn test_base_case_alone_handles_small_problems() {
    let segments = random_segments(500, 3);
    let expected = brute_force_intersections(&segments).unwrap();

    let (summary, found) = run_sweep(&segments, MemoryConfig::default_config());
    assert_eq!(summary.sweep_passes, 0);
    assert_eq!(summary.base_case_passes, 1);
    assert_eq!(found.len(), expected.len());
    assert_eq!(intersection_set(&found), intersection_set(&expected));
}

#[test]
fn test_normal_distribution_input_matches_brute_force() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut store: PagedStore<Segment> =
        PagedStore::create(temp_dir.path().join("generated.bin")).unwrap();
    SegmentGenerator::new(1024, 0.75, XDistribution::Normal)
        .generate(5, &mut store)
        .unwrap();
    let mut cursor = store.pages(0, 256).unwrap();
    let mut segments = Vec::new();
    while let Some((batch, _)) = cursor.next_page().unwrap() {
        segments.extend(batch);
    }

    let expected = brute_force_intersections(&segments).unwrap();
    let config = MemoryConfig::new(2048, 128);
    let (summary, found) = run_sweep(&segments, config);

    assert!(summary.max_depth >= 1);
    assert_eq!(found.len(), expected.len());
    assert_eq!(intersection_set(&found), intersection_set(&expected));
}
