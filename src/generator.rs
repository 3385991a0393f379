use crate::SweepError;
use crate::segment::Segment;
use crate::store::PagedStore;
use rand::prelude::*;
use rand_distr::Normal;

pub const X_MAX: f64 = 100.0;
pub const Y_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XDistribution {
    Uniform,
    Normal,
}

/// Synthetic segment collaborator.
///
/// Produces `count` segments, a `vertical_share` fraction of them vertical.
/// Vertical x-coordinates follow the chosen distribution (normal: mean
/// X_MAX/2, deviation X_MAX/7, clamped to the domain); every other
/// coordinate is uniform. Seeded, so test datasets are reproducible.
pub struct SegmentGenerator {
    count: usize,
    vertical_share: f64,
    distribution: XDistribution,
    x_max: f64,
    y_max: f64,
}

impl SegmentGenerator {
    pub fn new(count: usize, vertical_share: f64, distribution: XDistribution) -> Self {
        SegmentGenerator {
            count,
            vertical_share: vertical_share.clamp(0.0, 1.0),
            distribution,
            x_max: X_MAX,
            y_max: Y_MAX,
        }
    }

    pub fn with_domain(mut self, x_max: f64, y_max: f64) -> Self {
        self.x_max = x_max;
        self.y_max = y_max;
        self
    }

    pub fn generate(
        &self,
        seed: u64,
        store: &mut PagedStore<Segment>,
    ) -> Result<(), SweepError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(self.x_max / 2.0, self.x_max / 7.0)
            .map_err(|e| SweepError::Other(format!("bad normal parameters: {}", e)))?;

        let verticals =
            ((self.vertical_share * self.count as f64).round() as usize).min(self.count);
        let horizontals = self.count - verticals;

        for _ in 0..verticals {
            let x = match self.distribution {
                XDistribution::Uniform => rng.gen_range(0.0..self.x_max),
                XDistribution::Normal => normal.sample(&mut rng).clamp(0.0, self.x_max),
            };
            let y1 = rng.gen_range(0.0..self.y_max);
            let mut y2 = rng.gen_range(0.0..self.y_max);
            while y2 == y1 {
                y2 = rng.gen_range(0.0..self.y_max);
            }
            store.append(&Segment::vertical(x, y1, y2))?;
        }

        for _ in 0..horizontals {
            let y = rng.gen_range(0.0..self.y_max);
            let x1 = rng.gen_range(0.0..self.x_max);
            let mut x2 = rng.gen_range(0.0..self.x_max);
            while x2 == x1 {
                x2 = rng.gen_range(0.0..self.x_max);
            }
            store.append(&Segment::horizontal(x1, x2, y))?;
        }

        store.flush()
    }
}
