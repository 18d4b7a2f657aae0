use std::collections::HashSet;

use rayon::prelude::*;

use crate::libs::error::IbdError;
use crate::libs::rle::{call_rle, RleParams};
use crate::libs::segment::{MergeStats, Mode, Segment, SizeFilter};
use crate::libs::table::Row;
use crate::libs::track::{build_tracks, DuplicatePolicy, PairKey, Track};
use crate::libs::window::{Window, WindowIndex};
use crate::libs::xdrop::{call_seed_extend, SeedParams};

/// Everything that steers one calling run.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub mode: Mode,
    pub filter: SizeFilter,
    pub rle: RleParams,
    pub seed: SeedParams,
    pub merge: MergeStats,
    pub duplicates: DuplicatePolicy,
}

impl CallOptions {
    /// Sets `missing_as_gap` for both algorithms.
    pub fn with_missing_as_gap(mut self, missing_as_gap: bool) -> Self {
        self.rle.missing_as_gap = missing_as_gap;
        self.seed.missing_as_gap = missing_as_gap;
        self
    }

    pub fn validate(&self) -> Result<(), IbdError> {
        let finite = [
            ("min-identity", self.rle.min_identity),
            ("drop-tolerance", self.rle.drop_tolerance),
            ("seed-threshold", self.seed.seed_threshold),
            ("extend-threshold", self.seed.extend_threshold),
            ("xdrop", self.seed.xdrop),
            ("reward", self.seed.reward),
            ("penalty-bad", self.seed.penalty_bad),
            ("penalty-miss", self.seed.penalty_miss),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(IbdError::InvalidParameter(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        if self.seed.seed_k == 0 {
            return Err(IbdError::InvalidParameter(
                "seed-k must be at least 1".to_string(),
            ));
        }
        let non_negative = [
            ("drop-tolerance", self.rle.drop_tolerance),
            ("xdrop", self.seed.xdrop),
            ("reward", self.seed.reward),
            ("penalty-bad", self.seed.penalty_bad),
            ("penalty-miss", self.seed.penalty_miss),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(IbdError::InvalidParameter(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Segments of one pair on one chromosome.
#[derive(Debug, Clone)]
pub struct PairSegments {
    pub pair: PairKey,
    pub chr: String,
    pub segments: Vec<Segment>,
}

/// Runs the selected algorithm on a single track.
pub fn call_track(windows: &[Window], track: &Track, opts: &CallOptions) -> Vec<Segment> {
    match opts.mode {
        Mode::Rle => call_rle(windows, track, &opts.rle, &opts.filter),
        Mode::Seed => call_seed_extend(windows, track, &opts.seed, &opts.filter, opts.merge),
    }
}

/// Indexes windows, builds tracks and calls segments for every pair and
/// chromosome.
///
/// With `pairs`, only the listed canonical pairs are processed; an empty
/// set filters nothing. Units run
/// on the rayon pool; results keep the order pairs and chromosomes first
/// appear in `rows`.
pub fn call_all(
    rows: &[Row],
    opts: &CallOptions,
    pairs: Option<&HashSet<PairKey>>,
) -> Result<Vec<PairSegments>, IbdError> {
    if rows.is_empty() {
        return Err(IbdError::NoValidRows("input".to_string()));
    }
    opts.validate()?;

    let index = WindowIndex::build(rows);
    log::info!(
        "{} windows on {} chromosomes",
        index.len(),
        index.chrs().count()
    );
    let tracks = build_tracks(rows, &index, opts.duplicates)?;

    let pairs = pairs.filter(|set| !set.is_empty());
    let units: Vec<(&PairKey, &String, &Track)> = tracks
        .iter()
        .filter(|(pair, _)| pairs.map_or(true, |set| set.contains(*pair)))
        .flat_map(|(pair, by_chr)| by_chr.iter().map(move |(chr, track)| (pair, chr, track)))
        .filter(|(_, _, track)| !track.is_empty())
        .collect();
    log::info!("{} tracks to call in {} mode", units.len(), opts.mode);

    let results: Vec<PairSegments> = units
        .par_iter()
        .map(|&(pair, chr, track)| PairSegments {
            pair: pair.clone(),
            chr: chr.clone(),
            segments: call_track(index.windows(chr), track, opts),
        })
        .collect();

    let n_segments: usize = results.iter().map(|r| r.segments.len()).sum();
    log::info!("{} segments", n_segments);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(start: u64, a: &str, b: &str, identity: f64) -> Row {
        Row {
            region: String::new(),
            chr: "chr1".to_string(),
            start,
            end: start + 5000,
            length: 5000,
            a: a.to_string(),
            b: b.to_string(),
            identity,
        }
    }

    fn toy1_rows() -> Vec<Row> {
        let mut rows = Vec::new();
        for i in 0..10u64 {
            let ident = match i {
                4 => 0.9997,
                1..=6 => 0.9998,
                _ => 0.9950,
            };
            rows.push(row(i * 5000, "A", "B", ident));
        }
        for i in 0..7u64 {
            rows.push(row(i * 5000, "A", "C", 0.9950));
        }
        rows
    }

    fn spans(results: &[PairSegments]) -> Vec<(String, String, u64, u64)> {
        results
            .iter()
            .flat_map(|r| {
                r.segments
                    .iter()
                    .map(|s| (r.pair.a.clone(), r.pair.b.clone(), s.start, s.end))
            })
            .collect()
    }

    #[test]
    fn test_call_all_rle() {
        let opts = CallOptions {
            mode: Mode::Rle,
            ..Default::default()
        };
        let results = call_all(&toy1_rows(), &opts, None).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pair, PairKey::new("A", "B"));
        assert_eq!(results[1].segments.len(), 0);
        assert_eq!(
            spans(&results),
            vec![("A".to_string(), "B".to_string(), 5000, 35000)]
        );
    }

    #[test]
    fn test_call_all_seed() {
        let results = call_all(&toy1_rows(), &CallOptions::default(), None).unwrap();
        let segs = &results[0].segments;
        assert_eq!(segs.len(), 1);
        assert_eq!((segs[0].start, segs[0].end), (5000, 35000));
        assert_eq!(segs[0].mode, Mode::Seed);
    }

    #[test]
    fn test_pair_symmetry() {
        let rows = toy1_rows();
        let swapped: Vec<Row> = rows
            .iter()
            .map(|r| Row {
                a: r.b.clone(),
                b: r.a.clone(),
                ..r.clone()
            })
            .collect();

        for mode in [Mode::Rle, Mode::Seed] {
            let opts = CallOptions {
                mode,
                ..Default::default()
            };
            let fwd = call_all(&rows, &opts, None).unwrap();
            let rev = call_all(&swapped, &opts, None).unwrap();
            assert_eq!(spans(&fwd), spans(&rev));
            for (x, y) in fwd.iter().zip(&rev) {
                assert_eq!(x.segments, y.segments);
            }
        }
    }

    #[test]
    fn test_pair_filter() {
        let mut allow = HashSet::new();
        allow.insert(PairKey::new("C", "A"));
        let results = call_all(&toy1_rows(), &CallOptions::default(), Some(&allow)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pair, PairKey::new("A", "C"));
    }

    #[test]
    fn test_empty_pair_filter() {
        let allow = HashSet::new();
        let results = call_all(&toy1_rows(), &CallOptions::default(), Some(&allow)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].segments.len(), 1);
    }

    #[test]
    fn test_nan_window_stays_indexed() {
        // window 2 exists only through a NaN row of A/B
        let rows: Vec<Row> = [1.0, 1.0, f64::NAN, 1.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| row(i as u64 * 5000, "A", "B", x))
            .collect();
        let opts = CallOptions {
            mode: Mode::Rle,
            ..Default::default()
        };
        let results = call_all(&rows, &opts, None).unwrap();
        assert!(results[0].segments.is_empty());

        // extension steps over it as one below-threshold window
        let results = call_all(&rows, &CallOptions::default(), None).unwrap();
        let segs = &results[0].segments;
        assert_eq!(segs.len(), 1);
        assert_eq!((segs[0].start_idx, segs[0].end_idx), (0, 4));
        assert_eq!(segs[0].n_gaps, 0);
    }

    #[test]
    fn test_missing_windows_from_other_pairs() {
        // window 3 exists only through pair A/C
        let mut rows: Vec<Row> = [0.9950, 0.9997, 0.9998]
            .iter()
            .enumerate()
            .map(|(i, &x)| row(i as u64 * 5000, "A", "B", x))
            .collect();
        for (i, x) in [(4u64, 0.9998), (5, 0.9998), (6, 0.9950)] {
            rows.push(row(i * 5000, "A", "B", x));
        }
        rows.push(row(15000, "A", "C", 0.5));

        let opts = CallOptions::default().with_missing_as_gap(true);
        let results = call_all(&rows, &opts, None).unwrap();
        let segs = &results[0].segments;
        assert_eq!(segs.len(), 1);
        assert_eq!((segs[0].start_idx, segs[0].end_idx), (1, 5));
        assert_eq!(segs[0].n_gaps, 1);
    }

    #[test]
    fn test_empty_rows() {
        let err = call_all(&[], &CallOptions::default(), None).unwrap_err();
        assert!(matches!(err, IbdError::NoValidRows(_)));
    }

    #[test]
    fn test_validate() {
        let mut opts = CallOptions::default();
        assert!(opts.validate().is_ok());

        opts.seed.seed_k = 0;
        assert!(matches!(opts.validate(), Err(IbdError::InvalidParameter(_))));

        let mut opts = CallOptions::default();
        opts.seed.xdrop = f64::NAN;
        assert!(opts.validate().is_err());

        let mut opts = CallOptions::default();
        opts.seed.penalty_bad = -1.0;
        assert!(opts.validate().is_err());
    }
}
