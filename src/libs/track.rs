use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::libs::error::IbdError;
use crate::libs::table::Row;
use crate::libs::window::WindowIndex;

/// Unordered pair of haplotype labels, stored as `(min, max)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub a: String,
    pub b: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.a, self.b)
    }
}

/// Identity of a pair at one window index. Window spans and lengths live in
/// `WindowIndex`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub index: usize,
    pub identity: f64,
}

/// Which observation wins when a pair has several rows for the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    First,
    #[default]
    Last,
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(DuplicatePolicy::First),
            "last" => Ok(DuplicatePolicy::Last),
            "reject" => Ok(DuplicatePolicy::Reject),
            _ => Err(format!("unknown duplicate policy: {}", s)),
        }
    }
}

/// Observations of one pair on one chromosome.
#[derive(Debug, Clone)]
pub struct Track {
    observations: Vec<Observation>,
    identity: Vec<Option<f64>>,
}

impl Track {
    /// Sorts `observations` by window index and resolves duplicates.
    ///
    /// `n_windows` is the number of windows on the chromosome. On a
    /// duplicate under `DuplicatePolicy::Reject` the offending window index
    /// is returned.
    pub fn new(
        mut observations: Vec<Observation>,
        n_windows: usize,
        policy: DuplicatePolicy,
    ) -> Result<Self, usize> {
        // stable, so equal indices keep input order
        observations.sort_by_key(|o| o.index);

        let mut identity: Vec<Option<f64>> = vec![None; n_windows];
        for obs in &observations {
            let slot = &mut identity[obs.index];
            match (slot.is_some(), policy) {
                (false, _) | (true, DuplicatePolicy::Last) => *slot = Some(obs.identity),
                (true, DuplicatePolicy::First) => {}
                (true, DuplicatePolicy::Reject) => return Err(obs.index),
            }
        }

        Ok(Self {
            observations,
            identity,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Identity at window `index`, `None` when the pair has no observation there.
    pub fn identity(&self, index: usize) -> Option<f64> {
        self.identity.get(index).copied().flatten()
    }

    /// Size of the chromosome's window range
    pub fn n_windows(&self) -> usize {
        self.identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Pair -> chromosome -> track, both levels in order of first appearance.
pub type PairTracks = IndexMap<PairKey, IndexMap<String, Track>>;

/// Groups rows into per-pair, per-chromosome tracks.
///
/// Rows whose window is not in `index` are dropped.
pub fn build_tracks(
    rows: &[Row],
    index: &WindowIndex,
    policy: DuplicatePolicy,
) -> Result<PairTracks, IbdError> {
    let mut raw: IndexMap<PairKey, IndexMap<String, Vec<Observation>>> = IndexMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(i) = index.lookup(&row.chr, row.start, row.end) else {
            dropped += 1;
            continue;
        };
        raw.entry(PairKey::new(&row.a, &row.b))
            .or_default()
            .entry(row.chr.clone())
            .or_default()
            .push(Observation {
                index: i,
                identity: row.identity,
            });
    }
    if dropped > 0 {
        log::warn!("{} rows reference unknown windows", dropped);
    }

    let mut tracks = PairTracks::with_capacity(raw.len());
    for (pair, by_chr) in raw {
        let mut built = IndexMap::with_capacity(by_chr.len());
        for (chr, observations) in by_chr {
            let n_windows = index.windows(&chr).len();
            let track = Track::new(observations, n_windows, policy).map_err(|i| {
                IbdError::DuplicateObservation {
                    a: pair.a.clone(),
                    b: pair.b.clone(),
                    chr: chr.clone(),
                    index: i,
                }
            })?;
            built.insert(chr, track);
        }
        tracks.insert(pair, built);
    }

    log::info!("{} pairs", tracks.len());
    Ok(tracks)
}
