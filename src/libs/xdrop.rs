use itertools::Itertools;

use crate::libs::segment::{merge_segments, summarize, MergeStats, Mode, Segment, SizeFilter};
use crate::libs::track::Track;
use crate::libs::window::Window;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedParams {
    pub seed_threshold: f64,
    pub seed_k: usize,
    pub extend_threshold: f64,
    pub xdrop: f64,
    pub reward: f64,
    pub penalty_bad: f64,
    pub penalty_miss: f64,
    pub missing_as_gap: bool,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            seed_threshold: 0.9998,
            seed_k: 2,
            extend_threshold: 0.9995,
            xdrop: 2.0,
            reward: 1.0,
            penalty_bad: 1.0,
            penalty_miss: 1.0,
            missing_as_gap: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Finds maximal runs of at least `seed_k` consecutive windows with
/// identity `>= seed_threshold`, as inclusive `(start, end)` indices.
///
/// Missing windows always break a run.
pub fn find_seeds(track: &Track, params: &SeedParams) -> Vec<(usize, usize)> {
    let is_seed = |i: &usize| matches!(track.identity(*i), Some(x) if x >= params.seed_threshold);

    let runs = (0..track.n_windows()).chunk_by(is_seed);
    let seeds = runs
        .into_iter()
        .filter(|(seed, _)| *seed)
        .filter_map(|(_, mut run)| {
            let first = run.next()?;
            let last = run.last().unwrap_or(first);
            (last - first + 1 >= params.seed_k).then_some((first, last))
        })
        .collect();

    seeds
}

/// Running and best score of one extension.
#[derive(Debug)]
struct XDrop {
    score: f64,
    best_score: f64,
    best: usize,
}

/// Extends from the seed boundary `from` towards `direction`.
///
/// Each window adds `reward` when its identity reaches
/// `extend_threshold`, subtracts `penalty_bad` when it doesn't, and
/// subtracts `penalty_miss` when it is missing and `missing_as_gap` is set;
/// otherwise missing windows are stepped over for free. Extension stops
/// once the score falls more than `xdrop` below the best seen, and the
/// returned boundary is where the best score was reached.
pub fn extend(track: &Track, from: usize, direction: Direction, params: &SeedParams) -> usize {
    let steps: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Left => Box::new((0..from).rev()),
        Direction::Right => Box::new(from + 1..track.n_windows()),
    };

    let mut state = XDrop {
        score: 0.0,
        best_score: 0.0,
        best: from,
    };
    for k in steps {
        match track.identity(k) {
            None if !params.missing_as_gap => continue,
            None => state.score -= params.penalty_miss,
            Some(x) if x >= params.extend_threshold => state.score += params.reward,
            Some(_) => state.score -= params.penalty_bad,
        }

        if state.score > state.best_score {
            state.best_score = state.score;
            state.best = k;
        }
        if state.best_score - state.score > params.xdrop {
            break;
        }
    }

    state.best
}

/// Seed-and-extend calling over one chromosome.
///
/// Seeds are processed left to right; a seed lying entirely inside an
/// already reported segment is skipped. Reported segments are merged
/// before returning.
pub fn call_seed_extend(
    windows: &[Window],
    track: &Track,
    params: &SeedParams,
    filter: &SizeFilter,
    merge: MergeStats,
) -> Vec<Segment> {
    let mut used = vec![false; windows.len()];
    let mut segments = Vec::new();

    for (s, e) in find_seeds(track, params) {
        if used[s..=e].iter().all(|&u| u) {
            continue;
        }

        let left = extend(track, s, Direction::Left, params);
        let right = extend(track, e, Direction::Right, params);

        let seg = summarize(windows, track, left, right, Mode::Seed);
        if filter.accepts(&seg) {
            used[left..=right].iter_mut().for_each(|u| *u = true);
            segments.push(seg);
        }
    }

    merge_segments(segments, windows, track, merge)
}
