use crate::libs::segment::{Mode, Segment, SizeFilter};
use crate::libs::track::Track;
use crate::libs::window::Window;

/// How missing windows are charged against `max_gap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapBudget {
    /// Every missing window in the run counts
    #[default]
    PerRun,
    /// Only the current stretch of consecutive missing windows counts
    Consecutive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RleParams {
    pub min_identity: f64,
    pub max_gap: usize,
    pub drop_tolerance: f64,
    pub missing_as_gap: bool,
    pub gap_budget: GapBudget,
}

impl Default for RleParams {
    fn default() -> Self {
        Self {
            min_identity: 0.9995,
            max_gap: 1,
            drop_tolerance: 0.0,
            missing_as_gap: false,
            gap_budget: GapBudget::PerRun,
        }
    }
}

impl RleParams {
    pub fn qualifies(&self, identity: f64) -> bool {
        identity >= self.min_identity
            || (self.drop_tolerance > 0.0 && identity >= self.min_identity - self.drop_tolerance)
    }
}

/// An open run and its accumulators.
#[derive(Debug)]
struct Run {
    start_idx: usize,
    end_idx: usize,
    called: usize,
    ident_sum: f64,
    min_ident: f64,
    gaps: usize,
    streak: usize,
}

impl Run {
    fn open(i: usize, identity: f64) -> Self {
        Self {
            start_idx: i,
            end_idx: i,
            called: 1,
            ident_sum: identity,
            min_ident: identity,
            gaps: 0,
            streak: 0,
        }
    }

    fn call(&mut self, i: usize, identity: f64) {
        self.end_idx = i;
        self.called += 1;
        self.ident_sum += identity;
        self.min_ident = self.min_ident.min(identity);
        self.streak = 0;
    }

    fn skip(&mut self, i: usize) {
        self.end_idx = i;
        self.gaps += 1;
        self.streak += 1;
    }

    /// Drops the last skipped window from the run.
    fn unskip(&mut self) {
        self.end_idx -= 1;
        self.gaps -= 1;
        self.streak -= 1;
    }

    fn over_budget(&self, params: &RleParams) -> bool {
        match params.gap_budget {
            GapBudget::PerRun => self.gaps > params.max_gap,
            GapBudget::Consecutive => self.streak > params.max_gap,
        }
    }

    fn finish(self, windows: &[Window], filter: &SizeFilter) -> Option<Segment> {
        let mut seg = Segment::span(windows, self.start_idx, self.end_idx, Mode::Rle);
        seg.mean_identity = self.ident_sum / self.called as f64;
        seg.min_identity = self.min_ident;
        seg.fraction_called = self.called as f64 / seg.n_windows as f64;
        seg.n_gaps = self.gaps;

        filter.accepts(&seg).then_some(seg)
    }
}

/// Run-length thresholding over one chromosome.
///
/// Scans every window index of the chromosome. A run opens on a qualifying
/// window and grows over qualifying windows; missing windows extend it only
/// when `missing_as_gap` is set, up to `max_gap` of them. A present window
/// below the threshold always closes the run.
pub fn call_rle(
    windows: &[Window],
    track: &Track,
    params: &RleParams,
    filter: &SizeFilter,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut run: Option<Run> = None;

    for i in 0..windows.len() {
        let identity = track.identity(i);

        run = match run.take() {
            None => identity
                .filter(|&x| params.qualifies(x))
                .map(|x| Run::open(i, x)),
            Some(mut r) => match identity {
                Some(x) if params.qualifies(x) => {
                    r.call(i, x);
                    Some(r)
                }
                None if params.missing_as_gap => {
                    r.skip(i);
                    if r.over_budget(params) {
                        // the run ends before the window that broke the budget,
                        // which is missing and can't open a new one
                        r.unskip();
                        segments.extend(r.finish(windows, filter));
                        None
                    } else {
                        Some(r)
                    }
                }
                _ => {
                    segments.extend(r.finish(windows, filter));
                    None
                }
            },
        };
    }

    if let Some(r) = run {
        segments.extend(r.finish(windows, filter));
    }

    segments
}
