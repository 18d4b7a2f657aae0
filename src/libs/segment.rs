use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::libs::track::{PairKey, Track};
use crate::libs::window::Window;

pub const HEADER: [&str; 11] = [
    "CHR",
    "START",
    "END",
    "HAP1",
    "HAP2",
    "N_WINDOWS",
    "COVERED_BP",
    "MEAN_IDENTITY",
    "MIN_IDENTITY",
    "FRACTION_CALLED",
    "MODE",
];

/// Segment calling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Rle,
    #[default]
    Seed,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Rle => write!(f, "rle"),
            Mode::Seed => write!(f, "seed"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rle" => Ok(Mode::Rle),
            "seed" => Ok(Mode::Seed),
            _ => Err(format!("unknown mode: {}", s)),
        }
    }
}

/// Minimum size a segment must reach to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    pub min_windows: usize,
    pub min_length_bp: u64,
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self {
            min_windows: 3,
            min_length_bp: 5000,
        }
    }
}

impl SizeFilter {
    pub fn accepts(&self, seg: &Segment) -> bool {
        seg.n_windows >= self.min_windows && seg.covered_bp >= self.min_length_bp
    }
}

/// A called segment on one chromosome.
///
/// `start`/`end` are the genomic start of the first window and the end of
/// the last one. Identity statistics cover called windows only.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub start_idx: usize,
    pub end_idx: usize,
    pub n_windows: usize,
    pub covered_bp: u64,
    pub mean_identity: f64,
    pub min_identity: f64,
    pub fraction_called: f64,
    pub n_gaps: usize,
    pub mode: Mode,
}

impl Segment {
    /// Builds the span part of a segment for windows `s..=e`, leaving the
    /// identity statistics zeroed.
    pub fn span(windows: &[Window], s: usize, e: usize, mode: Mode) -> Self {
        let covered_bp = windows[s..=e].iter().map(|w| w.length).sum();
        Self {
            chr: windows[s].chr.clone(),
            start: windows[s].start,
            end: windows[e].end,
            start_idx: s,
            end_idx: e,
            n_windows: e - s + 1,
            covered_bp,
            mean_identity: 0.0,
            min_identity: 0.0,
            fraction_called: 0.0,
            n_gaps: 0,
            mode,
        }
    }
}

/// Computes all statistics of windows `s..=e` from the track.
pub fn summarize(windows: &[Window], track: &Track, s: usize, e: usize, mode: Mode) -> Segment {
    let mut seg = Segment::span(windows, s, e, mode);

    let called: Vec<f64> = (s..=e).filter_map(|i| track.identity(i)).collect();
    if !called.is_empty() {
        seg.mean_identity = called.iter().sum::<f64>() / called.len() as f64;
        seg.min_identity = called.iter().copied().fold(f64::INFINITY, f64::min);
    }
    seg.fraction_called = called.len() as f64 / seg.n_windows as f64;
    seg.n_gaps = seg.n_windows - called.len();

    seg
}

/// How merged segments get their statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStats {
    /// Keep the statistics of the first segment of each overlapping group;
    /// only the span widens
    #[default]
    KeepFirst,
    /// Recompute everything over the merged window range
    Recompute,
}

/// Coalesces overlapping segments of one chromosome.
///
/// Segments are sorted by `(start, end)`; a segment starting at or before
/// the end of the previous one is folded into it.
pub fn merge_segments(
    mut segs: Vec<Segment>,
    windows: &[Window],
    track: &Track,
    stats: MergeStats,
) -> Vec<Segment> {
    if segs.is_empty() {
        return segs;
    }
    segs.sort_by(|x, y| (&x.chr, x.start, x.end).cmp(&(&y.chr, y.start, y.end)));

    let mut out: Vec<Segment> = Vec::with_capacity(segs.len());
    let mut merged: Vec<bool> = Vec::with_capacity(segs.len());
    for seg in segs {
        match out.last_mut() {
            Some(last) if last.chr == seg.chr && seg.start <= last.end => {
                last.start = last.start.min(seg.start);
                last.end = last.end.max(seg.end);
                last.start_idx = last.start_idx.min(seg.start_idx);
                last.end_idx = last.end_idx.max(seg.end_idx);
                if let Some(flag) = merged.last_mut() {
                    *flag = true;
                }
            }
            _ => {
                out.push(seg);
                merged.push(false);
            }
        }
    }

    if stats == MergeStats::Recompute {
        for (seg, _) in out.iter_mut().zip(merged).filter(|(_, m)| *m) {
            *seg = summarize(windows, track, seg.start_idx, seg.end_idx, seg.mode);
        }
    }

    out
}

/// Writes the output header, optionally with the `N_GAPS` column.
pub fn write_header<W: Write>(wtr: &mut csv::Writer<W>, show_gaps: bool) -> csv::Result<()> {
    if show_gaps {
        let mut header = HEADER.to_vec();
        header.push("N_GAPS");
        wtr.write_record(&header)
    } else {
        wtr.write_record(HEADER)
    }
}

pub fn write_segment<W: Write>(
    wtr: &mut csv::Writer<W>,
    pair: &PairKey,
    seg: &Segment,
    show_gaps: bool,
) -> csv::Result<()> {
    let mut record = vec![
        seg.chr.clone(),
        seg.start.to_string(),
        seg.end.to_string(),
        pair.a.clone(),
        pair.b.clone(),
        seg.n_windows.to_string(),
        seg.covered_bp.to_string(),
        format!("{:.6}", seg.mean_identity),
        format!("{:.6}", seg.min_identity),
        format!("{:.3}", seg.fraction_called),
        seg.mode.to_string(),
    ];
    if show_gaps {
        record.push(seg.n_gaps.to_string());
    }
    wtr.write_record(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::track::{DuplicatePolicy, Observation};
    use approx::assert_relative_eq;

    fn windows(n: usize) -> Vec<Window> {
        (0..n)
            .map(|i| Window {
                chr: "chr1".to_string(),
                start: i as u64 * 5000,
                end: (i as u64 + 1) * 5000,
                length: 5000,
            })
            .collect()
    }

    fn track(idents: &[Option<f64>]) -> Track {
        let obs = idents
            .iter()
            .enumerate()
            .filter_map(|(index, ident)| {
                ident.map(|identity| Observation { index, identity })
            })
            .collect();
        Track::new(obs, idents.len(), DuplicatePolicy::Last).unwrap()
    }

    #[test]
    fn test_summarize() {
        let wins = windows(5);
        let t = track(&[Some(0.99), Some(0.9998), None, Some(0.9996), Some(0.99)]);
        let seg = summarize(&wins, &t, 1, 3, Mode::Seed);

        assert_eq!(seg.start, 5000);
        assert_eq!(seg.end, 20000);
        assert_eq!(seg.n_windows, 3);
        assert_eq!(seg.covered_bp, 15000);
        assert_eq!(seg.n_gaps, 1);
        assert_relative_eq!(seg.mean_identity, 0.9997, epsilon = 1e-12);
        assert_relative_eq!(seg.min_identity, 0.9996);
        assert_relative_eq!(seg.fraction_called, 2.0 / 3.0);
    }

    #[test]
    fn test_summarize_no_calls() {
        let wins = windows(2);
        let t = track(&[None, None]);
        let seg = summarize(&wins, &t, 0, 1, Mode::Seed);
        assert_eq!(seg.mean_identity, 0.0);
        assert_eq!(seg.min_identity, 0.0);
        assert_eq!(seg.fraction_called, 0.0);
    }

    #[test]
    fn test_size_filter() {
        let wins = windows(3);
        let t = track(&[Some(1.0), Some(1.0), Some(1.0)]);
        let filter = SizeFilter::default();
        assert!(filter.accepts(&summarize(&wins, &t, 0, 2, Mode::Rle)));
        assert!(!filter.accepts(&summarize(&wins, &t, 0, 1, Mode::Rle)));

        let loose = SizeFilter {
            min_windows: 1,
            min_length_bp: 5000,
        };
        assert!(loose.accepts(&summarize(&wins, &t, 1, 1, Mode::Rle)));
    }

    #[test]
    fn test_merge_keep_first() {
        let wins = windows(8);
        let t = track(&[
            Some(0.9),
            Some(0.9),
            Some(0.9),
            Some(0.5),
            Some(0.5),
            None,
            Some(1.0),
            Some(1.0),
        ]);
        let segs = vec![
            summarize(&wins, &t, 6, 7, Mode::Seed),
            summarize(&wins, &t, 2, 4, Mode::Seed),
            summarize(&wins, &t, 0, 2, Mode::Seed),
        ];
        let merged = merge_segments(segs, &wins, &t, MergeStats::KeepFirst);

        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start, merged[0].end), (0, 25000));
        assert_eq!((merged[0].start_idx, merged[0].end_idx), (0, 4));
        // statistics of windows 0..=2 only
        assert_eq!(merged[0].n_windows, 3);
        assert_relative_eq!(merged[0].mean_identity, 0.9);
        assert_eq!((merged[1].start, merged[1].end), (30000, 40000));
    }

    #[test]
    fn test_merge_touching() {
        let wins = windows(4);
        let t = track(&[Some(1.0); 4]);
        let segs = vec![
            summarize(&wins, &t, 0, 1, Mode::Seed),
            summarize(&wins, &t, 2, 3, Mode::Seed),
        ];
        // end of the first equals start of the second
        let merged = merge_segments(segs, &wins, &t, MergeStats::KeepFirst);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 20000);
    }

    #[test]
    fn test_merge_recompute() {
        let wins = windows(5);
        let t = track(&[Some(0.9), Some(0.9), Some(0.9), None, Some(0.5)]);
        let segs = vec![
            summarize(&wins, &t, 0, 2, Mode::Seed),
            summarize(&wins, &t, 2, 4, Mode::Seed),
        ];
        let merged = merge_segments(segs, &wins, &t, MergeStats::Recompute);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].n_windows, 5);
        assert_eq!(merged[0].covered_bp, 25000);
        assert_eq!(merged[0].n_gaps, 1);
        assert_relative_eq!(merged[0].min_identity, 0.5);
        assert_relative_eq!(merged[0].fraction_called, 0.8);
    }

    #[test]
    fn test_write_segment() {
        let wins = windows(3);
        let t = track(&[Some(0.99985), Some(0.9998), Some(0.9998)]);
        let seg = summarize(&wins, &t, 0, 2, Mode::Rle);

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(vec![]);
        write_header(&mut wtr, true).unwrap();
        write_segment(&mut wtr, &PairKey::new("B", "A"), &seg, true).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("CHR\tSTART\tEND\tHAP1"));
        assert!(lines[0].ends_with("MODE\tN_GAPS"));
        assert_eq!(
            lines[1],
            "chr1\t0\t15000\tA\tB\t3\t15000\t0.999817\t0.999800\t1.000\trle\t0"
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("rle".parse::<Mode>(), Ok(Mode::Rle));
        assert_eq!(Mode::Seed.to_string(), "seed");
        assert!("blast".parse::<Mode>().is_err());
    }
}
