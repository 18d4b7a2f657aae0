use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;

use crate::libs::table::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub length: u64,
}

/// Dense, per-chromosome window numbering.
///
/// Windows are the distinct `(start, end, length)` triples seen on a
/// chromosome, sorted ascending; the index of a window is its position in
/// that order. Gaps in genomic coordinates do not leave holes in the index.
#[derive(Debug, Default)]
pub struct WindowIndex {
    windows: IndexMap<String, Vec<Window>>,
    lookup: HashMap<String, HashMap<(u64, u64), usize>>,
}

impl WindowIndex {
    pub fn build(rows: &[Row]) -> Self {
        let mut uniq: IndexMap<String, BTreeSet<(u64, u64, u64)>> = IndexMap::new();
        for row in rows {
            uniq.entry(row.chr.clone())
                .or_default()
                .insert((row.start, row.end, row.length));
        }

        let mut index = WindowIndex::default();
        for (chr, triples) in uniq {
            let windows: Vec<Window> = triples
                .into_iter()
                .map(|(start, end, length)| Window {
                    chr: chr.clone(),
                    start,
                    end,
                    length,
                })
                .collect();

            let mut lookup = HashMap::with_capacity(windows.len());
            for (i, w) in windows.iter().enumerate() {
                // later triples with the same span overwrite earlier ones
                if lookup.insert((w.start, w.end), i).is_some() {
                    log::warn!(
                        "{}:{}-{} appears with conflicting lengths",
                        chr,
                        w.start,
                        w.end
                    );
                }
            }

            log::info!("{}: {} windows", chr, windows.len());
            index.lookup.insert(chr.clone(), lookup);
            index.windows.insert(chr, windows);
        }

        index
    }

    /// Windows of `chr` in index order; empty for an unknown chromosome.
    pub fn windows(&self, chr: &str) -> &[Window] {
        self.windows.get(chr).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup(&self, chr: &str, start: u64, end: u64) -> Option<usize> {
        self.lookup.get(chr)?.get(&(start, end)).copied()
    }

    pub fn chrs(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
