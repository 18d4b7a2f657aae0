use std::collections::HashSet;
use std::io::BufRead;

use crate::libs::error::IbdError;
use crate::libs::track::PairKey;

/// Reads an allow-list of pairs, one `A<TAB>B` per line.
///
/// Blank lines and lines starting with `#` are ignored, columns after the
/// second are ignored, and pairs are canonicalised.
pub fn read_pair_filter<R: BufRead>(reader: R) -> anyhow::Result<HashSet<PairKey>> {
    let mut pairs = HashSet::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        match (fields.next(), fields.next()) {
            (Some(a), Some(b)) => {
                pairs.insert(PairKey::new(a, b));
            }
            _ => return Err(IbdError::MalformedPair { line: i + 1 }.into()),
        }
    }

    if pairs.is_empty() {
        log::warn!("the allow-list is empty, all pairs will be called");
    } else {
        log::info!("{} pairs in the allow-list", pairs.len());
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pair_filter() {
        let input = "# comment\nA\tB\n\nD\tC\textra\n  \nB\tA\n";
        let pairs = read_pair_filter(input.as_bytes()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&PairKey::new("A", "B")));
        assert!(pairs.contains(&PairKey::new("C", "D")));
    }

    #[test]
    fn test_malformed_pair() {
        let input = "A\tB\nlonely\n";
        let err = read_pair_filter(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
