use std::io::Read;

use crate::libs::error::IbdError;

pub const DEFAULT_IDENTITY_COL: &str = "estimated.identity";

/// Columns every identity table carries, besides the identity column itself
pub const REQUIRED_COLS: [&str; 7] = [
    "REGION", "CHR", "START", "END", "LENGTH", "group.a", "group.b",
];

/// One window observation for one pair of haplotypes.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub region: String,
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub length: u64,
    pub a: String,
    pub b: String,
    pub identity: f64,
}

/// What to do with a row whose fields fail to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Drop the row and keep going
    #[default]
    Lenient,
    /// Abort on the first malformed row
    Strict,
}

/// Field positions, resolved once against the header.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    region: usize,
    chr: usize,
    start: usize,
    end: usize,
    length: usize,
    a: usize,
    b: usize,
    identity: usize,
}

impl ColumnMap {
    pub fn resolve(
        headers: &csv::StringRecord,
        identity_col: &str,
        source_name: &str,
    ) -> Result<Self, IbdError> {
        let required: Vec<&str> = REQUIRED_COLS
            .iter()
            .copied()
            .chain(std::iter::once(identity_col))
            .collect();

        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = required
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            let mut required: Vec<String> = required.iter().map(|s| s.to_string()).collect();
            required.sort();
            return Err(IbdError::MissingColumns {
                source_name: source_name.to_string(),
                missing,
                required,
            });
        }

        // All present, checked above
        let idx = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            region: idx("REGION"),
            chr: idx("CHR"),
            start: idx("START"),
            end: idx("END"),
            length: idx("LENGTH"),
            a: idx("group.a"),
            b: idx("group.b"),
            identity: idx(identity_col),
        })
    }

    /// Converts one record into a `Row`, or explains why it can't.
    pub fn parse(&self, record: &csv::StringRecord) -> Result<Row, String> {
        // labels are taken verbatim, numbers may carry surrounding blanks
        let field = |i: usize, name: &str| -> Result<&str, String> {
            record
                .get(i)
                .ok_or_else(|| format!("missing field {}", name))
        };
        let int = |i: usize, name: &str| -> Result<u64, String> {
            let s = field(i, name)?.trim();
            s.parse::<u64>()
                .map_err(|_| format!("{} is not an integer: {:?}", name, s))
        };

        // NaN parses and stays as a present window that never qualifies
        let identity_str = field(self.identity, "identity")?.trim();
        let identity = identity_str
            .parse::<f64>()
            .map_err(|_| format!("identity is not a number: {:?}", identity_str))?;

        Ok(Row {
            region: field(self.region, "REGION")?.to_string(),
            chr: field(self.chr, "CHR")?.to_string(),
            start: int(self.start, "START")?,
            end: int(self.end, "END")?,
            length: int(self.length, "LENGTH")?,
            a: field(self.a, "group.a")?.to_string(),
            b: field(self.b, "group.b")?.to_string(),
            identity,
        })
    }
}

/// Reads a tab-separated identity table.
///
/// The header must contain `REGION, CHR, START, END, LENGTH, group.a, group.b`
/// and `identity_col`; extra columns are ignored. Rows that fail type
/// conversion are dropped under `RowPolicy::Lenient`.
pub fn read_rows<R: Read>(
    input: R,
    source_name: &str,
    identity_col: &str,
    policy: RowPolicy,
) -> anyhow::Result<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::resolve(&headers, identity_col, source_name)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let parsed = match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                columns.parse(&record).map_err(|reason| (line, reason))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                Err((line, e.to_string()))
            }
        };

        match parsed {
            Ok(row) => rows.push(row),
            Err((line, reason)) => {
                if policy == RowPolicy::Strict {
                    return Err(IbdError::MalformedRow { line, reason }.into());
                }
                log::debug!("{}: skip line {}: {}", source_name, line, reason);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("{}: skipped {} malformed rows", source_name, skipped);
    }
    log::info!("{}: {} rows", source_name, rows.len());

    Ok(rows)
}

/// Opens and reads `infile`, failing when no row survives parsing.
pub fn read_table(infile: &str, identity_col: &str, policy: RowPolicy) -> anyhow::Result<Vec<Row>> {
    let reader = crate::reader(infile)?;
    let rows = read_rows(reader, infile, identity_col, policy)?;
    if rows.is_empty() {
        return Err(IbdError::NoValidRows(infile.to_string()).into());
    }
    Ok(rows)
}
