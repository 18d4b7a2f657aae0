use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::libs::table::{DEFAULT_IDENTITY_COL, REQUIRED_COLS};

const WIN: u64 = 5000;

/// Small synthetic identity tables with known answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toy {
    /// A/B: high identity over windows 1..6 with a 0.9997 dip at window 4;
    /// A/C: low identity throughout
    Toy1,
    /// Alternating low identities, nothing to call
    Toy2,
    /// Windows 15000-25000 absent from the table
    Toy3,
}

impl Toy {
    pub const ALL: [Toy; 3] = [Toy::Toy1, Toy::Toy2, Toy::Toy3];

    pub fn file_name(&self) -> String {
        format!("{}.pairwise.tsv", self)
    }

    /// `(chr, start, end, a, b, identity)` of each row
    pub fn rows(&self) -> Vec<(&'static str, u64, u64, &'static str, &'static str, f64)> {
        match self {
            Toy::Toy1 => {
                let ab = (0..10u64).map(|i| {
                    let ident = match i {
                        4 => 0.9997,
                        1..=6 => 0.9998,
                        _ => 0.9950,
                    };
                    ("chr1", i * WIN, (i + 1) * WIN, "A", "B", ident)
                });
                let ac = (0..7u64).map(|i| ("chr1", i * WIN, (i + 1) * WIN, "A", "C", 0.9950));
                ab.chain(ac).collect()
            }
            Toy::Toy2 => [
                0.9970, 0.9990, 0.9960, 0.9970, 0.9960, 0.9970, 0.9960, 0.9970, 0.9960, 0.9970,
            ]
            .into_iter()
            .zip(0u64..)
            .map(|(ident, i)| ("chr1", i * WIN, (i + 1) * WIN, "A", "B", ident))
            .collect(),
            Toy::Toy3 => [
                (0, 0.9950),
                (5000, 0.9997),
                (10000, 0.9998),
                (25000, 0.9998),
                (30000, 0.9998),
                (35000, 0.9950),
            ]
            .into_iter()
            .map(|(start, ident)| ("chr1", start, start + WIN, "A", "B", ident))
            .collect(),
        }
    }

    /// Writes the table, header included.
    pub fn write<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        let mut header = REQUIRED_COLS.to_vec();
        header.push(DEFAULT_IDENTITY_COL);
        wtr.write_record(&header)?;

        for (chr, start, end, a, b, ident) in self.rows() {
            wtr.write_record(&[
                format!("CHM13#0#{}:{}-{}", chr, start, end),
                chr.to_string(),
                start.to_string(),
                end.to_string(),
                (end - start).to_string(),
                a.to_string(),
                b.to_string(),
                format!("{:.4}", ident),
            ])?;
        }
        wtr.flush()?;

        Ok(())
    }
}

impl fmt::Display for Toy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toy::Toy1 => write!(f, "toy1"),
            Toy::Toy2 => write!(f, "toy2"),
            Toy::Toy3 => write!(f, "toy3"),
        }
    }
}

impl FromStr for Toy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toy1" => Ok(Toy::Toy1),
            "toy2" => Ok(Toy::Toy2),
            "toy3" => Ok(Toy::Toy3),
            _ => Err(format!("unknown toy: {}", s)),
        }
    }
}
