use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens `input` for buffered reading.
///
/// `stdin` reads from standard input, and files ending in `.gz` are
/// decompressed on the fly.
///
/// ```
/// use std::io::BufRead;
/// let reader = ibdnet::reader("tests/ibd/toy1.pairwise.tsv").unwrap();
/// assert_eq!(reader.lines().count(), 18);
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_gz_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tsv.gz");

        let file = std::fs::File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        gz.write_all(b"a\tb\n1\t2\n").unwrap();
        gz.finish().unwrap();

        let mut s = String::new();
        reader(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, "a\tb\n1\t2\n");
    }

    #[test]
    fn test_missing_file() {
        let err = reader("tests/ibd/no_such_file.tsv").err().unwrap();
        assert!(err.to_string().contains("could not open"));
    }
}
