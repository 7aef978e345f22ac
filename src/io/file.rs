use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Open a buffered reader on a path, "stdin" for standard input. Files with
/// a `.gz` extension are decompressed transparently.
///
/// # Example
/// ```no_run
/// use std::io::Read;
/// let mut reader = phylotk::io::file::reader("tree.nwk.gz").unwrap();
/// let mut text = String::new();
/// reader.read_to_string(&mut text).unwrap();
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

/// Open a buffered writer on a path, "stdout" for standard output.
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
    fn test_reader_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.nwk");
        std::fs::write(&path, "(A,B)C;").unwrap();

        let mut text = String::new();
        reader(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "(A,B)C;");
    }

    #[test]
    fn test_reader_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.nwk.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        enc.write_all(b"(A,B)C;").unwrap();
        enc.finish().unwrap();

        let mut text = String::new();
        reader(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "(A,B)C;");
    }

    #[test]
    fn test_reader_missing() {
        assert!(reader("no/such/file.nwk").is_err());
    }

    #[test]
    fn test_writer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nwk");
        {
            let mut out = writer(path.to_str().unwrap()).unwrap();
            out.write_all(b"(A,B)C;").unwrap();
        }

        let mut text = String::new();
        reader(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "(A,B)C;");
    }
}
