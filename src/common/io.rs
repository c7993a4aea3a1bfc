//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Whether `path` names a gzip-compressed file.
fn is_gz(path: &Path) -> bool {
    path.extension().map(|s| s.to_str()) == Some(Some("gz"))
}

/// Attach the path and mode to an error from opening a file.
fn open_error(path: &Path, mode: &str, e: std::io::Error) -> anyhow::Error {
    anyhow::Error::new(e).context(format!("could not open {:?} for {}", path, mode))
}

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| open_error(path, "reading", e))?;
    if is_gz(path) {
        tracing::trace!("Opening {:?} as gzip for reading", path);
        let decoder = MultiGzDecoder::new(BufReader::new(file));
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path);
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Transparently open a file with gzip encoder.
///
/// Output is buffered in both cases.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| open_error(path, "writing", e))?;
    if is_gz(path) {
        tracing::trace!("Opening {:?} as gzip for writing", path);
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path);
        Ok(Box::new(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("test.txt")]
    #[case("test.txt.gz")]
    fn write_then_read_maybe_gz(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();

        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join(filename))?;
            f.write_all(b"chr1\t0\t2300000\tp36.33\tgneg\n")?;
            f.flush()?;
        }

        let mut buf = String::new();
        super::open_read_maybe_gz(tmp_dir.join(filename))?.read_to_string(&mut buf)?;
        assert_eq!("chr1\t0\t2300000\tp36.33\tgneg\n", buf);

        Ok(())
    }

    #[test]
    fn gzip_output_is_compressed() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join("out.tsv.gz"))?;
            f.write_all(b"x")?;
        }
        let raw = std::fs::read(tmp_dir.join("out.tsv.gz"))?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        Ok(())
    }

    #[test]
    fn open_errors_name_the_path() {
        let err = match super::open_read_maybe_gz("tests/does/not/exist.tsv.gz") {
            Ok(_) => panic!("opening a missing file must fail"),
            Err(err) => err,
        };
        assert_eq!(
            "could not open \"tests/does/not/exist.tsv.gz\" for reading",
            err.to_string()
        );
        assert_eq!(
            Some(std::io::ErrorKind::NotFound),
            err.root_cause()
                .downcast_ref::<std::io::Error>()
                .map(|e| e.kind())
        );

        let err = match super::open_write_maybe_gz("tests/does/not/out.tsv") {
            Ok(_) => panic!("creating a file in a missing directory must fail"),
            Err(err) => err,
        };
        assert!(err.to_string().ends_with("for writing"), "{}", err);
    }
}
