use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::IdMergeError;

/// Opens an identifier input for buffered line reading. Paths ending in `.gz`
/// are decompressed on the fly.
pub fn open_input(path: &Utf8Path) -> Result<Box<dyn BufRead>, IdMergeError> {
    let file = File::open(path.as_std_path())
        .map_err(|err| IdMergeError::Filesystem(format!("open {path}: {err}")))?;
    if path.extension() == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Output file that only appears at its destination once [`commit`] is
/// called. Dropping it without committing removes the temporary file.
///
/// [`commit`]: AtomicFile::commit
pub struct AtomicFile {
    dest: Utf8PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create(dest: &Utf8Path) -> Result<Self, IdMergeError> {
        let parent = match dest.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| IdMergeError::Filesystem(format!("create {parent}: {err}")))?;
        let temp = tempfile::Builder::new()
            .prefix(".kira-idm")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| IdMergeError::Filesystem(err.to_string()))?;
        Ok(Self {
            dest: dest.to_owned(),
            writer: BufWriter::new(temp),
        })
    }

    pub fn dest(&self) -> &Utf8Path {
        &self.dest
    }

    pub fn commit(self) -> Result<Utf8PathBuf, IdMergeError> {
        let (dest, temp) = self.finish()?;
        persist(&dest, temp)?;
        Ok(dest)
    }

    /// Commits several outputs as a unit. Every file is flushed before any is
    /// persisted, and if a later file fails to persist the ones already moved
    /// into place are removed again.
    pub fn commit_all(files: Vec<AtomicFile>) -> Result<Vec<Utf8PathBuf>, IdMergeError> {
        let staged = files
            .into_iter()
            .map(AtomicFile::finish)
            .collect::<Result<Vec<_>, _>>()?;

        let mut committed: Vec<Utf8PathBuf> = Vec::with_capacity(staged.len());
        for (dest, temp) in staged {
            if let Err(err) = persist(&dest, temp) {
                for path in &committed {
                    if let Err(cleanup) = fs::remove_file(path.as_std_path()) {
                        warn!(path = %path, error = %cleanup, "failed to remove partial output");
                    }
                }
                return Err(err);
            }
            committed.push(dest);
        }
        Ok(committed)
    }

    fn finish(self) -> Result<(Utf8PathBuf, NamedTempFile), IdMergeError> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| IdMergeError::Filesystem(err.error().to_string()))?;
        Ok((self.dest, temp))
    }
}

fn persist(dest: &Utf8Path, temp: NamedTempFile) -> Result<(), IdMergeError> {
    temp.persist(dest.as_std_path())
        .map_err(|err| IdMergeError::Filesystem(format!("persist {dest}: {}", err.error)))?;
    Ok(())
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn uncommitted_output_leaves_no_file() {
        let temp = tempfile::tempdir().unwrap();
        let dest = utf8(temp.path().join("out.tsv"));
        {
            let mut file = AtomicFile::create(&dest).unwrap();
            writeln!(file, "1\thappy\tGene Name").unwrap();
        }
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn commit_replaces_destination() {
        let temp = tempfile::tempdir().unwrap();
        let dest = utf8(temp.path().join("out.tsv"));
        fs::write(&dest, "stale\n").unwrap();

        let mut file = AtomicFile::create(&dest).unwrap();
        writeln!(file, "1\thappy\tGene Name").unwrap();
        file.commit().unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "1\thappy\tGene Name\n");
    }

    #[test]
    fn failed_group_commit_removes_earlier_outputs() {
        let temp = tempfile::tempdir().unwrap();
        let first = utf8(temp.path().join("symbols.tsv"));
        let blocked = utf8(temp.path().join("descriptions.tsv"));
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "occupied\n").unwrap();

        let mut symbols = AtomicFile::create(&first).unwrap();
        writeln!(symbols, "1\thappy\tGene Name").unwrap();
        let mut descriptions = AtomicFile::create(&blocked).unwrap();
        writeln!(descriptions, "1\ta happy gene").unwrap();

        assert!(AtomicFile::commit_all(vec![symbols, descriptions]).is_err());
        assert!(!first.exists());
        assert!(blocked.is_dir());
    }

    #[test]
    fn gzip_inputs_are_decompressed() {
        let temp = tempfile::tempdir().unwrap();
        let path = utf8(temp.path().join("ids.tsv.gz"));
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"1\thappy\tGene Name\n").unwrap();
        encoder.finish().unwrap();

        let mut content = String::new();
        open_input(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "1\thappy\tGene Name\n");
    }
}
