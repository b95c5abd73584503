//! Destinations for fetched logs: the console or a support archive.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::buffer::ErrorBuffer;
use crate::error::LogsError;

pub const ERRORS_ENTRY: &str = "errors";

const ARCHIVE_FILENAME_FORMAT: &str = "support-%Y-%m-%dT%H-%M-%S-%Z.zip";

pub trait LogSink {
    fn write_log(&mut self, name: &str, content: &[u8]) -> Result<()>;
}

/// Prints each log as `<name> log:` followed by its text.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> LogSink for ConsoleSink<W> {
    fn write_log(&mut self, name: &str, content: &[u8]) -> Result<()> {
        writeln!(self.out, "{} log:", name)?;
        self.out.write_all(content)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

pub fn archive_file_name(at: DateTime<Utc>) -> String {
    at.format(ARCHIVE_FILENAME_FORMAT).to_string()
}

/// A zip archive with one entry per log.
pub struct ArchiveSink<W: Write + Seek = File> {
    path: PathBuf,
    file_name: String,
    writer: ZipWriter<W>,
    method: CompressionMethod,
}

impl ArchiveSink {
    pub fn create(dir: &Path, at: DateTime<Utc>) -> Result<Self, LogsError> {
        let file_name = archive_file_name(at);
        let path = dir.join(&file_name);
        let file = File::create(&path).map_err(|source| LogsError::ArchiveCreate {
            path: path.clone(),
            source,
        })?;
        debug!("created archive {}", path.display());

        Ok(Self::new(file, path, file_name, CompressionMethod::Deflated))
    }
}

impl<W: Write + Seek> ArchiveSink<W> {
    fn new(out: W, path: PathBuf, file_name: String, method: CompressionMethod) -> Self {
        Self {
            path,
            file_name,
            writer: ZipWriter::new(out),
            method,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the `errors` entry if anything failed and closes the archive.
    pub fn finish(mut self, errors: &ErrorBuffer) -> Result<PathBuf, LogsError> {
        if !errors.is_empty() {
            self.write_log(ERRORS_ENTRY, errors.as_bytes())
                .map_err(|source| LogsError::ArchiveWrite {
                    path: self.path.clone(),
                    source,
                })?;
        }
        self.writer.finish().map_err(|e| LogsError::ArchiveWrite {
            path: self.path.clone(),
            source: e.into(),
        })?;
        Ok(self.path)
    }
}

impl<W: Write + Seek> LogSink for ArchiveSink<W> {
    fn write_log(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(self.method);
        self.writer.start_file(name, options)?;
        if let Err(e) = self.writer.write_all(content) {
            // A truncated entry must not be listed in the archive. zip already
            // aborts on some errors; a second abort would drop the prior entry.
            if self.writer.is_writing_file() {
                if let Err(abort) = self.writer.abort_file() {
                    debug!("could not drop partial entry {}: {}", name, abort);
                }
            }
            return Err(e.into());
        }
        println!("Wrote {} log to {} archive file.", name, self.file_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::io::{self, Cursor, Read, SeekFrom};
    use std::rc::Rc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn archive_name_is_timestamped() {
        assert_eq!(archive_file_name(at()), "support-2024-03-09T14-05-07-UTC.zip");
    }

    #[test]
    fn console_prints_name_then_log() {
        let mut out = Vec::new();
        let mut sink = ConsoleSink::new(&mut out);
        sink.write_log("trident-controller", b"line one\nline two").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "trident-controller log:\nline one\nline two\n"
        );
    }

    #[test]
    fn archive_holds_logs_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ArchiveSink::create(dir.path(), at()).unwrap();
        assert_eq!(sink.path(), dir.path().join("support-2024-03-09T14-05-07-UTC.zip"));
        sink.write_log("trident-controller", b"controller log").unwrap();

        let mut errors = ErrorBuffer::new();
        errors.append(b"node pod not ready");
        let path = sink.finish(&errors).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut text = String::new();
        archive
            .by_name(ERRORS_ENTRY)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "node pod not ready");
    }

    #[test]
    fn archive_without_errors_has_no_errors_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ArchiveSink::create(dir.path(), at()).unwrap();
        sink.write_log("trident-controller", b"ok").unwrap();
        let path = sink.finish(&ErrorBuffer::new()).unwrap();

        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["trident-controller"]);
    }

    /// In-memory archive file that refuses any write carrying `bad`.
    #[derive(Clone, Default)]
    struct SharedFile {
        data: Rc<RefCell<Cursor<Vec<u8>>>>,
        bad: &'static [u8],
    }

    impl Write for SharedFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.bad.is_empty() && buf.windows(self.bad.len()).any(|w| w == self.bad) {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.data.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for SharedFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.data.borrow_mut().seek(pos)
        }
    }

    #[test]
    fn failed_write_leaves_no_partial_entry() {
        let file = SharedFile {
            bad: b"unwritable",
            ..SharedFile::default()
        };
        let name = "support.zip".to_string();
        let mut sink = ArchiveSink::new(file.clone(), PathBuf::from(&name), name, CompressionMethod::Stored);
        sink.write_log("trident-controller", b"controller log").unwrap();
        let err = sink
            .write_log("trident-node-worker-1", b"node log, unwritable tail")
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        sink.finish(&ErrorBuffer::new()).unwrap();

        let bytes = file.data.borrow().get_ref().clone();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["trident-controller"]);
        let mut text = String::new();
        archive
            .by_name("trident-controller")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "controller log");
    }

    #[test]
    fn missing_directory_fails_creation() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArchiveSink::create(&dir.path().join("missing"), at()).err().unwrap();
        assert!(matches!(err, LogsError::ArchiveCreate { .. }));
        assert_eq!(err.exit_code(), 74);
    }
}
