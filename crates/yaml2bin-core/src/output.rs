/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output destinations that only become visible on commit.
//!
//! A regular file is written to a temporary file next to it and persisted
//! over it by [`OutputFile::commit`]. A symlink is followed, so the file it
//! points at is the one replaced. Devices, FIFOs and standard output are
//! buffered in memory and written through in one go on commit. Dropping an
//! [`OutputFile`] without committing discards everything written so far: the
//! temporary file is removed and an existing destination is left as it was.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Where the artifact goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` selects standard output; anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "-"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An open destination. Commit publishes the content; drop or
/// [`discard`](OutputFile::discard) throws it away.
#[derive(Debug)]
pub struct OutputFile {
    destination: Destination,
    written: u64,
}

#[derive(Debug)]
enum Destination {
    Stdout(Vec<u8>),
    /// A regular file, replaced by renaming a temporary file over it.
    Replace {
        path: PathBuf,
        writer: BufWriter<NamedTempFile>,
    },
    /// Opened and written directly on commit. Used for devices and FIFOs,
    /// and for an existing file whose directory does not allow new entries.
    InPlace {
        path: PathBuf,
        buffer: Vec<u8>,
        truncate: bool,
    },
}

impl OutputFile {
    /// Open `target` for writing. Fails if the destination cannot be written.
    pub fn create(target: &OutputTarget) -> Result<Self> {
        let destination = match target {
            OutputTarget::Stdout => Destination::Stdout(Vec::new()),
            OutputTarget::File(path) => {
                let destination =
                    open_destination(path).map_err(|e| Error::output("open", target.to_string(), e))?;
                tracing::debug!(requested = %path.display(), ?destination, "Opened output");
                destination
            }
        };
        Ok(Self {
            destination,
            written: 0,
        })
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Make the written bytes the visible result at the destination.
    pub fn commit(self) -> Result<()> {
        match self.destination {
            Destination::Stdout(buffer) => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(&buffer)
                    .and_then(|()| stdout.flush())
                    .map_err(|e| Error::output("write", "-", e))?;
            }
            Destination::Replace { path, writer } => {
                let name = path.display().to_string();
                let temp = writer
                    .into_inner()
                    .map_err(|e| Error::output("write", name.clone(), e.into_error()))?;
                temp.as_file()
                    .sync_all()
                    .map_err(|e| Error::output("write", name.clone(), e))?;
                keep_existing_permissions(&temp, &path)
                    .map_err(|e| Error::output("write", name.clone(), e))?;
                temp.persist(&path)
                    .map_err(|e| Error::output("write", name, e.error))?;
                tracing::debug!(destination = %path.display(), bytes = self.written, "Committed output");
            }
            Destination::InPlace {
                path,
                buffer,
                truncate,
            } => {
                OpenOptions::new()
                    .write(true)
                    .truncate(truncate)
                    .open(&path)
                    .and_then(|mut file| file.write_all(&buffer).and_then(|()| file.flush()))
                    .map_err(|e| Error::output("write", path.display().to_string(), e))?;
                tracing::debug!(destination = %path.display(), bytes = self.written, "Wrote output in place");
            }
        }
        Ok(())
    }

    /// Drop everything written without touching the destination.
    pub fn discard(self) {
        tracing::debug!(bytes = self.written, "Discarded output");
        drop(self);
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match &mut self.destination {
            Destination::Stdout(buffer) | Destination::InPlace { buffer, .. } => buffer.write(buf)?,
            Destination::Replace { writer, .. } => writer.write(buf)?,
        };
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.destination {
            Destination::Stdout(_) | Destination::InPlace { .. } => Ok(()),
            Destination::Replace { writer, .. } => writer.flush(),
        }
    }
}

fn open_destination(path: &Path) -> io::Result<Destination> {
    let path = follow_symlink(path)?;
    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let writer = BufWriter::new(create_temp_beside(&path)?);
            return Ok(Destination::Replace { path, writer });
        }
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        return Err(io::Error::from(io::ErrorKind::IsADirectory));
    }
    // Opening a FIFO here would block until a reader shows up.
    if !metadata.is_file() {
        return Ok(Destination::InPlace {
            path,
            buffer: Vec::new(),
            truncate: false,
        });
    }

    // Fails on a read-only destination; does not truncate.
    OpenOptions::new().write(true).open(&path)?;
    match create_temp_beside(&path) {
        Ok(temp) => Ok(Destination::Replace {
            path,
            writer: BufWriter::new(temp),
        }),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(Destination::InPlace {
            path,
            buffer: Vec::new(),
            truncate: true,
        }),
        Err(e) => Err(e),
    }
}

/// The file a symlink points at, or `path` itself. A dangling link yields
/// the path it would create.
fn follow_symlink(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(target) => Ok(target),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let link = fs::read_link(path)?;
                Ok(match path.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                })
            }
            Err(e) => Err(e),
        },
        Ok(_) => Ok(path.to_path_buf()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(e),
    }
}

/// New files get `0666` less the umask, like any file the user creates.
fn create_temp_beside(path: &Path) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".yaml2bin-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn keep_existing_permissions(temp: &NamedTempFile, path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(existing) => temp.as_file().set_permissions(existing.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
