use anyhow::{Context, Result};
use bstr::ByteSlice;
use camino::Utf8PathBuf;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// A source that can be either a file or stdin.
#[derive(Default, Clone, Debug)]
pub enum FileOrStdin {
    /// Input from a file.
    File(Utf8PathBuf),
    /// Input from stdin.
    #[default]
    Stdin,
}

impl fmt::Display for FileOrStdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrStdin::File(path) => write!(f, "{}", path),
            FileOrStdin::Stdin => write!(f, "<stdin>"),
        }
    }
}

impl FileOrStdin {
    /// Create a new FileOrStdin from an optional path.
    ///
    /// No path, or "-", means stdin.
    pub fn from_path(path: Option<Utf8PathBuf>) -> Self {
        match path {
            Some(path) if path.as_str() != "-" => FileOrStdin::File(path),
            _ => FileOrStdin::Stdin,
        }
    }

    /// Open the input source as a reader.
    pub fn reader(&self) -> Result<InputReader> {
        match self {
            FileOrStdin::File(path) => {
                let file =
                    File::open(path).with_context(|| format!("failed to open file: {}", path))?;
                Ok(InputReader::File(BufReader::new(file)))
            }
            FileOrStdin::Stdin => Ok(InputReader::Stdin(BufReader::new(io::stdin()))),
        }
    }
}

/// A reader for input from either a file or stdin.
pub enum InputReader {
    /// A reader for a file.
    File(BufReader<File>),
    /// A reader for stdin.
    Stdin(BufReader<io::Stdin>),
    /// An in-memory reader, mostly for tests.
    Bytes(io::Cursor<Vec<u8>>),
}

impl InputReader {
    /// Read from an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        InputReader::Bytes(io::Cursor::new(bytes.into()))
    }

    /// Call `f` with each line, without its terminator and surrounding
    /// whitespace. Lines are read one at a time so output can keep up with
    /// interactive input.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; such a line will not
    /// parse as an address anyway.
    pub fn for_each_line<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            let n = match self {
                InputReader::File(ref mut rdr) => rdr.read_until(b'\n', &mut buf),
                InputReader::Stdin(ref mut rdr) => rdr.read_until(b'\n', &mut buf),
                InputReader::Bytes(ref mut rdr) => rdr.read_until(b'\n', &mut buf),
            };
            let n = n.context("failed to read line")?;
            if n == 0 {
                break;
            }
            let line = buf.trim().to_str_lossy();
            f(&line)?;
        }
        Ok(())
    }
}
