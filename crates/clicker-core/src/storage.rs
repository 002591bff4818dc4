//! Sequence files on disk - one pretty-printed JSON snapshot per file

use crate::error::{Error, Result};
use crate::format;
use crate::step::Sequences;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct SequenceStorage {
    dir: PathBuf,
}

impl SequenceStorage {
    /// Storage rooted at the current working directory.
    pub fn new() -> Result<Self> {
        Self::with_dir(std::env::current_dir()?)
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Resolve a file name against the storage dir. Absolute paths pass through.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    pub fn load(&self, name: impl AsRef<Path>) -> Result<Sequences> {
        let path = self.resolve(name);
        let file = File::open(&path)?;
        format::read(BufReader::new(file))
    }

    pub fn save(&self, name: impl AsRef<Path>, sequences: &Sequences) -> Result<PathBuf> {
        let mut path = self.resolve(name);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);
        format::write(&mut w, sequences)?;
        w.flush()?;
        Ok(path)
    }

    /// Save under `clicks_<timestamp>.json`.
    pub fn save_timestamped(&self, sequences: &Sequences) -> Result<PathBuf> {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.save(format!("clicks_{}.json", ts), sequences)
    }

    /// Sorted names of the `.json` files in the storage dir.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(s) = name.to_str() {
                if s.ends_with(".json") && entry.path().is_file() {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, name: impl AsRef<Path>) -> Result<()> {
        let path = self.resolve(name);
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}
