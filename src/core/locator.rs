// Per-day file lookup below the database root

use crate::core::compression::decompress;
use crate::core::constants::CompressionType;
use crate::core::error::{Result, WindCubeError};
use chrono::NaiveDate;
use std::fmt::Write;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Physical file backing one calendar day of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFile {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub compression: CompressionType,
}

impl DayFile {
    /// Read and decompress the whole file into text.
    pub async fn read_text(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path).await?;
        let raw = decompress(bytes, self.compression)?;

        match String::from_utf8(raw) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("{} is not valid UTF-8, decoding lossily", self.path.display());
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileLocator {
    root: PathBuf,
    pattern: String,
}

impl FileLocator {
    pub fn new<P: AsRef<Path>>(root: P, pattern: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            pattern: pattern.into(),
        }
    }

    /// Directory holding the day files of a catalog path such as `/A/B/C`.
    pub fn directory(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    fn file_name(&self, date: NaiveDate) -> Result<String> {
        let mut name = String::new();
        write!(name, "{}", date.format(&self.pattern))
            .map_err(|_| WindCubeError::Config(format!("invalid file pattern {:?}", self.pattern)))?;
        Ok(name)
    }

    /// Resolve the file for `date`. A missing day is `Ok(None)`.
    pub async fn locate(&self, path: &str, date: NaiveDate) -> Result<Option<DayFile>> {
        let name = self.file_name(date)?;
        let dir = self.directory(path);

        for compression in CompressionType::ALL {
            let candidate = dir.join(format!("{}{}", name, compression.suffix()));

            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => {
                    return Ok(Some(DayFile {
                        date,
                        path: candidate,
                        compression,
                    }));
                }
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        debug!("no day file for {} on {}", path, date);
        Ok(None)
    }

    /// All dates with a day file under `path`, ascending.
    pub async fn list_days(&self, path: &str) -> Result<Vec<NaiveDate>> {
        let base = self.directory(path);
        let mut days = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let entry_path = entry.path();

                if file_type.is_dir() {
                    pending.push(entry_path);
                } else if let Some(date) = self.date_of(&base, &entry_path) {
                    days.push(date);
                }
            }
        }

        days.sort_unstable();
        days.dedup();
        Ok(days)
    }

    fn date_of(&self, base: &Path, file: &Path) -> Option<NaiveDate> {
        let relative = file.strip_prefix(base).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?
            .join("/");
        let (_, stem) = CompressionType::from_file_name(&joined);

        NaiveDate::parse_from_str(stem, &self.pattern).ok()
    }
}
