//! CSV output for summary rows.
//!
//! Rows are `Serialize` structs; the header comes from the field names.
//! Fields containing a comma, quote or newline are quoted with inner
//! quotes doubled.
//!
//! RULE: writing is two-phase. `write_rows` only stages `<name>.tmp`
//! beside the final path. `commit` renames every staged file into place
//! once all of them are written. Staged files that are never committed
//! are removed, so a failed run leaves the previous outputs as they were.

use crate::error::AggResult;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

struct Staged {
    tmp: PathBuf,
    target: PathBuf,
}

pub struct SummaryWriter {
    out_dir: PathBuf,
    staged: Vec<Staged>,
}

impl SummaryWriter {
    /// Target `out_dir`, creating it if needed.
    pub fn new(out_dir: impl AsRef<Path>) -> AggResult<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            staged: Vec::new(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }

    /// Number of files written but not yet committed.
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Stage `rows` as the next content of `file_name`. An empty slice
    /// yields an empty file with no header. Nothing is visible under the
    /// final name until `commit`.
    pub fn write_rows<T: Serialize>(&mut self, file_name: &str, rows: &[T]) -> AggResult<PathBuf> {
        let target = self.path_for(file_name);
        let tmp = self.path_for(&format!("{file_name}.tmp"));

        let written: AggResult<()> = fs::File::create(&tmp)
            .map_err(Into::into)
            .and_then(|file| write_csv(file, rows));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        log::debug!("staged {} rows for {}", rows.len(), target.display());
        self.staged.push(Staged {
            tmp,
            target: target.clone(),
        });
        Ok(target)
    }

    /// Move every staged file into place. Targets are checked before the
    /// first rename; any failure discards what is still staged.
    pub fn commit(&mut self) -> AggResult<()> {
        if let Err(e) = self.check_targets() {
            self.discard();
            return Err(e);
        }
        while !self.staged.is_empty() {
            let staged = self.staged.remove(0);
            if let Err(e) = fs::rename(&staged.tmp, &staged.target) {
                let _ = fs::remove_file(&staged.tmp);
                self.discard();
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Remove every staged file without touching the existing outputs.
    pub fn discard(&mut self) {
        for staged in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&staged.tmp) {
                log::warn!("could not remove {}: {e}", staged.tmp.display());
            }
        }
    }

    fn check_targets(&self) -> AggResult<()> {
        for staged in &self.staged {
            if let Ok(meta) = fs::symlink_metadata(&staged.target) {
                if meta.is_dir() {
                    return Err(io::Error::other(format!(
                        "{} is a directory",
                        staged.target.display()
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

impl Drop for SummaryWriter {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Serialize `rows` as CSV into `sink`.
pub fn write_csv<W: Write, T: Serialize>(sink: W, rows: &[T]) -> AggResult<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize `rows` to an in-memory CSV string.
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> AggResult<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
