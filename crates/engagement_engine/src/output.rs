use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engagement_core::{output_header, OutputRow, VariantMode};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to create output {path}: {source}")]
    Create { path: String, source: io::Error },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// `dir/name.csv` becomes `dir/name_fb.csv`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let is_csv = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let base = if is_csv {
        input.file_stem()
    } else {
        input.file_name()
    };
    let base = base.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    input.with_file_name(format!("{base}_fb.csv"))
}

/// Append-only CSV sink; every append is flushed before returning.
pub struct ResultWriter<W: Write> {
    inner: csv::Writer<W>,
    rows_written: usize,
}

impl ResultWriter<File> {
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: csv::WriterBuilder::new().has_headers(false).from_writer(writer),
            rows_written: 0,
        }
    }

    pub fn write_header(&mut self, mode: VariantMode) -> Result<(), OutputError> {
        self.inner.write_record(output_header(mode))?;
        self.inner.flush()?;
        Ok(())
    }

    pub fn append(&mut self, rows: &[OutputRow]) -> Result<(), OutputError> {
        for row in rows {
            self.inner.write_record(row.to_record())?;
        }
        self.inner.flush()?;
        self.rows_written += rows.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W, OutputError> {
        self.inner
            .into_inner()
            .map_err(|err| OutputError::Io(err.into_error()))
    }
}
