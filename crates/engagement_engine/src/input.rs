use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use engagement_core::{is_http_url, InputRow, VariantMode};
use engine_logging::{engine_info, engine_warn};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to open input {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("input is missing required column `{0}`")]
    MissingColumn(&'static str),
}

pub fn load_input_rows(path: &Path, mode: VariantMode) -> Result<Vec<InputRow>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_input_rows(file, mode)
}

/// Read a CSV with `url` and `doi` columns.
///
/// Records with an empty `url` are dropped; the rest are indexed by their
/// position among the kept records.
pub fn read_input_rows<R: Read>(reader: R, mode: VariantMode) -> Result<Vec<InputRow>, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(InputError::MissingColumn(name))
    };
    let url_col = column("url")?;
    let doi_col = column("doi")?;

    let mut rows = Vec::new();
    let mut kept = 0usize;
    let mut non_http = 0usize;
    let mut unusable = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let url = record.get(url_col).map(str::trim).unwrap_or_default();
        if url.is_empty() {
            continue;
        }
        let index = kept;
        kept += 1;
        if !is_http_url(url) {
            non_http += 1;
        }

        let doi = record.get(doi_col);
        match InputRow::from_source(index, mode, url, doi) {
            Some(row) => rows.push(row),
            None => {
                unusable += 1;
                engine_warn!("Row {} has no queryable URL variant, skipping", index);
            }
        }
    }

    engine_info!("All URLs are http or https: {}", non_http == 0);
    if non_http > 0 {
        engine_warn!("{} of {} URLs are not http(s)", non_http, kept);
    }
    engine_info!(
        "Loaded {} input rows ({} without usable variants)",
        rows.len(),
        unusable
    );
    Ok(rows)
}
