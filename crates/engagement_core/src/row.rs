use serde_json::Value;

use crate::{derive_variants, QueryOutcome, VariantMode};

/// Position of a row in the filtered input dataset.
pub type RowIndex = usize;

/// One article from the input dataset together with its URL variants.
///
/// Never mutated once built. At least one variant is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    index: RowIndex,
    doi: Option<String>,
    variants: Vec<Option<String>>,
}

impl InputRow {
    /// Returns `None` when every variant is missing.
    pub fn new(index: RowIndex, doi: Option<String>, variants: Vec<Option<String>>) -> Option<Self> {
        if variants.iter().all(Option::is_none) {
            return None;
        }
        Some(Self {
            index,
            doi,
            variants,
        })
    }

    /// Derive variants for `mode` from a source record.
    pub fn from_source(
        index: RowIndex,
        mode: VariantMode,
        url: &str,
        doi: Option<&str>,
    ) -> Option<Self> {
        let doi = doi.map(str::trim).filter(|d| !d.is_empty());
        let variants = derive_variants(mode, url, doi);
        Self::new(index, doi.map(ToOwned::to_owned), variants)
    }

    pub fn index(&self) -> RowIndex {
        self.index
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn variants(&self) -> &[Option<String>] {
        &self.variants
    }

    pub fn variant(&self, column: usize) -> Option<&str> {
        self.variants.get(column).and_then(|v| v.as_deref())
    }
}

/// Serialized result columns for one URL variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantFields {
    pub object: Option<String>,
    pub engagement: Option<String>,
    pub error: Option<String>,
}

impl VariantFields {
    /// Copy whatever the outcome carries; absent or empty parts leave the field as is.
    pub fn record(&mut self, outcome: &QueryOutcome) {
        if let Some(object) = outcome.object.as_ref().filter(|v| has_content(v)) {
            self.object = Some(object.to_string());
        }
        if let Some(engagement) = outcome.engagement.as_ref().filter(|v| has_content(v)) {
            self.engagement = Some(engagement.to_string());
        }
        if let Some(error) = outcome.error.as_ref().filter(|e| !e.is_empty()) {
            self.error = Some(error.clone());
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// An input row plus its result columns, written exactly once to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    input: InputRow,
    fields: Vec<VariantFields>,
    timestamp: Option<String>,
}

impl OutputRow {
    pub fn new(input: InputRow) -> Self {
        let fields = vec![VariantFields::default(); input.variants().len()];
        Self {
            input,
            fields,
            timestamp: None,
        }
    }

    pub fn index(&self) -> RowIndex {
        self.input.index()
    }

    pub fn input(&self) -> &InputRow {
        &self.input
    }

    pub fn fields(&self) -> &[VariantFields] {
        &self.fields
    }

    pub fn field(&self, column: usize) -> Option<&VariantFields> {
        self.fields.get(column)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn record(&mut self, column: usize, outcome: &QueryOutcome) {
        if let Some(fields) = self.fields.get_mut(column) {
            fields.record(outcome);
        }
    }

    pub fn stamp(&mut self, timestamp: &str) {
        self.timestamp = Some(timestamp.to_string());
    }

    /// CSV cells in `output_header` order; missing values become empty cells.
    pub fn to_record(&self) -> Vec<String> {
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();
        let mut cells = Vec::with_capacity(2 + self.fields.len() * 4);
        cells.extend(self.input.variants().iter().map(|v| text(v.as_deref())));
        cells.push(text(self.input.doi()));
        for fields in &self.fields {
            cells.push(text(fields.object.as_deref()));
            cells.push(text(fields.engagement.as_deref()));
            cells.push(text(fields.error.as_deref()));
        }
        cells.push(text(self.timestamp()));
        cells
    }
}

/// Header row: variant columns, `doi`, `og_obj{i}/og_eng{i}/og_err{i}` per variant, `ts`.
pub fn output_header(mode: VariantMode) -> Vec<String> {
    let columns = mode.columns();
    let mut header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    header.push("doi".to_string());
    for i in 1..=columns.len() {
        header.push(format!("og_obj{i}"));
        header.push(format!("og_eng{i}"));
        header.push(format!("og_err{i}"));
    }
    header.push("ts".to_string());
    header
}
