use url::Url;

const FULL_COLUMNS: &[&str] = &["url1", "url2", "url3", "url4"];
const DOI_ONLY_COLUMNS: &[&str] = &["url1", "url2"];

/// Which URL variants are queried for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantMode {
    /// Original URL, its http/https twin and both DOI resolver forms.
    #[default]
    Full,
    /// Only the two DOI resolver forms.
    DoiOnly,
}

impl VariantMode {
    /// Variant column names in query order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            VariantMode::Full => FULL_COLUMNS,
            VariantMode::DoiOnly => DOI_ONLY_COLUMNS,
        }
    }

    pub fn len(self) -> usize {
        self.columns().len()
    }
}

/// Build the variant values for one input record, in `mode.columns()` order.
///
/// A variant that cannot be derived (no DOI, non-http URL) is `None`.
pub fn derive_variants(mode: VariantMode, url: &str, doi: Option<&str>) -> Vec<Option<String>> {
    let url = url.trim();
    let doi = doi.map(str::trim).filter(|d| !d.is_empty());
    let resolvers = |doi: Option<&str>| {
        [
            doi.map(|d| format!("https://doi.org/{d}")),
            doi.map(|d| format!("http://dx.doi.org/{d}")),
        ]
    };

    match mode {
        VariantMode::Full => {
            let original = (!url.is_empty()).then(|| url.to_string());
            let [doi_org, dx_doi] = resolvers(doi);
            vec![original, flip_scheme(url), doi_org, dx_doi]
        }
        VariantMode::DoiOnly => resolvers(doi).into_iter().collect(),
    }
}

/// True when `raw` parses as an absolute http or https URL.
pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

// Engagement is tracked per exact string, so only the scheme is touched.
fn flip_scheme(url: &str) -> Option<String> {
    if let Some(rest) = strip_prefix_ignore_case(url, "https://") {
        Some(format!("http://{rest}"))
    } else {
        strip_prefix_ignore_case(url, "http://").map(|rest| format!("https://{rest}"))
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value
        .get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &value[prefix.len()..])
}
