use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub listing: ListingConfig,
    #[serde(default)]
    pub detail: Option<DetailConfig>,
    #[serde(default)]
    pub sub_resource: Option<SubResourceConfig>,
    #[serde(default)]
    pub assets: Option<AssetsConfig>,
    pub output: OutputConfig,
}

/// Paginated listing source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Listing URL; the page parameter is set on top of its query.
    /// May be left out of the file when `--src` supplies it.
    #[serde(default)]
    pub url: String,

    /// Query parameter carrying the page number
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Number of entries on a full listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// What a 404 on page 1 means
    #[serde(default)]
    pub first_page_not_found: FirstPageNotFound,
}

/// Policy for a listing whose very first page is missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstPageNotFound {
    /// Treat the source as having zero entries
    #[default]
    Empty,
    /// Treat the source as misconfigured and abort
    Fatal,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Workers per pool stage; 0 means one per available processing unit
    #[serde(default)]
    pub concurrency: usize,
}

impl PipelineConfig {
    /// The effective number of workers per stage
    pub fn workers(&self) -> usize {
        if self.concurrency > 0 {
            return self.concurrency;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Selector rules for listing pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Selector matching one listing entry
    pub item: String,

    /// Where the identity link lives inside an entry
    pub link: AttrRule,

    /// Display name selector, when the listing shows names
    #[serde(default)]
    pub name: Option<String>,

    /// Where the asset URL lives inside an entry
    #[serde(default)]
    pub asset: Option<AttrRule>,

    #[serde(default)]
    pub fields: Vec<FieldRule>,
}

/// An attribute read from an element inside a listing entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttrRule {
    /// Element selector relative to the entry; absent means the entry itself
    #[serde(default)]
    pub selector: Option<String>,

    #[serde(default = "default_link_attr")]
    pub attr: String,
}

/// A directly extracted listing field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRule {
    pub name: String,

    /// Text of every match, concatenated and trimmed
    #[serde(default)]
    pub text: Option<String>,

    /// Weighted sum of match counts
    #[serde(default)]
    pub score: Option<Vec<ScoreTerm>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScoreTerm {
    pub selector: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Selector rules for detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetailConfig {
    pub name: String,

    #[serde(default)]
    pub references: Vec<ReferenceRule>,
}

/// A named list of sub-resource links on a detail page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReferenceRule {
    pub name: String,
    pub selector: String,
    #[serde(default = "default_link_attr")]
    pub attr: String,
}

/// Selector rules for sub-resource pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubResourceConfig {
    pub name: String,
}

/// Asset download configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetsConfig {
    /// Directory the downloaded files are written to
    pub dir: String,

    /// Prefix of the local reference written into each record
    pub path_prefix: String,

    /// File name used when the asset is missing upstream
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON data file
    pub data_path: String,
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_user_agent() -> String {
    format!("catalog-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_weight() -> f64 {
    1.0
}

fn default_placeholder() -> String {
    "not_found.png".to_string()
}
