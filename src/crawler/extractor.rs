//! HTML extraction for listing, detail, and sub-resource pages
//!
//! Selector rules are compiled once from config. The extraction functions are
//! synchronous and pure: the parsed document never lives across an await, so
//! workers can call them between fetches.

use crate::config::{AttrRule, DetailConfig, FieldRule, ListingConfig, SubResourceConfig};
use crate::record::{FieldValue, Stub};
use crate::{ConfigError, HarvestError};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// An attribute lookup inside a listing entry
#[derive(Debug, Clone)]
struct AttrSelector {
    selector: Option<Selector>,
    attr: String,
}

impl AttrSelector {
    fn compile(rule: &AttrRule) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: rule.selector.as_deref().map(compile).transpose()?,
            attr: rule.attr.clone(),
        })
    }

    /// First matching attribute value, relative to `item`
    fn read<'a>(&self, item: ElementRef<'a>) -> Option<&'a str> {
        match &self.selector {
            None => item.value().attr(&self.attr),
            Some(selector) => item
                .select(selector)
                .find_map(|element| element.value().attr(&self.attr)),
        }
    }
}

#[derive(Debug, Clone)]
enum FieldExtractor {
    Text(Selector),
    Score(Vec<(Selector, f64)>),
}

/// Compiled listing-page rules
#[derive(Debug, Clone)]
pub struct ListingRules {
    item: Selector,
    link: AttrSelector,
    name: Option<Selector>,
    asset: Option<AttrSelector>,
    fields: Vec<(String, FieldExtractor)>,
}

impl ListingRules {
    pub fn compile(config: &ListingConfig) -> Result<Self, ConfigError> {
        let fields = config
            .fields
            .iter()
            .map(compile_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            item: compile(&config.item)?,
            link: AttrSelector::compile(&config.link)?,
            name: config.name.as_deref().map(compile).transpose()?,
            asset: config.asset.as_ref().map(AttrSelector::compile).transpose()?,
            fields,
        })
    }
}

fn compile_field(rule: &FieldRule) -> Result<(String, FieldExtractor), ConfigError> {
    let extractor = match (&rule.text, &rule.score) {
        (Some(text), None) => FieldExtractor::Text(compile(text)?),
        (None, Some(terms)) => FieldExtractor::Score(
            terms
                .iter()
                .map(|term| Ok((compile(&term.selector)?, term.weight)))
                .collect::<Result<Vec<_>, ConfigError>>()?,
        ),
        _ => {
            return Err(ConfigError::Validation(format!(
                "Field '{}' must set exactly one of 'text' or 'score'",
                rule.name
            )))
        }
    };
    Ok((rule.name.clone(), extractor))
}

/// Compiled detail-page rules
#[derive(Debug, Clone)]
pub struct DetailRules {
    name: Selector,
    references: Vec<(String, Selector, String)>,
}

impl DetailRules {
    pub fn compile(config: &DetailConfig) -> Result<Self, ConfigError> {
        let references = config
            .references
            .iter()
            .map(|r| Ok((r.name.clone(), compile(&r.selector)?, r.attr.clone())))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            name: compile(&config.name)?,
            references,
        })
    }

    /// Names of the reference lists this page type yields
    pub fn reference_names(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|(name, _, _)| name.as_str())
    }
}

/// Compiled sub-resource page rules
#[derive(Debug, Clone)]
pub struct SubResourceRules {
    name: Selector,
}

impl SubResourceRules {
    pub fn compile(config: &SubResourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: compile(&config.name)?,
        })
    }
}

/// Field updates parsed from one detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    pub name: String,
    pub references: BTreeMap<String, Vec<String>>,
}

/// Returns the origin of `url`: scheme, host, and port with an empty path
///
/// Relative links on every page are resolved against this base.
pub fn base_origin(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Decodes a fetched body as HTML text
fn decode(body: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(body)
}

/// Concatenated, trimmed text of every match
fn select_text(root: ElementRef<'_>, selector: &Selector) -> String {
    root.select(selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Extracts listing stubs in document order
///
/// Entries without the identity attribute, or whose link does not resolve,
/// are skipped.
pub fn extract_stubs(rules: &ListingRules, body: &[u8], base: &Url) -> Vec<Stub> {
    let html = decode(body);
    let document = Html::parse_document(&html);

    let mut stubs = Vec::new();
    for item in document.select(&rules.item) {
        let Some(link) = rules.link.read(item).and_then(|href| resolve(base, href)) else {
            continue;
        };

        let mut stub = Stub::new(link);
        stub.name = rules.name.as_ref().map(|s| select_text(item, s));
        stub.asset = rules
            .asset
            .as_ref()
            .and_then(|asset| asset.read(item))
            .and_then(|href| resolve(base, href));

        for (name, extractor) in &rules.fields {
            let value = match extractor {
                FieldExtractor::Text(selector) => FieldValue::Text(select_text(item, selector)),
                FieldExtractor::Score(terms) => FieldValue::Number(
                    terms
                        .iter()
                        .map(|(selector, weight)| item.select(selector).count() as f64 * weight)
                        .sum(),
                ),
            };
            stub.fields.insert(name.clone(), value);
        }

        stubs.push(stub);
    }

    stubs
}

/// Parses a detail page into a display name and reference lists
///
/// Matches without the attribute are skipped; an attribute that cannot be
/// resolved to a URL fails the page.
pub fn parse_detail(
    rules: &DetailRules,
    body: &[u8],
    base: &Url,
    page_url: &str,
) -> Result<DetailPage, HarvestError> {
    let html = decode(body);
    let document = Html::parse_document(&html);
    let root = document.root_element();

    let mut page = DetailPage {
        name: select_text(root, &rules.name),
        references: BTreeMap::new(),
    };

    for (name, selector, attr) in &rules.references {
        let mut links = Vec::new();
        for element in root.select(selector) {
            let Some(href) = element.value().attr(attr) else {
                continue;
            };
            let link = resolve(base, href).ok_or_else(|| {
                HarvestError::parse(page_url, format!("unresolvable {} link '{}'", name, href))
            })?;
            links.push(link);
        }
        page.references.insert(name.clone(), links);
    }

    Ok(page)
}

/// Reads a sub-resource page's display name
pub fn parse_sub_resource(rules: &SubResourceRules, body: &[u8]) -> String {
    let html = decode(body);
    let document = Html::parse_document(&html);
    select_text(document.root_element(), &rules.name)
}

/// Resolves an href against the base origin, keeping only http(s) URLs
fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let url = base.join(href).ok()?;
    if url.scheme() == "http" || url.scheme() == "https" {
        Some(url.to_string())
    } else {
        None
    }
}
