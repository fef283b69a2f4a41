// src/extractors/shipment.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::path::Path;

// --- Tag Names ---
// Fixed and case-sensitive. No namespace or attribute handling.
pub const LINE_TAG: &str = "ShipConfirmLine";
pub const DELIVERY_TAG: &str = "delivery_id";
pub const PRODUCT_TAG: &str = "ProductServiceId";
pub const SERIALS_TAG: &str = "ShipConfirmSerials";
pub const SERIAL_NUMBER_TAG: &str = "serial_number";

const ALL_TAGS: [&str; 5] = [LINE_TAG, DELIVERY_TAG, PRODUCT_TAG, SERIALS_TAG, SERIAL_NUMBER_TAG];

// --- Regex Patterns (Lazy Static) ---
// Shortest span between an opening tag and the next matching closing tag,
// across newlines.
fn tag_pair_pattern(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>"))
        .expect("Failed to compile tag pair pattern")
}

static LINE_RE: Lazy<Regex> = Lazy::new(|| tag_pair_pattern(LINE_TAG));
static DELIVERY_RE: Lazy<Regex> = Lazy::new(|| tag_pair_pattern(DELIVERY_TAG));
static PRODUCT_RE: Lazy<Regex> = Lazy::new(|| tag_pair_pattern(PRODUCT_TAG));
static SERIALS_RE: Lazy<Regex> = Lazy::new(|| tag_pair_pattern(SERIALS_TAG));
static SERIAL_NUMBER_RE: Lazy<Regex> = Lazy::new(|| tag_pair_pattern(SERIAL_NUMBER_TAG));

// Any opening or closing tag of the five known names, for debug annotation.
static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    let names = ALL_TAGS.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"</?({names})>")).expect("Failed to compile ANY_TAG_RE")
});

// --- Data Structures ---

/// One flat output row: a shipment line, optionally narrowed to one serialized unit.
///
/// Field names double as the table header, so keep them in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub delivery_id: String,
    pub product_service_id: String,
    pub serial_number: String,
}

impl Record {
    pub fn new(
        delivery_id: impl Into<String>,
        product_service_id: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            product_service_id: product_service_id.into(),
            serial_number: serial_number.into(),
        }
    }
}

/// Location of one known tag occurrence in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    pub tag: &'static str,
}

/// Emits the records of one line: one per serial group, or a single record
/// with an empty serial when the line has none.
fn flatten_line(
    delivery_id: String,
    product_service_id: String,
    serials: Vec<String>,
    records: &mut Vec<Record>,
) {
    if serials.is_empty() {
        records.push(Record {
            delivery_id,
            product_service_id,
            serial_number: String::new(),
        });
        return;
    }

    for serial_number in serials {
        records.push(Record {
            delivery_id: delivery_id.clone(),
            product_service_id: product_service_id.clone(),
            serial_number,
        });
    }
}

// --- Strategies ---

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, content: &str) -> Vec<Record>;
}

/// Tolerant regex scan. Never fails; absent tags become empty strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractionStrategy;

impl PatternExtractionStrategy {
    fn first_capture(re: &Regex, block: &str) -> String {
        re.captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

impl ExtractionStrategy for PatternExtractionStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, content: &str) -> Vec<Record> {
        let mut records = Vec::new();

        for line_caps in LINE_RE.captures_iter(content) {
            let Some(line_block) = line_caps.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let delivery_id = Self::first_capture(&DELIVERY_RE, line_block);
            let product_service_id = Self::first_capture(&PRODUCT_RE, line_block);

            let serials: Vec<String> = SERIALS_RE
                .captures_iter(line_block)
                .filter_map(|caps| caps.get(1))
                .map(|group| Self::first_capture(&SERIAL_NUMBER_RE, group.as_str()))
                .collect();

            tracing::trace!(
                "Line block: delivery_id='{}' product_service_id='{}' serial groups={}",
                delivery_id,
                product_service_id,
                serials.len()
            );

            flatten_line(delivery_id, product_service_id, serials, &mut records);
        }

        records
    }
}

/// Element-tree parse restricted to the five known tags.
///
/// Each tag belongs to its nearest enclosing line or serial group, so an
/// identifier inside a serial group is not mistaken for the line's, and a
/// serial number outside any group is ignored. Falls back to the pattern scan
/// when the document is not well-formed XML.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeExtractionStrategy;

impl TreeExtractionStrategy {
    fn is_tag(node: &Node, tag: &str) -> bool {
        node.is_element() && node.tag_name().name() == tag
    }

    /// Nearest enclosing line or serial group, excluding the node itself.
    fn owner<'a, 'input>(node: &Node<'a, 'input>) -> Option<Node<'a, 'input>> {
        node.ancestors()
            .skip(1)
            .find(|a| Self::is_tag(a, LINE_TAG) || Self::is_tag(a, SERIALS_TAG))
    }

    fn owned_by(node: &Node, owner: &Node) -> bool {
        Self::owner(node).map(|o| o.id()) == Some(owner.id())
    }

    /// Enclosed text sliced straight from the input, entities left as written.
    fn inner_text(content: &str, node: &Node) -> String {
        match (node.first_child(), node.last_child()) {
            (Some(first), Some(last)) => content
                .get(first.range().start..last.range().end)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    fn first_owned(content: &str, owner: &Node, tag: &str) -> String {
        owner
            .descendants()
            .find(|n| Self::is_tag(n, tag) && Self::owned_by(n, owner))
            .map(|n| Self::inner_text(content, &n))
            .unwrap_or_default()
    }
}

impl ExtractionStrategy for TreeExtractionStrategy {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn extract(&self, content: &str) -> Vec<Record> {
        let document = match Document::parse(content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Document is not well-formed XML ({}), falling back to pattern scan", e);
                return PatternExtractionStrategy.extract(content);
            }
        };

        let mut records = Vec::new();

        for line in document.descendants().filter(|n| Self::is_tag(n, LINE_TAG)) {
            let delivery_id = Self::first_owned(content, &line, DELIVERY_TAG);
            let product_service_id = Self::first_owned(content, &line, PRODUCT_TAG);

            let serials: Vec<String> = line
                .descendants()
                .filter(|n| Self::is_tag(n, SERIALS_TAG) && Self::owned_by(n, &line))
                .map(|group| Self::first_owned(content, &group, SERIAL_NUMBER_TAG))
                .collect();

            flatten_line(delivery_id, product_service_id, serials, &mut records);
        }

        records
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    /// Tolerant tag-pair pattern scan
    #[default]
    Pattern,
    /// Element tree parse; falls back to pattern on malformed input
    Tree,
}

// --- Main Extractor Structure ---
pub struct ShipmentExtractor {
    strategy: Box<dyn ExtractionStrategy>,
}

impl Default for ShipmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipmentExtractor {
    pub fn new() -> Self {
        Self::with_strategy(StrategyKind::Pattern)
    }

    pub fn with_strategy(kind: StrategyKind) -> Self {
        let strategy: Box<dyn ExtractionStrategy> = match kind {
            StrategyKind::Pattern => Box::new(PatternExtractionStrategy),
            StrategyKind::Tree => Box::new(TreeExtractionStrategy),
        };
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Extracts records from raw document text, in document order.
    pub fn extract_data(&self, content: &str) -> Vec<Record> {
        let records = self.strategy.extract(content);
        tracing::debug!(
            "{} strategy extracted {} records from {} bytes",
            self.strategy.name(),
            records.len(),
            content.len()
        );
        records
    }

    /// Reads the whole file as UTF-8 and extracts from it.
    pub fn extract_from_source<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Record>, ExtractError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ExtractError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Read {} bytes from {}", content.len(), path.display());
        Ok(self.extract_data(&content))
    }

    /// Every opening/closing occurrence of the known tags, left to right.
    pub fn match_spans(content: &str) -> Vec<TagSpan> {
        ANY_TAG_RE
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str();
                let tag = ALL_TAGS.iter().copied().find(|t| *t == name)?;
                Some(TagSpan {
                    start: whole.start(),
                    end: whole.end(),
                    tag,
                })
            })
            .collect()
    }
}

/// Extracts with the default pattern strategy.
pub fn extract_data(content: &str) -> Vec<Record> {
    ShipmentExtractor::new().extract_data(content)
}

/// Reads `path` and extracts with the default pattern strategy.
pub fn extract_from_source<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, ExtractError> {
    ShipmentExtractor::new().extract_from_source(path)
}
