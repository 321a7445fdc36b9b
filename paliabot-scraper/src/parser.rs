//! HTML parsing and content extraction from wiki pages
//!
//! Converts one page's raw markup into a structured [`WikiPage`]. This is a
//! pure transform: malformed markup degrades to partial results, it never
//! fails the whole page.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A section of a wiki page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSection {
    pub heading: String,
    pub content: String,
}

/// Parsed content from a wiki page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiPage {
    pub title: String,
    pub url: String,
    pub category: String,
    /// Label/value pairs in document order; labels are normalized to
    /// lowercase_with_underscores.
    pub infobox: Vec<(String, String)>,
    pub sections: Vec<WikiSection>,
    pub full_text: String,
}

/// Villager names recognized in page URLs
const VILLAGER_NAMES: &[&str] = &[
    "ashura", "auni", "chayne", "delaila", "einar", "eshe", "hassian", "hodari", "jel", "jina",
    "kenyatta", "najuma", "nai'o", "reth", "sifuu", "tamala", "tish", "zeki",
];

/// Ordered (pattern, category) pairs; first match wins
const CATEGORY_PATTERNS: &[(&str, &str)] = &[
    ("fish", "Fish"),
    ("bug", "Bug"),
    ("recipe", "Recipe"),
    ("dish", "Dish"),
    ("quest", "Quest"),
    ("location", "Location"),
    ("skill", "Skill"),
    ("tool", "Tool"),
    ("furniture", "Furniture"),
    ("clothing", "Clothing"),
    ("seed", "Seed"),
    ("crop", "Crop"),
];

struct Selectors {
    first_heading: Selector,
    header_title: Selector,
    portable_infobox: Selector,
    infobox_table: Selector,
    pi_title: Selector,
    pi_item: Selector,
    pi_label: Selector,
    pi_value: Selector,
    content: Selector,
    headline: Selector,
    catlinks: Selector,
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    cell: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            first_heading: Selector::parse("h1#firstHeading").expect("firstHeading selector"),
            header_title: Selector::parse("h1.page-header__title").expect("header title selector"),
            portable_infobox: Selector::parse("aside.portable-infobox")
                .expect("portable infobox selector"),
            infobox_table: Selector::parse("table.infobox").expect("infobox table selector"),
            pi_title: Selector::parse("h2.pi-title").expect("pi-title selector"),
            pi_item: Selector::parse("div.pi-item").expect("pi-item selector"),
            pi_label: Selector::parse("h3.pi-data-label").expect("pi-data-label selector"),
            pi_value: Selector::parse("div.pi-data-value").expect("pi-data-value selector"),
            content: Selector::parse("div.mw-parser-output").expect("content selector"),
            headline: Selector::parse("span.mw-headline").expect("headline selector"),
            catlinks: Selector::parse("div#catlinks").expect("catlinks selector"),
            row: Selector::parse("tr").expect("tr selector"),
            header_cell: Selector::parse("th").expect("th selector"),
            data_cell: Selector::parse("td").expect("td selector"),
            cell: Selector::parse("th, td").expect("cell selector"),
        }
    }
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(Selectors::new)
}

/// Strip `[edit]` markers and collapse whitespace runs.
pub fn clean_text(text: &str) -> String {
    static WHITESPACE: OnceLock<regex::Regex> = OnceLock::new();
    let ws = WHITESPACE.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    let stripped = text.replace("[edit]", "");
    ws.replace_all(&stripped, " ").trim().to_string()
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>()
}

/// Parse a wiki page's HTML and extract structured content.
pub fn parse_wiki_page(html: &str, url: &str) -> WikiPage {
    let sel = selectors();
    let doc = Html::parse_document(html);

    let title = doc
        .select(&sel.first_heading)
        .next()
        .or_else(|| doc.select(&sel.header_title).next())
        .map(|el| clean_text(&element_text(&el)))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let category = detect_category(url, &doc);
    let infobox = extract_infobox(&doc);
    let sections = extract_sections(&doc);

    let mut full_text_parts = vec![title.clone()];
    if !infobox.is_empty() {
        full_text_parts.push(format_infobox(&infobox));
    }
    for section in &sections {
        full_text_parts.push(format!("{}: {}", section.heading, section.content));
    }
    let full_text = full_text_parts.join("\n\n");

    WikiPage {
        title,
        url: url.to_string(),
        category,
        infobox,
        sections,
        full_text,
    }
}

/// Detect the category of a wiki page from its URL or category links.
fn detect_category(url: &str, doc: &Html) -> String {
    let url_lower = url.to_lowercase();

    if url_lower.contains("/villager")
        || VILLAGER_NAMES.iter().any(|name| url_lower.contains(name))
    {
        return "Villager".to_string();
    }

    for (pattern, category) in CATEGORY_PATTERNS {
        if url_lower.contains(pattern) {
            return category.to_string();
        }
    }

    if let Some(cat_links) = doc.select(&selectors().catlinks).next() {
        let cat_text = element_text(&cat_links).to_lowercase();
        for (pattern, category) in CATEGORY_PATTERNS {
            if cat_text.contains(pattern) {
                return category.to_string();
            }
        }
    }

    "General".to_string()
}

/// Extract structured data from the infobox, if the page has one. Handles
/// both the portable-infobox sidebar and the classic table layout; a page
/// without an infobox yields an empty list.
fn extract_infobox(doc: &Html) -> Vec<(String, String)> {
    let sel = selectors();
    let mut infobox = Vec::new();

    if let Some(aside) = doc.select(&sel.portable_infobox).next() {
        if let Some(title) = aside.select(&sel.pi_title).next() {
            let name = clean_text(&element_text(&title));
            if !name.is_empty() {
                infobox.push(("name".to_string(), name));
            }
        }
        for item in aside.select(&sel.pi_item) {
            let label = item.select(&sel.pi_label).next();
            let value = item.select(&sel.pi_value).next();
            if let (Some(label), Some(value)) = (label, value) {
                let key = normalize_label(&element_text(&label));
                let value = clean_text(&element_text(&value));
                if !key.is_empty() {
                    infobox.push((key, value));
                }
            }
        }
        return infobox;
    }

    if let Some(table) = doc.select(&sel.infobox_table).next() {
        for row in table.select(&sel.row) {
            let header = row.select(&sel.header_cell).next();
            let data = row.select(&sel.data_cell).next();
            if let (Some(header), Some(data)) = (header, data) {
                let key = normalize_label(&element_text(&header));
                let value = clean_text(&element_text(&data));
                if !key.is_empty() {
                    infobox.push((key, value));
                }
            }
        }
    }

    infobox
}

fn normalize_label(label: &str) -> String {
    clean_text(label).to_lowercase().replace(' ', "_")
}

/// Walk the main content block's direct children, treating h2/h3 elements as
/// section boundaries and skipping navigation, table-of-contents, and
/// category-link blocks.
fn extract_sections(doc: &Html) -> Vec<WikiSection> {
    let sel = selectors();
    let mut sections = Vec::new();

    let Some(content) = doc.select(&sel.content).next() else {
        return sections;
    };

    let mut current_heading = "Overview".to_string();
    let mut current_content: Vec<String> = Vec::new();

    for child in content.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = el.value().name();

        if name == "h2" || name == "h3" {
            flush_section(&mut sections, &current_heading, &mut current_content);
            current_heading = el
                .select(&sel.headline)
                .next()
                .map(|h| clean_text(&element_text(&h)))
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| clean_text(&element_text(&el)));
            continue;
        }

        if matches!(
            el.value().id(),
            Some("toc") | Some("catlinks") | Some("mw-navigation")
        ) {
            continue;
        }
        if el.value().classes().any(|c| c == "navbox") {
            continue;
        }

        match name {
            "p" | "ul" | "ol" | "dl" => {
                let text = clean_text(&element_text(&el));
                if !text.is_empty() {
                    current_content.push(text);
                }
            }
            "table" if el.value().classes().any(|c| c == "wikitable") => {
                let table_text = extract_table_text(&el);
                if !table_text.is_empty() {
                    current_content.push(table_text);
                }
            }
            _ => {}
        }
    }

    flush_section(&mut sections, &current_heading, &mut current_content);
    sections
}

fn flush_section(sections: &mut Vec<WikiSection>, heading: &str, content: &mut Vec<String>) {
    if content.is_empty() {
        return;
    }
    let text = clean_text(&content.join(" "));
    content.clear();
    if !text.is_empty() {
        sections.push(WikiSection {
            heading: heading.to_string(),
            content: text,
        });
    }
}

/// Linearize a wiki table as semicolon-joined rows of "header: cell" pairs.
fn extract_table_text(table: &ElementRef) -> String {
    let sel = selectors();
    let rows: Vec<ElementRef> = table.select(&sel.row).collect();

    let headers: Vec<String> = rows
        .first()
        .map(|row| {
            row.select(&sel.header_cell)
                .map(|th| clean_text(&element_text(&th)))
                .collect()
        })
        .unwrap_or_default();

    let mut lines = Vec::new();
    for row in rows.iter().skip(1) {
        let mut row_data = Vec::new();
        for (i, cell) in row.select(&sel.cell).enumerate() {
            let cell_text = clean_text(&element_text(&cell));
            match headers.get(i) {
                Some(header) if !header.is_empty() => {
                    row_data.push(format!("{}: {}", header, cell_text));
                }
                _ => row_data.push(cell_text),
            }
        }
        if !row_data.is_empty() {
            lines.push(row_data.join(", "));
        }
    }

    lines.join("; ")
}

/// Format infobox pairs as readable text, e.g. `Catch Time: Morning; Rarity: Rare`.
pub fn format_infobox(infobox: &[(String, String)]) -> String {
    infobox
        .iter()
        .map(|(key, value)| format!("{}: {}", title_case(key), value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
