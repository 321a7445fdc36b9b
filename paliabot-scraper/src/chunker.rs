//! Text chunking with overlap for retrieval
//!
//! Turns a parsed [`WikiPage`] into overlapping text windows with provenance
//! metadata attached. Infoboxes are short and structured, so they become a
//! single chunk; sections are split independently and every sub-chunk is
//! prefixed with its page and section so it stays self-describing when
//! assembled into context out of order.

use crate::parser::{format_infobox, WikiPage};
use crate::splitter::split_text;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Provenance attached to every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub url: String,
    pub category: String,
    pub section: String,
    /// Position of the chunk within its section; None for single-chunk
    /// content like the infobox.
    pub chunk_index: Option<usize>,
}

/// A text chunk with metadata, the unit stored and retrieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Create overlapping text chunks from a wiki page.
pub fn create_chunks(page: &WikiPage, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    let base = |section: &str, chunk_index: Option<usize>| ChunkMetadata {
        title: page.title.clone(),
        url: page.url.clone(),
        category: page.category.clone(),
        section: section.to_string(),
        chunk_index,
    };

    // The infobox is never split further.
    if !page.infobox.is_empty() {
        let text = format!("{}\n\n{}", page.title, format_infobox(&page.infobox));
        chunks.push(Chunk {
            text,
            metadata: base("infobox", None),
        });
    }

    // Chunk each section independently to preserve context.
    for section in &page.sections {
        let prefix = format!("{} - {}\n\n", page.title, section.heading);
        for (i, piece) in split_text(&section.content, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
        {
            chunks.push(Chunk {
                text: format!("{}{}", prefix, piece),
                metadata: base(&section.heading, Some(i)),
            });
        }
    }

    // Nothing structured at all: fall back to the full text.
    if page.sections.is_empty() && page.infobox.is_empty() {
        for (i, piece) in split_text(&page.full_text, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
        {
            chunks.push(Chunk {
                text: piece,
                metadata: base("full_text", Some(i)),
            });
        }
    }

    chunks
}

/// Create chunks with the default size and overlap.
pub fn create_default_chunks(page: &WikiPage) -> Vec<Chunk> {
    create_chunks(page, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::WikiSection;

    fn page_with(
        infobox: Vec<(String, String)>,
        sections: Vec<WikiSection>,
    ) -> WikiPage {
        let full_text = sections
            .iter()
            .map(|s| format!("{}: {}", s.heading, s.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        WikiPage {
            title: "Sturgeon".to_string(),
            url: "https://palia.wiki.gg/wiki/Sturgeon".to_string(),
            category: "Fish".to_string(),
            infobox,
            sections,
            full_text: format!("Sturgeon\n\n{}", full_text),
        }
    }

    #[test]
    fn infobox_and_section_each_become_chunks() {
        let page = page_with(
            vec![("type".to_string(), "fish".to_string())],
            vec![WikiSection {
                heading: "Habitat".to_string(),
                content: "Found in lakes.".to_string(),
            }],
        );
        let chunks = create_default_chunks(&page);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.section, "infobox");
        assert_eq!(chunks[0].metadata.chunk_index, None);
        assert_eq!(chunks[0].text, "Sturgeon\n\nType: fish");

        assert_eq!(chunks[1].metadata.section, "Habitat");
        assert_eq!(chunks[1].metadata.chunk_index, Some(0));
        assert_eq!(chunks[1].text, "Sturgeon - Habitat\n\nFound in lakes.");
        assert_eq!(chunks[1].metadata.url, page.url);
        assert_eq!(chunks[1].metadata.category, "Fish");
    }

    #[test]
    fn infobox_only_page_yields_exactly_one_chunk() {
        let page = page_with(
            vec![("rarity".to_string(), "Rare".to_string())],
            Vec::new(),
        );
        let chunks = create_default_chunks(&page);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section, "infobox");
    }

    #[test]
    fn long_section_is_split_with_prefix_and_indices() {
        let sentence = "The sturgeon prefers deep water and cool mornings. ";
        let page = page_with(
            Vec::new(),
            vec![WikiSection {
                heading: "Habitat".to_string(),
                content: sentence.repeat(20),
            }],
        );
        let chunks = create_chunks(&page, 200, 20);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.text.starts_with("Sturgeon - Habitat\n\n"));
            assert_eq!(chunk.metadata.chunk_index, Some(i));
            assert_eq!(chunk.metadata.section, "Habitat");
        }
    }

    #[test]
    fn bare_page_falls_back_to_full_text() {
        let page = WikiPage {
            title: "Stub".to_string(),
            url: "https://palia.wiki.gg/wiki/Stub".to_string(),
            category: "General".to_string(),
            infobox: Vec::new(),
            sections: Vec::new(),
            full_text: "Stub\n\nJust a line of text.".to_string(),
        };
        let chunks = create_default_chunks(&page);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section, "full_text");
        assert_eq!(chunks[0].metadata.chunk_index, Some(0));
        assert_eq!(chunks[0].text, "Stub\n\nJust a line of text.");
    }

    #[test]
    fn no_chunk_is_empty() {
        let page = page_with(
            vec![("a".to_string(), "b".to_string())],
            vec![WikiSection {
                heading: "Notes".to_string(),
                content: "word ".repeat(300),
            }],
        );
        for chunk in create_chunks(&page, 100, 10) {
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn sections_chunk_independently() {
        let page = page_with(
            Vec::new(),
            vec![
                WikiSection {
                    heading: "First".to_string(),
                    content: "Alpha.".to_string(),
                },
                WikiSection {
                    heading: "Second".to_string(),
                    content: "Beta.".to_string(),
                },
            ],
        );
        let chunks = create_default_chunks(&page);
        assert_eq!(chunks.len(), 2);
        // indices restart for each section
        assert_eq!(chunks[0].metadata.chunk_index, Some(0));
        assert_eq!(chunks[1].metadata.chunk_index, Some(0));
        assert_eq!(chunks[0].metadata.section, "First");
        assert_eq!(chunks[1].metadata.section, "Second");
    }
}
