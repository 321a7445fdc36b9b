//! Parse → chunk pipeline over realistic page markup.

use paliabot_scraper::{create_default_chunks, parse_wiki_page, split_text};

const STURGEON_HTML: &str = r#"
    <html><body>
    <h1 id="firstHeading">Sturgeon</h1>
    <aside class="portable-infobox">
        <div class="pi-item">
            <h3 class="pi-data-label">Type</h3>
            <div class="pi-data-value">fish</div>
        </div>
    </aside>
    <div class="mw-parser-output">
        <h2><span class="mw-headline">Habitat</span></h2>
        <p>Found in lakes.</p>
    </div>
    <div id="catlinks">Category: Fish</div>
    </body></html>
"#;

#[test]
fn sturgeon_page_yields_infobox_and_habitat_chunks() {
    let page = parse_wiki_page(STURGEON_HTML, "https://palia.wiki.gg/wiki/Sturgeon");
    let chunks = create_default_chunks(&page);

    assert_eq!(chunks.len(), 2);

    let infobox = &chunks[0];
    assert_eq!(infobox.metadata.section, "infobox");
    assert_eq!(infobox.text, "Sturgeon\n\nType: fish");
    assert_eq!(infobox.metadata.url, "https://palia.wiki.gg/wiki/Sturgeon");

    let habitat = &chunks[1];
    assert_eq!(habitat.metadata.section, "Habitat");
    assert_eq!(habitat.text, "Sturgeon - Habitat\n\nFound in lakes.");
    assert_eq!(habitat.metadata.category, "Fish");
}

#[test]
fn every_chunk_carries_a_retrievable_url() {
    let page = parse_wiki_page(STURGEON_HTML, "https://palia.wiki.gg/wiki/Sturgeon");
    for chunk in create_default_chunks(&page) {
        assert_eq!(chunk.metadata.url, page.url);
        assert!(!chunk.text.trim().is_empty());
    }
}

#[test]
fn long_sections_round_trip_through_the_splitter() {
    let content =
        "The sturgeon is a large migratory fish. It prefers deep, cool water. Anglers report the best luck in the early morning, especially when it rains. "
            .repeat(8);
    let overlap = 50;
    let chunks = split_text(&content, 500, overlap);
    assert!(chunks.len() > 1);

    let mut rebuilt = chunks[0].clone();
    for pair in chunks.windows(2) {
        let tail = paliabot_scraper::splitter::overlap_tail(&pair[0], overlap);
        assert!(pair[1].starts_with(tail));
        rebuilt.push_str(&pair[1][tail.len()..]);
    }
    assert_eq!(rebuilt, content);
}
