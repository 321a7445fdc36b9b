//! Recursive text splitting with overlap
//!
//! An explicit recursive-descent splitter: try each separator in priority
//! order, recursively split any piece still over the size limit, then stitch
//! an overlap window from the end of chunk N into the start of chunk N+1.
//! Pure functions, no state.

/// Separators tried in priority order; the empty string is the last-resort
/// character-level split.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", ", ", " ", ""];

/// Split `text` into chunks of at most `chunk_size` bytes of fresh content,
/// each chunk after the first prefixed with up to `chunk_overlap` characters
/// carried over from the end of the previous chunk.
///
/// Concatenating the chunks with each overlap prefix removed reproduces the
/// input exactly; no content is dropped or duplicated beyond the overlap.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let fragments = fragment(text, SEPARATORS, chunk_size);
    merge(fragments, chunk_size, chunk_overlap)
}

/// Break `text` into fragments no longer than `limit` bytes, preferring the
/// earliest separator in `separators` that actually occurs in the text.
/// Separators stay attached to the preceding fragment so that concatenation
/// is lossless.
fn fragment(text: &str, separators: &[&str], limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return char_windows(text, limit);
        }
        if !text.contains(sep) {
            continue;
        }
        let rest = &separators[i + 1..];
        let mut fragments = Vec::new();
        for piece in text.split_inclusive(sep) {
            if piece.len() > limit {
                fragments.extend(fragment(piece, rest, limit));
            } else {
                fragments.push(piece.to_string());
            }
        }
        return fragments;
    }

    // Separator list exhausted without the empty fallback; split raw.
    char_windows(text, limit)
}

/// Cut `text` into windows of at most `limit` bytes on char boundaries.
fn char_windows(text: &str, limit: usize) -> Vec<String> {
    let mut windows = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > limit && !current.is_empty() {
            windows.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        windows.push(current);
    }
    windows
}

/// Greedily merge fragments into chunks. Each chunk accumulates up to
/// `chunk_size` bytes of new content on top of the overlap tail carried from
/// the previous chunk.
fn merge(fragments: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    // Bytes of `current` that are carried-over overlap, not new content.
    let mut carried = 0;

    for frag in fragments {
        if current.len() + frag.len() > chunk_size + carried && current.len() > carried {
            chunks.push(current.clone());
            let tail = overlap_tail(&current, chunk_overlap).to_string();
            carried = tail.len();
            current = tail;
        }
        current.push_str(&frag);
    }
    if current.len() > carried {
        chunks.push(current);
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

/// The last `max_chars` characters of `text`, on a char boundary.
pub fn overlap_tail(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("short and sweet", 500, 50);
        assert_eq!(chunks, vec!["short and sweet".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("", 500, 50).is_empty());
        assert!(split_text("   ", 2, 0).is_empty());
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";
        let chunks = split_text(text, 30, 0);
        assert!(chunks.len() >= 2);
        // Paragraph boundaries are respected: no chunk starts mid-word.
        assert!(chunks[0].starts_with("First paragraph"));
        assert!(chunks
            .iter()
            .any(|c| c.starts_with("Second paragraph")));
    }

    #[test]
    fn falls_back_to_sentences_then_spaces() {
        let text = "One two three four five six seven eight nine ten eleven twelve.";
        let chunks = split_text(text, 20, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 20, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn overlap_is_carried_between_chunks() {
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj";
        let chunks = split_text(text, 20, 5);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail = overlap_tail(&pair[0], 5);
            assert!(
                pair[1].starts_with(tail),
                "expected {:?} to start with {:?}",
                pair[1],
                tail
            );
        }
    }

    #[test]
    fn round_trip_reconstructs_input() {
        let text = "The sturgeon is a large fish. It lives in lakes and rivers.\n\nIt can be caught in the early morning, and it prefers rainy weather. Patience helps.";
        let overlap = 10;
        let chunks = split_text(text, 40, overlap);
        assert!(chunks.len() > 1);

        let mut rebuilt = chunks[0].clone();
        for pair in chunks.windows(2) {
            let tail = overlap_tail(&pair[0], overlap);
            rebuilt.push_str(&pair[1][tail.len()..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld ünïcödé ".repeat(10);
        let chunks = split_text(&text, 25, 5);
        assert!(chunks.len() > 1);
        // Would panic on a broken boundary; also verify nothing was lost.
        let total: String = chunks.concat();
        assert!(total.chars().count() >= text.chars().count());
    }

    #[test]
    fn unbroken_run_is_window_split() {
        let text = "x".repeat(120);
        let chunks = split_text(&text, 50, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn overlap_tail_respects_char_boundaries() {
        assert_eq!(overlap_tail("hello", 2), "lo");
        assert_eq!(overlap_tail("héé", 2), "éé");
        assert_eq!(overlap_tail("hi", 10), "hi");
        assert_eq!(overlap_tail("hi", 0), "");
    }
}
