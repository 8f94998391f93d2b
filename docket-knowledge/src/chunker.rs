//! Sliding-window text chunking.
//!
//! Documents are split into overlapping character windows sized to keep a
//! whole clause of legal text in one chunk. Window boundaries prefer
//! whitespace so a chunk does not end mid-word.

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
}

/// Split text into overlapping windows of roughly `chunk_size` characters
/// with `overlap` characters shared between consecutive windows.
///
/// `overlap` must be smaller than `chunk_size`; the config layer validates
/// this before the chunker ever sees the values.
pub fn chunk_text(input: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let trimmed = input.trim();
    if trimmed.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= chunk_size {
        return vec![Chunk {
            index: 0,
            content: trimmed.to_string(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end < chars.len() {
            break_at_whitespace(&chars, start, hard_end)
        } else {
            hard_end
        };

        let content: String = chars[start..end].iter().collect();
        let content = content.trim().to_string();
        if !content.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                content,
            });
        }

        if end == chars.len() {
            break;
        }
        // Step back by the overlap, but always move forward.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Find a whitespace boundary in the back half of the window, falling back
/// to the hard cut when the window is one unbroken token.
fn break_at_whitespace(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;
    (floor..hard_end)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(hard_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 800, 150).is_empty());
        assert!(chunk_text("   \n  ", 800, 150).is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunks = chunk_text("This agreement is binding.", 800, 150);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "This agreement is binding.");
    }

    #[test]
    fn long_input_produces_overlapping_windows() {
        let words: Vec<String> = (0..200).map(|i| format!("word{i}")).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, 300, 60);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 300);
        }
        // Consecutive chunks share text from the overlap region.
        let tail: String = chunks[0].content.chars().rev().take(30).collect();
        let tail: String = tail.chars().rev().collect();
        assert!(chunks[1].content.contains(tail.split_whitespace().next().unwrap()));
        // Indexes are sequential.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn breaks_at_whitespace_not_mid_word() {
        let words: Vec<String> = (0..100).map(|i| format!("clause{i}")).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, 120, 20);

        // Window ends snap to whitespace, so the last token of every chunk
        // is a complete word from the input.
        for chunk in &chunks {
            let last = chunk.content.split_whitespace().last().unwrap();
            assert!(
                text.split_whitespace().any(|w| w == last),
                "chunk ends mid-word: {last:?}"
            );
        }
    }

    #[test]
    fn handles_multibyte_text() {
        let text = "§ 1983 claims: municipal liability précis. ".repeat(50);
        let chunks = chunk_text(&text, 200, 40);
        assert!(chunks.len() > 1);
        let rejoined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert!(rejoined.contains("§ 1983"));
    }

    #[test]
    fn always_terminates_with_large_overlap() {
        let text = "x".repeat(5000);
        // Overlap close to the chunk size must still make forward progress.
        let chunks = chunk_text(&text, 100, 99);
        assert!(!chunks.is_empty());
    }
}
