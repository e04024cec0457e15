//! Text chunking and token counting.
//!
//! Chunks are sized in characters with a configurable overlap. In the default
//! whitespace-aligned mode, each chunk is extended left to the previous space
//! within the overlap window and right to the next space past the chunk size,
//! so words are never split mid-token.

use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, CoreBPE};

static BPE: OnceLock<CoreBPE> = OnceLock::new();

/// Count tokens in a string using the cl100k vocabulary.
///
/// Used for prompt budgeting in the search stages; an approximation is fine
/// there, exactness is not required.
pub fn token_count(text: &str) -> usize {
    let bpe = BPE.get_or_init(|| cl100k_base().expect("embedded cl100k vocabulary"));
    bpe.encode_with_special_tokens(text).len()
}

/// Split `text` into chunks of roughly `chunk_size` characters with `overlap`
/// characters of context carried between adjacent chunks.
///
/// With `split_on_whitespace_only` (the default mode), chunk boundaries snap
/// to spaces; otherwise chunks advance by a fixed stride. Characters, not
/// bytes, so multi-byte text is never split inside a code point.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    split_on_whitespace_only: bool,
) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut index: usize = 0;

    while index < chars.len() {
        if split_on_whitespace_only {
            // Extend left to the previous space within the overlap window.
            let mut prev_whitespace = 0usize;
            let mut left = index as isize - overlap as isize;
            while left >= 0 {
                if chars[left as usize] == ' ' {
                    prev_whitespace = left as usize;
                    break;
                }
                left -= 1;
            }

            // Extend right to the next space past the chunk size.
            let next_whitespace = find_char(&chars, ' ', index + chunk_size).unwrap_or(chars.len());

            let chunk: String = chars[prev_whitespace..next_whitespace].iter().collect();
            chunks.push(chunk.trim().to_string());
            index = next_whitespace + 1;
        } else {
            let start = (index as isize - overlap as isize + 1).max(0) as usize;
            let end = (index + chunk_size + overlap).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            chunks.push(chunk.trim().to_string());
            index += chunk_size;
        }
    }

    chunks
}

/// First occurrence of `needle` at or after `from`, by character index.
fn find_char(chars: &[char], needle: char, from: usize) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    chars[from..].iter().position(|&c| c == needle).map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = chunk_text("a short sentence", 100, 10, true);
        assert_eq!(chunks, vec!["a short sentence".to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 100, 10, true).is_empty());
        assert!(chunk_text("text", 0, 10, true).is_empty());
    }

    #[test]
    fn chunks_cover_all_words() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunk_text(text, 10, 4, true);

        assert!(chunks.len() > 1);
        for word in text.split(' ') {
            assert!(
                chunks.iter().any(|c| c.contains(word)),
                "word {word} missing from chunks"
            );
        }
    }

    #[test]
    fn whitespace_mode_never_splits_words() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = chunk_text(text, 12, 6, true);
        let words: Vec<&str> = text.split(' ').collect();

        for chunk in &chunks {
            for piece in chunk.split(' ') {
                assert!(words.contains(&piece), "fragment {piece:?} is not a whole word");
            }
        }
    }

    #[test]
    fn overlap_carries_context_between_chunks() {
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh";
        let chunks = chunk_text(text, 10, 6, true);

        // With a 6-char overlap the word before each boundary reappears.
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].contains(last_word) || pair[1].starts_with(last_word),
                "chunk {:?} does not overlap with {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn fixed_stride_mode_advances_by_chunk_size() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, 10, 2, false);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("abcdefghij"));
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let text = "héllo wörld ünïcode tëxt çharacters évérywhere";
        let chunks = chunk_text(text, 12, 4, true);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn token_count_grows_with_text() {
        let short = token_count("hello");
        let long = token_count("hello world, this is a longer sentence with more tokens");
        assert!(short >= 1);
        assert!(long > short);
    }
}
