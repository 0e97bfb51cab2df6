use std::fmt;
use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into model tokens.
///
/// `encode` must return byte spans that tile the input: in order, without
/// gaps, each starting where the previous one ended. Chunking and memory
/// accounting rely on this to cut text on token boundaries.
pub trait Tokenizer: Send + Sync + fmt::Debug {
    fn encode(&self, text: &str) -> Vec<Range<usize>>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Longest prefix of `text` holding at most `max_tokens` tokens.
    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> &'a str {
        let spans = self.encode(text);
        if spans.len() <= max_tokens {
            return text;
        }
        match max_tokens {
            0 => "",
            n => &text[..spans[n - 1].end],
        }
    }
}

/// One token per Unicode word, whitespace run or punctuation mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Vec<Range<usize>> {
        text.split_word_bound_indices()
            .map(|(start, word)| start..start + word.len())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_tile_text() {
        let text = "Memes spread, mutate — and compete!  Ünïcode too.";
        let spans = WordTokenizer.encode(text);
        let mut cursor = 0;
        for span in &spans {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor, text.len());
    }

    #[test]
    fn test_count() {
        // "Hello", " ", "world", "!"
        assert_eq!(WordTokenizer.count("Hello world!"), 4);
        assert_eq!(WordTokenizer.count(""), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(WordTokenizer.truncate("one two three", 3), "one two");
        assert_eq!(WordTokenizer.truncate("one two", 10), "one two");
        assert_eq!(WordTokenizer.truncate("one two", 0), "");
    }
}
