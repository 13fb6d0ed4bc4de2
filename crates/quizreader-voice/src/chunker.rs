//! Clause-level chunking for sequential utterances
//!
//! Splits a word sequence into speakable chunks at clause and sentence
//! boundaries. Chunks partition the sequence exactly: contiguous,
//! non-overlapping, covering every index.

use serde::{Deserialize, Serialize};

/// Token endings that close a chunk.
pub const CLAUSE_TERMINATORS: [char; 6] = ['.', '?', '!', ';', ',', ':'];

/// A contiguous run of words spoken as one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Words of the chunk joined with single spaces
    pub text: String,
    /// First word index (inclusive)
    pub start_index: usize,
    /// Last word index (inclusive)
    pub end_index: usize,
}

impl Chunk {
    /// Number of words in the chunk
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Chunks are never empty; provided for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn ends_clause(word: &str) -> bool {
    word.chars()
        .next_back()
        .is_some_and(|c| CLAUSE_TERMINATORS.contains(&c))
}

/// Split `words` into chunks.
///
/// A chunk ends at a token ending in one of [`CLAUSE_TERMINATORS`], at the
/// last token, or once it holds `max_words` tokens (when given). Whichever
/// condition is met first closes the chunk.
pub fn build_chunks<S: AsRef<str>>(words: &[S], max_words: Option<usize>) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;

    for (i, word) in words.iter().enumerate() {
        let word = word.as_ref();
        let is_last = i + 1 == words.len();
        let at_limit = max_words.is_some_and(|max| i + 1 - start >= max.max(1));

        if ends_clause(word) || is_last || at_limit {
            let text = words[start..=i]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" ");
            chunks.push(Chunk {
                text,
                start_index: start,
                end_index: i,
            });
            start = i + 1;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(words: &[&str], chunks: &[Chunk]) {
        let mut expected = 0;
        for (n, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.start_index, expected, "chunk {n} not contiguous");
            assert!(chunk.end_index >= chunk.start_index);
            let last = chunk.end_index + 1 == words.len();
            assert!(last || ends_clause(words[chunk.end_index]) || chunk.len() == 15);
            expected = chunk.end_index + 1;
        }
        assert_eq!(expected, words.len());
    }

    #[test]
    fn splits_at_sentence_end() {
        let words = ["Hello", "world.", "How", "are", "you"];
        let chunks = build_chunks(&words, None);
        assert_eq!(
            chunks,
            vec![
                Chunk {
                    text: "Hello world.".into(),
                    start_index: 0,
                    end_index: 1,
                },
                Chunk {
                    text: "How are you".into(),
                    start_index: 2,
                    end_index: 4,
                },
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let words: [&str; 0] = [];
        assert!(build_chunks(&words, Some(15)).is_empty());
    }

    #[test]
    fn single_token_is_one_chunk() {
        let chunks = build_chunks(&["Ready"], None);
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start_index, chunks[0].end_index), (0, 0));
    }

    #[test]
    fn every_terminator_closes_a_chunk() {
        let words = ["a.", "b?", "c!", "d;", "e,", "f:", "g"];
        let chunks = build_chunks(&words, None);
        assert_eq!(chunks.len(), 7);
        assert_partition(&words, &chunks);
    }

    #[test]
    fn max_words_forces_breaks_without_punctuation() {
        let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let chunks = build_chunks(&refs, Some(15));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 15);
        assert_eq!(chunks[1].len(), 15);
        assert_eq!(chunks[2].len(), 10);
        assert_partition(&refs, &chunks);
    }

    #[test]
    fn punctuation_before_limit_wins() {
        let mut words = vec!["one", "two", "three."];
        words.extend(std::iter::repeat("x").take(20));
        let chunks = build_chunks(&words, Some(15));
        assert_eq!(chunks[0].end_index, 2);
        assert_eq!(chunks[1].start_index, 3);
        assert_eq!(chunks[1].len(), 15);
        assert_partition(&words, &chunks);
    }

    #[test]
    fn long_mixed_question_partitions() {
        let text = "For 10 points, name this author of Moby-Dick, who also wrote Billy Budd; \
                    his other works include Typee and Omoo and a long poem called Clarel that \
                    nobody reads except graduate students in American literature programs";
        let words: Vec<&str> = text.split_whitespace().collect();
        let chunks = build_chunks(&words, Some(15));
        assert_partition(&words, &chunks);
    }
}
