use std::collections::VecDeque;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// A piece of a document produced by [`TextSplitter`]
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Character offset of the chunk in the original text, when it could be located
    pub start_index: Option<usize>,
}

/// Splits text into overlapping chunks, preferring paragraph breaks, then line breaks, then
/// spaces, and only cutting inside words when nothing else fits. Sizes are counted in characters.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: vec!["\n\n", "\n", " ", ""],
        }
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let pieces = self.split_recursive(text, &self.separators);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut search_from = 0;
        for piece in pieces {
            let start_index = text[search_from..].find(&piece).map(|offset| {
                let byte_start = search_from + offset;
                // the next chunk overlaps this one, so it can only start after this start
                search_from = byte_start
                    + piece
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or_default();
                text[..byte_start].chars().count()
            });
            chunks.push(Chunk {
                text: piece,
                start_index,
            });
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut final_chunks = Vec::new();
        let mut good_splits = Vec::new();
        for split in splits {
            if char_len(&split) < self.chunk_size {
                good_splits.push(split);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(split);
            } else {
                final_chunks.extend(self.split_recursive(&split, remaining));
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }
        final_chunks
    }

    /// Greedily join small splits into chunks no larger than `chunk_size`, carrying up to
    /// `chunk_overlap` characters of trailing splits into the next chunk
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for split in splits {
            let len = char_len(split);
            let joined_len = |current: &VecDeque<&str>, total: usize| {
                total + len + if current.is_empty() { 0 } else { separator_len }
            };

            if joined_len(&current, total) > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current, separator) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (joined_len(&current, total) > self.chunk_size && total > 0)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + if current.is_empty() { 0 } else { separator_len };
                }
            }

            if !current.is_empty() {
                total += separator_len;
            }
            current.push_back(split);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(parts: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split("Harshit Chawla\nBCA, GGSIPU");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Harshit Chawla\nBCA, GGSIPU");
        assert_eq!(chunks[0].start_index, Some(0));
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let splitter = TextSplitter::new(12, 0);
        let chunks = splitter.split("Skills here\n\nProjects now");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Skills here", "Projects now"]);
        assert_eq!(chunks[1].start_index, Some(13));
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let splitter = TextSplitter::new(10, 4);
        let chunks = splitter.split("aa bb cc dd ee ff gg");
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 10, "{:?}", chunk);
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aa bb cc", "cc dd ee", "ee ff gg"]);
        assert_eq!(chunks[1].start_index, Some(6));
    }

    #[test]
    fn test_long_word_is_cut() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split("abcdefghij");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_offsets() {
        let splitter = TextSplitter::new(6, 0);
        let chunks = splitter.split("héllo wörld");
        assert_eq!(chunks[0].text, "héllo");
        assert_eq!(chunks[1].text, "wörld");
        assert_eq!(chunks[1].start_index, Some(6));
    }
}
