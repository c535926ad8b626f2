//! Split markdown into overlapping chunks that never cross a heading.
//!
//! Tokens are approximated as whitespace-split words.

/// A chunk produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Nearest markdown heading above the chunk, without the `#` markers.
    pub heading: Option<String>,
    /// 1-based, inclusive.
    pub start_line: usize,
    pub end_line: usize,
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.trim_start_matches('#');
    let level = trimmed.len() - rest.len();
    (1..=6)
        .contains(&level)
        .then(|| rest.trim())
        .filter(|h| !h.is_empty())
}

/// Split `text` into chunks of roughly `chunk_size` tokens, repeating about
/// `overlap` tokens of trailing lines at the start of the next chunk.
///
/// A heading always starts a new chunk, so one chunk never mixes sections.
pub fn chunk_markdown(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = text.lines().collect();
    let tokens: Vec<usize> = lines
        .iter()
        .map(|l| l.split_whitespace().count().max(1))
        .collect();

    // Section boundaries: [start, end) line ranges, each led by a heading
    // (except possibly the first).
    let mut sections = Vec::new();
    let mut section_start = 0;
    for (i, line) in lines.iter().enumerate().skip(1) {
        if heading_text(line).is_some() {
            sections.push(section_start..i);
            section_start = i;
        }
    }
    sections.push(section_start..lines.len());

    let mut chunks = Vec::new();
    for section in sections {
        let heading = heading_text(lines[section.start]).map(str::to_string);
        let mut start = section.start;

        while start < section.end {
            let mut end = start;
            let mut used = 0;
            while end < section.end && (end == start || used + tokens[end] <= chunk_size) {
                used += tokens[end];
                end += 1;
            }

            let body = lines[start..end].join("\n");
            if !body.trim().is_empty() {
                chunks.push(Chunk {
                    text: body,
                    heading: heading.clone(),
                    start_line: start + 1,
                    end_line: end,
                });
            }
            if end >= section.end {
                break;
            }

            let mut next = end;
            let mut carried = 0;
            while next > start + 1 && carried < overlap {
                next -= 1;
                carried += tokens[next];
            }
            start = next.max(start + 1);
        }
    }

    chunks
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(chunk_markdown("", 100, 10).is_empty());
        assert!(chunk_markdown("  \n\n ", 100, 10).is_empty());
        assert!(chunk_markdown("hello", 0, 0).is_empty());
    }

    #[test]
    fn single_small_chunk() {
        let text = "hello world\nfoo bar";
        let chunks = chunk_markdown(text, 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 2);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].heading, None);
    }

    #[test]
    fn headings_split_sections() {
        let text = "# Horários\nAbrimos às 8h.\n## Endereço\nRua A, 100.";
        let chunks = chunk_markdown(text, 100, 0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading.as_deref(), Some("Horários"));
        assert_eq!(chunks[1].heading.as_deref(), Some("Endereço"));
        assert_eq!(chunks[1].start_line, 3);
    }

    #[test]
    fn long_sections_overlap() {
        let lines: Vec<String> = (0..10)
            .map(|i| format!("line {i} has several words in it here now ok"))
            .collect();
        let text = lines.join("\n");

        let chunks = chunk_markdown(&text, 20, 5);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_line <= pair[0].end_line);
            assert!(pair[1].start_line > pair[0].start_line);
        }
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, 10);
    }

    #[test]
    fn oversized_line_is_kept_whole() {
        let text = "one two three four five six";
        let chunks = chunk_markdown(text, 2, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn hash_without_text_is_not_a_heading() {
        assert_eq!(heading_text("#"), None);
        assert_eq!(heading_text("####### too deep"), None);
        assert_eq!(heading_text("  ## Ok "), Some("Ok"));
    }
}
