/// Split `text` into parts of at most `max_chars` characters.
///
/// Splits prefer a separator right after the window, then a paragraph break,
/// a line break, or a space inside it; a word longer than the window is cut
/// hard. Separators at a split point are dropped.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let window_end = match remaining.char_indices().nth(max_chars) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(remaining.to_string());
                break;
            },
        };

        let window = &remaining[..window_end];
        let split_at = if remaining[window_end..].starts_with(['\n', ' ']) {
            window_end
        } else {
            window
                .rfind("\n\n")
                .or_else(|| window.rfind('\n'))
                .or_else(|| window.rfind(' '))
                .filter(|&idx| idx > 0)
                .unwrap_or(window_end)
        };

        let head = remaining[..split_at].trim_end();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        remaining = remaining[split_at..].trim_start_matches(['\n', ' ']);
    }

    chunks
}
