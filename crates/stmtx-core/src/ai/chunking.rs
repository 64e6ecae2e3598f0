//! Line-preserving text chunking.

/// Split text into chunks of at most `max_chars` characters.
///
/// Lines are never split unless a single line is longer than the budget, in
/// which case it is hard-split on character boundaries. Order is preserved
/// and empty text yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in text.lines() {
        let line_chars = line.chars().count();

        if line_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        // +1 for the joining newline
        let needed = if current.is_empty() { line_chars } else { line_chars + 1 };
        if current_chars + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunk_text("a\nb", 100), vec!["a\nb".to_string()]);
        assert!(chunk_text("  \n ", 100).is_empty());
    }

    #[test]
    fn test_lines_are_not_split() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(chunk_text(text, 9), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_is_hard_split() {
        let text = "ab\nxxxxxxxxxx\ncd";
        assert_eq!(chunk_text(text, 4), vec!["ab", "xxxx", "xxxx", "xx", "cd"]);
    }

    #[test]
    fn test_multibyte_safe_and_order_preserved() {
        let text = "ñññ\néééé\nóó";
        let chunks = chunk_text(text, 5);
        assert_eq!(chunks, vec!["ñññ", "éééé", "óó"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert_eq!(chunks.join("\n"), text);
    }
}
