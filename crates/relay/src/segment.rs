//! Splitting a final answer into chat-sized markdown blocks.

use threadrelay_core::render::Block;

/// Split `text` into markdown blocks of at most `max_block_chars` characters,
/// grouped into messages of at most `max_blocks_per_message` blocks.
///
/// Paragraph breaks are preferred, then line breaks, then a hard cut.
/// Whitespace-only pieces are dropped, so an empty answer yields no messages.
pub fn segment_markdown(text: &str, max_block_chars: usize, max_blocks_per_message: usize) -> Vec<Vec<Block>> {
    let max_block_chars = max_block_chars.max(1);
    let max_blocks_per_message = max_blocks_per_message.max(1);

    let blocks: Vec<Block> = split(text, &["\n\n", "\n"], max_block_chars)
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .map(Block::markdown)
        .collect();

    blocks
        .chunks(max_blocks_per_message)
        .map(<[Block]>::to_vec)
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split(text: &str, separators: &[&str], max: usize) -> Vec<String> {
    if char_len(text) <= max {
        return vec![text.to_string()];
    }
    let Some((sep, finer)) = separators.split_first() else {
        return hard_split(text, max);
    };

    let mut pieces = Vec::new();
    let mut current = String::new();
    for part in text.split(sep) {
        let joined_len = if current.is_empty() {
            char_len(part)
        } else {
            char_len(&current) + char_len(sep) + char_len(part)
        };
        if joined_len <= max {
            if !current.is_empty() {
                current.push_str(sep);
            }
            current.push_str(part);
            continue;
        }

        if !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        if char_len(part) <= max {
            current.push_str(part);
        } else {
            pieces.extend(split(part, finer, max));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn hard_split(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(groups: &[Vec<Block>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|b| b.text().to_string()).collect())
            .collect()
    }

    #[test]
    fn short_answer_is_one_block() {
        let groups = segment_markdown("*Jane Doe* is CTO at Acme.", 3000, 50);
        assert_eq!(texts(&groups), vec![vec!["*Jane Doe* is CTO at Acme.".to_string()]]);
    }

    #[test]
    fn empty_answer_yields_nothing() {
        assert!(segment_markdown("", 3000, 50).is_empty());
        assert!(segment_markdown("  \n\n ", 3000, 50).is_empty());
    }

    #[test]
    fn paragraphs_are_packed_up_to_the_limit() {
        let groups = segment_markdown("aaaa\n\nbbbb\n\ncccc", 10, 50);
        assert_eq!(texts(&groups), vec![vec!["aaaa\n\nbbbb".to_string(), "cccc".to_string()]]);
    }

    #[test]
    fn long_paragraph_falls_back_to_lines() {
        let groups = segment_markdown("line one\nline two\nline three", 18, 50);
        assert_eq!(
            texts(&groups),
            vec![vec!["line one\nline two".to_string(), "line three".to_string()]]
        );
    }

    #[test]
    fn long_line_is_cut_on_char_boundaries() {
        let groups = segment_markdown("ééééé", 2, 50);
        assert_eq!(texts(&groups), vec![vec!["éé".to_string(), "éé".to_string(), "é".to_string()]]);
    }

    #[test]
    fn no_block_exceeds_the_limit_and_nothing_is_lost() {
        let text = (0..40)
            .map(|i| format!("Paragraph {i} with a few words of content.\nAnd a second line."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let groups = segment_markdown(&text, 120, 50);
        for block in groups.iter().flatten() {
            assert!(block.text().chars().count() <= 120);
        }
        let rejoined: String = groups.iter().flatten().map(|b| b.text()).collect::<Vec<_>>().join("\n\n");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn blocks_are_grouped_per_message() {
        let text = vec!["x"; 7].join("\n\n");
        let groups = segment_markdown(&text, 1, 3);
        let sizes: Vec<_> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }
}
