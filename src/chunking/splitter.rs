//! Recursive character splitter with boundary preference.
//!
//! Splits text into windows of at most `size` characters, where each window
//! after the first starts `overlap` characters before the end of the
//! previous one. Within a window the cut lands on the largest available
//! boundary: paragraph break, then line break, then sentence end, then word
//! boundary, then a raw character cut.

use unicode_segmentation::UnicodeSegmentation;

/// Separators tried in order of decreasing granularity. A sentence end is
/// only recognized when followed by a space so dots inside words are left
/// alone.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", "! ", "? "];

/// Splits `text` into half-open byte spans, each at most `size` characters.
///
/// Spans are deterministic for identical input and parameters. Consecutive
/// spans share at most `overlap` characters. Callers must have validated
/// `overlap < size`.
pub(crate) fn split_spans(text: &str, size: usize, overlap: usize) -> Vec<(usize, usize)> {
    debug_assert!(overlap < size, "overlap must be validated upstream");
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every character boundary, plus the end of the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = boundaries.len() - 1;
    if total_chars <= size {
        return vec![(0, text.len())];
    }

    let mut spans = Vec::new();
    let mut start_char = 0usize;
    loop {
        let end_char = (start_char + size).min(total_chars);
        let start_byte = boundaries[start_char];
        let end_byte = boundaries[end_char];
        if end_char == total_chars {
            spans.push((start_byte, end_byte));
            break;
        }

        // A cut inside the region shared with the previous window would
        // stall the walk, so boundaries are only accepted past it.
        let min_cut_byte = boundaries[start_char + overlap + 1];
        let cut_byte = find_break(text, start_byte, end_byte, min_cut_byte);
        spans.push((start_byte, cut_byte));

        // cut_byte always sits on a character boundary.
        let cut_char = boundaries.partition_point(|offset| *offset < cut_byte);
        start_char = cut_char.saturating_sub(overlap).max(start_char + 1);
    }
    spans
}

/// Splits `text` into chunk strings, trimming surrounding whitespace and
/// dropping chunks that trim to nothing.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    split_spans(text, size, overlap)
        .into_iter()
        .map(|(start, end)| text[start..end].trim())
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Picks the cut position inside `(min_cut, end]`, preferring the largest
/// semantic boundary closest to the window end.
fn find_break(text: &str, start: usize, end: usize, min_cut: usize) -> usize {
    let window = &text[start..end];
    for separator in SEPARATORS {
        if let Some(position) = window.rfind(separator) {
            let cut = start + position + separator.len();
            if position > 0 && cut >= min_cut {
                return cut;
            }
        }
    }
    if let Some(cut) = window
        .split_word_bound_indices()
        .map(|(position, _)| start + position)
        .filter(|cut| *cut >= min_cut && *cut > start)
        .next_back()
    {
        return cut;
    }
    end
}
