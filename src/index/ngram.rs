//! N-gram decomposition
//!
//! Splits text into overlapping fixed-length character windows. The same
//! scheme runs at build time over logical text and at query time over the
//! search phrase, so offsets line up between the two. No case folding and
//! no word tokenization: grams are exact substrings of the stored text.

/// One gram with its starting character offset in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gram<'a> {
    /// The gram's characters
    pub text: &'a str,
    /// Starting character offset in the source
    pub offset: usize,
}

/// Split `text` into overlapping grams of `n` characters.
///
/// Text shorter than `n` (but non-empty) yields a single gram covering
/// the whole string, so short stored values remain findable.
pub fn grams(text: &str, n: usize) -> Vec<Gram<'_>> {
    debug_assert!(n > 0);
    // Char boundaries plus the end of the string
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    if char_count == 0 {
        return Vec::new();
    }
    if char_count < n {
        return vec![Gram { text, offset: 0 }];
    }
    (0..=char_count - n)
        .map(|i| Gram {
            text: &text[bounds[i]..bounds[i + n]],
            offset: i,
        })
        .collect()
}
