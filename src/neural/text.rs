// projeto: rnnwindow
// file: src/neural/text.rs
// Text cleaning, strided character windows and one-hot encoding

use std::collections::{BTreeSet, HashMap};

use log::debug;
use ndarray::{Array2, Array3};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::neural::utils::WindowError;

// Anything that is not an English letter or one of . , - ' "
// U+0130/U+0131 are listed since they count as case variants of `i` in the cleaner this mirrors.
static NON_ENGLISH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)[^a-z\x{130}\x{131}.,\-'"]+"#).expect("static pattern compiles")
});

/// Replaces every run of characters outside `a-z`, `A-Z` and `. , - ' "`
/// with a single space.
pub fn clean_text(text: &str) -> String {
    NON_ENGLISH.replace_all(text, " ").into_owned()
}

/// Windowed text ready for a character model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextDataset {
    pub window_size: usize,
    pub step_size: usize,
    pub inputs: Vec<String>,
    pub outputs: String,
}

impl TextDataset {
    pub fn from_text(text: &str, window_size: usize, step_size: usize) -> Result<Self, WindowError> {
        let (inputs, outputs) = window_transform_text(text, window_size, step_size)?;
        Ok(TextDataset { window_size, step_size, inputs, outputs })
    }
}

/// Cuts `text` into windows of `window_size` characters starting every
/// `step_size` characters, and collects the targets as every
/// `step_size`-th character from index `window_size` on.
///
/// Indices count Unicode scalar values, not bytes. The two outputs are
/// produced independently and are not trimmed to a common length.
pub fn window_transform_text(
    text: &str,
    window_size: usize,
    step_size: usize,
) -> Result<(Vec<String>, String), WindowError> {
    if step_size == 0 {
        return Err(WindowError::InvalidStepSize(step_size));
    }

    let chars: Vec<char> = text.chars().collect();
    let last_start = chars.len().saturating_sub(window_size);

    let inputs: Vec<String> = (0..last_start)
        .step_by(step_size)
        .map(|i| chars[i..i + window_size].iter().collect())
        .collect();

    let outputs: String = chars.iter().skip(window_size).step_by(step_size).collect();

    debug!("🔧 [Text] {} chars, window {}, step {} -> {} inputs / {} outputs",
           chars.len(), window_size, step_size, inputs.len(), outputs.chars().count());
    Ok((inputs, outputs))
}

/// Sorted set of characters with index lookups in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct CharVocabulary {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl CharVocabulary {
    pub fn from_text(text: &str) -> Self {
        let unique: BTreeSet<char> = text.chars().collect();
        Self::from_chars(unique.into_iter().collect())
    }

    fn from_chars(chars: Vec<char>) -> Self {
        let index = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        CharVocabulary { chars, index }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn index_of(&self, c: char) -> Result<usize, WindowError> {
        self.index.get(&c).copied().ok_or(WindowError::UnknownCharacter(c))
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

/// One-hot encodes window/target pairs for the character model.
///
/// `X` is `(N, window_size, vocab)` and `y` is `(N, vocab)`.
pub fn encode_io_pairs(
    inputs: &[String],
    outputs: &str,
    vocab: &CharVocabulary,
) -> Result<(Array3<f64>, Array2<f64>), WindowError> {
    let targets: Vec<char> = outputs.chars().collect();
    if targets.len() != inputs.len() {
        return Err(WindowError::Shape(format!(
            "{} input windows but {} output characters", inputs.len(), targets.len()
        )));
    }

    let window_size = inputs.first().map(|w| w.chars().count()).unwrap_or(0);
    let num_chars = vocab.len();
    let mut x = Array3::zeros((inputs.len(), window_size, num_chars));
    let mut y = Array2::zeros((inputs.len(), num_chars));

    for (i, (window, &target)) in inputs.iter().zip(targets.iter()).enumerate() {
        let window: Vec<char> = window.chars().collect();
        if window.len() != window_size {
            return Err(WindowError::Shape(format!(
                "window {} has {} characters, expected {}", i, window.len(), window_size
            )));
        }
        for (t, &c) in window.iter().enumerate() {
            x[[i, t, vocab.index_of(c)?]] = 1.0;
        }
        y[[i, vocab.index_of(target)?]] = 1.0;
    }

    debug!("🔧 [Text] Encoded {} pairs over {} characters", inputs.len(), num_chars);
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_replaces_runs() {
        assert_eq!(clean_text("Hello123 World!"), "Hello World ");
        assert_eq!(clean_text("it's \"fine\", really - ok."), "it's \"fine\", really - ok.");
        assert_eq!(clean_text("à la carte"), " la carte");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_clean_text_keeps_dotted_and_dotless_i() {
        assert_eq!(clean_text("ı"), "ı");
        assert_eq!(clean_text("İ"), "İ");
        assert_eq!(clean_text("İstanbul, ılık!"), "İstanbul, ılık ");
        assert_eq!(clean_text("\u{212A}elvin"), "\u{212A}elvin");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let samples = [
            "Hello123 World!",
            "  multiple   spaces\tand\nnewlines  ",
            "MiXeD case; with: punctuation? & symbols #1",
            "ÜBER naïve café",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn test_text_windows_with_stride() {
        let (inputs, outputs) = window_transform_text("abcdefgh", 3, 2).unwrap();
        assert_eq!(inputs, vec!["abc", "cde", "efg"]);
        assert_eq!(outputs, "dfh");
    }

    #[test]
    fn test_text_windows_unit_stride() {
        let (inputs, outputs) = window_transform_text("abcdef", 2, 1).unwrap();
        assert_eq!(inputs, vec!["ab", "bc", "cd", "de"]);
        assert_eq!(outputs, "cdef");
    }

    #[test]
    fn test_text_targets_follow_windows() {
        let text = "the quick brown fox jumps over the lazy dog";
        let chars: Vec<char> = text.chars().collect();
        for step in 1..6 {
            let (inputs, outputs) = window_transform_text(text, 5, step).unwrap();
            let outputs: Vec<char> = outputs.chars().collect();
            assert_eq!(inputs.len(), outputs.len());
            for (k, window) in inputs.iter().enumerate() {
                let start = k * step;
                let expected: String = chars[start..start + 5].iter().collect();
                assert_eq!(window, &expected);
                assert_eq!(outputs[k], chars[start + 5]);
            }
        }
    }

    #[test]
    fn test_text_input_and_output_counts_agree() {
        let alphabet = "abcdefghijklmnopqrstuvwxyz";
        for len in 0..=alphabet.len() {
            let text = &alphabet[..len];
            for window in 0..=len + 2 {
                for step in 1..=7 {
                    let (inputs, outputs) = window_transform_text(text, window, step).unwrap();
                    assert_eq!(inputs.len(), outputs.chars().count(),
                               "len {} window {} step {}", len, window, step);
                }
            }
        }
    }

    #[test]
    fn test_text_window_too_large() {
        let (inputs, outputs) = window_transform_text("abc", 3, 1).unwrap();
        assert!(inputs.is_empty());
        assert!(outputs.is_empty());

        let (inputs, outputs) = window_transform_text("abc", 7, 2).unwrap();
        assert!(inputs.is_empty());
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_text_windows_count_chars_not_bytes() {
        let (inputs, outputs) = window_transform_text("çãoéü", 2, 1).unwrap();
        assert_eq!(inputs, vec!["çã", "ão", "oé"]);
        assert_eq!(outputs, "oéü");
    }

    #[test]
    fn test_zero_step_is_rejected() {
        let result = window_transform_text("abcdef", 2, 0);
        assert!(matches!(result, Err(WindowError::InvalidStepSize(0))));
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let vocab = CharVocabulary::from_text("banana split");
        assert_eq!(vocab.chars(), &[' ', 'a', 'b', 'i', 'l', 'n', 'p', 's', 't']);
        assert_eq!(vocab.index_of('b').unwrap(), 2);
        assert_eq!(vocab.char_at(0), Some(' '));
        assert!(matches!(vocab.index_of('z'), Err(WindowError::UnknownCharacter('z'))));
    }

    #[test]
    fn test_encode_io_pairs_one_hot() {
        let text = "abcabcab";
        let vocab = CharVocabulary::from_text(text);
        let (inputs, outputs) = window_transform_text(text, 3, 1).unwrap();
        let (x, y) = encode_io_pairs(&inputs, &outputs, &vocab).unwrap();

        assert_eq!(x.dim(), (5, 3, 3));
        assert_eq!(y.dim(), (5, 3));
        for i in 0..5 {
            for t in 0..3 {
                assert_eq!(x.slice(ndarray::s![i, t, ..]).sum(), 1.0);
            }
            assert_eq!(y.row(i).sum(), 1.0);
        }
        // first window "abc" -> 'a'
        assert_eq!(x[[0, 1, 1]], 1.0);
        assert_eq!(y[[0, 0]], 1.0);
    }

    #[test]
    fn test_encode_rejects_mismatched_lengths() {
        let vocab = CharVocabulary::from_text("abc");
        let inputs = vec!["ab".to_string(), "bc".to_string()];
        assert!(matches!(encode_io_pairs(&inputs, "c", &vocab), Err(WindowError::Shape(_))));

        let ragged = vec!["ab".to_string(), "b".to_string()];
        assert!(matches!(encode_io_pairs(&ragged, "cc", &vocab), Err(WindowError::Shape(_))));
    }

    #[test]
    fn test_dataset_from_text() {
        let dataset = TextDataset::from_text("hello world", 4, 3).unwrap();
        assert_eq!(dataset.inputs, vec!["hell", "lo w", "worl"]);
        assert_eq!(dataset.outputs, "ood");
    }
}
