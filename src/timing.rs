//! Word timing estimation.
//!
//! The model never sees real prosody: each word gets a slice of the total
//! duration proportional to its character count, and separators (whitespace,
//! punctuation) take no time at all. This is an approximation and callers
//! should treat it as such.

use serde::{Deserialize, Serialize};

/// A contiguous run of text, either a word or a separator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextToken {
    /// Ordinal position in the token sequence.
    pub id: usize,
    pub text: String,
    pub is_word: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl TextToken {
    /// Character count used to share out the duration. Separators weigh nothing.
    pub fn weight(&self) -> usize {
        if self.is_word {
            self.text.chars().count()
        } else {
            0
        }
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => self.is_word && start <= t && t < end,
            _ => false,
        }
    }
}

/// Whether `ch` belongs inside a word.
///
/// Letters, digits and underscore count, as do combining marks and the
/// Brahmic script blocks, so that Tamil or Devanagari words with vowel signs
/// and viramas stay whole.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || is_combining(ch) || is_brahmic_letter(ch)
}

fn is_combining(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F
            | 0x0483..=0x0489
            | 0x0591..=0x05BD
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x200C..=0x200D
            | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F
    )
}

fn is_brahmic_letter(ch: char) -> bool {
    // Devanagari through Sinhala, minus the danda marks.
    matches!(ch as u32, 0x0900..=0x0DFF) && !matches!(ch, '\u{0964}' | '\u{0965}' | '\u{0970}' | '\u{0DF4}')
}

/// Split `text` into maximal runs of word and non-word characters.
///
/// Concatenating the `text` of the result reproduces the input exactly.
pub fn tokenize(text: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();
    let mut run_start = 0usize;
    let mut run_is_word: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let word = is_word_char(ch);
        match run_is_word {
            Some(current) if current == word => {}
            Some(current) => {
                push_token(&mut tokens, &text[run_start..idx], current);
                run_start = idx;
                run_is_word = Some(word);
            }
            None => run_is_word = Some(word),
        }
    }

    if let Some(current) = run_is_word {
        push_token(&mut tokens, &text[run_start..], current);
    }

    tokens
}

fn push_token(tokens: &mut Vec<TextToken>, text: &str, is_word: bool) {
    tokens.push(TextToken {
        id: tokens.len(),
        text: text.to_string(),
        is_word,
        start: None,
        end: None,
    });
}

/// Tokenize `text` and spread `total_duration` seconds across its words.
///
/// A non-positive duration collapses every word to `[0, 0)`. Text with no
/// words yields only untimed separators.
pub fn estimate(text: &str, total_duration: f64) -> Vec<TextToken> {
    let mut tokens = tokenize(text);
    let total_weight: usize = tokens.iter().map(TextToken::weight).sum();
    if total_weight == 0 {
        return tokens;
    }

    let duration = if total_duration.is_finite() {
        total_duration.max(0.0)
    } else {
        0.0
    };
    let last_word = tokens.iter().rposition(|t| t.is_word);

    let mut cursor = 0.0f64;
    for (idx, token) in tokens.iter_mut().enumerate() {
        if !token.is_word {
            continue;
        }
        let share = duration * token.weight() as f64 / total_weight as f64;
        let end = if Some(idx) == last_word {
            duration
        } else {
            cursor + share
        };
        token.start = Some(cursor);
        token.end = Some(end);
        cursor = end;
    }

    tokens
}

/// An immutable token sequence with an index over its timed words.
///
/// Lookups binary-search the word end times, so a frame costs `O(log n)`
/// while keeping the first-match, half-open semantics of a linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    tokens: Vec<TextToken>,
    /// Indices into `tokens` of timed words, in sequence order.
    words: Vec<usize>,
}

impl Timeline {
    pub fn new(tokens: Vec<TextToken>) -> Self {
        let words = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_word && t.start.is_some() && t.end.is_some())
            .map(|(i, _)| i)
            .collect();
        Self { tokens, words }
    }

    /// Build a timeline for `text` spoken over `total_duration` seconds.
    pub fn estimate(text: &str, total_duration: f64) -> Self {
        Self::new(estimate(text, total_duration))
    }

    pub fn tokens(&self) -> &[TextToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// End of the last timed word, or 0 when there is none.
    pub fn end(&self) -> f64 {
        self.words
            .last()
            .and_then(|&i| self.tokens[i].end)
            .unwrap_or(0.0)
    }

    /// The id of the first word with `start <= t < end`, if any.
    pub fn token_at(&self, t: f64) -> Option<usize> {
        if t.is_nan() {
            return None;
        }
        // Ends are non-decreasing, so the first word ending after `t` is the
        // only one that can contain it.
        let pos = self
            .words
            .partition_point(|&i| self.tokens[i].end.unwrap_or(0.0) <= t);
        let token = &self.tokens[*self.words.get(pos)?];
        token.contains(t).then_some(token.id)
    }

    /// The reconstructed source text.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[TextToken]) -> Vec<&TextToken> {
        tokens.iter().filter(|t| t.is_word).collect()
    }

    #[test]
    fn splits_words_and_separators() {
        let tokens = tokenize("Hello, world!");
        let parts: Vec<(&str, bool)> = tokens.iter().map(|t| (t.text.as_str(), t.is_word)).collect();
        assert_eq!(
            parts,
            vec![("Hello", true), (", ", false), ("world", true), ("!", false)]
        );
        assert_eq!(tokens.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn concatenation_reconstructs_the_input() {
        let inputs = [
            "",
            "...!?",
            "  leading and trailing  ",
            "Hello, world!",
            "வணக்கம்! நீங்கள் எப்படி இருக்கிறீர்கள்?",
            "naïve café — 東京 2024_v2",
        ];
        for input in inputs {
            let timeline = Timeline::estimate(input, 3.0);
            assert_eq!(timeline.text(), input);
        }
    }

    #[test]
    fn tamil_words_stay_whole() {
        let tokens = tokenize("வணக்கம்! நீங்கள்");
        let w: Vec<&str> = words(&tokens).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(w, vec!["வணக்கம்", "நீங்கள்"]);
    }

    #[test]
    fn hello_world_splits_evenly() {
        let tokens = estimate("Hello, world!", 1.0);
        let hello = &tokens[0];
        let world = &tokens[2];
        assert_eq!(hello.text, "Hello");
        assert_eq!((hello.start, hello.end), (Some(0.0), Some(0.5)));
        assert_eq!(world.text, "world");
        assert_eq!((world.start, world.end), (Some(0.5), Some(1.0)));
        for sep in [&tokens[1], &tokens[3]] {
            assert!(!sep.is_word);
            assert_eq!((sep.start, sep.end), (None, None));
        }
    }

    #[test]
    fn durations_are_proportional_to_length() {
        let tokens = estimate("a bbb", 2.0);
        assert_eq!(tokens[0].end, Some(0.5));
        assert_eq!(tokens[2].start, Some(0.5));
        assert_eq!(tokens[2].end, Some(2.0));
    }

    #[test]
    fn timings_are_monotonic_and_end_at_duration() {
        let text = "Once upon a time, in a digital realm far away, a little code snippet dreamed.";
        let duration = 7.3;
        let tokens = estimate(text, duration);
        let mut last = 0.0;
        for t in words(&tokens) {
            let (start, end) = (t.start.unwrap(), t.end.unwrap());
            assert!(start >= last);
            assert!(end >= start);
            last = end;
        }
        assert!((last - duration).abs() < 1e-9);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(estimate("", 1.0).is_empty());
    }

    #[test]
    fn punctuation_only_text_is_untimed() {
        let tokens = estimate(" ,.!? ", 2.0);
        assert_eq!(tokens.len(), 1);
        assert!(!tokens[0].is_word);
        assert_eq!(tokens[0].start, None);
    }

    #[test]
    fn non_positive_duration_collapses_to_zero() {
        for duration in [0.0, -1.0, f64::NAN] {
            for t in words(&estimate("two words", duration)) {
                assert_eq!((t.start, t.end), (Some(0.0), Some(0.0)));
            }
        }
    }

    #[test]
    fn lookup_uses_half_open_intervals() {
        let timeline = Timeline::estimate("ab cd", 2.0);
        assert_eq!(timeline.token_at(0.0), Some(0));
        assert_eq!(timeline.token_at(0.5), Some(0));
        assert_eq!(timeline.token_at(1.0), Some(2));
        assert_eq!(timeline.token_at(1.999), Some(2));
        assert_eq!(timeline.token_at(2.0), None);
        assert_eq!(timeline.token_at(-0.1), None);
        assert_eq!(timeline.end(), 2.0);
    }

    #[test]
    fn lookup_matches_linear_scan() {
        let timeline = Timeline::estimate("The quick, brown fox; jumps over the lazy dog.", 4.0);
        let mut t = -0.05;
        while t < 4.2 {
            let linear = timeline.tokens().iter().find(|tok| tok.contains(t)).map(|tok| tok.id);
            assert_eq!(timeline.token_at(t), linear, "t = {t}");
            t += 0.01;
        }
    }

    #[test]
    fn serializes_with_camel_case_and_omits_missing_times() {
        let tokens = estimate("Hi!", 1.0);
        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json[0]["isWord"], true);
        assert_eq!(json[0]["end"], 1.0);
        assert!(json[1].get("start").is_none());
    }
}
