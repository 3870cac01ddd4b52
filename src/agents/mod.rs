//! Specialised agents the assistant dispatches a user turn to.

pub mod analyser;
pub mod examiner;
pub mod moderator;
pub mod problem_solver;
pub mod summarizer;
pub mod tutor;

use once_cell::sync::Lazy;
use regex::Regex;

/// One `<question><option>` pair such as `1a`, `2-c` or `3) b`.
pub(crate) static ANSWER_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*[-.:)]?\s*([a-d])").unwrap());

/// Parses every answer pair in `text`, upper-casing the option letter.
/// Pairs may be glued together (`1a2c`), but an option letter followed by
/// another letter is part of a word and is skipped. Later pairs for the same
/// question win.
pub(crate) fn parse_answer_pairs(text: &str) -> Vec<(u32, String)> {
    ANSWER_PAIR
        .captures_iter(text)
        .filter_map(|caps| {
            let letter = caps.get(2)?;
            if text[letter.end()..]
                .chars()
                .next()
                .is_some_and(char::is_alphabetic)
            {
                return None;
            }
            let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some((number, letter.as_str().to_uppercase()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_pairs_with_and_without_separators() {
        let expected = vec![(1, "A".to_string()), (2, "C".to_string()), (3, "B".to_string())];
        assert_eq!(parse_answer_pairs("1a2c3b"), expected);
        assert_eq!(parse_answer_pairs("1a, 2c, 3b"), expected);
        assert_eq!(parse_answer_pairs("1-A; 2)c 3. b"), expected);
        assert!(parse_answer_pairs("2 apples").is_empty());
    }
}
