//! Word segmentation and the case conversions built on top of it.
//!
//! Segmentation runs as a series of splitting passes. Each pass takes the
//! fragments produced by the previous one and may cut them further:
//!
//! 1. separators (space, underscore, exclamation mark)
//! 2. a lowercase letter followed by an uppercase letter (`redBlue`)
//! 3. the end of an acronym running into a word (`HTTPController`)
//! 4. every transition between digits and non-digits (`Forty40forty`)
//!
//! Empty fragments are dropped at the end. Letter-case tests are ASCII-only.

const SEPARATORS: [char; 3] = [' ', '_', '!'];

/// Splits an identifier into its word fragments.
///
/// ## Examples
///
/// ```
/// use levo_lib::transform::split_words;
///
/// assert_eq!(split_words("HTTPController"), vec!["HTTP", "Controller"]);
/// assert_eq!(split_words("Forty40forty"), vec!["Forty", "40", "forty"]);
/// ```
pub fn split_words(input: &str) -> Vec<String> {
    let words = split_on_separators(input);
    let words = split_each(words, is_lower_to_upper);
    let words = split_each(words, is_acronym_end);
    let words = split_each(words, is_digit_transition);
    words.into_iter().filter(|word| !word.is_empty()).collect()
}

/// Uppercases the first character of every fragment and joins them.
///
/// The rest of each fragment is left alone, so acronyms survive:
/// `Titlecase("HTTPController") == "HTTPController"`.
pub fn titlecase(input: &str) -> String {
    split_words(input).iter().map(|word| capitalize(word)).collect()
}

/// Like [`titlecase`], but the first fragment is lowercased entirely.
pub fn camelcase(input: &str) -> String {
    let words = split_words(input);
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };

    let mut output = first.to_lowercase();
    for word in rest {
        output.push_str(&capitalize(word));
    }
    output
}

/// Lowercases every fragment and joins them with `_`.
pub fn snakecase(input: &str) -> String {
    split_words(input).join("_").to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn split_on_separators(input: &str) -> Vec<String> {
    input
        .split(|c: char| SEPARATORS.contains(&c))
        .map(str::to_string)
        .collect()
}

fn split_each(words: Vec<String>, is_boundary: fn(&[char], usize) -> bool) -> Vec<String> {
    words
        .iter()
        .flat_map(|word| split_at_boundaries(word, is_boundary))
        .collect()
}

/// Cuts `word` in front of every index for which `is_boundary` holds.
fn split_at_boundaries(word: &str, is_boundary: fn(&[char], usize) -> bool) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut fragments = Vec::new();
    let mut start = 0;

    for index in 1..chars.len() {
        if is_boundary(&chars, index) {
            fragments.push(chars[start..index].iter().collect());
            start = index;
        }
    }
    fragments.push(chars[start..].iter().collect());
    fragments
}

fn is_lower_to_upper(chars: &[char], index: usize) -> bool {
    chars[index - 1].is_ascii_lowercase() && chars[index].is_ascii_uppercase()
}

// The last capital of an acronym belongs to the word that follows it.
fn is_acronym_end(chars: &[char], index: usize) -> bool {
    chars[index - 1].is_ascii_uppercase()
        && chars[index].is_ascii_uppercase()
        && chars
            .get(index + 1)
            .is_some_and(|next| next.is_ascii_lowercase())
}

fn is_digit_transition(chars: &[char], index: usize) -> bool {
    chars[index - 1].is_ascii_digit() != chars[index].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn split_words_counts_fragments() {
        let cases = [
            ("One", 1),
            ("One Two", 2),
            ("One Two_Three", 3),
            ("RedBlue", 2),
            ("RedBlueGreen", 3),
            ("REDBLUEGREEN", 1),
            ("HTTPController", 2),
            ("Forty40forty", 3),
            ("IPV6Address", 3),
            ("Cats_AndDogs shouldNotBEUsed4eating", 9),
        ];
        for (input, expected) in cases {
            assert_eq!(split_words(input).len(), expected, "fragments of {input:?}");
        }
    }

    #[test]
    fn split_words_drops_empty_fragments() {
        assert_eq!(split_words("__a!!b  c_"), vec!["a", "b", "c"]);
        assert!(split_words("").is_empty());
        assert!(split_words("_ !").is_empty());
    }

    #[test]
    fn snakecase_splits_acronyms() {
        assert_eq!(snakecase("HTTPController"), "http_controller");
        assert_eq!(snakecase("IPV6Address"), "ipv_6_address");
        assert_eq!(snakecase("REDBLUEGREEN"), "redbluegreen");
        assert_eq!(snakecase("One Two_Three"), "one_two_three");
        assert_eq!(
            snakecase("Cats_AndDogs shouldNotBEUsed4eating"),
            "cats_and_dogs_should_not_be_used_4_eating"
        );
    }

    #[test]
    fn titlecase_keeps_inner_casing() {
        assert_eq!(titlecase("One Two"), "OneTwo");
        assert_eq!(titlecase("HTTPController"), "HTTPController");
        assert_eq!(titlecase("Forty40forty"), "Forty40Forty");
        assert_eq!(
            titlecase("Cats_AndDogs shouldNotBEUsed4eating"),
            "CatsAndDogsShouldNotBEUsed4Eating"
        );
    }

    #[test]
    fn camelcase_lowers_whole_first_fragment() {
        assert_eq!(camelcase("One"), "one");
        assert_eq!(camelcase("RedBlueGreen"), "redBlueGreen");
        assert_eq!(camelcase("REDBLUEGREEN"), "redbluegreen");
        assert_eq!(camelcase("HTTPController"), "httpController");
        assert_eq!(camelcase("IPV6Address"), "ipv6Address");
        assert_eq!(camelcase("Forty40forty"), "forty40Forty");
    }

    #[test]
    fn camelcase_of_separators_only_is_empty() {
        assert_eq!(camelcase(""), "");
        assert_eq!(camelcase("__"), "");
    }

    proptest! {
        #[test]
        fn fragments_are_already_segmented(input in "[A-Za-z0-9_ !]{0,24}") {
            for fragment in split_words(&input) {
                prop_assert_eq!(split_words(&fragment), vec![fragment.clone()]);
            }
        }

        #[test]
        fn conversions_share_one_segmentation(input in "[A-Za-z0-9_ !]{0,24}") {
            let count = split_words(&input).len();
            let snake = snakecase(&input);
            let snake_count = if snake.is_empty() { 0 } else { snake.split('_').count() };
            prop_assert_eq!(snake_count, count);
        }
    }
}
