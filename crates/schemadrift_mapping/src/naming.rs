//! Identifier conversion from camel case to snake case.
//!
//! Words are split at every lower-case-or-digit to upper-case transition.
//! Digits stay attached to the word they follow. When an identifier turns out
//! to be a single word, a leading acronym is split from a trailing capitalised
//! word (`URLPath` -> `url_path`); inside multi-word identifiers acronyms are
//! kept intact (`XMLHttpRequest` -> `xmlhttp_request`).
//!
//! The conversion is pure and idempotent on its own output.

/// Convert a camel-case identifier to lower snake case.
///
/// Empty input yields empty output. Existing underscores are preserved and
/// never doubled.
pub fn convert(identifier: &str) -> String {
    if identifier.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = identifier.chars().collect();
    let mut words = camel_words(&chars);
    if words.len() == 1 {
        words = split_leading_acronym(words.remove(0));
    }

    let joined: String = words
        .iter()
        .map(|w| w.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("_");
    joined.to_lowercase()
}

fn camel_words(chars: &[char]) -> Vec<Vec<char>> {
    let mut words = Vec::new();
    let mut current: Vec<char> = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    words.push(current);
    words
}

fn split_leading_acronym(word: Vec<char>) -> Vec<Vec<char>> {
    for i in 1..word.len().saturating_sub(1) {
        if word[i - 1].is_ascii_uppercase()
            && word[i].is_ascii_uppercase()
            && word[i + 1].is_ascii_lowercase()
        {
            return vec![word[..i].to_vec(), word[i..].to_vec()];
        }
    }
    vec![word]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_camel_case() {
        assert_eq!(convert("firstName"), "first_name");
        assert_eq!(convert("getName"), "get_name");
        assert_eq!(convert("Customer"), "customer");
        assert_eq!(convert("OrderLineItem"), "order_line_item");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(convert("XMLHttpRequest"), "xmlhttp_request");
        assert_eq!(convert("HTMLParser"), "html_parser");
        assert_eq!(convert("URLPath"), "url_path");
        assert_eq!(convert("setURL"), "set_url");
        assert_eq!(convert("userID"), "user_id");
    }

    #[test]
    fn test_acronyms_inside_multi_word_identifiers_stay_whole() {
        assert_eq!(convert("userIDNumber"), "user_idnumber");
        assert_eq!(convert("myHTMLParser"), "my_htmlparser");
        assert_eq!(convert("parseXMLFile2"), "parse_xmlfile2");
        // a trailing acronym is still its own word
        assert_eq!(convert("customerHTML"), "customer_html");
        // single word: the leading acronym splits
        assert_eq!(convert("IOStream"), "io_stream");
    }

    #[test]
    fn test_digits() {
        assert_eq!(convert("firstName2"), "first_name2");
        assert_eq!(convert("version2Beta3"), "version2_beta3");
        assert_eq!(convert("line1"), "line1");
    }

    #[test]
    fn test_empty_and_already_snake() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("first_name"), "first_name");
        assert_eq!(convert("first_Name"), "first_name");
        assert_eq!(convert("ID"), "id");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "XMLHttpRequest",
            "HTMLParser",
            "userIDNumber",
            "version2Beta3",
            "homeAddress",
            "A",
        ] {
            let once = convert(input);
            assert_eq!(convert(&once), once, "not idempotent for {input}");
        }
    }
}
