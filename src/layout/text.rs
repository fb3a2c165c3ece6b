//! Text helpers shared by the clusterer and the table finders.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize extracted text: expand presentation-form ligatures (ﬁ → fi),
/// then compose to NFC.
pub fn normalize_text(text: &str) -> String {
    let expanded: String = text
        .chars()
        .flat_map(|c| {
            if is_presentation_form(c) {
                c.to_string().nfkc().collect::<Vec<_>>()
            } else {
                vec![c]
            }
        })
        .collect();
    expanded.nfc().collect()
}

fn is_presentation_form(c: char) -> bool {
    // Alphabetic Presentation Forms: ﬀ ﬁ ﬂ ﬃ ﬄ ﬅ ﬆ and the Armenian ligatures
    ('\u{FB00}'..='\u{FB17}').contains(&c)
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
        // Fullwidth forms
        || (0xFF00..=0xFFEF).contains(&code)
}

/// Whether joining two pieces of text at `a`|`b` needs a word space.
pub fn needs_space(a: Option<char>, b: Option<char>) -> bool {
    match (a, b) {
        (None, _) | (_, None) => false,
        (Some(a), _) if a.is_whitespace() => false,
        (_, Some(b)) if b.is_whitespace() => false,
        (Some(a), Some(b)) => !(is_spaceless_script_char(a) && is_spaceless_script_char(b)),
    }
}

/// Append `word` to `text`, inserting a space unless both sides of the
/// junction are spaceless-script characters.
pub fn push_word(text: &mut String, word: &str) {
    if needs_space(text.chars().last(), word.chars().next()) {
        text.push(' ');
    }
    text.push_str(word);
}

/// Check if text is a bullet marker (•, -, etc.).
pub fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–"
            | "—"
            | "•"
            | "·"
            | "*"
            | "○"
            | "▪"
            | "◦"
            | "▸"
            | "▹"
            | "►"
            | "■"
            | "●"
            | "※"
            | "□"
            | "◆"
            | "◇"
            | "▶"
            | "▷"
            | "☞"
            | "➤"
            | "➜"
    )
}

fn number_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // "1.", "12)", "(3)", "a.", "B)", "iv.", bare "7"
        Regex::new(r"^(?:\(?\d{1,3}\s*[.)]|\(?[A-Za-z]\s*[.)]|\(?(?i:[ivx]{1,5})[.)]|\d{1,3})$")
            .expect("list marker pattern is a valid regex")
    })
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
pub fn is_number_marker(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && number_marker_regex().is_match(trimmed)
}

/// Check if a text string looks like a list marker (number, bullet, etc.).
pub fn is_list_marker(text: &str) -> bool {
    is_bullet_marker(text) || is_number_marker(text)
}

/// Whether a line of text opens with a list marker followed by content.
pub fn starts_with_list_marker(line: &str) -> bool {
    let line = line.trim_start();
    if let Some(first) = line.chars().next() {
        if first != '-' && first != '*' && is_bullet_marker(&first.to_string()) {
            return true;
        }
    }
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => {
            !rest.trim().is_empty() && is_list_marker(head) && !is_bare_number(head)
        }
        None => false,
    }
}

fn is_bare_number(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}
