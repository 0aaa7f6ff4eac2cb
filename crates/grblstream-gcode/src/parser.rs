//! Comment stripping and word tokenizing

use regex::Regex;

/// A G-code word: an upper-cased letter and the raw text of its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Word letter, upper-cased
    pub letter: char,
    /// Raw value text following the letter (may be empty)
    pub value: String,
}

impl Token {
    /// Create a token
    pub fn new(letter: char, value: impl Into<String>) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            value: value.into(),
        }
    }

    /// Numeric value of the word, if it is a well-formed number
    pub fn number(&self) -> Option<f64> {
        parse_number(&self.value)
    }

    /// G/M code scaled by ten (`G1` -> 10, `G90.1` -> 901)
    ///
    /// Scaling keeps decimal sub-codes distinct from their parents.
    pub fn code(&self) -> Option<u32> {
        let value = self.number()?;
        if value < 0.0 {
            return None;
        }
        Some((value * 10.0).round() as u32)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.letter, self.value)
    }
}

/// Parse a plain decimal number (`12`, `-3.5`, `.25`, `+4.`)
///
/// Exponents, embedded signs and empty strings are rejected rather than
/// guessed at.
pub fn parse_number(text: &str) -> Option<f64> {
    static NUMBER_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let regex = NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("invalid regex pattern")
    });

    let text = text.trim();
    if !regex.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Remove comments from a G-code line and trim it
///
/// Balanced `( ... )` groups are removed, everything from the first `;` is
/// removed, and an unbalanced `(` drops the rest of the line. Runs of
/// whitespace left behind collapse to one space.
pub fn strip_comments(line: &str) -> String {
    let mut cmd = line.to_string();

    while let Some(start) = cmd.find('(') {
        match cmd[start..].find(')') {
            Some(offset) => {
                cmd.replace_range(start..=start + offset, "");
            }
            None => {
                cmd.truncate(start);
                break;
            }
        }
    }

    if let Some(pos) = cmd.find(';') {
        cmd.truncate(pos);
    }

    cmd.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip comments from every line and drop the ones left empty
pub fn sanitize_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| strip_comments(line.as_ref()))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Split a comment-free line into letter/value words
///
/// A word is an ASCII letter followed by the run of digits, `.`, `+`, `-`,
/// `e` and `E` after it. Characters outside any word are skipped.
pub fn tokenize(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.trim().chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() {
            let mut j = i + 1;
            while j < chars.len() && is_value_char(chars[j]) {
                j += 1;
            }
            let value: String = chars[i + 1..j].iter().collect();
            tokens.push(Token::new(c, value.trim()));
            i = j;
        } else {
            i += 1;
        }
    }

    tokens
}

fn is_value_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')
}
