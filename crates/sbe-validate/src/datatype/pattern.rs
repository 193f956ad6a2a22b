//! Translation of XML Schema regular expressions to `regex` syntax.
//!
//! XML Schema patterns are implicitly anchored, treat `^` and `$` as
//! literals, add the `\i`/`\c` name-character escapes and write class
//! subtraction as `[a-z-[aeiou]]`.

use regex::Regex;

const NAME_START: &str = r"\p{L}_:";
const NAME_CHAR: &str = r"\p{L}\p{N}\p{M}._:\-";

/// Rewrite one XML Schema pattern as an unanchored `regex` expression.
pub fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();
    let mut depth = 0usize;
    let mut dash = false;
    while let Some(c) = chars.next() {
        let was_dash = dash;
        dash = false;
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push_str(r"\\");
                    break;
                };
                match (escaped, depth > 0) {
                    ('i', true) => out.push_str(NAME_START),
                    ('i', false) => out.push_str(&format!("[{NAME_START}]")),
                    ('c', true) => out.push_str(NAME_CHAR),
                    ('c', false) => out.push_str(&format!("[{NAME_CHAR}]")),
                    ('I', false) => out.push_str(&format!("[^{NAME_START}]")),
                    ('C', false) => out.push_str(&format!("[^{NAME_CHAR}]")),
                    // Negated name classes cannot be nested; approximate.
                    ('I' | 'C', true) => out.push_str(r"\P{L}"),
                    (other, _) => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '[' if depth > 0 && was_dash => {
                out.pop();
                out.push_str("--[");
                depth += 1;
            }
            '[' => {
                out.push('[');
                depth += 1;
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if depth > 0 => {
                depth -= 1;
                out.push(']');
            }
            '^' | '$' if depth == 0 => {
                out.push('\\');
                out.push(c);
            }
            '&' | '~' if depth > 0 => {
                out.push('\\');
                out.push(c);
            }
            '-' if depth > 0 => {
                out.push('-');
                dash = true;
            }
            _ => out.push(c),
        }
    }
    out
}

/// Compile the alternatives of one derivation step into a single anchored
/// expression; a value is accepted when any alternative matches.
pub fn compile(alternatives: &[String]) -> Result<Regex, regex::Error> {
    let body = alternatives
        .iter()
        .map(|pattern| format!("(?:{})", translate(pattern)))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^(?:{body})$"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, value: &str) -> bool {
        compile(&[pattern.to_string()]).unwrap().is_match(value)
    }

    #[test]
    fn patterns_are_anchored() {
        assert!(matches("[A-Za-z_][A-Za-z0-9_]*", "messageHeader"));
        assert!(!matches("[A-Za-z_][A-Za-z0-9_]*", "1st"));
        assert!(!matches("[a-z]+", "abc def"));
    }

    #[test]
    fn anchors_are_literal() {
        assert!(matches("a$b", "a$b"));
        assert!(matches("^x", "^x"));
    }

    #[test]
    fn class_subtraction() {
        assert_eq!(translate("[a-z-[aeiou]]"), "[a-z--[aeiou]]");
        assert!(matches("[a-z-[aeiou]]+", "xyz"));
        assert!(!matches("[a-z-[aeiou]]+", "xaz"));
    }

    #[test]
    fn name_escapes() {
        assert!(matches(r"\i\c*", "sbe:message-1"));
        assert!(!matches(r"\i\c*", "1sbe"));
    }

    #[test]
    fn alternatives_from_one_step_are_ored() {
        let regex = compile(&["[0-9]+".to_string(), "N/A".to_string()]).unwrap();
        assert!(regex.is_match("42"));
        assert!(regex.is_match("N/A"));
        assert!(!regex.is_match("42N/A"));
    }
}
