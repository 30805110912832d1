//! Window rules.
//!
//! Declared as `rule owner="…" name="…" except="…" properties={…}` lines.
//! Owner, name and except patterns are regexes matched against the whole
//! string. Rules run when a window is first discovered and their outcome
//! gates whether the window is tiled at all.

use regex::Regex;
use thiserror::Error;

use crate::sys::window_server::DisplayId;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleProperties {
    pub float: Option<bool>,
    pub display: Option<DisplayId>,
    /// 1-based desktop index on the target display.
    pub space: Option<u32>,
    /// `Some(true)` = parked in the scratchpad but visible, `Some(false)` =
    /// parked hidden.
    pub scratchpad_visible: Option<bool>,
    pub role: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub owner: Option<Regex>,
    pub name: Option<Regex>,
    pub except: Option<Regex>,
    pub properties: RuleProperties,
}

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("expected '=' after '{0}'")]
    MissingEquals(String),
    #[error("expected a quoted value for '{0}'")]
    MissingValue(String),
    #[error("unterminated properties block")]
    UnterminatedBlock,
    #[error("unknown rule key '{0}'")]
    UnknownKey(String),
    #[error("invalid regex for '{key}': {message}")]
    BadPattern { key: String, message: String },
    #[error("invalid value '{value}' for '{key}'")]
    BadValue { key: String, value: String },
    #[error("rule matches nothing (owner, name, or except required)")]
    Vacuous,
}

impl Rule {
    pub fn matches(&self, app_name: &str, title: Option<&str>) -> bool {
        if let Some(owner) = &self.owner
            && !owner.is_match(app_name)
        {
            return false;
        }
        if let Some(name) = &self.name {
            match title {
                Some(title) if name.is_match(title) => {}
                _ => return false,
            }
        }
        if let Some(except) = &self.except
            && let Some(title) = title
            && except.is_match(title)
        {
            return false;
        }
        true
    }
}

/// Effective outcome of running every matching rule over a window, in
/// declaration order (later rules win on conflicts, kept from the original
/// behavior).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleOutcome {
    pub float: bool,
    pub display: Option<DisplayId>,
    pub space: Option<u32>,
    pub scratchpad: Option<bool>,
    pub role: Option<String>,
}

pub fn apply_rules(rules: &[Rule], app_name: &str, title: Option<&str>) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();
    for rule in rules {
        if !rule.matches(app_name, title) {
            continue;
        }
        if let Some(float) = rule.properties.float {
            outcome.float = float;
        }
        if rule.properties.display.is_some() {
            outcome.display = rule.properties.display;
        }
        if rule.properties.space.is_some() {
            outcome.space = rule.properties.space;
        }
        if rule.properties.scratchpad_visible.is_some() {
            outcome.scratchpad = rule.properties.scratchpad_visible;
        }
        if rule.properties.role.is_some() {
            outcome.role = rule.properties.role.clone();
        }
    }
    outcome
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Scanner<'a> { Scanner { text, pos: 0 } }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == ';' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> { self.text[self.pos..].chars().next() }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        if self.pos > start { Some(&self.text[start..self.pos]) } else { None }
    }

    fn quoted_value(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let quote = self.peek()?;
        if quote != '"' && quote != '\'' {
            // Unquoted values run to the next delimiter.
            let start = self.pos;
            while let Some(ch) = self.peek() {
                if ch.is_whitespace() || ch == ';' || ch == '}' {
                    break;
                }
                self.pos += ch.len_utf8();
            }
            return if self.pos > start { Some(&self.text[start..self.pos]) } else { None };
        }
        self.pos += 1;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == quote {
                let value = &self.text[start..self.pos];
                self.pos += 1;
                return Some(value);
            }
            self.pos += ch.len_utf8();
        }
        None
    }
}

fn parse_pattern(key: &str, value: &str) -> Result<Regex, RuleError> {
    Regex::new(&format!("^(?:{value})$")).map_err(|err| RuleError::BadPattern {
        key: key.to_string(),
        message: err.to_string(),
    })
}

fn parse_properties(scanner: &mut Scanner) -> Result<RuleProperties, RuleError> {
    let mut properties = RuleProperties::default();
    loop {
        scanner.skip_whitespace();
        if scanner.eat('}') {
            return Ok(properties);
        }
        let Some(key) = scanner.identifier() else {
            return Err(RuleError::UnterminatedBlock);
        };
        if !scanner.eat('=') {
            return Err(RuleError::MissingEquals(key.to_string()));
        }
        let value = scanner.quoted_value().ok_or_else(|| RuleError::MissingValue(key.to_string()))?;
        match key {
            "float" => match value {
                "true" => properties.float = Some(true),
                "false" => properties.float = Some(false),
                other => {
                    return Err(RuleError::BadValue {
                        key: key.to_string(),
                        value: other.to_string(),
                    });
                }
            },
            "display" => {
                properties.display =
                    Some(value.parse().map_err(|_| RuleError::BadValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?)
            }
            "space" => {
                properties.space = Some(value.parse().map_err(|_| RuleError::BadValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })?)
            }
            "scratchpad" => match value {
                "visible" => properties.scratchpad_visible = Some(true),
                "hidden" => properties.scratchpad_visible = Some(false),
                other => {
                    return Err(RuleError::BadValue {
                        key: key.to_string(),
                        value: other.to_string(),
                    });
                }
            },
            "role" => properties.role = Some(value.to_string()),
            other => return Err(RuleError::UnknownKey(other.to_string())),
        }
    }
}

/// Parses a rule declaration, e.g.
/// `owner="iTerm2" properties={float="true"}`.
pub fn parse_rule(text: &str) -> Result<Rule, RuleError> {
    let mut scanner = Scanner::new(text);
    let mut rule = Rule {
        owner: None,
        name: None,
        except: None,
        properties: RuleProperties::default(),
    };

    loop {
        scanner.skip_whitespace();
        if scanner.peek().is_none() {
            break;
        }
        let Some(key) = scanner.identifier() else {
            return Err(RuleError::UnknownKey(scanner.text[scanner.pos..].to_string()));
        };
        if !scanner.eat('=') {
            return Err(RuleError::MissingEquals(key.to_string()));
        }
        match key {
            "owner" | "name" | "except" => {
                let value =
                    scanner.quoted_value().ok_or_else(|| RuleError::MissingValue(key.to_string()))?;
                let pattern = parse_pattern(key, value)?;
                match key {
                    "owner" => rule.owner = Some(pattern),
                    "name" => rule.name = Some(pattern),
                    _ => rule.except = Some(pattern),
                }
            }
            "properties" => {
                if !scanner.eat('{') {
                    return Err(RuleError::MissingValue(key.to_string()));
                }
                rule.properties = parse_properties(&mut scanner)?;
            }
            other => return Err(RuleError::UnknownKey(other.to_string())),
        }
    }

    if rule.owner.is_none() && rule.name.is_none() && rule.except.is_none() {
        return Err(RuleError::Vacuous);
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_float() {
        let rule = parse_rule(r#"owner="iTerm2" properties={float="true"}"#).unwrap();
        assert!(rule.matches("iTerm2", None));
        assert!(!rule.matches("Safari", None));
        assert_eq!(rule.properties.float, Some(true));
    }

    #[test]
    fn owner_is_a_full_match_regex() {
        let rule = parse_rule(r#"owner="Google.*" properties={float="true"}"#).unwrap();
        assert!(rule.matches("Google Chrome", None));
        assert!(!rule.matches("Not Google Chrome", None));
    }

    #[test]
    fn name_and_except_interact() {
        let rule =
            parse_rule(r#"owner="Emacs" name=".*scratch.*" except=".*private.*""#).unwrap();
        assert!(rule.matches("Emacs", Some("scratch buffer")));
        assert!(!rule.matches("Emacs", Some("scratch private")));
        assert!(!rule.matches("Emacs", None));
    }

    #[test]
    fn properties_block_with_space_and_display() {
        let rule =
            parse_rule(r#"owner="Music" properties={display="2"; space="3"}"#).unwrap();
        assert_eq!(rule.properties.display, Some(2));
        assert_eq!(rule.properties.space, Some(3));
    }

    #[test]
    fn scratchpad_values() {
        let rule = parse_rule(r#"owner="Notes" properties={scratchpad="hidden"}"#).unwrap();
        assert_eq!(rule.properties.scratchpad_visible, Some(false));
        assert!(matches!(
            parse_rule(r#"owner="Notes" properties={scratchpad="sometimes"}"#),
            Err(RuleError::BadValue { .. })
        ));
    }

    #[test]
    fn malformed_rules_are_rejected() {
        assert!(matches!(parse_rule("owner"), Err(RuleError::MissingEquals(_))));
        assert!(matches!(
            parse_rule(r#"properties={float="true"}"#),
            Err(RuleError::Vacuous)
        ));
        assert!(matches!(
            parse_rule(r#"owner="[unclosed""#),
            Err(RuleError::BadPattern { .. })
        ));
        assert!(matches!(
            parse_rule(r#"owner="a" properties={float="true""#),
            Err(RuleError::UnterminatedBlock)
        ));
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        let rules = vec![
            parse_rule(r#"owner=".*" properties={float="true"}"#).unwrap(),
            parse_rule(r#"owner="Terminal" properties={float="false"}"#).unwrap(),
        ];
        let outcome = apply_rules(&rules, "Terminal", None);
        assert!(!outcome.float);
        let outcome = apply_rules(&rules, "Safari", None);
        assert!(outcome.float);
    }
}
