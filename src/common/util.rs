/// Splits a command line into tokens, honoring single/double quotes and the
/// usual backslash escapes inside quoted strings.
pub fn parse_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();
    let mut in_quotes = false;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current_part.is_empty() {
                    parts.push(current_part.clone());
                    current_part.clear();
                }
            }
            '\\' if in_quotes => {
                if let Some(next_ch) = chars.next() {
                    match next_ch {
                        'n' => current_part.push('\n'),
                        't' => current_part.push('\t'),
                        'r' => current_part.push('\r'),
                        '\\' => current_part.push('\\'),
                        '\'' => current_part.push('\''),
                        '"' => current_part.push('"'),
                        _ => {
                            current_part.push('\\');
                            current_part.push(next_ch);
                        }
                    }
                } else {
                    current_part.push('\\');
                }
            }
            _ => {
                current_part.push(ch);
            }
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}

/// True for lines the config interpreter should skip entirely.
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(parse_command("window -f north"), vec!["window", "-f", "north"]);
        assert_eq!(parse_command("  tree   rotate  90 "), vec!["tree", "rotate", "90"]);
    }

    #[test]
    fn quotes_keep_spaces() {
        assert_eq!(
            parse_command(r#"rule owner="Google Chrome" float="true""#),
            vec!["rule", "owner=Google Chrome", "float=true"]
        );
        assert_eq!(parse_command("space -n 'main space'"), vec![
            "space", "-n", "main space"
        ]);
    }

    #[test]
    fn escapes_inside_quotes() {
        assert_eq!(parse_command(r#"space -n "a\tb""#), vec!["space", "-n", "a\tb"]);
        assert_eq!(parse_command(r#"space -n "a\qb""#), vec!["space", "-n", "a\\qb"]);
    }

    #[test]
    fn comment_detection() {
        assert!(is_blank_or_comment(""));
        assert!(is_blank_or_comment("   "));
        assert!(is_blank_or_comment("# padding"));
        assert!(!is_blank_or_comment("window -f north"));
    }
}
