use serde_json::Value;

/// Decode a textual mapping or list into a structured value
///
/// Accepts JSON as well as the Python-literal form that shows up when a
/// nested object has been round-tripped through a CSV cache:
/// single-quoted strings, `True`/`False`/`None`, tuples and trailing commas.
pub fn decode_literal(text: &str) -> Result<Value, String> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let converted = python_literal_to_json(text)?;
    serde_json::from_str(&converted).map_err(|e| e.to_string())
}

fn python_literal_to_json(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                copy_string_body(c, &mut chars, &mut out)?;
                out.push('"');
            }
            '(' => out.push('['),
            '}' | ']' | ')' => {
                strip_trailing_comma(&mut out);
                out.push(if c == '}' { '}' } else { ']' });
            }
            // Exponent markers belong to the preceding number
            c if c.is_ascii_alphabetic() && !out.ends_with(|p: char| p.is_ascii_digit()) => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    other => return Err(format!("unsupported literal '{}'", other)),
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Copy a quoted string body up to its closing `quote`, re-escaped for JSON
fn copy_string_body<I>(
    quote: char,
    chars: &mut std::iter::Peekable<I>,
    out: &mut String,
) -> Result<(), String>
where
    I: Iterator<Item = char>,
{
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => break,
            },
            c if c == quote => return Ok(()),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    Err("unterminated string".to_string())
}

fn strip_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let value = decode_literal(r#"{"id": 44, "name": "Texas"}"#).unwrap();
        assert_eq!(value, json!({"id": 44, "name": "Texas"}));
    }

    #[test]
    fn test_decode_python_dict() {
        let value =
            decode_literal("{'id': 3, 'name': \"Owner's Credit\", 'active': True, 'parent': None,}")
                .unwrap();
        assert_eq!(
            value,
            json!({"id": 3, "name": "Owner's Credit", "active": true, "parent": null})
        );
    }

    #[test]
    fn test_decode_python_list_of_dicts() {
        let value = decode_literal("[{'categoryId': 1}, {'categoryId': 2, 'w': 1e3}]").unwrap();
        assert_eq!(value, json!([{"categoryId": 1}, {"categoryId": 2, "w": 1000.0}]));
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let value = decode_literal("{'z': 1, 'a': 2}").unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_literal("{'id': nan}").is_err());
        assert!(decode_literal("{'id': 'open").is_err());
        assert!(decode_literal("not a mapping").is_err());
    }
}
