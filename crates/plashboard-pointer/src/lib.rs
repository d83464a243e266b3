//! RFC 6901 JSON pointer engine.
//!
//! Reads walk a [`serde_json::Value`] tree token by token; writes walk to the
//! parent and require the final token to already resolve to an existing key
//! or in-range index — the skeleton a template is built from is authoritative,
//! so writes never create new object keys or extend arrays.

use serde_json::Value;
use thiserror::Error;

/// A single decoded reference token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Key(String),
    Index(usize),
}

/// A parsed, owned JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    raw: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer '{0}' must be empty or start with '/'")]
    MalformedPointer(String),

    #[error("pointer '{pointer}' not found in document")]
    NotFound { pointer: String },

    #[error("pointer '{pointer}' is invalid: {reason}")]
    Invalid { pointer: String, reason: String },
}

impl Pointer {
    /// Parse an RFC 6901 pointer string (`"/a/b/0"`, or `""` for the root).
    pub fn parse(raw: &str) -> Result<Self, PointerError> {
        if raw.is_empty() {
            return Ok(Self {
                raw: raw.to_string(),
                tokens: Vec::new(),
            });
        }
        if !raw.starts_with('/') {
            return Err(PointerError::MalformedPointer(raw.to_string()));
        }

        let tokens = raw[1..]
            .split('/')
            .map(|segment| {
                let decoded = decode_token(segment);
                match decoded.parse::<usize>() {
                    Ok(idx) if is_canonical_index(&decoded) => Token::Index(idx),
                    _ => Token::Key(decoded),
                }
            })
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// `~1` decodes to `/`, `~0` decodes to `~`; scanned left to right so `~01`
/// never collapses into the wrong character.
fn decode_token(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                Some(other) => {
                    out.push('~');
                    out.push(other);
                }
                None => out.push('~'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Array indices must be `0` or a digit string with no leading zero (RFC 6901 §4).
fn is_canonical_index(s: &str) -> bool {
    s == "0" || (s.starts_with(|c: char| c != '0') && s.chars().all(|c| c.is_ascii_digit()))
}

/// Read the value at `pointer` within `doc`.
pub fn read<'a>(doc: &'a Value, pointer: &Pointer) -> Result<&'a Value, PointerError> {
    let mut current = doc;
    for token in &pointer.tokens {
        current = step(current, token, pointer)?;
    }
    Ok(current)
}

/// Read the current values at every pointer, used to collect hints for the
/// fill runner.
pub fn try_read<'a>(doc: &'a Value, pointer: &Pointer) -> Option<&'a Value> {
    read(doc, pointer).ok()
}

/// Write `value` at `pointer` within `doc`. The parent container must exist
/// and the final token must resolve to an existing key or in-range index.
pub fn write(doc: &mut Value, pointer: &Pointer, value: Value) -> Result<(), PointerError> {
    let Some((last, init)) = pointer.tokens.split_last() else {
        *doc = value;
        return Ok(());
    };

    let mut current = doc;
    for token in init {
        current = step_mut(current, token, pointer)?;
    }

    match (current, last) {
        (Value::Object(map), Token::Key(key)) => {
            if !map.contains_key(key) {
                return Err(PointerError::NotFound {
                    pointer: pointer.as_str().to_string(),
                });
            }
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(arr), Token::Index(idx)) => {
            if *idx >= arr.len() {
                return Err(PointerError::NotFound {
                    pointer: pointer.as_str().to_string(),
                });
            }
            arr[*idx] = value;
            Ok(())
        }
        (Value::Object(_), Token::Index(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "numeric token against an object".to_string(),
        }),
        (Value::Array(_), Token::Key(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "non-numeric token against an array".to_string(),
        }),
        (_, _) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "parent is not an object or array".to_string(),
        }),
    }
}

fn step<'a>(value: &'a Value, token: &Token, pointer: &Pointer) -> Result<&'a Value, PointerError> {
    match (value, token) {
        (Value::Object(map), Token::Key(key)) => {
            map.get(key).ok_or_else(|| PointerError::NotFound {
                pointer: pointer.as_str().to_string(),
            })
        }
        (Value::Array(arr), Token::Index(idx)) => {
            arr.get(*idx).ok_or_else(|| PointerError::NotFound {
                pointer: pointer.as_str().to_string(),
            })
        }
        (Value::Object(_), Token::Index(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "numeric token against an object".to_string(),
        }),
        (Value::Array(_), Token::Key(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "non-numeric token against an array".to_string(),
        }),
        (_, _) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "token against a scalar or null value".to_string(),
        }),
    }
}

fn step_mut<'a>(
    value: &'a mut Value,
    token: &Token,
    pointer: &Pointer,
) -> Result<&'a mut Value, PointerError> {
    match (value, token) {
        (Value::Object(map), Token::Key(key)) => {
            map.get_mut(key).ok_or_else(|| PointerError::NotFound {
                pointer: pointer.as_str().to_string(),
            })
        }
        (Value::Array(arr), Token::Index(idx)) => {
            arr.get_mut(*idx).ok_or_else(|| PointerError::NotFound {
                pointer: pointer.as_str().to_string(),
            })
        }
        (Value::Object(_), Token::Index(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "numeric token against an object".to_string(),
        }),
        (Value::Array(_), Token::Key(_)) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "non-numeric token against an array".to_string(),
        }),
        (_, _) => Err(PointerError::Invalid {
            pointer: pointer.as_str().to_string(),
            reason: "token against a scalar or null value".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tilde_and_slash_escapes() {
        let ptr = Pointer::parse("/a~1b/c~0d").unwrap();
        assert_eq!(
            ptr.tokens,
            vec![
                Token::Key("a/b".to_string()),
                Token::Key("c~d".to_string())
            ]
        );
    }

    #[test]
    fn empty_pointer_reads_root() {
        let doc = json!({"a": 1});
        let ptr = Pointer::parse("").unwrap();
        assert_eq!(read(&doc, &ptr).unwrap(), &doc);
    }

    #[test]
    fn reads_nested_array_and_object() {
        let doc = json!({"sections": [{"title": "ops"}]});
        let ptr = Pointer::parse("/sections/0/title").unwrap();
        assert_eq!(read(&doc, &ptr).unwrap(), "ops");
    }

    #[test]
    fn missing_key_is_not_found() {
        let doc = json!({"a": 1});
        let ptr = Pointer::parse("/b").unwrap();
        assert_eq!(
            read(&doc, &ptr).unwrap_err(),
            PointerError::NotFound {
                pointer: "/b".to_string()
            }
        );
    }

    #[test]
    fn numeric_token_against_object_is_invalid() {
        let doc = json!({"a": 1});
        let ptr = Pointer::parse("/0").unwrap();
        assert!(matches!(
            read(&doc, &ptr).unwrap_err(),
            PointerError::Invalid { .. }
        ));
    }

    #[test]
    fn non_numeric_token_against_array_is_invalid() {
        let doc = json!({"a": [1, 2]});
        let ptr = Pointer::parse("/a/x").unwrap();
        assert!(matches!(
            read(&doc, &ptr).unwrap_err(),
            PointerError::Invalid { .. }
        ));
    }

    #[test]
    fn write_replaces_existing_key() {
        let mut doc = json!({"summary": "old"});
        let ptr = Pointer::parse("/summary").unwrap();
        write(&mut doc, &ptr, json!("new")).unwrap();
        assert_eq!(doc, json!({"summary": "new"}));
    }

    #[test]
    fn write_replaces_existing_array_index() {
        let mut doc = json!({"items": [1, 2, 3]});
        let ptr = Pointer::parse("/items/1").unwrap();
        write(&mut doc, &ptr, json!(99)).unwrap();
        assert_eq!(doc, json!({"items": [1, 99, 3]}));
    }

    #[test]
    fn write_never_creates_new_keys() {
        let mut doc = json!({"a": 1});
        let ptr = Pointer::parse("/b").unwrap();
        assert_eq!(
            write(&mut doc, &ptr, json!(2)).unwrap_err(),
            PointerError::NotFound {
                pointer: "/b".to_string()
            }
        );
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn write_never_extends_arrays() {
        let mut doc = json!({"items": [1]});
        let ptr = Pointer::parse("/items/5").unwrap();
        assert!(write(&mut doc, &ptr, json!(2)).is_err());
    }

    #[test]
    fn leading_zero_index_is_treated_as_a_key() {
        // RFC 6901 canonical indices have no leading zero; "01" is a key.
        let doc = json!({"items": {"01": "kept-as-key"}});
        let ptr = Pointer::parse("/items/01").unwrap();
        assert_eq!(read(&doc, &ptr).unwrap(), "kept-as-key");
    }

    #[test]
    fn malformed_pointer_without_leading_slash_errors() {
        assert!(Pointer::parse("a/b").is_err());
    }
}
