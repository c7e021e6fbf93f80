use indexmap::IndexMap;

use super::datetime::{TimeZone, format_timestamp};
use crate::types::SqlValue;

/// Escape a value into a SQL literal.
///
/// `stringify_objects` decides how a top-level [`SqlValue::Object`] renders: as a quoted
/// string of its JSON text (`true`) or as a `"key" = value` assignment list (`false`).
/// Values nested inside arrays and objects always use the stringified form.
#[must_use]
pub fn escape(value: &SqlValue, stringify_objects: bool, tz: TimeZone) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "TRUE".to_string(),
        SqlValue::Bool(false) => "FALSE".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Timestamp(ts) => match format_timestamp(ts, tz) {
            Some(text) => escape_string(&text),
            None => "NULL".to_string(),
        },
        SqlValue::Array(items) => array_to_list(items, tz),
        SqlValue::Bytes(bytes) => bytes_to_string(bytes),
        SqlValue::Raw(raw) => raw.as_str().to_string(),
        SqlValue::Object(_) if stringify_objects => escape_string(&value.to_string()),
        SqlValue::Object(map) => object_to_values(map, tz),
        SqlValue::Text(s) => escape_string(s),
    }
}

/// Render a list of values; nested lists become parenthesized sub-lists.
#[must_use]
pub fn array_to_list(items: &[SqlValue], tz: TimeZone) -> String {
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        match item {
            SqlValue::Array(inner) => {
                out.push('(');
                out.push_str(&array_to_list(inner, tz));
                out.push(')');
            }
            other => out.push_str(&escape(other, true, tz)),
        }
    }
    out
}

/// Render `"key" = value` assignments joined with `, `.
#[must_use]
pub fn object_to_values(map: &IndexMap<String, SqlValue>, tz: TimeZone) -> String {
    map.iter()
        .map(|(key, value)| format!("{} = {}", escape_id(key, false), escape(value, true, tz)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render binary data as a hex literal, e.g. `X'6275'`.
#[must_use]
pub fn bytes_to_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push('X');
    out.push_str(&escape_string(&hex::encode(bytes)));
    out
}

/// Quote an identifier, doubling embedded double quotes.
///
/// Unless `forbid_qualified` is set, dots separate segments that are quoted on their own:
/// `a.b` becomes `"a"."b"`.
#[must_use]
pub fn escape_id(name: &str, forbid_qualified: bool) -> String {
    let doubled = name.replace('"', "\"\"");
    if forbid_qualified {
        format!("\"{doubled}\"")
    } else {
        format!("\"{}\"", doubled.replace('.', "\".\""))
    }
}

/// Quote a list of identifiers and join them with `, `.
#[must_use]
pub fn escape_ids<S: AsRef<str>>(names: &[S], forbid_qualified: bool) -> String {
    names
        .iter()
        .map(|name| escape_id(name.as_ref(), forbid_qualified))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Identifier form of a bound value; arrays escape each element.
pub(super) fn escape_id_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Array(items) => items
            .iter()
            .map(escape_id_value)
            .collect::<Vec<_>>()
            .join(", "),
        SqlValue::Text(name) => escape_id(name, false),
        other => escape_id(&other.to_string(), false),
    }
}

/// Wrap text in single quotes, backslash-escaping control characters and doubling quotes.
#[must_use]
pub fn escape_string(val: &str) -> String {
    let mut out = String::with_capacity(val.len() + 2);
    out.push('\'');
    for ch in val.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\"\""),
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::types::raw;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn escapes_scalars() {
        let tz = TimeZone::Local;
        assert_eq!(escape(&SqlValue::Null, false, tz), "NULL");
        assert_eq!(escape(&SqlValue::Bool(true), false, tz), "TRUE");
        assert_eq!(escape(&SqlValue::Bool(false), false, tz), "FALSE");
        assert_eq!(escape(&SqlValue::Int(123), false, tz), "123");
        assert_eq!(escape(&SqlValue::Float(1.5), false, tz), "1.5");
        assert_eq!(escape(&"string".into(), false, tz), "'string'");
        assert_eq!(
            escape(&"string with 'quote'".into(), false, tz),
            "'string with ''quote'''"
        );
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(
            escape_string("a\0b\u{8}c\td\ne\rf\u{1a}g\\h\"i"),
            r#"'a\0b\bc\td\ne\rf\Zg\\h""i'"#
        );
    }

    #[test]
    fn escapes_dates_with_offset() {
        let ts = SqlValue::Timestamp(utc("2023-01-01T00:00:00Z"));
        assert_eq!(
            escape(&ts, false, TimeZone::parse("Z")),
            "'2023-01-01 00:00:00.000'"
        );
        assert_eq!(
            escape(&ts, false, TimeZone::parse("-01:00")),
            "'2022-12-31 23:00:00.000'"
        );
    }

    #[test]
    fn unrepresentable_date_is_null() {
        let ts = SqlValue::Timestamp(DateTime::<Utc>::MAX_UTC);
        assert_eq!(escape(&ts, false, TimeZone::Offset(1)), "NULL");
    }

    #[test]
    fn escapes_bytes_as_hex() {
        assert_eq!(escape(&SqlValue::bytes("buffer"), false, TimeZone::Local), "X'627566666572'");
        assert_eq!(bytes_to_string(&[0x62, 0x75]), "X'6275'");
    }

    #[test]
    fn escapes_arrays() {
        let tz = TimeZone::Local;
        let v = SqlValue::from(vec![
            SqlValue::Int(1),
            SqlValue::Text("two".into()),
            SqlValue::Bool(true),
        ]);
        assert_eq!(escape(&v, false, tz), "1, 'two', TRUE");
        let nested = vec![
            SqlValue::Int(1),
            SqlValue::from(vec![2, 3]),
            SqlValue::Int(4),
        ];
        assert_eq!(array_to_list(&nested, tz), "1, (2, 3), 4");
    }

    #[test]
    fn escapes_objects() {
        let tz = TimeZone::Local;
        let obj = SqlValue::object([("id", SqlValue::Int(1)), ("name", "name".into())]);
        assert_eq!(escape(&obj, false, tz), r#""id" = 1, "name" = 'name'"#);
        assert_eq!(escape(&obj, true, tz), r#"'{""id"":1,""name"":""name""}'"#);

        let nested = SqlValue::object([("tags", SqlValue::from(vec!["a", "b"]))]);
        assert_eq!(escape(&nested, false, tz), r#""tags" = 'a', 'b'"#);
    }

    #[test]
    fn objects_inside_arrays_are_stringified() {
        let v = SqlValue::from(vec![SqlValue::object([("k", 1)])]);
        assert_eq!(escape(&v, false, TimeZone::Local), r#"'{""k"":1}'"#);
    }

    #[test]
    fn raw_passes_through() {
        let v = SqlValue::Raw(raw("NOW()"));
        assert_eq!(escape(&v, false, TimeZone::Local), "NOW()");
        let in_array = SqlValue::from(vec![SqlValue::Raw(raw("a + 1")), SqlValue::Int(2)]);
        assert_eq!(escape(&in_array, false, TimeZone::Local), "a + 1, 2");
    }

    #[test]
    fn escapes_identifiers() {
        assert_eq!(escape_id("identifier", false), r#""identifier""#);
        assert_eq!(
            escape_id("identifier.with.dot", false),
            r#""identifier"."with"."dot""#
        );
        assert_eq!(escape_id("identifier.with.dot", true), r#""identifier.with.dot""#);
        assert_eq!(
            escape_id(r#"identifier"with"quote"#, false),
            r#""identifier""with""quote""#
        );
        assert_eq!(escape_ids(&["id1", "id2"], false), r#""id1", "id2""#);
    }

    #[test]
    fn identifier_round_trips() {
        for name in [r#"a"b"#, r#""""#, r#"plain"#, r#"x""y"z"#] {
            let escaped = escape_id(name, true);
            let inner = &escaped[1..escaped.len() - 1];
            assert_eq!(inner.replace("\"\"", "\""), name);
        }
    }

    #[test]
    fn string_round_trips() {
        for s in ["", "plain", "it's", "back\\slash", "tab\there", "mix'\\\"\n"] {
            let escaped = escape_string(s);
            assert!(escaped.starts_with('\'') && escaped.ends_with('\''));
            assert_eq!(unescape(&escaped[1..escaped.len() - 1]), s);
        }
    }

    fn unescape(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('0') => out.push('\0'),
                    Some('b') => out.push('\u{8}'),
                    Some('t') => out.push('\t'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('Z') => out.push('\u{1a}'),
                    Some(other) => out.push(other),
                    None => {}
                },
                '\'' | '"' => {
                    chars.next();
                    out.push(c);
                }
                other => out.push(other),
            }
        }
        out
    }
}
