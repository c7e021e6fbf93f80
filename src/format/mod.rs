use std::borrow::Cow;

mod datetime;
mod escape;
mod scanner;

pub use datetime::TimeZone;
pub use escape::{
    array_to_list, bytes_to_string, escape, escape_id, escape_ids, escape_string,
    object_to_values,
};

use escape::escape_id_value;
use scanner::next_marker_run;

use crate::types::SqlValue;

/// Per-call options for query compilation.
///
/// # Examples
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let options = FormatOptions::default()
///     .with_time_zone(TimeZone::parse("Z"))
///     .with_stringify_objects(true);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatOptions {
    /// Render top-level objects as quoted JSON text instead of assignment lists.
    pub stringify_objects: bool,
    /// Time zone used for timestamp literals.
    pub time_zone: TimeZone,
}

impl FormatOptions {
    #[must_use]
    pub fn with_stringify_objects(mut self, stringify_objects: bool) -> Self {
        self.stringify_objects = stringify_objects;
        self
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }
}

/// Substitute `?` markers with escaped values and `??` markers with escaped identifiers.
///
/// Values are consumed left to right. Runs of three or more `?` are skipped without
/// consuming a value. Once the values run out, the rest of the template is copied
/// verbatim, so `format("id = ? AND name = ?", &[1.into()], ..)` keeps the second marker.
///
/// Returns a borrowed `Cow` when nothing was substituted.
#[must_use]
pub fn format<'a>(sql: &'a str, values: &[SqlValue], options: &FormatOptions) -> Cow<'a, str> {
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut chunk_start = 0;
    let mut search_from = 0;
    let mut remaining = values.iter();

    while remaining.len() > 0 {
        let Some(run) = next_marker_run(bytes, search_from) else {
            break;
        };
        search_from = run.end;

        let escaped = match run.len() {
            1 => remaining
                .next()
                .map(|v| escape(v, options.stringify_objects, options.time_zone)),
            2 => remaining.next().map(escape_id_value),
            _ => continue,
        };
        let Some(escaped) = escaped else {
            break;
        };

        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 16));
        buf.push_str(&sql[chunk_start..run.start]);
        buf.push_str(&escaped);
        chunk_start = run.end;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[chunk_start..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
