use std::borrow::Cow;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::format::{FormatOptions, format};
use crate::types::{RawSql, SqlValue};

/// A SQL template and its bound values bundled together.
///
/// `text` holds one `?` marker per bound value. Nested statements are flattened when
/// they are bound, so the markers of the inner statement line up with its values:
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let filter = sql!("yearID > " {2010});
/// let stmt = sql!("SELECT sum(hits) FROM baseballStats WHERE " {filter} " AND league = " {"NL"});
/// assert_eq!(stmt.text(), "SELECT sum(hits) FROM baseballStats WHERE yearID > ? AND league = ?");
/// assert_eq!(
///     stmt.compile(),
///     "SELECT sum(hits) FROM baseballStats WHERE yearID > 2010 AND league = 'NL'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    text: String,
    values: Vec<SqlValue>,
}

impl Statement {
    /// Create a statement from template text and the values for its markers.
    ///
    /// Marker and value counts are not checked; see [`format`] for how mismatches render.
    pub fn new(text: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// An empty statement, useful as a neutral element when composing fragments.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a statement from its first literal chunk.
    pub fn builder(head: &str) -> StatementBuilder {
        StatementBuilder::new(head)
    }

    /// Join statements with a literal separator, keeping every value in order.
    pub fn join<I>(statements: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = Statement>,
    {
        let mut out = Statement::empty();
        for (idx, stmt) in statements.into_iter().enumerate() {
            if idx > 0 {
                out.text.push_str(separator);
            }
            out.text.push_str(&stmt.text);
            out.values.extend(stmt.values);
        }
        out
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.values.is_empty()
    }

    /// Compile with default [`FormatOptions`].
    #[must_use]
    pub fn compile(&self) -> Cow<'_, str> {
        self.compile_with(&FormatOptions::default())
    }

    #[must_use]
    pub fn compile_with(&self, options: &FormatOptions) -> Cow<'_, str> {
        format(&self.text, &self.values, options)
    }
}

/// Something that can be bound at a marker position: a value or a nested statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(SqlValue),
    Statement(Statement),
}

impl From<Statement> for Binding {
    fn from(stmt: Statement) -> Self {
        Binding::Statement(stmt)
    }
}

impl From<&Statement> for Binding {
    fn from(stmt: &Statement) -> Self {
        Binding::Statement(stmt.clone())
    }
}

macro_rules! impl_from_for_binding {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Binding {
                fn from(value: $ty) -> Self {
                    Binding::Value(value.into())
                }
            }
        )*
    };
}

impl_from_for_binding! {
    SqlValue,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    DateTime<Utc>,
    RawSql,
    IndexMap<String, SqlValue>,
}

impl<T: Into<SqlValue>> From<Option<T>> for Binding {
    fn from(value: Option<T>) -> Self {
        Binding::Value(value.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for Binding {
    fn from(values: Vec<T>) -> Self {
        Binding::Value(values.into())
    }
}

/// Incremental builder behind the [`sql!`](crate::sql) macro.
///
/// Literal chunks are appended as-is; every bound value adds one `?` marker.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    stmt: Statement,
}

impl StatementBuilder {
    #[must_use]
    pub fn new(head: &str) -> Self {
        Self {
            stmt: Statement::new(head, Vec::new()),
        }
    }

    /// Append literal SQL text.
    #[must_use]
    pub fn push(mut self, text: &str) -> Self {
        self.stmt.text.push_str(text);
        self
    }

    /// Bind a value (one marker) or splice a nested statement.
    #[must_use]
    pub fn bind(mut self, binding: impl Into<Binding>) -> Self {
        match binding.into() {
            Binding::Value(value) => {
                self.stmt.text.push('?');
                self.stmt.values.push(value);
            }
            Binding::Statement(inner) => {
                self.stmt.text.push_str(&inner.text);
                self.stmt.values.extend(inner.values);
            }
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> Statement {
        self.stmt
    }
}

/// Build a [`Statement`] from literal chunks interleaved with `{expr}` bindings.
///
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let year = 2010;
/// let stmt = sql!("SELECT * FROM baseballStats WHERE yearID > " {year} " LIMIT 10");
/// assert_eq!(stmt.text(), "SELECT * FROM baseballStats WHERE yearID > ? LIMIT 10");
/// assert_eq!(stmt.values(), &[SqlValue::Int(2010)]);
/// ```
#[macro_export]
macro_rules! sql {
    ($head:literal $( { $value:expr } $($tail:literal)? )*) => {{
        let builder = $crate::StatementBuilder::new($head);
        $(
            let builder = builder.bind($value).push(concat!("" $(, $tail)?));
        )*
        builder.finish()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::raw;

    #[test]
    fn macro_builds_template_and_values() {
        let stmt = crate::sql!("SELECT * FROM t WHERE id = " {1} " AND name = " {"bob"});
        assert_eq!(stmt.text(), "SELECT * FROM t WHERE id = ? AND name = ?");
        assert_eq!(
            stmt.values(),
            &[SqlValue::Int(1), SqlValue::Text("bob".into())]
        );
        assert_eq!(stmt.compile(), "SELECT * FROM t WHERE id = 1 AND name = 'bob'");
    }

    #[test]
    fn macro_without_bindings() {
        let stmt = crate::sql!("SELECT 1");
        assert_eq!(stmt.text(), "SELECT 1");
        assert!(stmt.values().is_empty());
        assert!(matches!(stmt.compile(), Cow::Borrowed(_)));
    }

    #[test]
    fn nested_statements_flatten() {
        let inner = crate::sql!("a = " {1} " OR b = " {2});
        let outer = crate::sql!("SELECT * FROM t WHERE (" {inner} ") AND c = " {3});
        assert_eq!(outer.text(), "SELECT * FROM t WHERE (a = ? OR b = ?) AND c = ?");
        assert_eq!(outer.compile(), "SELECT * FROM t WHERE (a = 1 OR b = 2) AND c = 3");
    }

    #[test]
    fn join_keeps_values_in_order() {
        let parts = vec![
            crate::sql!("a = " {1}),
            Statement::empty(),
            crate::sql!("b = " {raw("NOW()")}),
        ];
        let joined = Statement::join(parts.into_iter().filter(|s| !s.is_empty()), " AND ");
        assert_eq!(joined.text(), "a = ? AND b = ?");
        assert_eq!(joined.compile(), "a = 1 AND b = NOW()");
    }

    #[test]
    fn builder_binds_lists_and_nulls() {
        let stmt = Statement::builder("x IN (")
            .bind(vec![1, 2, 3])
            .push(") AND y = ")
            .bind(None::<i64>)
            .finish();
        assert_eq!(stmt.compile(), "x IN (1, 2, 3) AND y = NULL");
    }
}
