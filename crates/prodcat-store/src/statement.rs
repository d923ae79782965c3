//! Parameterized statements with named placeholders.

use prodcat_core::{CatalogError, CatalogResult};

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

/// Statement text plus the values for its `:name` placeholders.
///
/// Caller-supplied values only ever live in `params`; `sql` holds
/// placeholder names.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    params: Vec<(String, SqlValue)>,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds `value` to `:name`. Rebinding a name replaces its value.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        let name = name.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, SqlValue)] {
        &self.params
    }

    /// Value bound to `name`, if any.
    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Rewrites `:name` placeholders into SQLite `?NNN` indices.
    ///
    /// The returned values are ordered so that `?1` is the first element.
    /// Quoted literals are copied verbatim. A placeholder with no bound
    /// value is an error.
    pub fn to_positional(&self) -> CatalogResult<(String, Vec<&SqlValue>)> {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.char_indices().peekable();
        let mut quote: Option<char> = None;

        while let Some((idx, ch)) = chars.next() {
            if let Some(open) = quote {
                out.push(ch);
                if ch == open {
                    quote = None;
                }
                continue;
            }

            match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                ':' if chars
                    .peek()
                    .is_some_and(|(_, next)| next.is_ascii_alphabetic() || *next == '_') =>
                {
                    let start = idx + 1;
                    let mut end = start;
                    while let Some((pos, next)) = chars.peek().copied() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            end = pos + next.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let name = &self.sql[start..end];
                    let position = self
                        .params
                        .iter()
                        .position(|(bound, _)| bound == name)
                        .ok_or_else(|| {
                            CatalogError::query_execution(format!(
                                "placeholder :{name} has no bound value"
                            ))
                        })?;
                    out.push('?');
                    out.push_str(&(position + 1).to_string());
                }
                _ => out.push(ch),
            }
        }

        Ok((out, self.params.iter().map(|(_, value)| value).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_become_indexed_parameters() {
        let statement = BoundStatement::new(
            "SELECT * FROM t WHERE a = :first AND b LIKE :second AND c = :first",
        )
        .bind("first", SqlValue::Integer(7))
        .bind("second", SqlValue::Text("%x%".into()));

        let (sql, values) = statement.to_positional().expect("rewrite");
        assert_eq!(sql, "SELECT * FROM t WHERE a = ?1 AND b LIKE ?2 AND c = ?1");
        assert_eq!(
            values,
            vec![&SqlValue::Integer(7), &SqlValue::Text("%x%".into())]
        );
    }

    #[test]
    fn quoted_literals_are_left_alone() {
        let statement = BoundStatement::new("SELECT ':not_a_param' AS x WHERE y = :y")
            .bind("y", SqlValue::Integer(1));

        let (sql, _) = statement.to_positional().expect("rewrite");
        assert_eq!(sql, "SELECT ':not_a_param' AS x WHERE y = ?1");
    }

    #[test]
    fn similar_names_do_not_collide() {
        let statement = BoundStatement::new("WHERE a = :lim AND b = :limite")
            .bind("limite", SqlValue::Integer(5))
            .bind("lim", SqlValue::Integer(1));

        let (sql, values) = statement.to_positional().expect("rewrite");
        assert_eq!(sql, "WHERE a = ?2 AND b = ?1");
        assert_eq!(values[0], &SqlValue::Integer(5));
    }

    #[test]
    fn unbound_placeholder_is_rejected() {
        let statement = BoundStatement::new("SELECT 1 WHERE x = :missing");

        let err = statement.to_positional().expect_err("unbound");
        assert!(err.to_string().contains(":missing"));
    }

    #[test]
    fn rebinding_replaces_value() {
        let statement = BoundStatement::new("SELECT :v")
            .bind("v", SqlValue::Integer(1))
            .bind("v", SqlValue::Integer(2));

        assert_eq!(statement.params().len(), 1);
        assert_eq!(statement.param("v"), Some(&SqlValue::Integer(2)));
    }
}
