//! SQL dialects: native type translation, existence checks and bind-var syntax.
//!
//! A [`Dialect`] is looked up by name when an [`Engine`](crate::Engine) is
//! constructed. The session only ever talks to the trait, so statement
//! assembly stays dialect-independent.

mod postgres;

pub use postgres::Postgres;

use crate::param::Param;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Column-level type of a Rust value, independent of any SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Text,
    Bytes,
    Json,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
}

/// Maps a Rust type to its [`NativeType`].
///
/// Implemented for the scalar types tokio-postgres can bind. `#[derive(Model)]`
/// requires every mapped field type to implement it.
pub trait SqlType {
    /// The native type a zero value of `Self` translates to.
    const NATIVE: NativeType;
}

macro_rules! impl_sql_type {
    ($($ty:ty => $native:ident),* $(,)?) => {
        $(
            impl SqlType for $ty {
                const NATIVE: NativeType = NativeType::$native;
            }
        )*
    };
}

impl_sql_type! {
    bool => Bool,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
    uuid::Uuid => Uuid,
    chrono::NaiveDate => Date,
    chrono::NaiveTime => Time,
    chrono::NaiveDateTime => Timestamp,
}

impl<T> SqlType for tokio_postgres::types::Json<T> {
    const NATIVE: NativeType = NativeType::Json;
}

impl<Tz: chrono::TimeZone> SqlType for chrono::DateTime<Tz> {
    const NATIVE: NativeType = NativeType::TimestampTz;
}

// Option<T> delegates to inner type
impl<T: SqlType> SqlType for Option<T> {
    const NATIVE: NativeType = T::NATIVE;
}

/// A pluggable SQL dialect.
pub trait Dialect: Send + Sync {
    /// Registry name, e.g. `"postgres"`.
    fn name(&self) -> &str;

    /// Column type string for a native type.
    fn data_type_of(&self, native: NativeType) -> String;

    /// A statement (with `?` markers) and its parameters that yields a single
    /// integer row, `1` when `table` exists.
    fn table_exist_sql(&self, table: &str) -> (String, Vec<Param>);

    /// Bind-variable text for the 1-based parameter `index`.
    fn bind_var(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    /// Quote an identifier generated from a schema.
    fn quote_ident(&self, ident: &str) -> String {
        ident.to_string()
    }
}

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn Dialect>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn Dialect>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<String, Arc<dyn Dialect>> = HashMap::new();
        map.insert("postgres".to_string(), Arc::new(Postgres));
        RwLock::new(map)
    })
}

/// Register (or replace) a dialect under `name`.
pub fn register_dialect(name: impl Into<String>, dialect: Arc<dyn Dialect>) {
    let mut map = registry().write().unwrap_or_else(|e| e.into_inner());
    map.insert(name.into(), dialect);
}

/// Look up a registered dialect.
pub fn get_dialect(name: &str) -> Option<Arc<dyn Dialect>> {
    let map = registry().read().unwrap_or_else(|e| e.into_inner());
    map.get(name).cloned()
}

/// Rewrite `?` markers into the dialect's bind variables, numbering them in
/// order of appearance.
///
/// Markers are left alone inside single-quoted literals (including `E'...'`
/// backslash escapes), double-quoted identifiers, dollar-quoted bodies and
/// `--` or `/* */` comments. Unterminated quoting runs to the end of `sql`.
pub fn render_placeholders(sql: &str, dialect: &dyn Dialect) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let end = match c {
            '\'' => {
                let escapes = i > 0
                    && matches!(chars[i - 1], 'E' | 'e')
                    && (i < 2 || !is_ident_char(chars[i - 2]));
                Some(quoted_end(&chars, i, '\'', escapes))
            }
            '"' => Some(quoted_end(&chars, i, '"', false)),
            '-' if next == Some('-') => Some(
                chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |n| i + n + 1),
            ),
            '/' if next == Some('*') => Some(block_comment_end(&chars, i)),
            '$' if i == 0 || !is_ident_char(chars[i - 1]) => dollar_quote_end(&chars, i),
            '?' => {
                index += 1;
                out.push_str(&dialect.bind_var(index));
                i += 1;
                continue;
            }
            _ => None,
        };

        match end {
            Some(end) => {
                out.extend(&chars[i..end]);
                i = end;
            }
            None => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// End of a quoted run opened at `start`; a doubled quote stays inside.
fn quoted_end(chars: &[char], start: usize, quote: char, backslash: bool) -> usize {
    let mut j = start + 1;
    while j < chars.len() {
        let c = chars[j];
        if backslash && c == '\\' {
            j += 2;
        } else if c == quote {
            if chars.get(j + 1) == Some(&quote) {
                j += 2;
            } else {
                return j + 1;
            }
        } else {
            j += 1;
        }
    }
    chars.len()
}

/// Block comments nest in Postgres.
fn block_comment_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut j = start;
    while j < chars.len() {
        match (chars[j], chars.get(j + 1)) {
            ('/', Some('*')) => {
                depth += 1;
                j += 2;
            }
            ('*', Some('/')) => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    chars.len()
}

/// End of a `$tag$...$tag$` body opened at `start`, or `None` when the `$`
/// does not open one (e.g. a `$1` parameter).
fn dollar_quote_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j).is_some_and(|&c| c.is_alphabetic() || c == '_') {
        while chars.get(j).is_some_and(|&c| c.is_alphanumeric() || c == '_') {
            j += 1;
        }
    }
    if chars.get(j) != Some(&'$') {
        return None;
    }

    let tag = &chars[start..=j];
    let body = j + 1;
    let end = chars[body..]
        .windows(tag.len())
        .position(|w| w == tag)
        .map_or(chars.len(), |n| body + n + tag.len());
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Question;

    impl Dialect for Question {
        fn name(&self) -> &str {
            "question"
        }

        fn data_type_of(&self, _native: NativeType) -> String {
            "blob".to_string()
        }

        fn table_exist_sql(&self, table: &str) -> (String, Vec<Param>) {
            ("SELECT 1 FROM tables WHERE name = ?".to_string(), vec![Param::new(table.to_string())])
        }
    }

    #[test]
    fn postgres_is_registered_by_default() {
        let dialect = get_dialect("postgres").expect("postgres registered");
        assert_eq!(dialect.name(), "postgres");
    }

    #[test]
    fn unknown_dialect_is_none() {
        assert!(get_dialect("no-such-dialect").is_none());
    }

    #[test]
    fn registered_dialect_can_be_found() {
        register_dialect("question", Arc::new(Question));
        let dialect = get_dialect("question").expect("registered");
        assert_eq!(dialect.data_type_of(NativeType::Int), "blob");
    }

    #[test]
    fn option_delegates_native_type() {
        assert_eq!(<Option<i64> as SqlType>::NATIVE, NativeType::BigInt);
        assert_eq!(<Option<String> as SqlType>::NATIVE, NativeType::Text);
    }

    #[test]
    fn render_numbers_markers_in_order() {
        let sql = render_placeholders("SELECT a FROM t WHERE a > ? AND b = ? LIMIT ?", &Postgres);
        assert_eq!(sql, "SELECT a FROM t WHERE a > $1 AND b = $2 LIMIT $3");
    }

    #[test]
    fn render_skips_quoted_markers() {
        let sql = render_placeholders(r#"SELECT '?' AS "q?" FROM t WHERE a = ?"#, &Postgres);
        assert_eq!(sql, r#"SELECT '?' AS "q?" FROM t WHERE a = $1"#);
    }

    #[test]
    fn render_skips_comments() {
        let sql = render_placeholders(
            "SELECT a FROM t /* don't ? /* nested ' */ */ WHERE a = ? -- it's ?\nAND b = ?",
            &Postgres,
        );
        assert_eq!(
            sql,
            "SELECT a FROM t /* don't ? /* nested ' */ */ WHERE a = $1 -- it's ?\nAND b = $2"
        );
    }

    #[test]
    fn render_skips_dollar_quoted_bodies() {
        let sql = render_placeholders("WHERE note <> $$it's$$ AND id = ?", &Postgres);
        assert_eq!(sql, "WHERE note <> $$it's$$ AND id = $1");

        let sql = render_placeholders("WHERE note <> $tag$it's ? $$ $tag$ AND id = ?", &Postgres);
        assert_eq!(sql, "WHERE note <> $tag$it's ? $$ $tag$ AND id = $1");
    }

    #[test]
    fn render_handles_escape_strings() {
        let sql = render_placeholders(r"WHERE a = E'it\'s ?' AND b = ?", &Postgres);
        assert_eq!(sql, r"WHERE a = E'it\'s ?' AND b = $1");

        // Plain literals treat backslash as an ordinary character.
        let sql = render_placeholders(r"WHERE path = 'C:\' AND b = ?", &Postgres);
        assert_eq!(sql, r"WHERE path = 'C:\' AND b = $1");
    }

    #[test]
    fn render_leaves_dollar_inside_identifiers() {
        let sql = render_placeholders("SELECT a$b FROM t WHERE a$b = ? AND c = ?", &Postgres);
        assert_eq!(sql, "SELECT a$b FROM t WHERE a$b = $1 AND c = $2");
    }

    #[test]
    fn default_bind_var_keeps_question_marks() {
        let sql = render_placeholders("VALUES (?,?)", &Question);
        assert_eq!(sql, "VALUES (?,?)");
    }
}
