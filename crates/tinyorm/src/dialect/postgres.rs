use super::{Dialect, NativeType};
use crate::param::Param;

/// The PostgreSQL dialect, registered as `"postgres"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &str {
        "postgres"
    }

    fn data_type_of(&self, native: NativeType) -> String {
        let ty = match native {
            NativeType::Bool => "boolean",
            NativeType::SmallInt => "smallint",
            NativeType::Int => "integer",
            NativeType::BigInt => "bigint",
            NativeType::Real => "real",
            NativeType::Double => "double precision",
            NativeType::Text => "text",
            NativeType::Bytes => "bytea",
            NativeType::Json => "jsonb",
            NativeType::Uuid => "uuid",
            NativeType::Date => "date",
            NativeType::Time => "time",
            NativeType::Timestamp => "timestamp",
            NativeType::TimestampTz => "timestamptz",
        };
        ty.to_string()
    }

    fn table_exist_sql(&self, table: &str) -> (String, Vec<Param>) {
        (
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name::text = ?"
                .to_string(),
            vec![Param::new(table.to_string())],
        )
    }

    fn bind_var(&self, index: usize) -> String {
        format!("${index}")
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}
