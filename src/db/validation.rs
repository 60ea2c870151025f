use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

/// Reasons the live database does not match the expected schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("schema query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("table {0} does not exist")]
    MissingTable(&'static str),
    #[error("missing column {column} in table {table}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("extra column {column} found in table {table}")]
    ExtraColumn { table: &'static str, column: String },
    #[error("column mismatch in table {table}: column {column}: {detail}")]
    ColumnMismatch {
        table: &'static str,
        column: &'static str,
        detail: String,
    },
    #[error("missing index {index} in table {table}")]
    MissingIndex {
        table: &'static str,
        index: &'static str,
    },
}

struct ExpectedColumn {
    name: &'static str,
    data_type: &'static str,
    not_null: bool,
}

struct ExpectedTable {
    name: &'static str,
    columns: &'static [ExpectedColumn],
    indexes: &'static [&'static str],
}

const fn column(name: &'static str, data_type: &'static str, not_null: bool) -> ExpectedColumn {
    ExpectedColumn {
        name,
        data_type,
        not_null,
    }
}

const EXPECTED_TABLES: &[ExpectedTable] = &[
    ExpectedTable {
        name: "ads",
        columns: &[
            column("id", "INTEGER", true),
            column("title", "TEXT", true),
            column("description", "TEXT", false),
            column("attributes", "TEXT", true),
            column("status", "INTEGER", true),
            column("price_amount", "DOUBLE", false),
            column("price_currency", "INTEGER", false),
            column("created_at", "TIMESTAMP", true),
            column("updated_at", "TIMESTAMP", true),
        ],
        indexes: &["idx_ads_status", "idx_ads_price", "idx_ads_created_at"],
    },
    ExpectedTable {
        name: "ad_categories",
        columns: &[
            column("ad_id", "INTEGER", true),
            column("category_id", "INTEGER", true),
        ],
        indexes: &["idx_ad_categories_category"],
    },
    ExpectedTable {
        name: "ad_attributes",
        columns: &[
            column("ad_id", "INTEGER", true),
            column("name", "TEXT", true),
            column("value", "TEXT", true),
        ],
        indexes: &["idx_ad_attributes_name_value"],
    },
    ExpectedTable {
        name: "category_closure",
        columns: &[
            column("ancestor_id", "INTEGER", true),
            column("descendant_id", "INTEGER", true),
            column("depth", "INTEGER", true),
        ],
        indexes: &[
            "idx_category_closure_ancestor",
            "idx_category_closure_descendant",
        ],
    },
    ExpectedTable {
        name: "ads_search",
        columns: &[column("content", "", false)],
        indexes: &[],
    },
];

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName)]
struct ColumnInfo {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    column_type: String,
    #[diesel(sql_type = Integer)]
    not_null: i32,
}

fn normalize_type(data_type: &str) -> String {
    let upper = data_type.trim().to_ascii_uppercase();
    match upper.as_str() {
        "INT" | "INTEGER" | "BIGINT" => "INTEGER".to_string(),
        "REAL" | "DOUBLE" | "FLOAT" | "DOUBLE PRECISION" => "DOUBLE".to_string(),
        "TIMESTAMP" | "DATETIME" => "TIMESTAMP".to_string(),
        t if t == "TEXT" || t.starts_with("VARCHAR") => "TEXT".to_string(),
        _ => upper,
    }
}

fn table_exists(conn: &mut SqliteConnection, table: &str) -> QueryResult<bool> {
    let found = diesel::sql_query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind::<Text, _>(table)
        .load::<TableName>(conn)?;
    Ok(!found.is_empty())
}

fn table_columns(conn: &mut SqliteConnection, table: &str) -> QueryResult<Vec<ColumnInfo>> {
    diesel::sql_query(
        "SELECT name, type AS column_type, \"notnull\" AS not_null FROM pragma_table_info(?)",
    )
    .bind::<Text, _>(table)
    .load::<ColumnInfo>(conn)
}

fn table_indexes(conn: &mut SqliteConnection, table: &str) -> QueryResult<Vec<String>> {
    Ok(diesel::sql_query("SELECT name FROM pragma_index_list(?)")
        .bind::<Text, _>(table)
        .load::<TableName>(conn)?
        .into_iter()
        .map(|row| row.name)
        .collect())
}

fn compare_column(
    table: &'static str,
    expected: &ExpectedColumn,
    actual: &ColumnInfo,
) -> Result<(), SchemaError> {
    let expected_type = normalize_type(expected.data_type);
    let actual_type = normalize_type(&actual.column_type);
    if expected_type != actual_type {
        return Err(SchemaError::ColumnMismatch {
            table,
            column: expected.name,
            detail: format!("expected type {expected_type}, got {actual_type}"),
        });
    }

    let actual_not_null = actual.not_null != 0;
    if expected.not_null != actual_not_null {
        return Err(SchemaError::ColumnMismatch {
            table,
            column: expected.name,
            detail: format!(
                "expected not null {}, got {}",
                expected.not_null, actual_not_null
            ),
        });
    }

    Ok(())
}

/// Compare the live schema with the tables, columns and indexes the
/// repository relies on.
pub fn validate_schema(conn: &mut SqliteConnection) -> Result<(), SchemaError> {
    for table in EXPECTED_TABLES {
        if !table_exists(conn, table.name)? {
            return Err(SchemaError::MissingTable(table.name));
        }

        let actual_columns = table_columns(conn, table.name)?;
        for expected in table.columns {
            let actual = actual_columns
                .iter()
                .find(|c| c.name == expected.name)
                .ok_or(SchemaError::MissingColumn {
                    table: table.name,
                    column: expected.name,
                })?;
            compare_column(table.name, expected, actual)?;
        }

        if let Some(extra) = actual_columns
            .iter()
            .find(|actual| !table.columns.iter().any(|c| c.name == actual.name))
        {
            return Err(SchemaError::ExtraColumn {
                table: table.name,
                column: extra.name.clone(),
            });
        }

        let actual_indexes = table_indexes(conn, table.name)?;
        for index in table.indexes {
            if !actual_indexes.iter().any(|i| i.eq_ignore_ascii_case(index)) {
                return Err(SchemaError::MissingIndex {
                    table: table.name,
                    index,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_sqlite_type_aliases() {
        assert_eq!(normalize_type("int"), "INTEGER");
        assert_eq!(normalize_type("REAL"), "DOUBLE");
        assert_eq!(normalize_type("datetime"), "TIMESTAMP");
        assert_eq!(normalize_type("VARCHAR(255)"), "TEXT");
        assert_eq!(normalize_type(""), "");
    }
}
