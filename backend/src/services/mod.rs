pub mod allocation;
pub mod room;
pub mod stats;
pub mod user;

/// True when `err` is a unique-constraint failure on `column`
/// (`table.column`, as SQLite reports it).
fn is_unique_violation(err: &sqlx::Error, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_error) => {
            db_error.is_unique_violation() && db_error.message().contains(column)
        }
        _ => false,
    }
}

/// Trims free text; blank input counts as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty())
}
