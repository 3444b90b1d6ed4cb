//! Storage error classification
//!
//! The only place where `DbErr` is turned into the domain taxonomy.

use sea_orm::{DbErr, Order, SqlErr};

use crate::shared::SortDirection;
use crate::support::DomainError;

/// Wrap an unclassified storage failure without leaking its text into `Display`.
pub(super) fn db_err(operation: &'static str) -> impl FnOnce(DbErr) -> DomainError {
    move |e| DomainError::internal("DB_ERROR", format!("{operation} failed"), e)
}

/// Classify a failed insert/update: unique violations become `Conflict`,
/// attributed to the first of `unique_columns` named in the driver message.
pub(super) fn write_err(
    entity: &'static str,
    unique_columns: &'static [&'static str],
    operation: &'static str,
) -> impl FnOnce(DbErr) -> DomainError {
    move |e| match unique_violation_detail(&e) {
        Some(detail) => DomainError::conflict(entity, conflict_field(&detail, unique_columns)),
        None => db_err(operation)(e),
    }
}

pub(super) fn is_foreign_key_violation(e: &DbErr) -> bool {
    match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => true,
        _ => e.to_string().contains("FOREIGN KEY constraint failed"),
    }
}

fn unique_violation_detail(e: &DbErr) -> Option<String> {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => {
            let text = e.to_string();
            if text.contains("UNIQUE constraint failed") || text.contains("duplicate key") {
                Some(text)
            } else {
                None
            }
        }
    }
}

fn conflict_field(detail: &str, unique_columns: &'static [&'static str]) -> Option<&'static str> {
    unique_columns
        .iter()
        .copied()
        .find(|column| detail.contains(column))
}

pub(super) fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// `%term%` with LIKE wildcards in the term escaped by `\`.
pub(super) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
