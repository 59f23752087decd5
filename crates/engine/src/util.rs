//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so rules and manual entries enforce the same
//! invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransactionKind};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|v| parse_uuid(v, label)).transpose()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Payload checks shared by recurring rules and manually recorded entries.
///
/// Returns the normalized category. Payload errors are wrapped with `err`, so
/// rules report `InvalidRule` and manual entries `InvalidTransaction`; a
/// non-positive amount is always `InvalidAmount`.
pub(crate) fn validate_payload(
    kind: TransactionKind,
    amount_minor: i64,
    account_id: Uuid,
    dest_account_id: Option<Uuid>,
    category: Option<&str>,
    err: fn(String) -> EngineError,
) -> ResultEngine<Option<String>> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }

    let category = normalize_optional_text(category);
    match kind {
        TransactionKind::Transfer => match dest_account_id {
            None => {
                return Err(err(
                    "dest_account_id is required for transfers".to_string(),
                ));
            }
            Some(dest) if dest == account_id => {
                return Err(err(
                    "account_id and dest_account_id must differ".to_string(),
                ));
            }
            Some(_) => {}
        },
        TransactionKind::Income | TransactionKind::Expense => {
            if dest_account_id.is_some() {
                return Err(err(format!(
                    "dest_account_id is only allowed for transfers, got {}",
                    kind.as_str()
                )));
            }
            if category.is_none() {
                return Err(err(format!(
                    "category is required for {}",
                    kind.as_str()
                )));
            }
        }
    }
    Ok(category)
}
