//! Column decoding shared by the MySQL repositories

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{mysql::MySqlRow, Row};
use uuid::Uuid;

use sv_core::domain::entities::{Verification, VerificationStatus};
use sv_core::domain::value_objects::Money;
use sv_core::errors::DomainError;

/// Columns selected for every verification read
pub(super) const VERIFICATION_COLUMNS: &str = "id, user_id, service_name, country, phone_number, \
     status, cost, provider_cost, activation_id, sms_code, sms_text, created_at, updated_at, \
     completed_at, refunded_at, refund_attempts, last_refund_attempt_at";

/// Wrap a database error with what was being attempted
pub(super) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("{}: {}", context, e),
    }
}

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name).map_err(|e| DomainError::Internal {
        message: format!("Failed to get {}: {}", name, e),
    })
}

pub(super) fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID {}: {}", value, e),
    })
}

pub(super) fn to_money(value: Decimal) -> Result<Money, DomainError> {
    Money::new(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid stored amount {}: {}", value, e),
    })
}

pub(super) fn money_column(row: &MySqlRow, name: &str) -> Result<Money, DomainError> {
    to_money(column::<Decimal>(row, name)?)
}

/// Convert a database row to a Verification entity
pub(super) fn row_to_verification(row: &MySqlRow) -> Result<Verification, DomainError> {
    let id: String = column(row, "id")?;
    let user_id: String = column(row, "user_id")?;
    let status: String = column(row, "status")?;
    let provider_cost: Option<Decimal> = column(row, "provider_cost")?;

    Ok(Verification {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        service_name: column(row, "service_name")?,
        country: column(row, "country")?,
        phone_number: column(row, "phone_number")?,
        status: status
            .parse::<VerificationStatus>()
            .map_err(|message| DomainError::Internal { message })?,
        cost: money_column(row, "cost")?,
        provider_cost: provider_cost.map(to_money).transpose()?,
        activation_id: column(row, "activation_id")?,
        sms_code: column(row, "sms_code")?,
        sms_text: column(row, "sms_text")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
        completed_at: column::<Option<DateTime<Utc>>>(row, "completed_at")?,
        refunded_at: column::<Option<DateTime<Utc>>>(row, "refunded_at")?,
        refund_attempts: column(row, "refund_attempts")?,
        last_refund_attempt_at: column::<Option<DateTime<Utc>>>(row, "last_refund_attempt_at")?,
    })
}
