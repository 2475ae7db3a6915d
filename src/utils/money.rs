use rust_decimal::Decimal;

use crate::error::{PayrollError, PayrollResult};

/// Fractional digits every stored amount carries.
pub const SCALE: u32 = 2;

/// Amounts are stored as DECIMAL(10,2), so their magnitude stays below 10^8.
const MAX_INTEGER_PART: i64 = 100_000_000;

/// Checks that `value` fits the storage column and returns it at two
/// fractional digits.
pub fn validate_amount(field: &str, value: Decimal) -> PayrollResult<Decimal> {
    let normalized = value.normalize();

    if normalized.scale() > SCALE {
        return Err(PayrollError::validation(format!(
            "{field} must have at most {SCALE} decimal places"
        )));
    }

    if normalized.abs() >= Decimal::from(MAX_INTEGER_PART) {
        return Err(PayrollError::validation(format!(
            "{field} must be less than {MAX_INTEGER_PART}"
        )));
    }

    let mut amount = normalized;
    amount.rescale(SCALE);
    Ok(amount)
}
