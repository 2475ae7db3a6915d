use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComponentType {
    Earning,
    Deduction,
}

impl TryFrom<String> for ComponentType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ComponentType::from_str(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Transport allowance",
        "component_type": "earning",
        "amount": "5000.00"
    })
)]
pub struct SalaryComponent {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Transport allowance")]
    pub name: String,

    #[sqlx(try_from = "String")]
    #[schema(example = "earning")]
    pub component_type: ComponentType,

    #[schema(example = "5000.00", value_type = String)]
    pub amount: Decimal,
}

/// Validated field values of a component about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDraft {
    pub name: String,
    pub component_type: ComponentType,
    pub amount: Decimal,
}

impl SalaryComponent {
    pub fn from_draft(id: u64, draft: ComponentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            component_type: draft.component_type,
            amount: draft.amount,
        }
    }
}
