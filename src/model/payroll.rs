use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::PayrollTotals;
use crate::model::salary_component::SalaryComponent;

/// Stored payroll record of one employee-period together with the
/// components currently attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    pub month: u8,
    pub year: i32,
    pub basic_salary: Decimal,
    pub hra: Decimal,
    pub gross_salary: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub components: Vec<SalaryComponent>,
}

impl Payroll {
    pub fn period(&self) -> Period {
        Period {
            employee_id: self.employee_id,
            month: self.month,
            year: self.year,
        }
    }

    pub fn component_ids(&self) -> Vec<u64> {
        self.components.iter().map(|c| c.id).collect()
    }
}

#[cfg(test)]
impl Payroll {
    pub fn totals(&self) -> PayrollTotals {
        PayrollTotals {
            gross_salary: self.gross_salary,
            total_deductions: self.total_deductions,
            net_salary: self.net_salary,
        }
    }
}

/// The (employee, month, year) triple a payroll record is unique on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub employee_id: u64,
    pub month: u8,
    pub year: i32,
}

/// Fully validated values to write for a payroll record, totals included.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollDraft {
    pub period: Period,
    pub basic_salary: Decimal,
    pub hra: Decimal,
    pub notes: Option<String>,
    pub totals: PayrollTotals,
}

/// Optional filters of the payroll listing. Absent filters match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayrollFilter {
    pub employee_id: Option<u64>,
    pub month: Option<u8>,
    pub year: Option<i32>,
}
