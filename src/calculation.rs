//! Payroll calculation routine.
//!
//! Pure function of base pay and the component set attached to a payroll
//! record. All arithmetic stays in fixed-point decimal; nothing is rounded
//! beyond the precision the amounts were stored with.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::salary_component::{ComponentType, SalaryComponent};

/// Derived figures of one employee-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayrollTotals {
    pub gross_salary: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
}

/// Sum of the amounts of every component of the given type.
pub fn sum_of(components: &[SalaryComponent], component_type: ComponentType) -> Decimal {
    components
        .iter()
        .filter(|c| c.component_type == component_type)
        .map(|c| c.amount)
        .sum()
}

/// gross = basic + hra + earnings, net = gross - deductions.
///
/// Net salary is allowed to go negative when deductions exceed gross.
pub fn calculate(
    basic_salary: Decimal,
    hra: Decimal,
    components: &[SalaryComponent],
) -> PayrollTotals {
    let earnings = sum_of(components, ComponentType::Earning);
    let deductions = sum_of(components, ComponentType::Deduction);

    let gross_salary = basic_salary + hra + earnings;

    PayrollTotals {
        gross_salary,
        total_deductions: deductions,
        net_salary: gross_salary - deductions,
    }
}
