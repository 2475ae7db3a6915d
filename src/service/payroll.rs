//! Payroll calculator: one record per employee-period, totals kept in step
//! with base pay and the attached components on every write.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::calculation::{self, PayrollTotals};
use crate::error::{Entity, PayrollError, PayrollResult};
use crate::model::payroll::{Payroll, PayrollDraft, PayrollFilter, Period};
use crate::model::salary_component::SalaryComponent;
use crate::store::{EmployeeDirectory, PayrollStore};
use crate::utils::money::validate_amount;

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub month: u8,
    pub year: i32,
    pub basic_salary: Decimal,
    pub hra: Decimal,
    pub component_ids: Vec<u64>,
    pub notes: Option<String>,
}

/// Partial update of a payroll record. `component_ids`, when present,
/// replaces the whole component set (an empty list detaches everything).
#[derive(Debug, Clone, Default)]
pub struct PayrollChanges {
    pub employee_id: Option<u64>,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub basic_salary: Option<Decimal>,
    pub hra: Option<Decimal>,
    pub notes: Option<String>,
    pub component_ids: Option<Vec<u64>>,
}

/// A payroll record together with the label of its employee.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollDetails {
    pub payroll: Payroll,
    pub employee_name: Option<String>,
}

#[derive(Clone)]
pub struct PayrollCalculator {
    store: Arc<dyn PayrollStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

fn validate_period(month: u8, year: i32) -> PayrollResult<()> {
    if !(1..=12).contains(&month) {
        return Err(PayrollError::validation("month must be between 1 and 12"));
    }
    if year < 0 {
        return Err(PayrollError::validation("year must not be negative"));
    }
    Ok(())
}

/// Blank notes are stored as no notes.
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

fn duplicate(period: Period) -> PayrollError {
    PayrollError::DuplicatePayroll {
        employee_id: period.employee_id,
        month: period.month,
        year: period.year,
    }
}

/// Sorted, de-duplicated component ids. The reference set has set semantics.
fn component_set(ids: &[u64]) -> Vec<u64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

impl PayrollCalculator {
    pub fn new(store: Arc<dyn PayrollStore>, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { store, directory }
    }

    async fn require_employee(&self, employee_id: u64) -> PayrollResult<()> {
        if self.directory.employee_exists(employee_id).await? {
            Ok(())
        } else {
            Err(PayrollError::not_found(Entity::Employee, employee_id))
        }
    }

    /// Loads every component of `ids`, failing on the first one missing.
    async fn resolve_components(&self, ids: &[u64]) -> PayrollResult<Vec<SalaryComponent>> {
        let found = self.store.find_components(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
            return Err(PayrollError::not_found(Entity::SalaryComponent, *missing));
        }
        Ok(found)
    }

    async fn load(&self, id: u64) -> PayrollResult<Payroll> {
        self.store
            .get_payroll(id)
            .await?
            .ok_or_else(|| PayrollError::not_found(Entity::Payroll, id))
    }

    async fn describe(&self, payroll: Payroll) -> PayrollResult<PayrollDetails> {
        let employee_name = self
            .directory
            .employee_display_name(payroll.employee_id)
            .await?;
        Ok(PayrollDetails {
            payroll,
            employee_name,
        })
    }

    pub async fn create(&self, new: NewPayroll) -> PayrollResult<PayrollDetails> {
        validate_period(new.month, new.year)?;
        let basic_salary = validate_amount("basic_salary", new.basic_salary)?;
        let hra = validate_amount("hra", new.hra)?;

        self.require_employee(new.employee_id).await?;

        let component_ids = component_set(&new.component_ids);
        let components = self.resolve_components(&component_ids).await?;

        let period = Period {
            employee_id: new.employee_id,
            month: new.month,
            year: new.year,
        };
        if self.store.find_payroll_by_period(period).await?.is_some() {
            warn!(
                employee_id = period.employee_id,
                month = period.month,
                year = period.year,
                "Rejected duplicate payroll"
            );
            return Err(duplicate(period));
        }

        let draft = PayrollDraft {
            period,
            basic_salary,
            hra,
            notes: normalize_notes(new.notes),
            totals: calculation::calculate(basic_salary, hra, &components),
        };

        let id = self.store.insert_payroll(&draft, &component_ids).await?;
        info!(
            payroll_id = id,
            employee_id = period.employee_id,
            month = period.month,
            year = period.year,
            net_salary = %draft.totals.net_salary,
            "Payroll created"
        );

        let payroll = self.load(id).await?;
        self.describe(payroll).await
    }

    pub async fn update(&self, id: u64, changes: PayrollChanges) -> PayrollResult<PayrollDetails> {
        let current = self.load(id).await?;

        let period = Period {
            employee_id: changes.employee_id.unwrap_or(current.employee_id),
            month: changes.month.unwrap_or(current.month),
            year: changes.year.unwrap_or(current.year),
        };
        validate_period(period.month, period.year)?;

        let basic_salary = match changes.basic_salary {
            Some(amount) => validate_amount("basic_salary", amount)?,
            None => current.basic_salary,
        };
        let hra = match changes.hra {
            Some(amount) => validate_amount("hra", amount)?,
            None => current.hra,
        };

        if period.employee_id != current.employee_id {
            self.require_employee(period.employee_id).await?;
        }

        let component_ids = changes.component_ids.as_deref().map(component_set);
        let components = match &component_ids {
            Some(ids) => self.resolve_components(ids).await?,
            None => current.components.clone(),
        };

        if period != current.period() {
            if let Some(other) = self.store.find_payroll_by_period(period).await? {
                if other != id {
                    warn!(
                        payroll_id = id,
                        conflicting_payroll_id = other,
                        month = period.month,
                        year = period.year,
                        "Rejected payroll period change"
                    );
                    return Err(duplicate(period));
                }
            }
        }

        let notes = match changes.notes {
            Some(notes) => normalize_notes(Some(notes)),
            None => current.notes.clone(),
        };

        let draft = PayrollDraft {
            period,
            basic_salary,
            hra,
            notes,
            totals: calculation::calculate(basic_salary, hra, &components),
        };

        self.store
            .update_payroll(id, &draft, component_ids.as_deref())
            .await?;
        info!(
            payroll_id = id,
            net_salary = %draft.totals.net_salary,
            components_replaced = component_ids.is_some(),
            "Payroll updated"
        );

        let payroll = self.load(id).await?;
        self.describe(payroll).await
    }

    /// Recomputes totals from the stored base pay and component set.
    pub async fn recalculate(&self, id: u64) -> PayrollResult<PayrollDetails> {
        let mut payroll = self.load(id).await?;

        let totals: PayrollTotals =
            calculation::calculate(payroll.basic_salary, payroll.hra, &payroll.components);
        self.store.save_totals(id, totals).await?;
        info!(
            payroll_id = id,
            previous_net_salary = %payroll.net_salary,
            net_salary = %totals.net_salary,
            "Payroll recalculated"
        );

        payroll.gross_salary = totals.gross_salary;
        payroll.total_deductions = totals.total_deductions;
        payroll.net_salary = totals.net_salary;
        self.describe(payroll).await
    }

    pub async fn get(&self, id: u64) -> PayrollResult<PayrollDetails> {
        let payroll = self.load(id).await?;
        self.describe(payroll).await
    }

    pub async fn list(&self, filter: PayrollFilter) -> PayrollResult<Vec<PayrollDetails>> {
        let payrolls = self.store.list_payrolls(filter).await?;
        let mut details = Vec::with_capacity(payrolls.len());
        for payroll in payrolls {
            details.push(self.describe(payroll).await?);
        }
        Ok(details)
    }

    pub async fn delete(&self, id: u64) -> PayrollResult<()> {
        if !self.store.delete_payroll(id).await? {
            return Err(PayrollError::not_found(Entity::Payroll, id));
        }
        info!(payroll_id = id, "Payroll deleted");
        Ok(())
    }
}
