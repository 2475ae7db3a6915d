//! Storage seams of the payroll service.
//!
//! The service layer only talks to these traits. `MySqlStore` backs them in
//! production; `MemoryStore` backs them in tests.

use async_trait::async_trait;

use crate::calculation::PayrollTotals;
use crate::error::PayrollResult;
use crate::model::payroll::{Payroll, PayrollDraft, PayrollFilter, Period};
use crate::model::salary_component::{ComponentDraft, SalaryComponent};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[cfg(test)]
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Read access to the employee directory, which payroll does not own.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employee_exists(&self, employee_id: u64) -> PayrollResult<bool>;

    /// `None` once the employee has left the directory.
    async fn employee_display_name(&self, employee_id: u64) -> PayrollResult<Option<String>>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// All components ordered by name, then id.
    async fn list_components(&self) -> PayrollResult<Vec<SalaryComponent>>;

    async fn get_component(&self, id: u64) -> PayrollResult<Option<SalaryComponent>>;

    /// The subset of `ids` that exist, in no particular order.
    async fn find_components(&self, ids: &[u64]) -> PayrollResult<Vec<SalaryComponent>>;

    async fn insert_component(&self, draft: ComponentDraft) -> PayrollResult<SalaryComponent>;

    async fn update_component(&self, component: &SalaryComponent) -> PayrollResult<()>;

    /// Detaches the component from every payroll record before removing it.
    /// Returns `false` when no such component exists.
    async fn delete_component(&self, id: u64) -> PayrollResult<bool>;

    /// Records matching `filter`, most recent period first, then highest
    /// employee id, then highest record id.
    async fn list_payrolls(&self, filter: PayrollFilter) -> PayrollResult<Vec<Payroll>>;

    async fn get_payroll(&self, id: u64) -> PayrollResult<Option<Payroll>>;

    /// Id of the record holding `period`, if any.
    async fn find_payroll_by_period(&self, period: Period) -> PayrollResult<Option<u64>>;

    /// Inserts the record and attaches `component_ids` in one transaction.
    ///
    /// Fails with `DuplicatePayroll` when the period is already taken and with
    /// `NotFound` when a component vanished before it could be attached.
    async fn insert_payroll(&self, draft: &PayrollDraft, component_ids: &[u64])
    -> PayrollResult<u64>;

    /// Rewrites the record and, when `component_ids` is given, replaces its
    /// whole component set in the same transaction.
    async fn update_payroll(
        &self,
        id: u64,
        draft: &PayrollDraft,
        component_ids: Option<&[u64]>,
    ) -> PayrollResult<()>;

    async fn save_totals(&self, id: u64, totals: PayrollTotals) -> PayrollResult<()>;

    /// Returns `false` when no such record exists.
    async fn delete_payroll(&self, id: u64) -> PayrollResult<bool>;
}
