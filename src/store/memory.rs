use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::calculation::PayrollTotals;
use crate::error::{Entity, PayrollError, PayrollResult};
use crate::model::employee::EmployeeLabel;
use crate::model::payroll::{Payroll, PayrollDraft, PayrollFilter, Period};
use crate::model::salary_component::{ComponentDraft, SalaryComponent};

use super::{EmployeeDirectory, PayrollStore};

/// Stored payroll row; components are kept as ids like the join table.
#[derive(Debug, Clone)]
struct PayrollRow {
    payroll: Payroll,
    component_ids: Vec<u64>,
}

#[derive(Debug, Default)]
struct Tables {
    next_component_id: u64,
    next_payroll_id: u64,
    components: BTreeMap<u64, SalaryComponent>,
    payrolls: BTreeMap<u64, PayrollRow>,
}

impl Tables {
    fn period_taken(&self, period: Period, except: Option<u64>) -> bool {
        self.payrolls
            .iter()
            .any(|(id, row)| Some(*id) != except && row.payroll.period() == period)
    }

    fn check_components(&self, component_ids: &[u64]) -> PayrollResult<()> {
        match component_ids
            .iter()
            .find(|id| !self.components.contains_key(*id))
        {
            Some(missing) => Err(PayrollError::not_found(Entity::SalaryComponent, *missing)),
            None => Ok(()),
        }
    }

    fn hydrate(&self, row: &PayrollRow) -> Payroll {
        let mut payroll = row.payroll.clone();
        let mut components: Vec<SalaryComponent> = row
            .component_ids
            .iter()
            .filter_map(|id| self.components.get(id).cloned())
            .collect();
        components.sort_by_key(|c| c.id);
        payroll.components = components;
        payroll
    }
}

fn filter_matches(filter: &PayrollFilter, payroll: &Payroll) -> bool {
    filter.employee_id.is_none_or(|id| payroll.employee_id == id)
        && filter.month.is_none_or(|m| payroll.month == m)
        && filter.year.is_none_or(|y| payroll.year == y)
}

fn duplicate(period: Period) -> PayrollError {
    PayrollError::DuplicatePayroll {
        employee_id: period.employee_id,
        month: period.month,
        year: period.year,
    }
}

/// In-memory stand-in for both the payroll tables and the employee
/// directory. Enforces the same unique and foreign keys the schema does.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    employees: Mutex<HashMap<u64, EmployeeLabel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_employee(&self, id: u64, first_name: &str, last_name: &str, code: &str) {
        self.employees.lock().await.insert(
            id,
            EmployeeLabel {
                id,
                employee_code: code.to_string(),
                first_name: first_name.to_string(),
                last_name: Some(last_name.to_string()),
            },
        );
    }

    pub async fn payroll_count(&self) -> usize {
        self.tables.lock().await.payrolls.len()
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn employee_exists(&self, employee_id: u64) -> PayrollResult<bool> {
        Ok(self.employees.lock().await.contains_key(&employee_id))
    }

    async fn employee_display_name(&self, employee_id: u64) -> PayrollResult<Option<String>> {
        Ok(self
            .employees
            .lock()
            .await
            .get(&employee_id)
            .map(EmployeeLabel::display_name))
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn list_components(&self) -> PayrollResult<Vec<SalaryComponent>> {
        let tables = self.tables.lock().await;
        let mut components: Vec<SalaryComponent> = tables.components.values().cloned().collect();
        components.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(components)
    }

    async fn get_component(&self, id: u64) -> PayrollResult<Option<SalaryComponent>> {
        Ok(self.tables.lock().await.components.get(&id).cloned())
    }

    async fn find_components(&self, ids: &[u64]) -> PayrollResult<Vec<SalaryComponent>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.components.get(id).cloned())
            .collect())
    }

    async fn insert_component(&self, draft: ComponentDraft) -> PayrollResult<SalaryComponent> {
        let mut tables = self.tables.lock().await;
        tables.next_component_id += 1;
        let component = SalaryComponent::from_draft(tables.next_component_id, draft);
        tables.components.insert(component.id, component.clone());
        Ok(component)
    }

    async fn update_component(&self, component: &SalaryComponent) -> PayrollResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(stored) = tables.components.get_mut(&component.id) {
            *stored = component.clone();
        }
        Ok(())
    }

    async fn delete_component(&self, id: u64) -> PayrollResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.components.remove(&id).is_none() {
            return Ok(false);
        }
        for row in tables.payrolls.values_mut() {
            row.component_ids.retain(|c| *c != id);
        }
        Ok(true)
    }

    async fn list_payrolls(&self, filter: PayrollFilter) -> PayrollResult<Vec<Payroll>> {
        let tables = self.tables.lock().await;
        let mut payrolls: Vec<Payroll> = tables
            .payrolls
            .values()
            .filter(|row| filter_matches(&filter, &row.payroll))
            .map(|row| tables.hydrate(row))
            .collect();
        payrolls.sort_by(|a, b| {
            (b.year, b.month, b.employee_id, b.id).cmp(&(a.year, a.month, a.employee_id, a.id))
        });
        Ok(payrolls)
    }

    async fn get_payroll(&self, id: u64) -> PayrollResult<Option<Payroll>> {
        let tables = self.tables.lock().await;
        Ok(tables.payrolls.get(&id).map(|row| tables.hydrate(row)))
    }

    async fn find_payroll_by_period(&self, period: Period) -> PayrollResult<Option<u64>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payrolls
            .iter()
            .find(|(_, row)| row.payroll.period() == period)
            .map(|(id, _)| *id))
    }

    async fn insert_payroll(
        &self,
        draft: &PayrollDraft,
        component_ids: &[u64],
    ) -> PayrollResult<u64> {
        let mut tables = self.tables.lock().await;
        if tables.period_taken(draft.period, None) {
            return Err(duplicate(draft.period));
        }
        tables.check_components(component_ids)?;

        tables.next_payroll_id += 1;
        let id = tables.next_payroll_id;
        let now = Utc::now();
        let payroll = Payroll {
            id,
            employee_id: draft.period.employee_id,
            month: draft.period.month,
            year: draft.period.year,
            basic_salary: draft.basic_salary,
            hra: draft.hra,
            gross_salary: draft.totals.gross_salary,
            total_deductions: draft.totals.total_deductions,
            net_salary: draft.totals.net_salary,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
            components: Vec::new(),
        };
        tables.payrolls.insert(
            id,
            PayrollRow {
                payroll,
                component_ids: component_ids.to_vec(),
            },
        );
        Ok(id)
    }

    async fn update_payroll(
        &self,
        id: u64,
        draft: &PayrollDraft,
        component_ids: Option<&[u64]>,
    ) -> PayrollResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.period_taken(draft.period, Some(id)) {
            return Err(duplicate(draft.period));
        }
        if let Some(ids) = component_ids {
            tables.check_components(ids)?;
        }

        let Some(row) = tables.payrolls.get_mut(&id) else {
            return Ok(());
        };
        let payroll = &mut row.payroll;
        payroll.employee_id = draft.period.employee_id;
        payroll.month = draft.period.month;
        payroll.year = draft.period.year;
        payroll.basic_salary = draft.basic_salary;
        payroll.hra = draft.hra;
        payroll.gross_salary = draft.totals.gross_salary;
        payroll.total_deductions = draft.totals.total_deductions;
        payroll.net_salary = draft.totals.net_salary;
        payroll.notes = draft.notes.clone();
        payroll.updated_at = Utc::now();
        if let Some(ids) = component_ids {
            row.component_ids = ids.to_vec();
        }
        Ok(())
    }

    async fn save_totals(&self, id: u64, totals: PayrollTotals) -> PayrollResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.payrolls.get_mut(&id) {
            row.payroll.gross_salary = totals.gross_salary;
            row.payroll.total_deductions = totals.total_deductions;
            row.payroll.net_salary = totals.net_salary;
            row.payroll.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_payroll(&self, id: u64) -> PayrollResult<bool> {
        Ok(self.tables.lock().await.payrolls.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn draft(employee_id: u64, month: u8, year: i32) -> PayrollDraft {
        PayrollDraft {
            period: Period {
                employee_id,
                month,
                year,
            },
            basic_salary: Decimal::from(1000),
            hra: Decimal::ZERO,
            notes: None,
            totals: PayrollTotals {
                gross_salary: Decimal::from(1000),
                total_deductions: Decimal::ZERO,
                net_salary: Decimal::from(1000),
            },
        }
    }

    fn is_duplicate(result: PayrollResult<impl std::fmt::Debug>, expected: Period) -> bool {
        matches!(
            result,
            Err(PayrollError::DuplicatePayroll { employee_id, month, year })
                if employee_id == expected.employee_id
                    && month == expected.month
                    && year == expected.year
        )
    }

    #[actix_web::test]
    async fn test_insert_into_taken_period_is_duplicate() {
        let store = MemoryStore::new();
        let january = draft(1, 1, 2024);

        store.insert_payroll(&january, &[]).await.unwrap();
        let second = store.insert_payroll(&january, &[]).await;

        assert!(is_duplicate(second, january.period));
        assert_eq!(store.payroll_count().await, 1);
    }

    #[actix_web::test]
    async fn test_update_into_taken_period_is_duplicate() {
        let store = MemoryStore::new();
        store.insert_payroll(&draft(1, 1, 2024), &[]).await.unwrap();
        let february = store.insert_payroll(&draft(1, 2, 2024), &[]).await.unwrap();

        let moved = draft(1, 1, 2024);
        let result = store.update_payroll(february, &moved, None).await;
        assert!(is_duplicate(result, moved.period));

        let stored = store.get_payroll(february).await.unwrap().unwrap();
        assert_eq!(stored.month, 2);

        // Rewriting a record onto its own period is not a clash
        store
            .update_payroll(february, &draft(1, 2, 2024), None)
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn test_blank_filter_matches_everything() {
        let store = MemoryStore::new();
        store.insert_payroll(&draft(1, 1, 2024), &[]).await.unwrap();
        store.insert_payroll(&draft(2, 1, 2023), &[]).await.unwrap();

        let all = store.list_payrolls(PayrollFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].year, 2024);

        let filter = PayrollFilter {
            year: Some(2023),
            ..Default::default()
        };
        let old = store.list_payrolls(filter).await.unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].employee_id, 2);
    }
}
