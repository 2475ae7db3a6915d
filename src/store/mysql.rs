use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::calculation::PayrollTotals;
use crate::error::{Entity, PayrollError, PayrollResult};
use crate::model::employee::EmployeeLabel;
use crate::model::payroll::{Payroll, PayrollDraft, PayrollFilter, Period};
use crate::model::salary_component::{ComponentDraft, SalaryComponent};

use super::{EmployeeDirectory, PayrollStore};

const PAYROLL_COLUMNS: &str = "id, employee_id, month, year, basic_salary, hra, \
     gross_salary, total_deductions, net_salary, notes, created_at, updated_at";

const COMPONENT_COLUMNS: &str = "id, name, component_type, amount";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    U8(u8),
    I32(i32),
}

#[derive(sqlx::FromRow)]
struct AttachedComponent {
    payroll_id: u64,
    #[sqlx(flatten)]
    component: SalaryComponent,
}

/// MySQL-backed storage for components and payroll records; also reads the
/// `employees` table owned by the HR directory.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Loads the attached components of every record in `payrolls`.
    async fn load_components(&self, payrolls: &mut [Payroll]) -> PayrollResult<()> {
        if payrolls.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "SELECT pc.payroll_id, c.id, c.name, c.component_type, c.amount \
             FROM payroll_components pc \
             JOIN salary_components c ON c.id = pc.component_id \
             WHERE pc.payroll_id IN ({}) \
             ORDER BY c.id",
            placeholders(payrolls.len())
        );

        let mut query = sqlx::query_as::<_, AttachedComponent>(&sql);
        for payroll in payrolls.iter() {
            query = query.bind(payroll.id);
        }

        let mut by_payroll: HashMap<u64, Vec<SalaryComponent>> = HashMap::new();
        for row in query.fetch_all(&self.pool).await? {
            by_payroll
                .entry(row.payroll_id)
                .or_default()
                .push(row.component);
        }

        for payroll in payrolls.iter_mut() {
            payroll.components = by_payroll.remove(&payroll.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Maps constraint violations of a payroll write onto the error taxonomy.
fn translate_payroll_write(err: sqlx::Error, period: Period) -> PayrollError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return PayrollError::DuplicatePayroll {
                employee_id: period.employee_id,
                month: period.month,
                year: period.year,
            };
        }
    }
    err.into()
}

async fn attach_components(
    tx: &mut Transaction<'_, MySql>,
    payroll_id: u64,
    component_ids: &[u64],
) -> PayrollResult<()> {
    for &component_id in component_ids {
        let result = sqlx::query(
            "INSERT INTO payroll_components (payroll_id, component_id) VALUES (?, ?)",
        )
        .bind(payroll_id)
        .bind(component_id)
        .execute(&mut **tx)
        .await;

        if let Err(e) = result {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return Err(PayrollError::not_found(
                        Entity::SalaryComponent,
                        component_id,
                    ));
                }
            }
            return Err(e.into());
        }
    }
    Ok(())
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn employee_exists(&self, employee_id: u64) -> PayrollResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn employee_display_name(&self, employee_id: u64) -> PayrollResult<Option<String>> {
        let label = sqlx::query_as::<_, EmployeeLabel>(
            "SELECT id, employee_code, first_name, last_name FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(label.map(|l| l.display_name()))
    }
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn list_components(&self) -> PayrollResult<Vec<SalaryComponent>> {
        let sql = format!("SELECT {COMPONENT_COLUMNS} FROM salary_components ORDER BY name, id");
        let components = sqlx::query_as::<_, SalaryComponent>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(components)
    }

    async fn get_component(&self, id: u64) -> PayrollResult<Option<SalaryComponent>> {
        let sql = format!("SELECT {COMPONENT_COLUMNS} FROM salary_components WHERE id = ?");
        let component = sqlx::query_as::<_, SalaryComponent>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(component)
    }

    async fn find_components(&self, ids: &[u64]) -> PayrollResult<Vec<SalaryComponent>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {COMPONENT_COLUMNS} FROM salary_components WHERE id IN ({})",
            placeholders(ids.len())
        );

        let mut query = sqlx::query_as::<_, SalaryComponent>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn insert_component(&self, draft: ComponentDraft) -> PayrollResult<SalaryComponent> {
        let result = sqlx::query(
            "INSERT INTO salary_components (name, component_type, amount) VALUES (?, ?, ?)",
        )
        .bind(&draft.name)
        .bind(draft.component_type.as_ref())
        .bind(draft.amount)
        .execute(&self.pool)
        .await?;

        Ok(SalaryComponent::from_draft(result.last_insert_id(), draft))
    }

    async fn update_component(&self, component: &SalaryComponent) -> PayrollResult<()> {
        sqlx::query(
            "UPDATE salary_components SET name = ?, component_type = ?, amount = ? WHERE id = ?",
        )
        .bind(&component.name)
        .bind(component.component_type.as_ref())
        .bind(component.amount)
        .bind(component.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_component(&self, id: u64) -> PayrollResult<bool> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("DELETE FROM payroll_components WHERE component_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM salary_components WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        debug!(component_id = id, detached, "Salary component deleted");
        Ok(deleted > 0)
    }

    async fn list_payrolls(&self, filter: PayrollFilter) -> PayrollResult<Vec<Payroll>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(month) = filter.month {
            where_sql.push_str(" AND month = ?");
            args.push(FilterValue::U8(month));
        }

        if let Some(year) = filter.year {
            where_sql.push_str(" AND year = ?");
            args.push(FilterValue::I32(year));
        }

        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM employee_payrolls{where_sql} \
             ORDER BY year DESC, month DESC, employee_id DESC, id DESC"
        );
        debug!(sql = %sql, "Fetching payroll records");

        let mut query = sqlx::query_as::<_, Payroll>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::U8(v) => query.bind(v),
                FilterValue::I32(v) => query.bind(v),
            };
        }

        let mut payrolls = query.fetch_all(&self.pool).await?;
        self.load_components(&mut payrolls).await?;
        Ok(payrolls)
    }

    async fn get_payroll(&self, id: u64) -> PayrollResult<Option<Payroll>> {
        let sql = format!("SELECT {PAYROLL_COLUMNS} FROM employee_payrolls WHERE id = ?");
        let payroll = sqlx::query_as::<_, Payroll>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let mut found: Vec<Payroll> = payroll.into_iter().collect();
        self.load_components(&mut found).await?;
        Ok(found.pop())
    }

    async fn find_payroll_by_period(&self, period: Period) -> PayrollResult<Option<u64>> {
        let id = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employee_payrolls WHERE employee_id = ? AND month = ? AND year = ?",
        )
        .bind(period.employee_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_payroll(
        &self,
        draft: &PayrollDraft,
        component_ids: &[u64],
    ) -> PayrollResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO employee_payrolls
            (employee_id, month, year, basic_salary, hra,
             gross_salary, total_deductions, net_salary, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.period.employee_id)
        .bind(draft.period.month)
        .bind(draft.period.year)
        .bind(draft.basic_salary)
        .bind(draft.hra)
        .bind(draft.totals.gross_salary)
        .bind(draft.totals.total_deductions)
        .bind(draft.totals.net_salary)
        .bind(draft.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| translate_payroll_write(e, draft.period))?;

        let payroll_id = result.last_insert_id();
        attach_components(&mut tx, payroll_id, component_ids).await?;

        tx.commit().await?;
        Ok(payroll_id)
    }

    async fn update_payroll(
        &self,
        id: u64,
        draft: &PayrollDraft,
        component_ids: Option<&[u64]>,
    ) -> PayrollResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE employee_payrolls
            SET employee_id = ?, month = ?, year = ?, basic_salary = ?, hra = ?,
                gross_salary = ?, total_deductions = ?, net_salary = ?, notes = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(draft.period.employee_id)
        .bind(draft.period.month)
        .bind(draft.period.year)
        .bind(draft.basic_salary)
        .bind(draft.hra)
        .bind(draft.totals.gross_salary)
        .bind(draft.totals.total_deductions)
        .bind(draft.totals.net_salary)
        .bind(draft.notes.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| translate_payroll_write(e, draft.period))?;

        if let Some(component_ids) = component_ids {
            sqlx::query("DELETE FROM payroll_components WHERE payroll_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            attach_components(&mut tx, id, component_ids).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_totals(&self, id: u64, totals: PayrollTotals) -> PayrollResult<()> {
        sqlx::query(
            r#"
            UPDATE employee_payrolls
            SET gross_salary = ?, total_deductions = ?, net_salary = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(totals.gross_salary)
        .bind(totals.total_deductions)
        .bind(totals.net_salary)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_payroll(&self, id: u64) -> PayrollResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM payroll_components WHERE payroll_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM employee_payrolls WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_match_bind_count() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let period = Period {
            employee_id: 1,
            month: 3,
            year: 2025,
        };
        let err = translate_payroll_write(sqlx::Error::PoolTimedOut, period);
        assert!(matches!(err, PayrollError::Database(_)));
    }
}
