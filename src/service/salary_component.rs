use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{Entity, PayrollError, PayrollResult};
use crate::model::salary_component::{ComponentDraft, ComponentType, SalaryComponent};
use crate::store::PayrollStore;
use crate::utils::money::validate_amount;

const NAME_MAX_CHARS: usize = 100;

/// Partial update of a component; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ComponentChanges {
    pub name: Option<String>,
    pub component_type: Option<ComponentType>,
    pub amount: Option<Decimal>,
}

/// Catalog of reusable earning and deduction line items.
#[derive(Clone)]
pub struct ComponentCatalog {
    store: Arc<dyn PayrollStore>,
}

fn validate_name(name: &str) -> PayrollResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PayrollError::validation("name must not be empty"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(PayrollError::validation(format!(
            "name must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

impl ComponentCatalog {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        name: &str,
        component_type: ComponentType,
        amount: Decimal,
    ) -> PayrollResult<SalaryComponent> {
        let draft = ComponentDraft {
            name: validate_name(name)?,
            component_type,
            amount: validate_amount("amount", amount)?,
        };

        let component = self.store.insert_component(draft).await?;
        info!(
            component_id = component.id,
            component_type = %component.component_type,
            amount = %component.amount,
            "Salary component created"
        );
        Ok(component)
    }

    pub async fn list(&self) -> PayrollResult<Vec<SalaryComponent>> {
        self.store.list_components().await
    }

    pub async fn get(&self, id: u64) -> PayrollResult<SalaryComponent> {
        self.store
            .get_component(id)
            .await?
            .ok_or_else(|| PayrollError::not_found(Entity::SalaryComponent, id))
    }

    /// Payroll records referencing the component keep their stored totals
    /// until they are recalculated.
    pub async fn update(&self, id: u64, changes: ComponentChanges) -> PayrollResult<SalaryComponent> {
        let mut component = self.get(id).await?;

        if let Some(name) = changes.name.as_deref() {
            component.name = validate_name(name)?;
        }
        if let Some(component_type) = changes.component_type {
            component.component_type = component_type;
        }
        if let Some(amount) = changes.amount {
            component.amount = validate_amount("amount", amount)?;
        }

        self.store.update_component(&component).await?;
        info!(component_id = id, "Salary component updated");
        Ok(component)
    }

    /// Detaches the component from every payroll record; those records keep
    /// their stored totals until they are recalculated.
    pub async fn delete(&self, id: u64) -> PayrollResult<()> {
        if !self.store.delete_component(id).await? {
            return Err(PayrollError::not_found(Entity::SalaryComponent, id));
        }
        info!(component_id = id, "Salary component deleted");
        Ok(())
    }
}
