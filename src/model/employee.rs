use serde::{Deserialize, Serialize};

/// The slice of an employee directory row payroll needs to label a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeLabel {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl EmployeeLabel {
    /// "First Last (CODE)", last name dropped when blank.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => {
                format!("{} {} ({})", self.first_name, last, self.employee_code)
            }
            _ => format!("{} ({})", self.first_name, self.employee_code),
        }
    }
}
