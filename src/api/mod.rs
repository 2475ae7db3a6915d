pub mod payroll;
pub mod salary_component;
