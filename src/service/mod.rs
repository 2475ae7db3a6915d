pub mod payroll;
pub mod salary_component;

pub use payroll::PayrollCalculator;
pub use salary_component::ComponentCatalog;
