use crate::api::payroll::{CreatePayroll, PayrollResponse, UpdatePayroll};
use crate::api::salary_component::{CreateSalaryComponent, UpdateSalaryComponent};
use crate::model::salary_component::{ComponentType, SalaryComponent};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## Payroll module of the Human Resource Management (HRM) system

### 🔹 Key Features
- **Salary Components**
  - Catalog of named earnings and deductions with fixed amounts
- **Payroll Management**
  - One payroll record per employee per month
  - Gross salary, total deductions and net salary computed on every write
  - Recalculate a record after component amounts change

### 🔐 Security
All `/api` endpoints expect a **JWT Bearer** access token.
Any authenticated user can read; only **Admin** or **HR** can write.

### 📦 Response Format
- JSON-based RESTful responses
- Money amounts are decimal strings with two fractional digits
- Errors carry `error` and `message` fields

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::routes::health,

        crate::api::salary_component::list_components,
        crate::api::salary_component::get_component,
        crate::api::salary_component::create_component,
        crate::api::salary_component::update_component,
        crate::api::salary_component::delete_component,

        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::recalculate_payroll,
        crate::api::payroll::delete_payroll
    ),
    components(
        schemas(
            ComponentType,
            SalaryComponent,
            CreateSalaryComponent,
            UpdateSalaryComponent,
            PayrollResponse,
            CreatePayroll,
            UpdatePayroll
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Salary Component", description = "Salary component catalog APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
