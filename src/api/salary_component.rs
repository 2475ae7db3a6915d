use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::salary_component::ComponentType;
use crate::service::ComponentCatalog;
use crate::service::salary_component::ComponentChanges;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateSalaryComponent {
    #[schema(example = "Transport allowance")]
    pub name: String,

    #[schema(example = "earning")]
    pub component_type: ComponentType,

    #[schema(example = "5000.00", value_type = String)]
    pub amount: Decimal,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdateSalaryComponent {
    #[schema(example = "Transport allowance")]
    pub name: Option<String>,

    #[schema(example = "deduction")]
    pub component_type: Option<ComponentType>,

    #[schema(example = "2500.00", value_type = Option<String>)]
    pub amount: Option<Decimal>,
}

impl From<UpdateSalaryComponent> for ComponentChanges {
    fn from(body: UpdateSalaryComponent) -> Self {
        Self {
            name: body.name,
            component_type: body.component_type,
            amount: body.amount,
        }
    }
}

/// List salary components
#[utoipa::path(
    get,
    path = "/api/salary-components",
    responses(
        (status = 200, description = "All salary components ordered by name", body = [SalaryComponent]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Component"
)]
pub async fn list_components(
    _auth: AuthUser,
    catalog: web::Data<ComponentCatalog>,
) -> actix_web::Result<impl Responder> {
    let components = catalog.list().await?;
    Ok(HttpResponse::Ok().json(components))
}

/// Get salary component by ID
#[utoipa::path(
    get,
    path = "/api/salary-components/{component_id}",
    params(
        ("component_id" = u64, Path, description = "Salary component ID")
    ),
    responses(
        (status = 200, description = "Salary component found", body = SalaryComponent),
        (status = 404, description = "Salary component not found", body = Object, example = json!({
            "error": "not_found",
            "message": "Salary component 7 not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Component"
)]
pub async fn get_component(
    _auth: AuthUser,
    catalog: web::Data<ComponentCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let component = catalog.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(component))
}

/// Create salary component
#[utoipa::path(
    post,
    path = "/api/salary-components",
    request_body = CreateSalaryComponent,
    responses(
        (status = 201, description = "Salary component created", body = SalaryComponent),
        (status = 400, description = "Invalid name, type or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Component"
)]
pub async fn create_component(
    auth: AuthUser,
    catalog: web::Data<ComponentCatalog>,
    payload: web::Json<CreateSalaryComponent>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let component = catalog
        .create(&payload.name, payload.component_type, payload.amount)
        .await?;

    Ok(HttpResponse::Created().json(component))
}

/// Update salary component
///
/// Payroll records referencing the component keep their totals until they
/// are recalculated.
#[utoipa::path(
    put,
    path = "/api/salary-components/{component_id}",
    params(
        ("component_id" = u64, Path, description = "Salary component ID")
    ),
    request_body = UpdateSalaryComponent,
    responses(
        (status = 200, description = "Salary component updated", body = SalaryComponent),
        (status = 400, description = "Invalid name, type or amount"),
        (status = 404, description = "Salary component not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Component"
)]
pub async fn update_component(
    auth: AuthUser,
    catalog: web::Data<ComponentCatalog>,
    path: web::Path<u64>,
    body: web::Json<UpdateSalaryComponent>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let component = catalog
        .update(path.into_inner(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(component))
}

/// Delete salary component
///
/// The component is detached from every payroll record referencing it.
#[utoipa::path(
    delete,
    path = "/api/salary-components/{component_id}",
    params(
        ("component_id" = u64, Path, description = "Salary component ID")
    ),
    responses(
        (status = 204, description = "Salary component deleted"),
        (status = 404, description = "Salary component not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Component"
)]
pub async fn delete_component(
    auth: AuthUser,
    catalog: web::Data<ComponentCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    catalog.delete(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
