use std::fmt;
use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::payroll::PayrollFilter;
use crate::model::salary_component::SalaryComponent;
use crate::service::PayrollCalculator;
use crate::service::payroll::{NewPayroll, PayrollChanges, PayrollDetails};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreatePayroll {
    #[serde(alias = "employee_id")]
    #[schema(example = 1001)]
    pub employee: u64,

    #[schema(example = 1, minimum = 1, maximum = 12)]
    pub month: u8,

    #[schema(example = 2024)]
    pub year: i32,

    #[serde(default)]
    #[schema(example = "30000.00", value_type = String)]
    pub basic_salary: Decimal,

    #[serde(default)]
    #[schema(example = "5000.00", value_type = String)]
    pub hra: Decimal,

    /// Salary component ids to attach
    #[serde(default)]
    #[schema(example = json!([1, 2]))]
    pub components: Vec<u64>,

    #[schema(example = "January payroll")]
    pub notes: Option<String>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdatePayroll {
    #[serde(alias = "employee_id")]
    #[schema(example = 1001)]
    pub employee: Option<u64>,

    #[schema(example = 2)]
    pub month: Option<u8>,

    #[schema(example = 2024)]
    pub year: Option<i32>,

    #[schema(example = "32000.00", value_type = Option<String>)]
    pub basic_salary: Option<Decimal>,

    #[schema(example = "5000.00", value_type = Option<String>)]
    pub hra: Option<Decimal>,

    /// Replaces the attached component set when present
    #[schema(example = json!([1]))]
    pub components: Option<Vec<u64>>,

    pub notes: Option<String>,
}

/// Query filters. A blank value (`?month=`) means no filter.
#[derive(Deserialize, IntoParams)]
pub struct PayrollQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<u64>, example = 1001)]
    pub employee: Option<u64>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<u8>, example = 1)]
    pub month: Option<u8>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<i32>, example = 2024)]
    pub year: Option<i32>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

#[derive(Serialize, ToSchema)]
pub struct PayrollResponse {
    pub id: u64,
    pub employee: u64,

    #[schema(example = "John Doe (EMP-001)")]
    pub employee_name: Option<String>,

    pub month: u8,
    pub year: i32,

    #[schema(value_type = String, example = "30000.00")]
    pub basic_salary: Decimal,
    #[schema(value_type = String, example = "5000.00")]
    pub hra: Decimal,

    pub components: Vec<u64>,
    pub components_details: Vec<SalaryComponent>,

    #[schema(value_type = String, example = "40000.00")]
    pub gross_salary: Decimal,
    #[schema(value_type = String, example = "2000.00")]
    pub total_deductions: Decimal,
    #[schema(value_type = String, example = "38000.00")]
    pub net_salary: Decimal,

    pub notes: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl From<PayrollDetails> for PayrollResponse {
    fn from(details: PayrollDetails) -> Self {
        let p = details.payroll;
        Self {
            id: p.id,
            employee: p.employee_id,
            employee_name: details.employee_name,
            month: p.month,
            year: p.year,
            basic_salary: p.basic_salary,
            hra: p.hra,
            components: p.component_ids(),
            components_details: p.components,
            gross_salary: p.gross_salary,
            total_deductions: p.total_deductions,
            net_salary: p.net_salary,
            notes: p.notes,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<CreatePayroll> for NewPayroll {
    fn from(body: CreatePayroll) -> Self {
        Self {
            employee_id: body.employee,
            month: body.month,
            year: body.year,
            basic_salary: body.basic_salary,
            hra: body.hra,
            component_ids: body.components,
            notes: body.notes,
        }
    }
}

impl From<UpdatePayroll> for PayrollChanges {
    fn from(body: UpdatePayroll) -> Self {
        Self {
            employee_id: body.employee,
            month: body.month,
            year: body.year,
            basic_salary: body.basic_salary,
            hra: body.hra,
            notes: body.notes,
            component_ids: body.components,
        }
    }
}

/// List payroll records
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, description = "Payroll records, newest period first", body = [PayrollResponse]),
        (status = 400, description = "Malformed filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    _auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    let filter = PayrollFilter {
        employee_id: query.employee,
        month: query.month,
        year: query.year,
    };

    let data: Vec<PayrollResponse> = calculator
        .list(filter)
        .await?
        .into_iter()
        .map(PayrollResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

/// Get payroll by ID
#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll found", body = PayrollResponse),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    _auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let details = calculator.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PayrollResponse::from(details)))
}

/// Create payroll
///
/// Totals are computed from basic salary, HRA and the attached components.
#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = PayrollResponse),
        (status = 400, description = "Invalid month, year or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee or salary component not found"),
        (status = 409, description = "Payroll already exists for this period", body = Object, example = json!({
            "error": "duplicate_payroll",
            "message": "Payroll already exists for employee 1001 for 1/2024"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let details = calculator.create(payload.into_inner().into()).await?;

    Ok(HttpResponse::Created().json(PayrollResponse::from(details)))
}

/// Update payroll
///
/// Omitted fields keep their values. Totals are recomputed on every update.
#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated", body = PayrollResponse),
        (status = 400, description = "Invalid month, year or amount"),
        (status = 404, description = "Payroll, employee or salary component not found"),
        (status = 409, description = "Another payroll already exists for the target period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let details = calculator
        .update(path.into_inner(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(PayrollResponse::from(details)))
}

/// Recalculate payroll totals
///
/// Re-reads the current amounts of attached components. Idempotent.
#[utoipa::path(
    post,
    path = "/api/payroll/{payroll_id}/recalculate",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll recalculated", body = PayrollResponse),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn recalculate_payroll(
    auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let details = calculator.recalculate(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PayrollResponse::from(details)))
}

/// Delete payroll
#[utoipa::path(
    delete,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 204, description = "Payroll deleted"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_payroll(
    auth: AuthUser,
    calculator: web::Data<PayrollCalculator>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    calculator.delete(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
