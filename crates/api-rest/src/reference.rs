//! WHO reference data and form slider bounds.

use crate::error::{api_error, ApiResult};
use crate::AppState;
use api_shared::{BoundsRes, ErrorRes, PercentileRowRes, ReferenceRes};
use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
};
use clinic_core::growth::{slider_bounds, Indicator, TEMPERATURE_BOUNDS};
use clinic_core::{ClinicError, Sex};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct BoundsQuery {
    age_months: u32,
}

fn parse_indicator(context: &str, value: &str) -> ApiResult<Indicator> {
    value
        .parse()
        .map_err(|e| api_error(context, ClinicError::InvalidInput(format!("{e}"))))
}

fn parse_sex(context: &str, value: &str) -> ApiResult<Sex> {
    value
        .parse()
        .map_err(|e| api_error(context, ClinicError::InvalidInput(format!("{e}"))))
}

#[utoipa::path(
    get,
    path = "/reference/{indicator}/{sex}",
    params(
        ("indicator" = String, Path, description = "weight, height, bmi or head_circumference"),
        ("sex" = String, Path, description = "male or female")
    ),
    responses(
        (status = 200, description = "Reference rows sorted by age", body = ReferenceRes),
        (status = 400, description = "Unknown indicator or sex", body = ErrorRes),
        (status = 404, description = "No reference data for this series", body = ErrorRes)
    )
)]
pub(crate) async fn reference_rows(
    State(state): State<AppState>,
    AxumPath((indicator, sex)): AxumPath<(String, String)>,
) -> ApiResult<Json<ReferenceRes>> {
    let indicator = parse_indicator("Reference rows", &indicator)?;
    let sex = parse_sex("Reference rows", &sex)?;

    let rows = state.cfg.reference_table().rows(indicator, sex);
    if rows.is_empty() {
        return Err(api_error(
            "Reference rows",
            ClinicError::NotFound {
                kind: "reference series",
                id: format!("{indicator}/{sex}"),
            },
        ));
    }

    Ok(Json(ReferenceRes {
        indicator: indicator.to_string(),
        sex: sex.to_string(),
        unit: indicator.unit().to_string(),
        rows: rows.iter().map(PercentileRowRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/reference/{indicator}/{sex}/bounds",
    params(
        ("indicator" = String, Path, description = "weight, height, bmi, head_circumference or temperature"),
        ("sex" = String, Path, description = "male or female"),
        ("age_months" = u32, Query, description = "Age the form is filled in for")
    ),
    responses(
        (status = 200, description = "Slider bounds; neutral when reference data is missing", body = BoundsRes),
        (status = 400, description = "Unknown indicator or sex", body = ErrorRes)
    )
)]
/// Slider bounds for a measurement input.
///
/// Missing reference data is not an error: neutral bounds are returned with `fallback: true`.
pub(crate) async fn slider_bounds_for(
    State(state): State<AppState>,
    AxumPath((indicator, sex)): AxumPath<(String, String)>,
    Query(query): Query<BoundsQuery>,
) -> ApiResult<Json<BoundsRes>> {
    let sex = parse_sex("Slider bounds", &sex)?;

    if indicator.trim().eq_ignore_ascii_case("temperature") {
        return Ok(Json(BoundsRes::new(
            "temperature",
            sex,
            query.age_months,
            TEMPERATURE_BOUNDS,
        )));
    }

    let indicator = parse_indicator("Slider bounds", &indicator)?;
    let row = state
        .cfg
        .reference_table()
        .lookup(indicator, sex, query.age_months);
    Ok(Json(BoundsRes::new(
        indicator.as_str(),
        sex,
        query.age_months,
        slider_bounds(indicator, row),
    )))
}
