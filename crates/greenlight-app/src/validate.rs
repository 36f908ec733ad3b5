use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use garde::{Report, Validate};
use greenlight_types::ValidationError;
use http::request::Parts;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor wrapper which runs `garde` validation on the extracted value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Garde<E>(pub E);

#[derive(Debug)]
pub enum ValidationRejection<V, E> {
    /// The extracted value failed validation.
    Valid(V),
    /// The inner extractor failed.
    Inner(E),
}

impl<V: Display, E: Display> Display for ValidationRejection<V, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationRejection::Valid(errors) => write!(f, "{errors}"),
            ValidationRejection::Inner(error) => write!(f, "{error}"),
        }
    }
}

impl<V: Error + 'static, E: Error + 'static> Error for ValidationRejection<V, E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValidationRejection::Valid(ve) => Some(ve),
            ValidationRejection::Inner(e) => Some(e),
        }
    }
}

pub type GardeRejection<E> = ValidationRejection<Report, E>;

impl<E> From<Report> for GardeRejection<E> {
    fn from(value: Report) -> Self {
        Self::Valid(value)
    }
}

/// Flattens a garde report to the same `field -> message` shape as domain validation.
pub fn report_to_validation_error(report: &Report) -> ValidationError {
    let mut errors = BTreeMap::new();
    for (path, error) in report.iter() {
        errors
            .entry(path.to_string())
            .or_insert_with(|| error.message().to_string());
    }
    ValidationError::from(errors)
}

impl<E: Into<ApiError>> From<GardeRejection<E>> for ApiError {
    fn from(rejection: GardeRejection<E>) -> Self {
        match rejection {
            ValidationRejection::Valid(report) => {
                ApiError::Validation(report_to_validation_error(&report))
            }
            ValidationRejection::Inner(e) => e.into(),
        }
    }
}

impl<E: Into<ApiError>> IntoResponse for GardeRejection<E> {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    <Extractor as FromRequestParts<AppState>>::Rejection: Into<ApiError>,
{
    type Rejection = GardeRejection<<Extractor as FromRequestParts<AppState>>::Rejection>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state)
            .await
            .map_err(GardeRejection::Inner)?;

        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}
