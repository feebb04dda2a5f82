//! Mapping of core errors onto HTTP responses.

use api_shared::ErrorRes;
use axum::{http::StatusCode, response::Json};
use clinic_core::ClinicError;

/// Error half of every fallible handler: a status code plus `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<ErrorRes>);
pub type ApiResult<T> = Result<T, ApiError>;

fn status_for(err: &ClinicError) -> StatusCode {
    if !err.is_client_error() {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    match err {
        ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClinicError::TerminalStatus(_)
        | ClinicError::TransitionNotAllowed { .. }
        | ClinicError::NotesRequired(_)
        | ClinicError::AppointmentInPast => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Converts `err` into a response, logging server-side failures.
///
/// Storage and configuration errors are reported with a generic message; their details only go
/// to the log.
pub(crate) fn api_error(context: &str, err: ClinicError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{} error: {:?}", context, err);
        return (
            status,
            Json(ErrorRes {
                error: "Internal error".into(),
            }),
        );
    }

    tracing::debug!("{} rejected: {}", context, err);
    (
        status,
        Json(ErrorRes {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let (status, Json(body)) = api_error("test", ClinicError::NotesRequired(7));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.contains("notes are required"));

        let (status, _) = api_error(
            "test",
            ClinicError::NotFound {
                kind: "patient",
                id: "abc".into(),
            },
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn client_errors_map_to_4xx_and_the_rest_to_500() {
        let cases = [
            (ClinicError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ClinicError::UnknownStatus(42), StatusCode::BAD_REQUEST),
            (ClinicError::TerminalStatus(6), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ClinicError::TransitionNotAllowed { from: 0, to: 11 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ClinicError::AppointmentInPast, StatusCode::UNPROCESSABLE_ENTITY),
            (
                ClinicError::TransitionTable("bad".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.is_client_error(), expected.is_client_error(), "{err}");
            assert_eq!(status_for(&err), expected, "{err}");
        }
    }

    #[test]
    fn storage_errors_are_hidden() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/srv/clinic_data");
        let (status, Json(body)) = api_error("test", ClinicError::FileWrite(io));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal error");
    }
}
