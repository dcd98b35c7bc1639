//! SDK error classification
//!
//! Maps aws-sdk-s3 failures onto the core error kinds so the workflow can
//! match on an explicit enum instead of inspecting exception strings.
//! Dispatch-level failures (the request never reached the service) are
//! where "the network is gone" is distinguished from "the service pushed
//! back".

use aws_sdk_s3::error::SdkError;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use pail_core::Error;
use pail_core::error::is_transient_code;

/// Classify an SDK error into a core error kind.
///
/// `what` names the operation for the error message.
pub(crate) fn classify_sdk<E>(err: &SdkError<E, HttpResponse>, what: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err {
        SdkError::DispatchFailure(failure) => {
            if failure.is_timeout() {
                Error::Transient(format!("{what}: request timed out"))
            } else {
                // Connection refused, DNS failure, interface down: the
                // whole session is offline, not just this request
                Error::NetworkUnavailable(format!("{what}: {err}"))
            }
        }
        SdkError::TimeoutError(_) => Error::Transient(format!("{what}: request timed out")),
        SdkError::ResponseError(_) => {
            Error::Transient(format!("{what}: malformed or interrupted response"))
        }
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            classify_service(err.code(), err.message(), status, what)
        }
        _ => Error::General(format!("{what}: {err}")),
    }
}

/// Map a service error's code (and, when the code is absent, its HTTP
/// status) onto an error kind.
pub(crate) fn classify_service(
    code: Option<&str>,
    message: Option<&str>,
    status: u16,
    what: &str,
) -> Error {
    let detail = || {
        let message = message.unwrap_or("no message");
        format!("{what}: {} ({message})", code.unwrap_or("no error code"))
    };

    match code {
        Some("NoSuchBucket" | "NoSuchKey" | "NoSuchVersion" | "NotFound") => {
            Error::NotFound(detail())
        }
        Some(
            "AccessDenied" | "AllAccessDisabled" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"
            | "AccountProblem",
        ) => Error::AccessDenied(detail()),
        Some("BucketNotEmpty" | "BucketAlreadyExists" | "BucketAlreadyOwnedByYou") => {
            Error::Conflict(detail())
        }
        Some(c) if is_transient_code(c) => Error::Transient(detail()),
        Some(_) => Error::General(detail()),
        // Head-style probes answer with a bare status and no error body
        None => match status {
            404 => Error::NotFound(format!("{what}: HTTP 404")),
            403 => Error::AccessDenied(format!("{what}: HTTP 403")),
            429 | 500 | 502 | 503 | 504 => {
                Error::Transient(format!("{what}: HTTP {status}"))
            }
            _ => Error::General(format!("{what}: HTTP {status}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        for code in ["NoSuchBucket", "NoSuchKey", "NoSuchVersion", "NotFound"] {
            let err = classify_service(Some(code), None, 404, "HeadBucket");
            assert!(matches!(err, Error::NotFound(_)), "code = {code}");
        }
    }

    #[test]
    fn test_access_denied_codes() {
        for code in ["AccessDenied", "InvalidAccessKeyId", "SignatureDoesNotMatch"] {
            let err = classify_service(Some(code), Some("denied"), 403, "DeleteObjects");
            assert!(matches!(err, Error::AccessDenied(_)), "code = {code}");
        }
    }

    #[test]
    fn test_throttling_codes_are_transient() {
        for code in ["SlowDown", "Throttling", "InternalError", "ServiceUnavailable"] {
            let err = classify_service(Some(code), None, 503, "ListObjectVersions");
            assert!(err.is_transient(), "code = {code}");
        }
    }

    #[test]
    fn test_bucket_not_empty_is_conflict() {
        let err = classify_service(Some("BucketNotEmpty"), None, 409, "DeleteBucket");
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_bare_status_fallback() {
        assert!(matches!(
            classify_service(None, None, 404, "HeadBucket"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify_service(None, None, 403, "HeadBucket"),
            Error::AccessDenied(_)
        ));
        assert!(classify_service(None, None, 503, "HeadBucket").is_transient());
        assert!(matches!(
            classify_service(None, None, 418, "HeadBucket"),
            Error::General(_)
        ));
    }

    #[test]
    fn test_unknown_code_is_general() {
        let err = classify_service(Some("MalformedXML"), Some("bad"), 400, "DeleteObjects");
        assert!(matches!(err, Error::General(_)));
        assert!(err.to_string().contains("MalformedXML"));
    }
}
