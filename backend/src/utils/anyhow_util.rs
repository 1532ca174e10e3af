use common::errors::ApiError;

/// Recovers an [`ApiError`] raised somewhere below the handler, or turns any
/// other failure into a 500.
pub fn from_anyhow(e: anyhow::Error) -> ApiError {
    let e = match e.downcast::<ApiError>() {
        Ok(api_error) => return api_error,
        Err(e) => e,
    };
    log::error!("unhandled error: {:#}", e);
    ApiError::server_error(format!("{:#}", e))
}
