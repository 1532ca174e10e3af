#[macro_export]
macro_rules! setup_rejection {
    ($err:ident $code_ident: ident $message: ident $($path:path, $code:expr);*) => {
        if let Some(_) = Option::<&str>::None {}
        $(
            else if let Some(e) = $err.find::<$path>() {
                $code_ident = $code;
                $message = e.to_string();
            }
        )+
    };
}

/// Unwraps an `anyhow::Result`, or returns the error as a JSON reply from
/// the enclosing handler.
#[macro_export]
macro_rules! bail_if_err {
    ($res:expr) => {{
        let result = $res.map_err($crate::utils::from_anyhow);

        match result {
            Ok(value) => value,
            Err(e) => return Ok(warp::Reply::into_response(e)),
        }
    }};
}

#[macro_export]
macro_rules! value_or_404 {
    ($expr:expr, $message:expr) => {{
        match $expr {
            Some(value) => value,
            None => {
                return Ok($crate::utils::error_reply(
                    warp::http::StatusCode::NOT_FOUND,
                    $message,
                ))
            }
        }
    }};
    ($expr:expr) => {{
        $crate::value_or_404!($expr, "Requested resource not found")
    }};
}

#[macro_export]
macro_rules! bail_if_err_or_404 {
    ($res:expr, $message:expr) => {{
        let value = $crate::bail_if_err!($res);
        let value = $crate::value_or_404!(value, $message);
        value
    }};
    ($res:expr) => {{
        let value = $crate::bail_if_err!($res);
        let value = $crate::value_or_404!(value);
        value
    }};
}

/// Assigns every `Some` value to the matching field, leaving the rest alone.
#[macro_export]
macro_rules! update_fields {
    ($target:ident => $($field:ident = $value:expr),+ $(,)?) => {
        $(
            if let Some(value) = $value {
                $target.$field = value;
            }
        )+
    };
}

/// Returns `Err(ApiError::bad_request(..))` from the enclosing function.
#[macro_export]
macro_rules! reject {
    ($message:expr) => {
        return Err(common::errors::ApiError::bad_request($message).into())
    };
}
