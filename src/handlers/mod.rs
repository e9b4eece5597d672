pub mod fare;
pub mod health;
pub mod location;

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections answer with the usual `{"error": ..}` body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
