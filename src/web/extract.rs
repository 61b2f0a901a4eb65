//! Extractors whose rejections render as [`AppError`] JSON bodies with a 400
//! status instead of axum's plain-text defaults.

use axum::extract::{FromRequest, FromRequestParts};

use crate::web::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
