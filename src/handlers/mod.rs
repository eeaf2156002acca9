pub mod health;
pub mod labels;
pub mod recipes;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON body extractor whose rejections use the crate's error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the crate's error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

pub use health::*;
