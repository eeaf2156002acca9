#![allow(dead_code, unused_imports)]

pub mod database;
pub mod helpers;
pub mod test_app;

pub use database::{TestDb, count_users_by_email};
pub use helpers::{
    auth, create_recipe, generate_test_email, png_bytes, register_and_login, register_user,
};
pub use test_app::TestApp;
