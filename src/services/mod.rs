pub mod jwt;
pub mod labels;
pub mod recipes;
pub mod storage;
pub mod users;
