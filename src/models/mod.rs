pub mod labels;
pub mod price;
pub mod recipes;
pub mod users;
