pub mod post;
pub mod row;
