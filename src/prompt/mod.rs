pub mod constructor;
pub mod placeholders;
pub mod schema;
