pub mod client;
pub mod fields;
