pub mod order;
pub mod quote;
