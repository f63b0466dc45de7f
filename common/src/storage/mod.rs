pub mod corpus;
pub mod types;
