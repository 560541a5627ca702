pub mod activation;
pub mod config;
pub mod corpus;
pub mod filter;
pub mod formatting;
pub mod markov;
pub mod pipeline;
pub mod privilege;
pub mod responder;
