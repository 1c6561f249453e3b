pub mod token_service;

pub use token_service::{Claims, TokenIssuer, TokenSubject};
