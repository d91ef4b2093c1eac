pub mod jwt;
pub mod validation;

pub use validation::ValidatedPayload;
