pub mod inputs;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use inputs::*;
pub use validation::validate_business_case;
