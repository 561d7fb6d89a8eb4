// Resume documents: loading, persistence, and validation.

pub mod handlers;
pub mod store;
pub mod validation;
