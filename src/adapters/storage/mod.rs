//! Storage abstraction layer
//!
//! This module provides the backend-agnostic [`Model`] capability and the
//! factory that binds it to LeanCloud or Deta Base.

pub mod factory;
pub mod traits;

pub use factory::{create_model, dittorm, ModelFactory};
pub use traits::{Model, ModelExt, Update};
