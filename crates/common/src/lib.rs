//! Common types shared by the credential validator crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
