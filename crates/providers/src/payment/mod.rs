//! Payment gateways

pub mod paypal;
pub mod polar;
