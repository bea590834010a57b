pub mod component;
pub mod configuration;
pub mod pricing;
pub mod quote;
