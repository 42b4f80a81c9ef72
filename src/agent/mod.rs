pub mod provider;
pub mod roles;
