//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`clock::Clock`]: injectable time source

pub mod clock;
pub mod error;
