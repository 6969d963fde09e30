//! `gatewise-api` — HTTP boundary for the tenancy/authorization core.
//!
//! Request pipeline: bearer extraction + claims augmentation → tenant guard
//! → handlers. Tenant-rejected requests get the fixed JSON envelope; accepted
//! requests carry [`context::TenantContext`] for downstream use.

pub mod app;
pub mod context;
pub mod errors;
pub mod middleware;
pub mod routes;
