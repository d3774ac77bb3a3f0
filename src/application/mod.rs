pub mod convergence;
pub mod health;
pub mod ingest;
pub mod provisioning;
pub mod search;
