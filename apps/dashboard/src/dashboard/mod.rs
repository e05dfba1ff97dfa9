// Dashboard view state and the rules that keep it in sync with the scan service.
// The scan service itself is reached only through crate::scan_client.

pub mod derivation;
pub mod handlers;
pub mod models;
pub mod report;
pub mod scan;
pub mod seed;
pub mod store;
