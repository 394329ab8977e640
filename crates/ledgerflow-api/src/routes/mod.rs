//! Route modules for the API server
//!
//! - filter_flow: entry filtering, field options and report downloads
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints
//! - download.rs: File downloads

pub mod filter_flow;
