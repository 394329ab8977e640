//! Filter-flow routes
//!
//! One query endpoint serves both entry filtering and field options; every
//! successful answer is cached under a token that the download endpoints
//! turn into a PDF or spreadsheet.
//!
//! Structure:
//! - api.rs: JSON endpoint and download link construction
//! - download.rs: PDF and spreadsheet streaming

pub mod api;
pub mod download;

pub use api::{api_filter_entry_flow, base_url, check_caller};
pub use download::{api_download_excel, api_download_pdf};
