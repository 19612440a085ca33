//! SOAP-over-HTTP catalog client for a ReportService2010 endpoint.

mod client;
pub mod envelope;
mod error;
pub mod response;

pub use client::{service_url, SoapCatalogClient};
pub use error::SoapFault;
