//! # rssync-engine
//!
//! Descriptor-driven catalog sync.
//!
//! Call [`sync_descriptor`] to stream a descriptor file and issue the catalog
//! calls it describes against any [`CatalogClient`], or drive a
//! [`SyncDriver`] directly with your own event source.

pub mod definition;
pub mod descriptor;
pub mod driver;
pub mod dry_run;
pub mod error;
pub mod path_stack;
pub mod pending;
pub mod report;
pub mod resolve;
pub mod substitute;

use rssync_core::{CatalogClient, RunConfig};

pub use descriptor::{DescriptorEvent, DescriptorEvents};
pub use driver::SyncDriver;
pub use dry_run::{CatalogCall, DryRunClient};
pub use error::SyncError;
pub use report::{ItemFailure, SyncReport};

/// Run one sync: open `config.descriptor`, bootstrap the root, and walk the
/// descriptor to the end.
///
/// Returns the run report on success. Recoverable failures are listed in
/// [`SyncReport::failures`]; anything fatal aborts with a [`SyncError`].
pub fn sync_descriptor<C: CatalogClient>(
    config: &RunConfig,
    client: C,
) -> Result<SyncReport, SyncError> {
    let events = DescriptorEvents::open(&config.descriptor)?;
    tracing::info!(
        descriptor = %config.descriptor.display(),
        root = %config.root,
        "starting sync"
    );
    let report = SyncDriver::new(client, config).run(events)?;
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failures.len(),
        "sync finished"
    );
    Ok(report)
}
