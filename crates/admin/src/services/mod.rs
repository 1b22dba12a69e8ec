//! Service layer: transactional inventory operations and external seams.

pub mod allocation;
pub mod carrier;
pub mod resolver;
pub mod sweep;

pub use allocation::{AllocationError, AllocationService};
pub use carrier::{HttpTrackingClient, TrackingClient, TrackingError, TrackingStatus};
pub use resolver::{CatalogResolver, ProductResolver, ResolvedLine};
pub use sweep::{StatusSweep, SweepError};
