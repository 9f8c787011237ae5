//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each write runs as one database transaction; batch operations run one
//! transaction per item.

pub mod audit;
pub mod dunning;
pub mod error;
pub mod statement;
pub mod tracking;

pub use dunning::DunningRepository;
pub use error::RepositoryError;
pub use statement::{NO_ACTIVITY, StatementRepository};
pub use tracking::{ReceiveInvoiceInput, TrackingRepository};
