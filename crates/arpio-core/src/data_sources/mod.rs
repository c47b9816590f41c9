//! Read-only data source types

pub mod recovery_point;

pub use recovery_point::{RECOVERY_POINT_DATA_SOURCE_TYPE, RecoveryPointDataSource};
