//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - an operation reported error diagnostics
pub const ERROR: i32 = 1;

/// Validation error - configuration block or command input is invalid
pub const VALIDATION_ERROR: i32 = 2;

/// Cluster error - API server unreachable or request failed
pub const CLUSTER_ERROR: i32 = 3;

/// Config error - provider configuration or CRD files could not be loaded
pub const CONFIG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
