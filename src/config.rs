//! Configuration constants for the Netezza session
//!
//! This module centralizes the fixed parameters used when talking to the
//! database and when staging data on local disk.

// ============================================================================
// Connection Configuration
// ============================================================================

/// ODBC driver name registered by the Netezza client installation
pub const ODBC_DRIVER: &str = "NetezzaSQL";

// ============================================================================
// Type Mapping Configuration
// ============================================================================

/// Width of the catch-all character column used for unmapped types
pub const DEFAULT_VARCHAR_WIDTH: usize = 1024;

// ============================================================================
// Result Set Configuration
// ============================================================================

/// Number of rows fetched from the driver per round trip
#[cfg_attr(not(feature = "odbc"), allow(dead_code))]
pub const FETCH_BATCH_SIZE: usize = 5000;

/// Upper bound on the buffer reserved for a single text cell
///
/// Values longer than this are truncated by the driver.
#[cfg_attr(not(feature = "odbc"), allow(dead_code))]
pub const MAX_TEXT_CELL_BYTES: usize = 64 * 1024; // 64 KB

// ============================================================================
// Staging Configuration
// ============================================================================

/// Suffix for staging files handed to the external table loader
pub const STAGING_SUFFIX: &str = ".csv";

/// Distribution clause value that matches Netezza's implicit default
pub const DEFAULT_DISTRIBUTION: &str = "random";

/// Number of source rows shown when a verbose load prints a sample
pub const SAMPLE_ROWS: usize = 5;

// ============================================================================
// Output Configuration
// ============================================================================

/// Width of the rule printed around echoed statements
pub const ECHO_RULE_WIDTH: usize = 80;
