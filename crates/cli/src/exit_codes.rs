//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; schedulers that run
//! `regcheck` nightly rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, unknown name) |
//! | 3       | Workbook         | Cannot open or save the spreadsheet      |
//! | 4       | Config           | Config missing, unreadable or invalid    |
//! | 50-59   | registry         | Ad-hoc `lookup` outcomes                 |
//!
//! Row-level failures never change the exit code of `run`; they are
//! written into the sheet instead.

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown registry name.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Workbook (3)
// =============================================================================

/// The workbook could not be opened, or a checkpoint/final save failed.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Config (4)
// =============================================================================

/// No config file found, or it failed to parse or validate.
pub const EXIT_CONFIG: u8 = 4;

// =============================================================================
// Registry (50-59) - `regcheck lookup`
// =============================================================================

/// The register has no record for the identifier.
pub const EXIT_LOOKUP_NOT_FOUND: u8 = 50;

/// The record exists but the licence has expired.
pub const EXIT_LOOKUP_EXPIRED: u8 = 51;

/// Transport failure or an unreadable response.
pub const EXIT_LOOKUP_FAILED: u8 = 54;
