//! CLI Exit Code Registry
//!
//! Single source of truth for `unidoc` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (no documentation found, etc.)             |
//! | 2    | Usage error (bad arguments)                              |
//! | 3    | Fields need review (`run --strict` only)                 |
//! | 4    | Invalid config                                           |
//! | 5    | Malformed input (documents, field lists, decision files) |
//! | 6    | Decision policy failed                                   |
//! | 7    | Cannot read input or write output                        |

use unidoc_recon::ReconError;

pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments or option values.
pub const EXIT_USAGE: u8 = 2;

/// Run completed but at least one field needs human review.
pub const EXIT_NEEDS_REVIEW: u8 = 3;

pub const EXIT_INVALID_CONFIG: u8 = 4;

pub const EXIT_VALIDATION: u8 = 5;

pub const EXIT_POLICY: u8 = 6;

/// Filesystem read/write failure, including report/document rendering targets.
pub const EXIT_IO: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Validation(_) => EXIT_VALIDATION,
        ReconError::Policy { .. } => EXIT_POLICY,
        ReconError::Render(_) => EXIT_IO,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
    }
}
