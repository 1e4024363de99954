//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Description                                            |
//! |------|--------------------------------------------------------|
//! | 0    | Success                                                |
//! | 1    | General error (unspecified)                            |
//! | 2    | CLI usage error (bad args, unknown output extension)   |
//! | 3    | Awaiting input: no supported file produced a table     |
//! | 4    | Invalid config file                                    |
//! | 5    | Partial merge under `--strict`: some files failed      |
//! | 6    | Output could not be written                            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or an output path with an unknown extension.
pub const EXIT_USAGE: u8 = 2;

/// No input produced a usable table: every file failed to parse or had an
/// unsupported extension. Nothing is written.
pub const EXIT_AWAITING_INPUT: u8 = 3;

/// Config file missing, unreadable, malformed or failing validation.
pub const EXIT_CONFIG: u8 = 4;

/// `--strict` and at least one input failed. The output is still written.
pub const EXIT_PARTIAL: u8 = 5;

/// Export or report file could not be written.
pub const EXIT_WRITE: u8 = 6;
