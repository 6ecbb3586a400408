//! Stable exit codes for `borg-id-verify`.

/// Every repository verified (missing baselines without `--init` included).
pub const OK: u8 = 0;
/// A repository diverged or failed, or the arguments/base path were invalid.
pub const FAILED: u8 = 1;
