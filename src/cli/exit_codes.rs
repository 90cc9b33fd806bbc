//! exit codes for bwm commands
//!
//! 0 = success, non-zero = error. specific codes let scripts tell a monitor
//! mismatch apart from a broken blueprint.

/// command completed successfully
#[cfg(test)]
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// invalid command-line arguments or selection
pub const INVALID_ARGS: i32 = 4;

/// config or blueprint file error
pub const CONFIG_ERROR: i32 = 5;

/// blueprint monitors do not match the connected monitors
pub const MONITOR_MISMATCH: i32 = 7;

/// no discovered blueprint matches the connected monitors
pub const NO_VALID_BLUEPRINT: i32 = 8;
