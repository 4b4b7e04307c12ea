/// Error code registry for Spindle
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Read errors (pair source)
/// - 3000-3999: Write errors (output sink)
/// - 4000-4999: Handler errors
/// - 7000-7999: Validation errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_MISSING_CAPABILITY: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;

    // Read errors (2000-2999)
    pub const READ_GENERIC: u16 = 2000;
    pub const READ_IO_ERROR: u16 = 2001;
    pub const READ_DECODE_ERROR: u16 = 2002;
    pub const READ_PRODUCER_FAILED: u16 = 2003;

    // Write errors (3000-3999)
    pub const WRITE_GENERIC: u16 = 3000;
    pub const WRITE_EMIT_FAILED: u16 = 3001;
    pub const WRITE_CLOSE_FAILED: u16 = 3002;

    // Handler errors (4000-4999)
    pub const HANDLER_GENERIC: u16 = 4000;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_MISSING_PHASE: u16 = 7001;
    pub const VALIDATION_UNKNOWN_PHASE: u16 = 7002;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Configuration errors
        1000 => "Generic configuration error",
        1001 => "Handler does not implement the capability required by the phase",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",

        // Read errors
        2000 => "Generic read error",
        2001 => "I/O error while reading input pairs",
        2002 => "Input pair could not be decoded",
        2003 => "Group producer task terminated abnormally",

        // Write errors
        3000 => "Generic write error",
        3001 => "Failed to emit output pair",
        3002 => "Failed to close output",

        // Handler errors
        4000 => "Handler capability failed",

        // Validation errors
        7000 => "Generic validation error",
        7001 => "Phase name is missing",
        7002 => "Phase name is not recognized",

        _ => "Unknown error code",
    }
}
