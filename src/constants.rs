//! Protocol constants and configuration values

/// Default FastAGI port Asterisk dials when the dialplan uses `agi://host/script`
pub const DEFAULT_AGI_PORT: u16 = 4573;

/// Prefix carried by every handshake variable name (`agi_request`, `agi_channel`, ...)
pub const AGI_ENV_PREFIX: &str = "agi_";

/// Literal line Asterisk sends when the call is torn down out of band.
/// Never a numeric reply; decoding it yields the hangup sentinel instead of a record.
pub const HANGUP_SENTINEL: &str = "hangup";

/// Value the switch substitutes for caller-id fields it has no data for
pub const UNKNOWN_SENTINEL: &str = "unknown";

/// Reserved mapper key for the fallback script handler
pub const DEFAULT_SCRIPT: &str = "default";

/// Outbound command terminator
pub const LINE_TERMINATOR: &str = "\n";

/// Maximum length of a single protocol line (handshake variable or reply).
/// Real AGI lines are well under 1KB; anything bigger indicates a desynced
/// or hostile peer.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Maximum size of the handshake block. Asterisk sends ~20 short lines.
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024;
