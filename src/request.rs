//! Call-context parsing from the AGI handshake block.

use crate::constants::{AGI_ENV_PREFIX, UNKNOWN_SENTINEL};
use crate::headers::RequestKey;
use std::collections::HashMap;

/// The call context Asterisk sends before any command traffic.
///
/// Built once per call from the `name: value` handshake lines, read-only
/// thereafter. Any standard field may be absent — consumers must tolerate
/// missing keys, so every accessor returns `Option`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgiRequest {
    fields: HashMap<String, String>,
}

impl AgiRequest {
    /// Parse the raw handshake block.
    ///
    /// Each line containing exactly one `:` is split into name and value, the
    /// `agi_` prefix is stripped from the name if present, and both sides are
    /// trimmed. Duplicate names keep the last value. Anything else (blank
    /// lines, values containing colons, free text) is silently skipped —
    /// malformed handshake lines must not abort a call.
    pub fn parse(block: &str) -> Self {
        let mut fields = HashMap::new();

        for line in block.lines() {
            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() != 2 {
                continue;
            }

            let mut name = parts[0].trim();
            if let Some(stripped) = name.strip_prefix(AGI_ENV_PREFIX) {
                name = stripped;
            }
            let value = parts[1].trim();

            fields.insert(name.to_string(), value.to_string());
        }

        Self { fields }
    }

    /// Look up a handshake field by (prefix-stripped) name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.fields.get(name.as_ref()).map(|s| s.as_str())
    }

    /// Look up a standard handshake field by typed key.
    pub fn key(&self, key: RequestKey) -> Option<&str> {
        self.get(key.as_str())
    }

    /// All handshake fields.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// The requested script name (`agi_network_script`), set for FastAGI calls.
    pub fn network_script(&self) -> Option<&str> {
        self.key(RequestKey::NetworkScript)
    }

    /// The request target (`agi://host/script` URL or script path).
    pub fn request(&self) -> Option<&str> {
        self.key(RequestKey::Request)
    }

    /// Channel identifier (e.g. `SIP/1000-00000001`).
    pub fn channel(&self) -> Option<&str> {
        self.key(RequestKey::Channel)
    }

    /// Channel technology type (e.g. `SIP`).
    pub fn call_type(&self) -> Option<&str> {
        self.key(RequestKey::Type)
    }

    /// Unique call identifier.
    pub fn unique_id(&self) -> Option<&str> {
        self.key(RequestKey::UniqueId)
    }

    /// Caller-id number. The switch's `unknown` placeholder maps to `None`.
    pub fn caller_id(&self) -> Option<&str> {
        self.key(RequestKey::CallerId).filter(|v| *v != UNKNOWN_SENTINEL)
    }

    /// Calling-party name. The switch's `unknown` placeholder maps to `None`.
    pub fn caller_id_name(&self) -> Option<&str> {
        self.key(RequestKey::CallerIdName)
            .filter(|v| *v != UNKNOWN_SENTINEL)
    }

    /// Dialed number identification.
    pub fn dnid(&self) -> Option<&str> {
        self.key(RequestKey::Dnid)
    }

    /// Redirecting number. The switch's `unknown` placeholder maps to `None`.
    pub fn rdnis(&self) -> Option<&str> {
        self.key(RequestKey::Rdnis).filter(|v| *v != UNKNOWN_SENTINEL)
    }

    /// Dialplan context the call came from.
    pub fn context(&self) -> Option<&str> {
        self.key(RequestKey::Context)
    }

    /// Dialplan extension the call came from.
    pub fn extension(&self) -> Option<&str> {
        self.key(RequestKey::Extension)
    }

    /// Dialplan priority the call came from.
    pub fn priority(&self) -> Option<&str> {
        self.key(RequestKey::Priority)
    }

    /// Account code, if the dialplan set one.
    pub fn account_code(&self) -> Option<&str> {
        self.key(RequestKey::AccountCode)
    }

    /// Channel language (e.g. `en`).
    pub fn language(&self) -> Option<&str> {
        self.key(RequestKey::Language)
    }

    /// AGI protocol version reported by the switch.
    pub fn version(&self) -> Option<&str> {
        self.key(RequestKey::Version)
    }

    /// Thread identifier of the switch-side AGI thread.
    pub fn thread_id(&self) -> Option<&str> {
        self.key(RequestKey::ThreadId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_strips_prefix() {
        let request = AgiRequest::parse("agi_callerid: 5551212\nagi_extension: 100\n");
        assert_eq!(request.get("callerid"), Some("5551212"));
        assert_eq!(request.get("extension"), Some("100"));
        assert_eq!(request.extension(), Some("100"));
    }

    #[test]
    fn skips_malformed_lines() {
        let block = "\
agi_channel: SIP/1000-00000001
this line has no separator
agi_request: agi://localhost:4573/ivr
agi_language: en

";
        let request = AgiRequest::parse(block);
        assert_eq!(request.channel(), Some("SIP/1000-00000001"));
        assert_eq!(request.language(), Some("en"));
        // The request URL carries a second colon, so the whole line is dropped.
        assert_eq!(request.request(), None);
        assert_eq!(request.fields().len(), 2);
    }

    #[test]
    fn last_write_wins_on_duplicates() {
        let request = AgiRequest::parse("agi_context: first\nagi_context: second\n");
        assert_eq!(request.context(), Some("second"));
    }

    #[test]
    fn keeps_unprefixed_names() {
        let request = AgiRequest::parse("custom_arg: hello\n");
        assert_eq!(request.get("custom_arg"), Some("hello"));
    }

    #[test]
    fn trims_both_sides() {
        let request = AgiRequest::parse("  agi_accountcode :  billing-7  \n");
        assert_eq!(request.account_code(), Some("billing-7"));
    }

    #[test]
    fn empty_value_is_kept() {
        let request = AgiRequest::parse("agi_accountcode:\n");
        assert_eq!(request.account_code(), Some(""));
    }

    #[test]
    fn unknown_sentinel_maps_to_none() {
        let block = "agi_callerid: unknown\nagi_calleridname: Alice\nagi_rdnis: unknown\n";
        let request = AgiRequest::parse(block);
        assert_eq!(request.caller_id(), None);
        assert_eq!(request.caller_id_name(), Some("Alice"));
        assert_eq!(request.rdnis(), None);
        // The raw field is still reachable.
        assert_eq!(request.get("callerid"), Some("unknown"));
    }

    #[test]
    fn network_script_lookup() {
        let request = AgiRequest::parse("agi_network_script: sales\n");
        assert_eq!(request.network_script(), Some("sales"));
    }

    #[test]
    fn missing_fields_are_none() {
        let request = AgiRequest::parse("");
        assert_eq!(request.channel(), None);
        assert_eq!(request.caller_id(), None);
        assert!(request.fields().is_empty());
    }
}
