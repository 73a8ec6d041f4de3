//! Typed names for the `agi_*` handshake variables.

/// Error returned when parsing an unrecognized handshake key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequestKeyError(pub String);

impl std::fmt::Display for ParseRequestKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown request key: {}", self.0)
    }
}

impl std::error::Error for ParseRequestKeyError {}

define_wire_enum! {
    error_type: ParseRequestKeyError,
    /// Standard handshake variable names, with the `agi_` prefix stripped.
    ///
    /// These are the keys Asterisk sends in the initial call-context block.
    /// Use with [`AgiRequest::key()`](crate::AgiRequest::key) for type-safe
    /// lookups; non-standard keys remain reachable through
    /// [`AgiRequest::get()`](crate::AgiRequest::get).
    pub enum RequestKey {
        Request => "request",
        Channel => "channel",
        Language => "language",
        Type => "type",
        UniqueId => "uniqueid",
        Version => "version",
        CallerId => "callerid",
        CallerIdName => "calleridname",
        CallingPres => "callingpres",
        CallingAni2 => "callingani2",
        CallingTon => "callington",
        CallingTns => "callingtns",
        Dnid => "dnid",
        Rdnis => "rdnis",
        Context => "context",
        Extension => "extension",
        Priority => "priority",
        Enhanced => "enhanced",
        AccountCode => "accountcode",
        ThreadId => "threadid",
        NetworkScript => "network_script",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trip() {
        assert_eq!(RequestKey::UniqueId.to_string(), "uniqueid");
        assert_eq!(RequestKey::CallerIdName.to_string(), "calleridname");
        assert_eq!(RequestKey::NetworkScript.to_string(), "network_script");
    }

    #[test]
    fn as_ref_str() {
        let k: &str = RequestKey::Channel.as_ref();
        assert_eq!(k, "channel");
    }

    #[test]
    fn from_str_case_insensitive() {
        assert_eq!("callerid".parse::<RequestKey>(), Ok(RequestKey::CallerId));
        assert_eq!("CALLERID".parse::<RequestKey>(), Ok(RequestKey::CallerId));
        assert_eq!(
            "Network_Script".parse::<RequestKey>(),
            Ok(RequestKey::NetworkScript)
        );
    }

    #[test]
    fn from_str_unknown() {
        let err = "no_such_key".parse::<RequestKey>();
        assert!(err.is_err());
        assert_eq!(
            err.unwrap_err().to_string(),
            "unknown request key: no_such_key"
        );
    }

    #[test]
    fn from_str_round_trip_all_variants() {
        let variants = [
            RequestKey::Request,
            RequestKey::Channel,
            RequestKey::Language,
            RequestKey::Type,
            RequestKey::UniqueId,
            RequestKey::Version,
            RequestKey::CallerId,
            RequestKey::CallerIdName,
            RequestKey::CallingPres,
            RequestKey::CallingAni2,
            RequestKey::CallingTon,
            RequestKey::CallingTns,
            RequestKey::Dnid,
            RequestKey::Rdnis,
            RequestKey::Context,
            RequestKey::Extension,
            RequestKey::Priority,
            RequestKey::Enhanced,
            RequestKey::AccountCode,
            RequestKey::ThreadId,
            RequestKey::NetworkScript,
        ];
        for v in variants {
            let wire = v.to_string();
            let parsed: RequestKey = wire.parse().unwrap();
            assert_eq!(parsed, v, "round-trip failed for {wire}");
        }
    }
}
