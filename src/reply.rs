//! AGI reply-line decoding.
//!
//! Wire format: `<code> [<key>=<value> ...] [(<extra>)]`, space-separated,
//! one line per reply. The literal line `hangup` is a terminal sentinel, not
//! a reply. Decoding is pure and side-effect free.

use crate::constants::HANGUP_SENTINEL;
use std::collections::HashMap;

/// One inbound protocol line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyLine {
    /// The call was torn down out of band.
    Hangup,
    /// A decoded reply record.
    Reply(AgiReply),
}

impl ReplyLine {
    /// Classify and decode one raw line.
    pub fn decode(line: &str) -> Self {
        if line.trim() == HANGUP_SENTINEL {
            ReplyLine::Hangup
        } else {
            ReplyLine::Reply(AgiReply::decode(line))
        }
    }
}

/// Parsed form of one reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgiReply {
    raw: String,
    code: Option<u16>,
    attributes: HashMap<String, String>,
    extra: Option<String>,
}

impl AgiReply {
    /// Decode one raw reply line.
    ///
    /// The code is the leading digits of the first space-delimited token;
    /// a line with no parsable code yields `code() == None` rather than an
    /// error — the decoder is forgiving, strictness is the session's choice.
    pub fn decode(line: &str) -> Self {
        let raw = line.trim().to_string();

        let code = raw
            .split(' ')
            .next()
            .and_then(Self::parse_leading_digits);

        let mut attributes = HashMap::new();
        for token in raw.split(' ') {
            if let Some(pos) = token.find('=') {
                if pos > 0 {
                    attributes.insert(token[..pos].to_string(), token[pos + 1..].to_string());
                }
            }
        }

        // Extra payload: interior of the outermost parenthesized group.
        let extra = match (raw.find('('), raw.rfind(')')) {
            (Some(open), Some(close)) if open < close => {
                Some(raw[open + 1..close].to_string())
            }
            _ => None,
        };

        Self {
            raw,
            code,
            attributes,
            extra,
        }
    }

    // Leading-digits parse, matching the reference decoder: `510junk` is 510,
    // a token with no leading digit has no code.
    fn parse_leading_digits(token: &str) -> Option<u16> {
        let end = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        if end == 0 {
            None
        } else {
            token[..end].parse().ok()
        }
    }

    /// The trimmed raw line.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Numeric result code, `None` when the leading token was not numeric.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// Look up a `key=value` attribute.
    pub fn attribute(&self, name: impl AsRef<str>) -> Option<&str> {
        self.attributes.get(name.as_ref()).map(|s| s.as_str())
    }

    /// All `key=value` attributes.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// The raw `result` attribute, if present.
    pub fn result(&self) -> Option<&str> {
        self.attribute("result")
    }

    /// The `result` attribute as an integer; absent, empty, or non-numeric
    /// values map to `-1`.
    pub fn result_code(&self) -> i64 {
        self.result()
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok())
            .unwrap_or(-1)
    }

    /// Free-text payload inside the trailing parenthesized group, if any.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_code_attributes_and_extra() {
        let reply = AgiReply::decode("200 k1=v1 k2=v2 (extra text)");
        assert_eq!(reply.code(), Some(200));
        assert_eq!(reply.attribute("k1"), Some("v1"));
        assert_eq!(reply.attribute("k2"), Some("v2"));
        assert_eq!(reply.extra(), Some("extra text"));
    }

    #[test]
    fn simple_result() {
        let reply = AgiReply::decode("200 result=1");
        assert_eq!(reply.code(), Some(200));
        assert_eq!(reply.result(), Some("1"));
        assert_eq!(reply.result_code(), 1);
        assert_eq!(reply.extra(), None);
    }

    #[test]
    fn empty_result_maps_to_minus_one() {
        let reply = AgiReply::decode("200 result=");
        assert_eq!(reply.result(), Some(""));
        assert_eq!(reply.result_code(), -1);
    }

    #[test]
    fn absent_result_maps_to_minus_one() {
        let reply = AgiReply::decode("510");
        assert_eq!(reply.code(), Some(510));
        assert_eq!(reply.result(), None);
        assert_eq!(reply.result_code(), -1);
    }

    #[test]
    fn extra_without_attributes() {
        let reply = AgiReply::decode("510 (some message)");
        assert_eq!(reply.code(), Some(510));
        assert_eq!(reply.extra(), Some("some message"));
        assert!(reply.attributes().is_empty());
    }

    #[test]
    fn extra_spans_to_last_paren() {
        let reply = AgiReply::decode("200 result=0 (timeout (early))");
        assert_eq!(reply.extra(), Some("timeout (early)"));
    }

    #[test]
    fn unmatched_paren_is_no_extra() {
        assert_eq!(AgiReply::decode("200 result=1 (dangling").extra(), None);
        assert_eq!(AgiReply::decode("200 result=1 )flip(").extra(), None);
    }

    #[test]
    fn value_keeps_text_after_first_equals() {
        let reply = AgiReply::decode("200 result=1 var=a=b");
        assert_eq!(reply.attribute("var"), Some("a=b"));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let reply = AgiReply::decode("200 result=1 result=2");
        assert_eq!(reply.result(), Some("2"));
    }

    #[test]
    fn leading_equals_token_is_skipped() {
        let reply = AgiReply::decode("200 =orphan result=1");
        assert_eq!(reply.attribute(""), None);
        assert_eq!(reply.result(), Some("1"));
    }

    #[test]
    fn non_numeric_code_is_none() {
        let reply = AgiReply::decode("garbage result=1");
        assert_eq!(reply.code(), None);
        // Forgiving decode still yields the rest of the record.
        assert_eq!(reply.result(), Some("1"));
    }

    #[test]
    fn leading_digits_parse_like_the_reference() {
        assert_eq!(AgiReply::decode("510junk").code(), Some(510));
        assert_eq!(AgiReply::decode("200result=1").code(), Some(200));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let reply = AgiReply::decode("  200 result=1 \r");
        assert_eq!(reply.raw(), "200 result=1");
        assert_eq!(reply.code(), Some(200));
    }

    #[test]
    fn hangup_is_a_sentinel_not_a_reply() {
        assert_eq!(ReplyLine::decode("hangup"), ReplyLine::Hangup);
        assert_eq!(ReplyLine::decode("  hangup  "), ReplyLine::Hangup);
        assert!(matches!(
            ReplyLine::decode("200 result=1"),
            ReplyLine::Reply(_)
        ));
        // A line merely containing the word is a normal reply.
        assert!(matches!(
            ReplyLine::decode("200 result=hangup"),
            ReplyLine::Reply(_)
        ));
    }
}
