//! Query parameters for the Singular S2S event endpoint.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Parameter keys understood by the S2S event endpoint.
pub mod keys {
    pub const SDK_KEY: &str = "a";
    pub const SDK_VERSION: &str = "sdk_version";
    pub const CUSTOM_USER_ID: &str = "custom_user_id";
    pub const EVENT_NAME: &str = "n";
    pub const PLATFORM: &str = "p";
    pub const BUNDLE_ID: &str = "i";
    pub const EVENT_ARGS: &str = "e";
    pub const USER_AGENT: &str = "ua";
    pub const LOCALE: &str = "lc";
    pub const IP: &str = "ip";
    pub const USE_IP: &str = "use_ip";
    pub const UTIME: &str = "utime";
    pub const OS_VERSION: &str = "ve";
    pub const MANUFACTURER: &str = "ma";
    pub const MODEL: &str = "mo";
    pub const IDFA: &str = "idfa";
    pub const IDFV: &str = "idfv";
    pub const ATT_STATUS: &str = "att_authorization_status";
    pub const AIFA: &str = "aifa";
    pub const ASID: &str = "asid";
    pub const AMID: &str = "amid";
    pub const OAID: &str = "oaid";
    pub const SDID: &str = "sdid";
    pub const AMOUNT: &str = "amt";
    pub const CURRENCY: &str = "cur";
    pub const IS_REVENUE_EVENT: &str = "is_revenue_event";
}

/// Outbound parameter set, keyed by the fixed endpoint vocabulary.
///
/// The endpoint parses by key, so ordering only matters for readable logs
/// and stable test output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundParams {
    inner: BTreeMap<&'static str, String>,
}

impl OutboundParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.inner.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.inner.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Percent-encode every key and value and join them as `k=v&k=v`.
    ///
    /// Spaces become `%20`, never `+`, so receivers that only percent-decode
    /// get the original text back.
    pub fn to_query(&self) -> String {
        self.iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, COMPONENT),
                    utf8_percent_encode(v, COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append every parameter, percent-encoded, to `base` as its query string.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(Some(&self.to_query()));
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_value() {
        let mut params = OutboundParams::new();
        params.set(keys::EVENT_NAME, "first");
        params.set(keys::EVENT_NAME, "second");
        assert_eq!(params.get(keys::EVENT_NAME), Some("second"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_to_url_encodes_values() {
        let base = Url::parse("https://s2s.singular.net/api/v1/evt").unwrap();
        let mut params = OutboundParams::new();
        params.set(keys::SDK_KEY, "KEY123");
        params.set(keys::EVENT_NAME, "Order Completed");
        params.set(keys::EVENT_ARGS, r#"{"a&b":"c=d"}"#);

        let url = params.to_url(&base);
        let query = url.query().unwrap();
        assert!(url.as_str().starts_with("https://s2s.singular.net/api/v1/evt?"));
        assert!(query.contains("a=KEY123"));
        assert!(!query.contains("a&b"));

        let decoded: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(decoded["n"], "Order Completed");
        assert_eq!(decoded["e"], r#"{"a&b":"c=d"}"#);
    }

    #[test]
    fn test_spaces_encode_as_percent_twenty() {
        let base = Url::parse("https://s2s.singular.net/api/v1/evt").unwrap();
        let mut params = OutboundParams::new();
        params.set(keys::EVENT_NAME, "Order Completed");
        params.set(keys::USER_AGENT, "Mozilla/5.0 (iPhone)");
        params.set(keys::EVENT_ARGS, r#"{"order id":"A B","sum":"1+1"}"#);

        let url = params.to_url(&base);
        let query = url.query().unwrap();
        assert!(query.contains("n=Order%20Completed"));
        assert!(query.contains("ua=Mozilla%2F5.0%20(iPhone)"));
        assert!(!query.contains('+'));

        let args = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("e="))
            .unwrap();
        let decoded = percent_encoding::percent_decode_str(args)
            .decode_utf8()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(json["order id"], "A B");
        assert_eq!(json["sum"], "1+1");
    }
}
