//! Page configuration, read from `<script type="application/json" id="tipJarConfig">`.

use tj_core::TipJarConfig;
use tracing::warn;

use crate::dom;

pub const CONFIG_ELEMENT_ID: &str = "tipJarConfig";

pub fn load() -> TipJarConfig {
    let raw = dom::by_id(CONFIG_ELEMENT_ID).and_then(|el| el.text_content());
    from_override(raw.as_deref())
}

/// Defaults, with any fields present in `raw` applied on top. An invalid
/// override is logged and ignored as a whole.
pub fn from_override(raw: Option<&str>) -> TipJarConfig {
    let Some(json) = raw.map(str::trim).filter(|json| !json.is_empty()) else {
        return TipJarConfig::default();
    };
    match TipJarConfig::from_json(json) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "ignoring page configuration");
            TipJarConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_override_uses_defaults() {
        assert_eq!(from_override(None), TipJarConfig::default());
        assert_eq!(from_override(Some("  \n ")), TipJarConfig::default());
        assert_eq!(from_override(Some("{}")), TipJarConfig::default());
    }

    #[test]
    fn override_replaces_named_fields() {
        let config = from_override(Some(r#"{ "recipient": "Guy", "tip_amount": "0.002" }"#));
        assert_eq!(config.recipient, "Guy");
        assert_eq!(config.tip_amount.to_string(), "0.002");
        assert_eq!(config.poll_interval_ms, TipJarConfig::default().poll_interval_ms);
    }

    #[test]
    fn invalid_override_is_ignored() {
        assert_eq!(from_override(Some("{ not json")), TipJarConfig::default());
        assert_eq!(from_override(Some(r#"{ "tip_amount": "-1" }"#)), TipJarConfig::default());
    }
}
