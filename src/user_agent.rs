//! User-Agent string sent with every request.

/// Product token used in the User-Agent header.
const PRODUCT: &str = "uget";

/// Default User-Agent for download requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("uget/").expect("UA has product prefix"),
            "UA must contain crate version"
        );
    }
}
