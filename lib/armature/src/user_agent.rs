//! Composite user-agent construction.
//!
//! Downstream telemetry parses the string positionally: tool-chain
//! segment, provider segment, environment-injected segment, then the
//! partner-ID segment last. Keep that order when changing anything here.

/// Fixed runtime + plugin-SDK segment.
pub const BASE_USER_AGENT: &str =
    "HashiCorp Terraform (+https://www.terraform.io) Terraform Plugin SDK/2.10.1";

/// Provider segment name.
pub const PROVIDER_NAME: &str = "terraform-provider-azurerm";

/// Well-known GUID identifying this provider's default partner identity.
///
/// Substituted when the operator supplied no partner ID and did not opt
/// out of partner attribution.
pub const DEFAULT_PARTNER_ID: &str = "222c6c49-1b0a-5959-a213-6608f9eb8820";

/// Environment variable carrying a UA fragment injected by cloud-shell
/// style embedding hosts.
pub const CLOUD_SHELL_USER_AGENT_ENV: &str = "AZURE_HTTP_USER_AGENT";

/// Build the composite user-agent string.
///
/// Deterministic in its five inputs; the environment variable read happens
/// at the configuration seam, not here, so tests can exercise every
/// combination.
#[must_use]
pub fn build_user_agent(
    existing: &str,
    provider_version: &str,
    partner_id: Option<&str>,
    disable_partner_id: bool,
    cloud_shell_agent: Option<&str>,
) -> String {
    let mut user_agent = format!("{BASE_USER_AGENT} {PROVIDER_NAME}/{provider_version}");

    // a fragment the generated client already carried goes first
    if !existing.is_empty() {
        user_agent = format!("{existing} {user_agent}");
    }

    if let Some(agent) = cloud_shell_agent {
        if !agent.is_empty() {
            user_agent = format!("{user_agent} {agent}");
        }
    }

    let partner_id = match partner_id {
        Some(id) if !id.is_empty() => Some(id),
        _ if !disable_partner_id => Some(DEFAULT_PARTNER_ID),
        _ => None,
    };

    if let Some(id) = partner_id {
        // strip any pre-existing prefix so the segment never doubles up
        let id = id.strip_prefix("pid-").unwrap_or(id);
        user_agent = format!("{user_agent} pid-{id}");
    }

    user_agent.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partner_id_substituted() {
        let user_agent = build_user_agent("", "1.0", None, false, None);
        assert_eq!(
            user_agent,
            format!("{BASE_USER_AGENT} {PROVIDER_NAME}/1.0 pid-{DEFAULT_PARTNER_ID}")
        );
    }

    #[test]
    fn supplied_partner_id_not_double_prefixed() {
        let user_agent = build_user_agent("", "1.0", Some("pid-abc123"), false, None);
        assert!(user_agent.ends_with(" pid-abc123"), "{user_agent}");

        let user_agent = build_user_agent("", "1.0", Some("abc123"), false, None);
        assert!(user_agent.ends_with(" pid-abc123"), "{user_agent}");
    }

    #[test]
    fn disabled_partner_id_omits_segment() {
        let user_agent = build_user_agent("", "1.0", None, true, None);
        assert!(!user_agent.contains("pid-"), "{user_agent}");
    }

    #[test]
    fn supplied_partner_id_wins_over_disable_flag() {
        // an explicit ID is attribution the operator asked for
        let user_agent = build_user_agent("", "1.0", Some("custom"), true, None);
        assert!(user_agent.ends_with(" pid-custom"), "{user_agent}");
    }

    #[test]
    fn existing_fragment_goes_first() {
        let user_agent = build_user_agent("some-sdk/9.9", "1.0", None, true, None);
        assert!(user_agent.starts_with("some-sdk/9.9 "), "{user_agent}");
    }

    #[test]
    fn cloud_shell_fragment_appended_before_partner_id() {
        let user_agent = build_user_agent("", "1.0", None, false, Some("cloud-shell/1.0"));
        let shell_pos = user_agent.find("cloud-shell/1.0").expect("present");
        let pid_pos = user_agent.find("pid-").expect("present");
        assert!(shell_pos < pid_pos, "{user_agent}");
    }

    #[test]
    fn empty_cloud_shell_fragment_ignored() {
        let with_empty = build_user_agent("", "1.0", None, true, Some(""));
        let without = build_user_agent("", "1.0", None, true, None);
        assert_eq!(with_empty, without);
    }
}
