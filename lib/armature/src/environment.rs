//! Target cloud environments.
//!
//! An [`Environment`] names the base endpoints for one cloud instance
//! (public, sovereign, or a private stack). It is resolved once at
//! provider initialization and read-only afterwards.

use armature_core::{Error, Result};
use url::Url;

/// Endpoint metadata for a target cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Canonical environment name, e.g. `AZUREPUBLICCLOUD`.
    pub name: String,
    /// Base URI of the resource-manager (management-plane) API.
    pub resource_manager_endpoint: Url,
    /// Base URI of the directory (token) service.
    pub active_directory_endpoint: Url,
    /// DNS suffix for storage data-plane endpoints.
    pub storage_endpoint_suffix: String,
    /// DNS suffix for key-vault data-plane endpoints.
    pub key_vault_dns_suffix: String,
}

// Endpoint constants are infallible to parse; the expect calls below are
// confined to the well-known constructors.
#[allow(clippy::expect_used)]
impl Environment {
    /// The worldwide public cloud.
    #[must_use]
    pub fn public() -> Self {
        Self {
            name: "AZUREPUBLICCLOUD".to_string(),
            resource_manager_endpoint: Url::parse("https://management.azure.com/")
                .expect("static endpoint"),
            active_directory_endpoint: Url::parse("https://login.microsoftonline.com/")
                .expect("static endpoint"),
            storage_endpoint_suffix: "core.windows.net".to_string(),
            key_vault_dns_suffix: "vault.azure.net".to_string(),
        }
    }

    /// The US government sovereign cloud.
    #[must_use]
    pub fn us_government() -> Self {
        Self {
            name: "AZUREUSGOVERNMENTCLOUD".to_string(),
            resource_manager_endpoint: Url::parse("https://management.usgovcloudapi.net/")
                .expect("static endpoint"),
            active_directory_endpoint: Url::parse("https://login.microsoftonline.us/")
                .expect("static endpoint"),
            storage_endpoint_suffix: "core.usgovcloudapi.net".to_string(),
            key_vault_dns_suffix: "vault.usgovcloudapi.net".to_string(),
        }
    }

    /// The China sovereign cloud.
    #[must_use]
    pub fn china() -> Self {
        Self {
            name: "AZURECHINACLOUD".to_string(),
            resource_manager_endpoint: Url::parse("https://management.chinacloudapi.cn/")
                .expect("static endpoint"),
            active_directory_endpoint: Url::parse("https://login.chinacloudapi.cn/")
                .expect("static endpoint"),
            storage_endpoint_suffix: "core.chinacloudapi.cn".to_string(),
            key_vault_dns_suffix: "vault.azure.cn".to_string(),
        }
    }

    /// Resolve an environment from its name.
    ///
    /// Accepts both the canonical form (`AZUREPUBLICCLOUD`) and the short
    /// readable form users actually type (`public`, `usgovernment`,
    /// `china`): when the given name does not match, it is retried wrapped
    /// as `AZURE<NAME>CLOUD`.
    ///
    /// # Errors
    ///
    /// Returns an error when neither form names a known environment.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::lookup(name)
            .or_else(|| Self::lookup(&format!("AZURE{name}CLOUD")))
            .ok_or_else(|| Error::invalid_request(format!("unknown cloud environment {name:?}")))
    }

    fn lookup(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "AZUREPUBLICCLOUD" => Some(Self::public()),
            "AZUREUSGOVERNMENTCLOUD" => Some(Self::us_government()),
            "AZURECHINACLOUD" => Some(Self::china()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_canonical() {
        let env = Environment::from_name("AzurePublicCloud").expect("known");
        assert_eq!(env, Environment::public());
    }

    #[test]
    fn from_name_wrapped_short_form() {
        let env = Environment::from_name("usgovernment").expect("known");
        assert_eq!(env, Environment::us_government());

        let env = Environment::from_name("china").expect("known");
        assert_eq!(env, Environment::china());
    }

    #[test]
    fn from_name_unknown() {
        let err = Environment::from_name("germany").expect_err("unknown");
        assert!(err.to_string().contains("germany"));
    }

    #[test]
    fn endpoints_differ_per_cloud() {
        assert_ne!(
            Environment::public().resource_manager_endpoint,
            Environment::china().resource_manager_endpoint
        );
    }
}
