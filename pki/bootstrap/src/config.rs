use std::path::Path;
use std::path::PathBuf;

use nameth::NamedEnumValues as _;
use nameth::nameth;
use serde::Deserialize;

use crate::template::DnOverrides;

/// Configuration handed in by the deployment layer.
///
/// Everything is optional; the defaults reproduce the stock insecure
/// localhost PKI.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub country: Option<String>,
    pub state_or_province: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,

    /// Common name of the server certificate.
    pub common_name: String,

    /// Common name of the root CA, distinct from the server's.
    pub ca_common_name: String,

    /// Alternate identities of the server: DNS names or IP addresses.
    pub subject_alt_names: Vec<String>,

    pub validity_days: u32,

    /// Where the four PEM artifacts are written.
    pub output_dir: PathBuf,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            country: None,
            state_or_province: None,
            locality: None,
            organization: None,
            organizational_unit: None,
            common_name: "localhost".to_owned(),
            ca_common_name: "insecure.ca.localhost".to_owned(),
            subject_alt_names: vec!["127.0.0.1".to_owned()],
            validity_days: 31,
            output_dir: PathBuf::from("."),
        }
    }
}

impl BootstrapConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let content = std::fs::read_to_string(path).map_err(LoadConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// The DN overrides for a certificate with the given common name.
    pub fn dn_overrides(&self, common_name: &str) -> DnOverrides {
        DnOverrides {
            country: self.country.clone(),
            state_or_province: self.state_or_province.clone(),
            locality: self.locality.clone(),
            organization: self.organization.clone(),
            organizational_unit: self.organizational_unit.clone(),
            common_name: Some(common_name.to_owned()),
        }
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum LoadConfigError {
    #[error("[{n}] Failed to read the configuration file: {0}", n = self.name())]
    Read(std::io::Error),

    #[error("[{n}] Failed to parse the configuration file: {0}", n = self.name())]
    Parse(#[from] toml::de::Error),
}
