use localtls_common::x509::name::CertificateName;
use nameth::NamedEnumValues as _;
use nameth::nameth;

/// The default organizational unit, also used as the service name.
pub const SERVICE_NAME: &str = "localtls";

/// Longest common name accepted by [DnTemplate::materialize].
pub const MAX_COMMON_NAME_LEN: usize = 64;

/// Default subject fields and validation policy for Distinguished Names.
///
/// The defaults deliberately advertise that this PKI is a local,
/// insecure-by-design bootstrap and must never be trusted outside the
/// machine that generated it.
#[derive(Clone, Debug)]
pub struct DnTemplate {
    pub country: String,
    pub state_or_province: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
    pub common_name: String,
}

impl Default for DnTemplate {
    fn default() -> Self {
        Self {
            country: "AU".to_owned(),
            state_or_province: "Queensland".to_owned(),
            locality: "Brisbane".to_owned(),
            organization: "INSECURE EXAMPLE".to_owned(),
            organizational_unit: SERVICE_NAME.to_owned(),
            common_name: "localhost".to_owned(),
        }
    }
}

/// Caller-supplied overrides applied on top of a [DnTemplate].
#[derive(Clone, Debug, Default)]
pub struct DnOverrides {
    pub country: Option<String>,
    pub state_or_province: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub common_name: Option<String>,
}

impl DnTemplate {
    /// Resolves overrides against the defaults and validates the result.
    ///
    /// Pure function of its inputs: no entropy, no side effects.
    pub fn materialize(&self, overrides: &DnOverrides) -> Result<CertificateName, ValidationError> {
        fn resolve<'t>(
            field: &'static str,
            default: &'t str,
            another: &'t Option<String>,
        ) -> Result<&'t str, ValidationError> {
            let value = another.as_deref().unwrap_or(default);
            if value.is_empty() {
                return Err(ValidationError::EmptyField { field });
            }
            Ok(value)
        }

        let country = resolve("country", &self.country, &overrides.country)?;
        let mut chars = country.chars();
        let country = match (chars.next(), chars.next(), chars.next()) {
            (Some(c1), Some(c2), None) => [c1, c2],
            _ => {
                return Err(ValidationError::CountryCode {
                    value: country.to_owned(),
                });
            }
        };

        let common_name = resolve("common-name", &self.common_name, &overrides.common_name)?;
        let length = common_name.chars().count();
        if length > MAX_COMMON_NAME_LEN {
            return Err(ValidationError::CommonNameTooLong { length });
        }

        Ok(CertificateName {
            country,
            state_or_province: resolve(
                "state-or-province",
                &self.state_or_province,
                &overrides.state_or_province,
            )?
            .to_owned(),
            locality: resolve("locality", &self.locality, &overrides.locality)?.to_owned(),
            organization: resolve("organization", &self.organization, &overrides.organization)?
                .to_owned(),
            organizational_unit: resolve(
                "organizational-unit",
                &self.organizational_unit,
                &overrides.organizational_unit,
            )?
            .to_owned(),
            common_name: common_name.to_owned(),
        })
    }
}

/// Malformed or out-of-bounds bootstrap inputs.
#[nameth]
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("[{n}] Required field '{field}' resolved to an empty value", n = self.name())]
    EmptyField { field: &'static str },

    #[error("[{n}] Country code must be exactly 2 characters, got '{value}'", n = self.name())]
    CountryCode { value: String },

    #[error("[{n}] Common name of {length} characters exceeds the maximum of {MAX_COMMON_NAME_LEN}", n = self.name())]
    CommonNameTooLong { length: usize },

    #[error("[{n}] A server certificate request needs at least one subject alternative name", n = self.name())]
    EmptySubjectAltNames,

    #[error("[{n}] Validity of {days} days is not positive", n = self.name())]
    InvalidValidity { days: u32 },
}

#[cfg(test)]
mod tests {
    use super::DnOverrides;
    use super::DnTemplate;
    use super::ValidationError;

    #[test]
    fn defaults() {
        let name = DnTemplate::default()
            .materialize(&DnOverrides::default())
            .unwrap();
        assert_eq!(
            "C=AU, ST=Queensland, L=Brisbane, O=INSECURE EXAMPLE, OU=localtls, CN=localhost",
            name.to_string()
        );
    }

    #[test]
    fn overrides() {
        let name = DnTemplate::default()
            .materialize(&DnOverrides {
                country: Some("DE".to_owned()),
                organizational_unit: Some("gateway".to_owned()),
                common_name: Some("insecure.ca.localhost".to_owned()),
                ..DnOverrides::default()
            })
            .unwrap();
        assert_eq!(['D', 'E'], name.country);
        assert_eq!("gateway", name.organizational_unit);
        assert_eq!("insecure.ca.localhost", name.common_name);
        assert_eq!("Queensland", name.state_or_province);
    }

    #[test]
    fn empty_field() {
        let error = DnTemplate::default()
            .materialize(&DnOverrides {
                locality: Some(String::default()),
                ..DnOverrides::default()
            })
            .unwrap_err();
        assert_eq!(ValidationError::EmptyField { field: "locality" }, error);
    }

    #[test]
    fn country_code_bounds() {
        for country in ["A", "AUS"] {
            let error = DnTemplate::default()
                .materialize(&DnOverrides {
                    country: Some(country.to_owned()),
                    ..DnOverrides::default()
                })
                .unwrap_err();
            assert_eq!(
                ValidationError::CountryCode {
                    value: country.to_owned()
                },
                error
            );
        }
    }

    #[test]
    fn common_name_bounds() {
        let at_limit: String = (0..64).map(|_| 'x').collect();
        let name = DnTemplate::default()
            .materialize(&DnOverrides {
                common_name: Some(at_limit.clone()),
                ..DnOverrides::default()
            })
            .unwrap();
        assert_eq!(at_limit, name.common_name);

        let over_limit: String = (0..65).map(|_| 'x').collect();
        let error = DnTemplate::default()
            .materialize(&DnOverrides {
                common_name: Some(over_limit),
                ..DnOverrides::default()
            })
            .unwrap_err();
        assert_eq!(ValidationError::CommonNameTooLong { length: 65 }, error);
    }
}
