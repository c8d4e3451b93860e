use std::fmt;

use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::x509::X509Name;
use openssl::x509::X509NameBuilder;

/// A fully materialized Distinguished Name.
///
/// Every attribute is resolved: the template layer rejects empty or
/// out-of-bounds values before this type is constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateName {
    pub country: [char; 2],
    pub state_or_province: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
    pub common_name: String,
}

impl fmt::Display for CertificateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            country: [c1, c2],
            state_or_province,
            locality,
            organization,
            organizational_unit,
            common_name,
        } = self;
        write!(
            f,
            "C={c1}{c2}, ST={state_or_province}, L={locality}, O={organization}, OU={organizational_unit}, CN={common_name}"
        )
    }
}

pub fn make_name(args: &CertificateName) -> Result<X509Name, MakeNameError> {
    let mut name = X509NameBuilder::new().map_err(MakeNameError::NewBuilder)?;
    let mut set = |nid: Nid, value: &str| match name.append_entry_by_nid(nid, value) {
        Ok(()) => Ok(()),
        Err(error) => {
            let nid = nid
                .long_name()
                .map_err(|error| MakeNameError::InvalidField { error, nid })?
                .to_owned();
            let value = value.to_owned();
            Err(MakeNameError::InvalidValue { error, nid, value })
        }
    };
    let country: String = args.country.iter().collect();
    set(Nid::COUNTRYNAME, &country)?;
    set(Nid::STATEORPROVINCENAME, &args.state_or_province)?;
    set(Nid::LOCALITYNAME, &args.locality)?;
    set(Nid::ORGANIZATIONNAME, &args.organization)?;
    set(Nid::ORGANIZATIONALUNITNAME, &args.organizational_unit)?;
    set(Nid::COMMONNAME, &args.common_name)?;
    Ok(name.build())
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum MakeNameError {
    #[error("[{n}] Failed to create a new LDAP Name builder: {0}", n = self.name())]
    NewBuilder(ErrorStack),

    #[error("[{n}] Failed to set LDAP field {nid} = '{value}': {error}", n = self.name())]
    InvalidValue {
        error: ErrorStack,
        nid: String,
        value: String,
    },

    #[error("[{n}] Invalid LDAP field NID={nid}: {error}", n = self.name(), nid = nid.as_raw())]
    InvalidField { error: ErrorStack, nid: Nid },
}

#[cfg(test)]
mod tests {
    use super::CertificateName;

    fn test_name() -> CertificateName {
        CertificateName {
            country: ['A', 'U'],
            state_or_province: "Queensland".to_owned(),
            locality: "Brisbane".to_owned(),
            organization: "INSECURE EXAMPLE".to_owned(),
            organizational_unit: "localtls".to_owned(),
            common_name: "localhost".to_owned(),
        }
    }

    #[test]
    fn make_name() {
        let name = super::make_name(&test_name()).unwrap();
        let name: String = name.entries().map(|entry| format!("{entry:?}")).collect();
        assert!(name.contains("countryName = \"AU\""));
        assert!(name.contains("organizationalUnitName = \"localtls\""));
        assert!(name.contains("commonName = \"localhost\""));
    }

    #[test]
    fn display() {
        assert_eq!(
            "C=AU, ST=Queensland, L=Brisbane, O=INSECURE EXAMPLE, OU=localtls, CN=localhost",
            test_name().to_string()
        );
    }

    #[test]
    fn error() {
        let too_long: String = (0..200).map(|_| 'X').collect();
        let Err(error) = super::make_name(&CertificateName {
            common_name: too_long.clone(),
            ..test_name()
        }) else {
            panic!();
        };
        let super::MakeNameError::InvalidValue { nid, value, .. } = &error else {
            panic!();
        };
        assert_eq!(&too_long, value);
        assert_eq!("commonName", nid.as_str());
        assert!(error.to_string().starts_with(&format!(
            "[InvalidValue] Failed to set LDAP field commonName = '{too_long}': "
        ),));
    }
}
