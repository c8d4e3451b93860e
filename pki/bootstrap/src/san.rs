use std::fmt;
use std::net::IpAddr;

use openssl::error::ErrorStack;
use openssl::x509::X509Extension;
use openssl::x509::X509v3Context;
use openssl::x509::extension::SubjectAlternativeName;

/// One alternate identity of a server certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanEntry {
    Dns(String),
    Ip(IpAddr),
}

impl From<&str> for SanEntry {
    /// IP address literals become [SanEntry::Ip], everything else is a
    /// DNS name.
    fn from(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(ip),
            Err(_) => Self::Dns(value.to_owned()),
        }
    }
}

impl fmt::Display for SanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(name) => write!(f, "DNS:{name}"),
            Self::Ip(ip) => write!(f, "IP:{ip}"),
        }
    }
}

/// The ordered subject alternative names of a certificate request.
///
/// Duplicates are permitted; order is preserved into the issued
/// certificate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectAltNames(Vec<SanEntry>);

impl SubjectAltNames {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SanEntry> {
        self.0.iter()
    }

    /// Renders the `subjectAltName` extension.
    pub(crate) fn to_extension(
        &self,
        context: &X509v3Context<'_>,
    ) -> Result<X509Extension, ErrorStack> {
        let mut extension = SubjectAlternativeName::new();
        for entry in &self.0 {
            match entry {
                SanEntry::Dns(name) => extension.dns(name),
                SanEntry::Ip(ip) => extension.ip(&ip.to_string()),
            };
        }
        extension.build(context)
    }
}

impl FromIterator<SanEntry> for SubjectAltNames {
    fn from_iter<T: IntoIterator<Item = SanEntry>>(entries: T) -> Self {
        Self(entries.into_iter().collect())
    }
}

impl From<Vec<SanEntry>> for SubjectAltNames {
    fn from(entries: Vec<SanEntry>) -> Self {
        Self(entries)
    }
}

impl fmt::Display for SubjectAltNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separator = "";
        for entry in &self.0 {
            write!(f, "{separator}{entry}")?;
            separator = ",";
        }
        Ok(())
    }
}
