use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::SeqCst;

use localtls_common::certificate_info::CertificateInfo;
use localtls_common::certificate_info::X509CertificateInfo;
use localtls_common::certificate_info::X509CertificateInfoRef;
use localtls_common::x509::common_fields::SetCommonFieldsError;
use localtls_common::x509::common_fields::set_common_fields;
use localtls_common::x509::key::CryptoError;
use localtls_common::x509::key::KeyAlgorithm;
use localtls_common::x509::key::make_key;
use localtls_common::x509::name::MakeNameError;
use localtls_common::x509::name::make_name;
use localtls_common::x509::time::Asn1ToSystemTimeError;
use localtls_common::x509::validity::Validity;
use localtls_common::x509::validity::ValidityError;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::pkey::PKeyRef;
use openssl::pkey::Private;
use openssl::x509::X509Builder;
use openssl::x509::X509Ref;
use openssl::x509::extension::BasicConstraints;
use openssl::x509::extension::KeyUsage;

use crate::template::DnOverrides;
use crate::template::DnTemplate;
use crate::template::ValidationError;

/// A root CA: a self-signed certificate, its private key, and the
/// serial-number counter for everything this CA instance signs.
///
/// The serial counter is the only mutable state; the key and
/// certificate are read-only after bootstrap, so a single instance can
/// be shared freely for signing.
pub struct CertificateAuthority {
    info: X509CertificateInfo,
    serial: AtomicU64,
}

impl CertificateAuthority {
    pub fn certificate(&self) -> &X509Ref {
        &self.info.certificate
    }

    pub fn private_key(&self) -> &PKeyRef<Private> {
        &self.info.private_key
    }

    pub fn as_ref(&self) -> X509CertificateInfoRef<'_> {
        self.info.as_ref()
    }

    /// The CA certificate's own validity window.
    pub fn validity(&self) -> Result<Validity, ValidityError<Asn1ToSystemTimeError>> {
        self.certificate().try_into()
    }

    /// Allocates the next serial number.
    ///
    /// Strictly increasing, never reused, even when the certificate the
    /// serial was allocated for is later discarded.
    pub(crate) fn next_serial(&self) -> u64 {
        self.serial.fetch_add(1, SeqCst)
    }
}

/// Creates a fresh, self-signed root CA.
///
/// The root is its own trust anchor: issuer and subject are the same
/// name and the signature is produced with the CA's own private key.
/// Nothing about it derives from previously issued state. The serial
/// counter starts at 1 and the root certificate consumes the first
/// allocation.
pub fn bootstrap(
    template: &DnTemplate,
    overrides: &DnOverrides,
    algorithm: KeyAlgorithm,
    validity_days: u32,
) -> Result<CertificateAuthority, BootstrapCaError> {
    if validity_days == 0 {
        return Err(ValidationError::InvalidValidity {
            days: validity_days,
        })?;
    }

    let serial = AtomicU64::new(1);
    let private_key = make_key(algorithm)?;
    let subject = template.materialize(overrides)?;
    let subject_name = make_name(&subject)?;

    let mut builder = X509Builder::new().map_err(BootstrapCaError::NewBuilder)?;
    builder
        .set_pubkey(&private_key)
        .map_err(BootstrapCaError::SetPublicKey)?;
    let root_serial = serial.fetch_add(1, SeqCst);
    set_common_fields(
        &mut builder,
        &subject_name,
        &subject_name,
        Validity::days_from_now(validity_days),
        root_serial,
    )?;

    (|| {
        let basic_constraints = BasicConstraints::new().critical().ca().build()?;
        builder.append_extension(basic_constraints)?;
        Ok(())
    })()
    .map_err(BootstrapCaError::BasicConstraints)?;

    (|| {
        let key_usage = KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()?;
        builder.append_extension(key_usage)?;
        Ok(())
    })()
    .map_err(BootstrapCaError::KeyUsage)?;

    builder
        .sign(&private_key, openssl::hash::MessageDigest::sha256())
        .map_err(BootstrapCaError::Sign)?;

    let certificate = builder.build();

    Ok(CertificateAuthority {
        info: CertificateInfo {
            certificate,
            private_key,
        },
        serial,
    })
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum BootstrapCaError {
    #[error("[{n}] {0}", n = self.name())]
    Validation(#[from] ValidationError),

    #[error("[{n}] {0}", n = self.name())]
    MakeKey(#[from] CryptoError),

    #[error("[{n}] {0}", n = self.name())]
    MakeName(#[from] MakeNameError),

    #[error("[{n}] Failed to create a new X509 Certificate builder: {0}", n = self.name())]
    NewBuilder(ErrorStack),

    #[error("[{n}] Failed to set the public key: {0}", n = self.name())]
    SetPublicKey(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    SetCommonFields(#[from] SetCommonFieldsError),

    #[error("[{n}] Failed to set basic constraints: {0}", n = self.name())]
    BasicConstraints(ErrorStack),

    #[error("[{n}] Failed to set key usage: {0}", n = self.name())]
    KeyUsage(ErrorStack),

    #[error("[{n}] Failed to sign the certificate: {0}", n = self.name())]
    Sign(ErrorStack),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use localtls_common::x509::PemString as _;
    use localtls_common::x509::key::KeyAlgorithm;

    use super::BootstrapCaError;
    use crate::template::DnOverrides;
    use crate::template::DnTemplate;
    use crate::template::ValidationError;

    fn ca_overrides() -> DnOverrides {
        DnOverrides {
            common_name: Some("insecure.ca.localhost".to_owned()),
            ..DnOverrides::default()
        }
    }

    #[test]
    fn bootstrap() -> Result<(), Box<dyn Error>> {
        Ok({
            let ca = super::bootstrap(
                &DnTemplate::default(),
                &ca_overrides(),
                KeyAlgorithm::default(),
                31,
            )?;
            let text = ca.certificate().to_text().pem_string()?;
            let _debug = scopeguard::guard_on_unwind((), |_| {
                println!("CA certificate is\n{text}");
            });

            assert!(text.contains("Signature Algorithm: ecdsa-with-SHA256"));
            assert!(text.contains(
                "Issuer: C=AU, ST=Queensland, L=Brisbane, O=INSECURE EXAMPLE, OU=localtls, CN=insecure.ca.localhost"
            ));
            assert!(text.contains(
                "Subject: C=AU, ST=Queensland, L=Brisbane, O=INSECURE EXAMPLE, OU=localtls, CN=insecure.ca.localhost"
            ));
            assert!(text.contains("CA:TRUE"));
            assert!(text.contains("Certificate Sign, CRL Sign"));
            assert!(text.contains("Serial Number: 1 (0x1)"));
            assert!(text.contains("X509v3 Subject Key Identifier"));
        })
    }

    #[test]
    fn self_signed() -> Result<(), Box<dyn Error>> {
        Ok({
            let ca = super::bootstrap(
                &DnTemplate::default(),
                &ca_overrides(),
                KeyAlgorithm::default(),
                31,
            )?;
            let public_key = ca.certificate().public_key()?;
            assert!(ca.certificate().verify(&public_key)?);
        })
    }

    #[test]
    fn zero_validity() {
        let Err(BootstrapCaError::Validation(ValidationError::InvalidValidity { days: 0 })) =
            super::bootstrap(
                &DnTemplate::default(),
                &ca_overrides(),
                KeyAlgorithm::default(),
                0,
            )
        else {
            panic!()
        };
    }

    #[test]
    fn serial_allocation() -> Result<(), Box<dyn Error>> {
        Ok({
            let ca = super::bootstrap(
                &DnTemplate::default(),
                &ca_overrides(),
                KeyAlgorithm::default(),
                31,
            )?;
            assert_eq!(2, ca.next_serial());
            assert_eq!(3, ca.next_serial());
        })
    }
}
