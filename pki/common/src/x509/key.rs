use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::ec::EcGroup;
use openssl::ec::EcKey;
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::pkey::Private;
use openssl::rsa::Rsa;

/// The smallest RSA modulus accepted by [make_key].
pub const MIN_RSA_BITS: u32 = 2048;

/// The asymmetric key flavors supported by the bootstrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// NIST P-256, same security class as RSA-2048.
    #[default]
    EcdsaP256,
    Rsa {
        bits: u32,
    },
}

/// Generates a fresh private key using openssl's CSPRNG.
///
/// Two invocations never return equal key material.
pub fn make_key(algorithm: KeyAlgorithm) -> Result<PKey<Private>, CryptoError> {
    match algorithm {
        KeyAlgorithm::EcdsaP256 => {
            let group =
                EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).map_err(CryptoError::GetCurve)?;
            let ec_key = EcKey::generate(&group).map_err(CryptoError::Generate)?;
            PKey::from_ec_key(ec_key).map_err(CryptoError::ToKey)
        }
        KeyAlgorithm::Rsa { bits } => {
            if bits < MIN_RSA_BITS {
                return Err(CryptoError::KeySizeBelowFloor { bits });
            }
            let rsa = Rsa::generate(bits).map_err(CryptoError::Generate)?;
            PKey::from_rsa(rsa).map_err(CryptoError::ToKey)
        }
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("[{n}] RSA modulus of {bits} bits is below the accepted floor of {MIN_RSA_BITS}", n = self.name())]
    KeySizeBelowFloor { bits: u32 },

    #[error("[{n}] Failed to get the elliptic curve: {0}", n = self.name())]
    GetCurve(ErrorStack),

    #[error("[{n}] Failed to generate the key: {0}", n = self.name())]
    Generate(ErrorStack),

    #[error("[{n}] Failed to convert the generated key: {0}", n = self.name())]
    ToKey(ErrorStack),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use openssl::pkey::PKey;

    use super::CryptoError;
    use super::KeyAlgorithm;
    use crate::x509::PemString as _;

    #[test]
    fn make_key() -> Result<(), Box<dyn Error>> {
        Ok({
            let private_key = super::make_key(KeyAlgorithm::default())?;
            let public_key = private_key.public_key_to_pem()?;
            let public_key = public_key.pem_string()?;
            let _debug = scopeguard::guard_on_unwind((), |_| {
                println!("Public key is\n{public_key}");
            });
            assert!(public_key.starts_with("-----BEGIN PUBLIC KEY-----"));
            let public_key = PKey::public_key_from_pem(public_key.as_bytes())?;
            assert_eq!(
                (256, 128, 72),
                (
                    public_key.bits(),
                    public_key.security_bits(),
                    public_key.size()
                )
            );
            assert!(public_key.public_eq(&private_key));
        })
    }

    #[test]
    fn no_key_reuse() -> Result<(), Box<dyn Error>> {
        Ok({
            let k1 = super::make_key(KeyAlgorithm::default())?;
            let k2 = super::make_key(KeyAlgorithm::default())?;
            assert!(!k1.public_eq(&k2));
            assert_ne!(k1.private_key_to_der()?, k2.private_key_to_der()?);
        })
    }

    #[test]
    fn rsa_below_floor() {
        let Err(CryptoError::KeySizeBelowFloor { bits: 1024 }) =
            super::make_key(KeyAlgorithm::Rsa { bits: 1024 })
        else {
            panic!()
        };
    }

    #[test]
    fn rsa_at_floor() -> Result<(), Box<dyn Error>> {
        Ok({
            let private_key = super::make_key(KeyAlgorithm::Rsa { bits: 2048 })?;
            assert_eq!(2048, private_key.bits());
        })
    }
}
