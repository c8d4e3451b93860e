use localtls_common::x509::name::CertificateName;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::hash::Hasher;
use openssl::hash::MessageDigest;
use openssl::pkey::PKeyRef;
use openssl::pkey::Private;
use openssl::pkey::Public;
use openssl::sign::Signer;
use openssl::sign::Verifier;

use crate::san::SubjectAltNames;

/// Canonical rendering of the request properties covered by the
/// proof-of-possession signature.
///
/// Covers the subject, the SAN set, the requested validity, the
/// basic-constraints CA flag and the public key (by SHA-256), so none
/// of them can be swapped after the request was built without
/// invalidating the proof.
pub(crate) fn request_properties_hash(
    subject: &CertificateName,
    subject_alt_names: &SubjectAltNames,
    validity_days: u32,
    ca: bool,
    public_key_der: &[u8],
) -> Result<Vec<u8>, MakeRequestHashError> {
    let mut properties =
        format!("{subject}:{subject_alt_names}:{validity_days}:{ca}:").into_bytes();
    let public_key_sha256 = (|| {
        let mut hasher = Hasher::new(MessageDigest::sha256())?;
        hasher.update(public_key_der)?;
        hasher.finish()
    })()
    .map_err(MakeRequestHashError::PublicKeySha256)?;
    properties.extend(public_key_sha256.as_ref());
    Ok(properties)
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum MakeRequestHashError {
    #[error("[{n}] Failed to compute the public key's sha256: {0}", n = self.name())]
    PublicKeySha256(ErrorStack),
}

/// Signs the request properties with the requester's own private key.
pub(crate) fn make_proof(
    private_key: &PKeyRef<Private>,
    properties: &[u8],
) -> Result<Vec<u8>, ErrorStack> {
    let mut signer = Signer::new(MessageDigest::sha256(), private_key)?;
    signer.update(properties)?;
    signer.sign_to_vec()
}

/// Checks the proof against the public key embedded in the request.
pub(crate) fn verify_proof(
    public_key: &PKeyRef<Public>,
    properties: &[u8],
    proof: &[u8],
) -> Result<bool, ErrorStack> {
    let mut verifier = Verifier::new(MessageDigest::sha256(), public_key)?;
    verifier.update(properties)?;
    verifier.verify(proof)
}
