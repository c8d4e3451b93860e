use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::asn1::Asn1Integer;
use openssl::bn::BigNum;
use openssl::error::ErrorStack;
use openssl::x509::X509Builder;

/// Applies a CA-allocated serial number to the certificate under
/// construction.
///
/// Serial numbers are allocated by the issuing CA from a monotonic
/// counter, so every certificate signed by one CA instance carries a
/// distinct, strictly increasing serial.
pub(super) fn set_serial_number(
    builder: &mut X509Builder,
    serial: u64,
) -> Result<(), SetSerialNumberError> {
    let serial =
        BigNum::from_dec_str(&serial.to_string()).map_err(SetSerialNumberError::ToBigNum)?;
    let serial = Asn1Integer::from_bn(&serial).map_err(SetSerialNumberError::ToAsn1)?;
    builder
        .set_serial_number(&serial)
        .map_err(SetSerialNumberError::Set)?;
    Ok(())
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum SetSerialNumberError {
    #[error("[{n}] Failed to convert the serial to BigNum: {0}", n = self.name())]
    ToBigNum(ErrorStack),

    #[error("[{n}] Failed to convert the serial to Asn1: {0}", n = self.name())]
    ToAsn1(ErrorStack),

    #[error("[{n}] Failed to set the serial number: {0}", n = self.name())]
    Set(ErrorStack),
}
