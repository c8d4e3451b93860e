use std::time::Duration;
use std::time::SystemTime;

use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::asn1::Asn1Time;
use openssl::error::ErrorStack;
use openssl::x509::X509Builder;
use openssl::x509::X509Ref;

use super::time::Asn1ToSystemTimeError;
use super::time::SystemToAsn1TimeError;
use super::time::asn1_to_system_time;
use super::time::system_to_asn1_time;

/// Represents the interval of time for certificate validity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity<T = SystemTime> {
    pub from: T,
    pub to: T,
}

impl Validity {
    /// A window starting now and ending `days` later.
    pub fn days_from_now(days: u32) -> Self {
        let from = SystemTime::now();
        Self {
            from,
            to: from + Duration::from_secs(3600 * 24) * days,
        }
    }
}

pub(super) fn set_validity(
    builder: &mut X509Builder,
    validity: Validity<Asn1Time>,
) -> Result<(), ValidityError<ErrorStack>> {
    builder
        .set_not_before(&validity.from)
        .map_err(ValidityError::NotBefore)?;
    builder
        .set_not_after(&validity.to)
        .map_err(ValidityError::NotAfter)?;
    Ok(())
}

impl<T> Validity<T> {
    pub fn try_map<F, U, E>(self, f: F) -> Result<Validity<U>, ValidityError<E>>
    where
        F: Fn(T) -> Result<U, E>,
        E: std::error::Error,
    {
        Ok(Validity {
            from: f(self.from).map_err(ValidityError::NotBefore)?,
            to: f(self.to).map_err(ValidityError::NotAfter)?,
        })
    }

    pub fn map<F, U>(self, f: F) -> Validity<U>
    where
        F: Fn(T) -> U,
    {
        Validity {
            from: f(self.from),
            to: f(self.to),
        }
    }
}

impl TryFrom<Validity> for Validity<Asn1Time> {
    type Error = ValidityError<SystemToAsn1TimeError>;

    fn try_from(value: Validity) -> Result<Self, Self::Error> {
        value.try_map(system_to_asn1_time)
    }
}

impl<'t> TryFrom<&'t X509Ref> for Validity {
    type Error = ValidityError<Asn1ToSystemTimeError>;

    fn try_from(x509: &'t X509Ref) -> Result<Self, Self::Error> {
        Validity {
            from: x509.not_before(),
            to: x509.not_after(),
        }
        .try_map(asn1_to_system_time)
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum ValidityError<E: std::error::Error> {
    #[error("[{n}] Failed to process the 'not before' field: {0}", n = self.name())]
    NotBefore(E),

    #[error("[{n}] Failed to process the 'not after' field: {0}", n = self.name())]
    NotAfter(E),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;

    use openssl::asn1::Asn1Time;

    use super::Validity;

    #[test]
    fn days_from_now() {
        let validity = Validity::days_from_now(31);
        assert_eq!(
            Duration::from_secs(3600 * 24 * 31),
            validity.to.duration_since(validity.from).unwrap()
        );
    }

    #[test]
    fn convert() -> Result<(), Box<dyn std::error::Error>> {
        let now = SystemTime::now();
        let now = now
            - Duration::from_nanos(now.duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64);
        let window = Validity {
            from: now,
            to: now + Duration::from_secs(3600),
        };
        let asn1: Validity<Asn1Time> = window.try_into()?;
        let diff = asn1.from.diff(&asn1.to)?;
        assert_eq!((0, 3600), (diff.days, diff.secs));
        Ok(())
    }
}
