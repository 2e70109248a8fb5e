//! Certificate issuance: turns a [`CertificateConfig`] into a signed
//! certificate.

use std::str::FromStr;

use der::asn1::{BitString, OctetString, UtcTime};
use der::{Decode, Encode};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::name::RdnSequence;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::params::{BasicConstraints, CertificateConfig, Issued};
use crate::cert::Certificate;
use crate::error::{Error, Result};
use crate::key::{KeyAlgorithm, KeyPair, PublicKey};

/// Issues a certificate from the given config.
///
/// The whole issuance is one pure computation over the config: validation,
/// optional subject-key generation, TBS assembly, signing, and a decode of
/// the freshly produced DER so the caller never receives a certificate this
/// crate cannot itself read back.
pub fn issue(config: &CertificateConfig) -> Result<Issued> {
    if config.serial_number.is_empty() {
        return Err(Error::Validation("serial number must not be empty".into()));
    }
    let key_sources = [
        config.subject_key.is_some(),
        config.subject_public_key.is_some(),
        config.key_algorithm.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if key_sources > 1 {
        return Err(Error::Validation(
            "subject key, subject public key and key algorithm are mutually exclusive".into(),
        ));
    }

    let generated = match (&config.subject_key, &config.subject_public_key) {
        (None, None) => {
            let algorithm = config
                .key_algorithm
                .unwrap_or(KeyAlgorithm::Rsa { bits: 2048 });
            Some(KeyPair::generate(algorithm)?)
        }
        _ => None,
    };

    let subject_public_key: PublicKey = if let Some(pair) = &config.subject_key {
        pair.public_key()
    } else if let Some(public) = &config.subject_public_key {
        public.clone()
    } else if let Some(pair) = &generated {
        pair.public_key()
    } else {
        unreachable!("one key source always remains")
    };

    let (issuer_dn, signing_key): (String, &KeyPair) = match &config.issuer {
        Some(info) => (info.distinguished_name.clone(), &info.key),
        None => {
            let pair = config
                .subject_key
                .as_ref()
                .or(generated.as_ref())
                .ok_or_else(|| {
                    Error::Validation(
                        "self-signed issuance requires a subject private key".into(),
                    )
                })?;
            (config.subject.clone(), pair)
        }
    };

    if config.signature_algorithm.family() != signing_key.family() {
        return Err(Error::Signing(format!(
            "{} cannot be signed with a {} key",
            config.signature_algorithm,
            signing_key.family().name()
        )));
    }

    let not_before = config
        .not_before
        .unwrap_or_else(|| OffsetDateTime::now_utc().replace_time(time::Time::MIDNIGHT));
    let not_after = match config.not_after {
        Some(instant) => instant,
        None => add_years(not_before, 2)?,
    };
    if not_after <= not_before {
        return Err(Error::Validation(
            "certificate would expire before it becomes valid".into(),
        ));
    }

    let subject = RdnSequence::from_str(&config.subject)
        .map_err(|e| Error::Validation(format!("invalid subject name: {e}")))?;
    let issuer = RdnSequence::from_str(&issuer_dn)
        .map_err(|e| Error::Validation(format!("invalid issuer name: {e}")))?;

    let validity = x509_cert::time::Validity {
        not_before: encode_time(not_before)?,
        not_after: encode_time(not_after)?,
    };

    let serial_number: SerialNumber = SerialNumber::new(&config.serial_number)
        .map_err(|e| Error::Validation(format!("invalid serial number: {e}")))?;

    let subject_public_key_info =
        SubjectPublicKeyInfoOwned::from_der(&subject_public_key.to_spki_der()?)
            .map_err(|e| Error::Encoding(e.to_string()))?;

    let algorithm_id = config.signature_algorithm.to_algorithm_identifier()?;

    let tbs_certificate = TbsCertificateInner {
        version: Version::V3,
        serial_number,
        signature: algorithm_id.clone(),
        issuer,
        validity,
        subject,
        subject_public_key_info,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: basic_constraints_extension(config.basic_constraints)?,
    };

    let tbs_der = tbs_certificate
        .to_der()
        .map_err(|e| Error::Encoding(e.to_string()))?;
    let signature = signing_key.sign(config.signature_algorithm, &tbs_der)?;

    let inner = CertificateInner {
        tbs_certificate,
        signature_algorithm: algorithm_id,
        signature: BitString::from_bytes(&signature)
            .map_err(|e| Error::Encoding(e.to_string()))?,
    };
    let der = inner.to_der().map_err(|e| Error::Encoding(e.to_string()))?;

    // Decode our own output before handing it out.
    let certificate = Certificate::from_der(&der)
        .map_err(|e| Error::Encoding(format!("issued certificate does not decode: {e}")))?;

    Ok(Issued {
        certificate,
        generated_key: generated,
    })
}

/// Shifts an instant by whole years. A February 29 start in a non-leap
/// target year clamps to February 28.
fn add_years(instant: OffsetDateTime, years: i32) -> Result<OffsetDateTime> {
    let date = instant.date();
    let year = date.year() + years;
    let shifted = time::Date::from_calendar_date(year, date.month(), date.day())
        .or_else(|_| time::Date::from_calendar_date(year, date.month(), 28))
        .map_err(|e| Error::Validation(e.to_string()))?;
    Ok(instant.replace_date(shifted))
}

/// Encodes a validity instant as `UTCTime`, which bounds usable dates to the
/// year 2049.
fn encode_time(instant: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let utc = UtcTime::from_system_time(instant.into())
        .map_err(|e| Error::Validation(format!("validity instant not encodable: {e}")))?;
    Ok(x509_cert::time::Time::UtcTime(utc))
}

fn basic_constraints_extension(
    state: BasicConstraints,
) -> Result<Option<Vec<x509_cert::ext::Extension>>> {
    let content = match state {
        BasicConstraints::Omit => return Ok(None),
        BasicConstraints::EndEntity => x509_cert::ext::pkix::BasicConstraints {
            ca: false,
            path_len_constraint: None,
        },
        BasicConstraints::Ca(limit) => x509_cert::ext::pkix::BasicConstraints {
            ca: true,
            path_len_constraint: limit,
        },
    };
    let value = content.to_der().map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(Some(vec![x509_cert::ext::Extension {
        extn_id: const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS,
        critical: true,
        extn_value: OctetString::new(value).map_err(|e| Error::Encoding(e.to_string()))?,
    }]))
}
