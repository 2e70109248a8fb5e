mod util;

use certforge::cert::SignatureAlgorithm;
use certforge::cert::params::{BasicConstraints, CertificateConfig, IssuerInfo};
use certforge::dn;
use certforge::error::Error;
use certforge::issuer;
use certforge::key::{EcCurve, KeyAlgorithm, KeyPair};
use time::OffsetDateTime;

#[test]
fn issued_certificate_reflects_the_config() {
    let not_before = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    let not_after = not_before + time::Duration::days(365);

    let key = util::p256_key();
    let config = CertificateConfig::builder()
        .serial_number(vec![7])
        .subject(util::dn("test"))
        .subject_key(key.clone())
        .not_before(not_before)
        .not_after(not_after)
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();

    let issued = issuer::issue(&config).unwrap();
    let certificate = &issued.certificate;

    assert!(issued.generated_key.is_none());
    assert_eq!(certificate.serial_number(), &[7]);
    assert_eq!(dn::common_name(&certificate.subject()).as_deref(), Some("test"));
    assert!(certificate.is_self_signed());
    assert_eq!(certificate.not_before(), not_before);
    assert_eq!(certificate.not_after(), not_after);
    assert_eq!(
        certificate.signature_algorithm().unwrap(),
        SignatureAlgorithm::Sha256WithEcdsa
    );
    assert_eq!(certificate.public_key().unwrap(), key.public_key());

    // The issued document decodes from its own DER.
    let reparsed = certforge::cert::Certificate::from_der(&certificate.to_der().unwrap()).unwrap();
    assert_eq!(&reparsed, certificate);
}

#[test]
fn default_validity_starts_at_midnight_and_lasts_two_years() {
    let (certificate, _) = util::self_signed_ca("Default Validity", 1);

    let not_before = certificate.not_before();
    assert_eq!(not_before.time(), time::Time::MIDNIGHT);
    assert_eq!(
        certificate.not_after(),
        not_before.replace_year(not_before.year() + 2).unwrap()
    );
}

#[test]
fn default_expiry_clamps_a_leap_day_start() {
    let not_before = time::Date::from_calendar_date(2024, time::Month::February, 29)
        .unwrap()
        .midnight()
        .assume_utc();
    let config = CertificateConfig::builder()
        .serial_number(vec![2])
        .subject(util::dn("leap"))
        .subject_key(util::p256_key())
        .not_before(not_before)
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();

    let not_after = issuer::issue(&config).unwrap().certificate.not_after();
    assert_eq!(not_after.year(), 2026);
    assert_eq!(not_after.month(), time::Month::February);
    assert_eq!(not_after.day(), 28);
}

#[test]
fn p521_keys_issue_and_round_trip_through_pkcs8() {
    let key = KeyPair::generate(KeyAlgorithm::Ecdsa {
        curve: EcCurve::NistP521,
    })
    .unwrap();
    let config = CertificateConfig::builder()
        .serial_number(vec![21])
        .subject(util::dn("p521-entity"))
        .subject_key(key.clone())
        .signature_algorithm(SignatureAlgorithm::Sha512WithEcdsa)
        .build();

    let issued = issuer::issue(&config).unwrap();
    assert_eq!(issued.certificate.public_key().unwrap(), key.public_key());
    assert_eq!(
        issued.certificate.signature_algorithm().unwrap(),
        SignatureAlgorithm::Sha512WithEcdsa
    );

    let reparsed = KeyPair::from_pkcs8_der(&key.to_pkcs8_der().unwrap()).unwrap();
    assert_eq!(reparsed.public_key(), key.public_key());
}

#[test]
fn issuance_generates_a_key_when_none_is_supplied() {
    let config = CertificateConfig::builder()
        .serial_number(vec![1])
        .subject(util::dn("generated"))
        .key_algorithm(KeyAlgorithm::Ecdsa {
            curve: EcCurve::NistP256,
        })
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();

    let issued = issuer::issue(&config).unwrap();
    let generated = issued.generated_key.expect("a key should be generated");
    assert_eq!(
        issued.certificate.public_key().unwrap(),
        generated.public_key()
    );
}

#[test]
fn basic_constraints_round_trip_through_the_wire() {
    let cases = [
        BasicConstraints::Omit,
        BasicConstraints::EndEntity,
        BasicConstraints::Ca(Some(3)),
        BasicConstraints::Ca(None),
    ];
    for (index, state) in cases.into_iter().enumerate() {
        let key = util::p256_key();
        let config = CertificateConfig::builder()
            .serial_number(vec![index as u8 + 1])
            .subject(util::dn("constraints"))
            .subject_key(key)
            .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
            .basic_constraints(state)
            .build();
        let issued = issuer::issue(&config).unwrap();
        assert_eq!(issued.certificate.basic_constraints().unwrap(), state);
    }
}

#[test]
fn resigning_a_copy_preserves_everything_but_the_issuer() {
    let (chain, _) = util::three_level_chain();
    let leaf = &chain[0];

    let (new_ca_cert, new_ca_key) = util::self_signed_ca("Replacement CA", 9);
    let mut config = CertificateConfig::from_certificate(leaf).unwrap();
    config.issuer = Some(IssuerInfo {
        distinguished_name: new_ca_cert.subject(),
        key: new_ca_key,
    });
    let resigned = issuer::issue(&config).unwrap().certificate;

    assert_eq!(resigned.serial_number(), leaf.serial_number());
    assert_eq!(resigned.subject(), leaf.subject());
    assert_eq!(resigned.not_before(), leaf.not_before());
    assert_eq!(resigned.not_after(), leaf.not_after());
    assert_eq!(resigned.public_key().unwrap(), leaf.public_key().unwrap());
    assert_eq!(
        resigned.basic_constraints().unwrap(),
        leaf.basic_constraints().unwrap()
    );
    assert_eq!(resigned.issuer(), new_ca_cert.subject());
    assert_ne!(resigned.issuer(), leaf.issuer());
}

#[test]
fn signature_algorithm_must_match_the_signing_key() {
    let config = CertificateConfig::builder()
        .serial_number(vec![1])
        .subject(util::dn("mismatch"))
        .subject_key(util::p256_key())
        .signature_algorithm(SignatureAlgorithm::Sha256WithRsa)
        .build();
    assert!(matches!(issuer::issue(&config), Err(Error::Signing(_))));
}

#[test]
fn key_sources_are_mutually_exclusive() {
    let key = util::p256_key();
    let config = CertificateConfig::builder()
        .serial_number(vec![1])
        .subject(util::dn("conflict"))
        .subject_key(key.clone())
        .key_algorithm(KeyAlgorithm::Ecdsa {
            curve: EcCurve::NistP256,
        })
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();
    assert!(matches!(issuer::issue(&config), Err(Error::Validation(_))));
}

#[test]
fn empty_serial_number_is_rejected() {
    let config = CertificateConfig::builder()
        .serial_number(Vec::new())
        .subject(util::dn("no-serial"))
        .subject_key(util::p256_key())
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();
    assert!(matches!(issuer::issue(&config), Err(Error::Validation(_))));
}

#[test]
fn inverted_validity_is_rejected() {
    let instant = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    let config = CertificateConfig::builder()
        .serial_number(vec![1])
        .subject(util::dn("inverted"))
        .subject_key(util::p256_key())
        .not_before(instant)
        .not_after(instant - time::Duration::days(1))
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .build();
    assert!(matches!(issuer::issue(&config), Err(Error::Validation(_))));
}
