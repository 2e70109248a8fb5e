#![allow(dead_code)]

use certforge::cert::params::{BasicConstraints, CertificateConfig, Issued, IssuerInfo};
use certforge::cert::{Certificate, SignatureAlgorithm};
use certforge::dn::DnBuilder;
use certforge::issuer;
use certforge::key::{EcCurve, KeyAlgorithm, KeyPair};

pub fn p256_key() -> KeyPair {
    KeyPair::generate(KeyAlgorithm::Ecdsa {
        curve: EcCurve::NistP256,
    })
    .unwrap()
}

pub fn dn(common_name: &str) -> String {
    let mut builder = DnBuilder::new();
    builder.add("O", "CertForge Tests").add("CN", common_name);
    builder.build()
}

/// A self-signed CA certificate over a fresh P-256 key.
pub fn self_signed_ca(common_name: &str, serial: u8) -> (Certificate, KeyPair) {
    let key = p256_key();
    let config = CertificateConfig::builder()
        .serial_number(vec![serial])
        .subject(dn(common_name))
        .subject_key(key.clone())
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .basic_constraints(BasicConstraints::Ca(None))
        .build();
    let issued = issuer::issue(&config).unwrap();
    (issued.certificate, key)
}

pub fn issue_under(
    issuer_cert: &Certificate,
    issuer_key: &KeyPair,
    common_name: &str,
    serial: u8,
    constraints: BasicConstraints,
) -> Issued {
    let config = CertificateConfig::builder()
        .serial_number(vec![serial])
        .subject(dn(common_name))
        .key_algorithm(KeyAlgorithm::Ecdsa {
            curve: EcCurve::NistP256,
        })
        .issuer(IssuerInfo {
            distinguished_name: issuer_cert.subject(),
            key: issuer_key.clone(),
        })
        .signature_algorithm(SignatureAlgorithm::Sha256WithEcdsa)
        .basic_constraints(constraints)
        .build();
    issuer::issue(&config).unwrap()
}

/// A three-level chain, entity certificate first, plus the entity key.
pub fn three_level_chain() -> (Vec<Certificate>, KeyPair) {
    let (root_cert, root_key) = self_signed_ca("Test Root CA", 1);
    let intermediate = issue_under(
        &root_cert,
        &root_key,
        "Test Intermediate CA",
        2,
        BasicConstraints::Ca(Some(0)),
    );
    let intermediate_key = intermediate.generated_key.unwrap();
    let leaf = issue_under(
        &intermediate.certificate,
        &intermediate_key,
        "test-entity",
        3,
        BasicConstraints::EndEntity,
    );
    let leaf_key = leaf.generated_key.unwrap();
    (
        vec![leaf.certificate, intermediate.certificate, root_cert],
        leaf_key,
    )
}
