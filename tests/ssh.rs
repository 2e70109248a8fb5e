mod util;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use certforge::error::Error;
use certforge::key::{KeyAlgorithm, KeyPair};
use certforge::ssh::encode_public_key;

fn blob_tag(blob: &[u8]) -> String {
    let len = u32::from_be_bytes(blob[..4].try_into().unwrap()) as usize;
    String::from_utf8(blob[4..4 + len].to_vec()).unwrap()
}

#[test]
fn rsa_keys_encode_as_ssh_rsa_lines() {
    let key = KeyPair::generate(KeyAlgorithm::Rsa { bits: 2048 }).unwrap();
    let line = encode_public_key(&key.public_key(), Some("user@host")).unwrap();

    let fields: Vec<&str> = line.split(' ').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], "ssh-rsa");
    assert!(fields[1].starts_with("AAAA"));
    assert_eq!(fields[2], "user@host");

    // The blob's first field repeats the tag.
    let blob = BASE64.decode(fields[1]).unwrap();
    assert_eq!(blob_tag(&blob), "ssh-rsa");
}

#[test]
fn dsa_keys_encode_as_ssh_dss_lines() {
    let key = KeyPair::generate(KeyAlgorithm::Dsa { bits: 1024 }).unwrap();
    let line = encode_public_key(&key.public_key(), None).unwrap();

    let fields: Vec<&str> = line.split(' ').collect();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0], "ssh-dss");

    let blob = BASE64.decode(fields[1]).unwrap();
    assert_eq!(blob_tag(&blob), "ssh-dss");
}

#[test]
fn an_empty_comment_is_dropped() {
    let key = KeyPair::generate(KeyAlgorithm::Rsa { bits: 2048 }).unwrap();
    let line = encode_public_key(&key.public_key(), Some("")).unwrap();
    assert_eq!(line.split(' ').count(), 2);
}

#[test]
fn ecdsa_keys_have_no_ssh_encoding() {
    let key = util::p256_key();
    let result = encode_public_key(&key.public_key(), None);
    assert!(matches!(result, Err(Error::UnsupportedKeyType(_))));
}
