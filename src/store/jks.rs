//! JKS container codec.
//!
//! The format is the classic Java keystore: a big-endian binary framing with
//! per-entry tags, private keys wrapped in an `EncryptedPrivateKeyInfo` under
//! the Sun proprietary protector (an iterated SHA-1 keystream XOR plus a check
//! hash), and a trailing whitened SHA-1 digest over the whole file keyed by
//! the store password.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use der::asn1::{Null, ObjectIdentifier, OctetStringRef};
use der::{Decode, Encode, Sequence};
use digest::Digest;
use rand_core::{OsRng, RngCore};
use sha1::Sha1;
use std::io::Read;

use crate::cert::Certificate;
use crate::error::{Error, Result};
use crate::store::PlainRecord;

const MAGIC: u32 = 0xFEED_FEED;
const VERSION: u32 = 2;
const TAG_KEY: u32 = 1;
const TAG_TRUSTED_CERT: u32 = 2;
const CERT_TYPE: &str = "X.509";
const INTEGRITY_WHITENER: &[u8] = b"Mighty Aphrodite";

/// Sun proprietary key-protector algorithm, 1.3.6.1.4.1.42.2.17.1.1.
const KEY_PROTECTOR_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.42.2.17.1.1");

#[derive(Sequence)]
struct ProtectorAlgorithm {
    algorithm: ObjectIdentifier,
    parameters: Null,
}

#[derive(Sequence)]
struct ProtectedKey<'a> {
    algorithm: ProtectorAlgorithm,
    encrypted_data: OctetStringRef<'a>,
}

/// Serializes records into JKS bytes under the store password.
pub(crate) fn encode(records: &[(String, PlainRecord)], password: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_u32(&mut buf, MAGIC);
    write_u32(&mut buf, VERSION);
    write_u32(&mut buf, records.len() as u32);

    let timestamp = unix_millis();
    for (alias, record) in records {
        match record {
            PlainRecord::Key { key_der, chain } => {
                write_u32(&mut buf, TAG_KEY);
                write_utf(&mut buf, alias)?;
                write_i64(&mut buf, timestamp);
                let protected = protect_key(key_der, password)?;
                write_bytes(&mut buf, &protected);
                write_u32(&mut buf, chain.len() as u32);
                for certificate in chain {
                    write_utf(&mut buf, CERT_TYPE)?;
                    write_bytes(&mut buf, &certificate.to_der()?);
                }
            }
            PlainRecord::TrustedCert(certificate) => {
                write_u32(&mut buf, TAG_TRUSTED_CERT);
                write_utf(&mut buf, alias)?;
                write_i64(&mut buf, timestamp);
                write_utf(&mut buf, CERT_TYPE)?;
                write_bytes(&mut buf, &certificate.to_der()?);
            }
        }
    }

    let digest = integrity_digest(password, &buf);
    buf.extend_from_slice(&digest);
    Ok(buf)
}

/// Deserializes JKS bytes, verifying the integrity digest first.
pub(crate) fn decode(data: &[u8], password: &str) -> Result<Vec<(String, PlainRecord)>> {
    if data.len() < 12 + 20 {
        return Err(Error::Container("keystore file too short".into()));
    }
    let (body, stored_digest) = data.split_at(data.len() - 20);
    if integrity_digest(password, body) != stored_digest {
        return Err(Error::Container(
            "keystore integrity check failed, wrong password or corrupt file".into(),
        ));
    }

    let mut cursor = body;
    if read_u32(&mut cursor)? != MAGIC {
        return Err(Error::Container("not a JKS keystore".into()));
    }
    if read_u32(&mut cursor)? != VERSION {
        return Err(Error::Container("unsupported JKS version".into()));
    }

    let count = read_u32(&mut cursor)?;
    // Counts come off disk; cap the preallocation by what is actually left.
    let mut records = Vec::with_capacity((count as usize).min(cursor.len()));
    for _ in 0..count {
        let tag = read_u32(&mut cursor)?;
        match tag {
            TAG_KEY => {
                let alias = read_utf(&mut cursor)?;
                let _timestamp = read_i64(&mut cursor)?;
                let protected = read_bytes(&mut cursor)?;
                let key_der = recover_key(&protected, password)?;
                let chain_len = read_u32(&mut cursor)?;
                let mut chain = Vec::with_capacity((chain_len as usize).min(cursor.len()));
                for _ in 0..chain_len {
                    let _cert_type = read_utf(&mut cursor)?;
                    let der = read_bytes(&mut cursor)?;
                    chain.push(Certificate::from_der(&der)?);
                }
                records.push((alias, PlainRecord::Key { key_der, chain }));
            }
            TAG_TRUSTED_CERT => {
                let alias = read_utf(&mut cursor)?;
                let _timestamp = read_i64(&mut cursor)?;
                let _cert_type = read_utf(&mut cursor)?;
                let der = read_bytes(&mut cursor)?;
                records.push((alias, PlainRecord::TrustedCert(Certificate::from_der(&der)?)));
            }
            other => {
                return Err(Error::Container(format!("unknown JKS entry tag: {other}")));
            }
        }
    }
    Ok(records)
}

// Framing primitives. Writing into a Vec cannot fail; reads are bounds
// checked against the remaining slice.

fn write_u32(buf: &mut Vec<u8>, value: u32) {
    let _ = buf.write_u32::<BigEndian>(value);
}

fn write_i64(buf: &mut Vec<u8>, value: i64) {
    let _ = buf.write_i64::<BigEndian>(value);
}

fn write_utf(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(Error::Encoding("string too long for JKS".into()));
    }
    let _ = buf.write_u16::<BigEndian>(bytes.len() as u16);
    buf.extend_from_slice(bytes);
    Ok(())
}

fn write_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

fn read_u32(cursor: &mut &[u8]) -> Result<u32> {
    cursor
        .read_u32::<BigEndian>()
        .map_err(|_| truncated())
}

fn read_i64(cursor: &mut &[u8]) -> Result<i64> {
    cursor
        .read_i64::<BigEndian>()
        .map_err(|_| truncated())
}

fn read_utf(cursor: &mut &[u8]) -> Result<String> {
    let len = cursor.read_u16::<BigEndian>().map_err(|_| truncated())? as usize;
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes).map_err(|_| truncated())?;
    String::from_utf8(bytes).map_err(|_| Error::Container("alias is not valid UTF-8".into()))
}

fn read_bytes(cursor: &mut &[u8]) -> Result<Vec<u8>> {
    let len = read_u32(cursor)? as usize;
    if len > cursor.len() {
        return Err(truncated());
    }
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes).map_err(|_| truncated())?;
    Ok(bytes)
}

fn truncated() -> Error {
    Error::Container("truncated keystore file".into())
}

fn unix_millis() -> i64 {
    let now = time::OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Store passwords enter every digest as UTF-16BE code units.
fn password_bytes(password: &str) -> Vec<u8> {
    password
        .encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect()
}

fn integrity_digest(password: &str, body: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(password_bytes(password));
    hasher.update(INTEGRITY_WHITENER);
    hasher.update(body);
    hasher.finalize().into()
}

/// XORs `input` with the iterated keystream SHA1(password || previous_block),
/// seeded from the salt. Encryption and decryption are the same operation.
fn keystream_xor(password: &[u8], salt: &[u8], input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut block: Vec<u8> = salt.to_vec();
    for chunk in input.chunks(20) {
        let mut hasher = Sha1::new();
        hasher.update(password);
        hasher.update(&block);
        block = hasher.finalize().to_vec();
        for (byte, key) in chunk.iter().zip(&block) {
            output.push(byte ^ key);
        }
    }
    output
}

/// Wraps a plaintext PKCS#8 key as the Sun-protected `EncryptedPrivateKeyInfo`.
fn protect_key(key_der: &[u8], password: &str) -> Result<Vec<u8>> {
    let password = password_bytes(password);

    let mut salt = [0u8; 20];
    OsRng.fill_bytes(&mut salt);

    let ciphertext = keystream_xor(&password, &salt, key_der);

    let mut check_hasher = Sha1::new();
    check_hasher.update(&password);
    check_hasher.update(key_der);
    let check = check_hasher.finalize();

    let mut blob = Vec::with_capacity(20 + ciphertext.len() + 20);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&ciphertext);
    blob.extend_from_slice(&check);

    let protected = ProtectedKey {
        algorithm: ProtectorAlgorithm {
            algorithm: KEY_PROTECTOR_OID,
            parameters: Null,
        },
        encrypted_data: OctetStringRef::new(&blob)
            .map_err(|e| Error::Encoding(e.to_string()))?,
    };
    protected.to_der().map_err(|e| Error::Encoding(e.to_string()))
}

/// Unwraps a Sun-protected key blob back to plaintext PKCS#8.
fn recover_key(protected_der: &[u8], password: &str) -> Result<Vec<u8>> {
    let protected =
        ProtectedKey::from_der(protected_der).map_err(|e| Error::Container(e.to_string()))?;
    if protected.algorithm.algorithm != KEY_PROTECTOR_OID {
        return Err(Error::Container(format!(
            "unsupported key protector: {}",
            protected.algorithm.algorithm
        )));
    }
    let blob = protected.encrypted_data.as_bytes();
    if blob.len() < 40 {
        return Err(Error::Container("protected key blob too short".into()));
    }

    let password = password_bytes(password);
    let salt = &blob[..20];
    let ciphertext = &blob[20..blob.len() - 20];
    let stored_check = &blob[blob.len() - 20..];

    let key_der = keystream_xor(&password, salt, ciphertext);

    let mut check_hasher = Sha1::new();
    check_hasher.update(&password);
    check_hasher.update(&key_der);
    if check_hasher.finalize().as_slice() != stored_check {
        return Err(Error::Container(
            "cannot recover key, wrong password or corrupt entry".into(),
        ));
    }
    Ok(key_der)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_digest_is_password_sensitive() {
        let a = integrity_digest("alpha", b"body");
        let b = integrity_digest("beta", b"body");
        assert_ne!(a, b);
        assert_eq!(a, integrity_digest("alpha", b"body"));
    }

    #[test]
    fn password_enters_digests_as_utf16be() {
        assert_eq!(password_bytes("AB"), vec![0x00, 0x41, 0x00, 0x42]);
        assert!(password_bytes("").is_empty());
    }

    #[test]
    fn keystream_xor_is_an_involution() {
        let password = password_bytes("secret");
        let salt = [7u8; 20];
        let plaintext = b"a blob noticeably longer than one SHA-1 block of keystream";
        let ciphertext = keystream_xor(&password, &salt, plaintext);
        assert_ne!(&ciphertext, plaintext);
        assert_eq!(keystream_xor(&password, &salt, &ciphertext), plaintext);
    }

    #[test]
    fn protected_key_roundtrip() {
        let key = b"not really a key, but protection does not care";
        let protected = protect_key(key, "changeit").unwrap();
        assert_eq!(recover_key(&protected, "changeit").unwrap(), key);
        assert!(recover_key(&protected, "changed").is_err());
    }

    #[test]
    fn decode_survives_a_hostile_entry_count() {
        let mut data = Vec::new();
        write_u32(&mut data, MAGIC);
        write_u32(&mut data, VERSION);
        write_u32(&mut data, u32::MAX);
        let digest = integrity_digest("pw", &data);
        data.extend_from_slice(&digest);

        // Passes the integrity check, then must fail on the missing records
        // without allocating for four billion entries first.
        assert!(matches!(decode(&data, "pw"), Err(Error::Container(_))));
    }

    #[test]
    fn decode_rejects_tampered_body() {
        let data = encode(&[], "pw").unwrap();
        assert!(decode(&data, "pw").unwrap().is_empty());

        let mut tampered = data.clone();
        tampered[4] ^= 1;
        assert!(decode(&tampered, "pw").is_err());
        assert!(decode(&data, "other").is_err());
    }
}
