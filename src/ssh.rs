//! OpenSSH `authorized_keys` encoding for RSA and DSA public keys.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use byteorder::{BigEndian, WriteBytesExt};
use num_bigint_dig::BigUint;

use crate::error::{Error, Result};
use crate::key::PublicKey;

/// Encodes a public key as one `authorized_keys` line:
/// `<tag> <base64 blob>[ <comment>]`.
///
/// The blob is the SSH wire format: length-prefixed fields, integers as
/// big-endian two's complement (a leading zero byte keeps large values
/// positive). `ssh-rsa` carries exponent then modulus, `ssh-dss` carries
/// p, q, g, y. ECDSA keys have no encoding here.
pub fn encode_public_key(key: &PublicKey, comment: Option<&str>) -> Result<String> {
    let (tag, blob) = match key {
        PublicKey::Rsa(rsa) => {
            use rsa::traits::PublicKeyParts;
            let mut blob = Vec::new();
            write_string(&mut blob, b"ssh-rsa");
            write_mpint(&mut blob, rsa.e());
            write_mpint(&mut blob, rsa.n());
            ("ssh-rsa", blob)
        }
        PublicKey::Dsa(dsa) => {
            let components = dsa.components();
            let mut blob = Vec::new();
            write_string(&mut blob, b"ssh-dss");
            write_mpint(&mut blob, components.p());
            write_mpint(&mut blob, components.q());
            write_mpint(&mut blob, components.g());
            write_mpint(&mut blob, dsa.y());
            ("ssh-dss", blob)
        }
        other => {
            return Err(Error::UnsupportedKeyType(format!(
                "{} keys have no SSH encoding",
                other.family().name()
            )));
        }
    };

    let mut line = format!("{tag} {}", BASE64.encode(&blob));
    if let Some(comment) = comment.filter(|c| !c.is_empty()) {
        line.push(' ');
        line.push_str(comment);
    }
    Ok(line)
}

fn write_string(blob: &mut Vec<u8>, data: &[u8]) {
    let _ = blob.write_u32::<BigEndian>(data.len() as u32);
    blob.extend_from_slice(data);
}

fn write_mpint(blob: &mut Vec<u8>, value: &BigUint) {
    let bytes = value.to_bytes_be();
    if bytes.first().is_some_and(|first| first & 0x80 != 0) {
        let _ = blob.write_u32::<BigEndian>(bytes.len() as u32 + 1);
        blob.push(0);
    } else {
        let _ = blob.write_u32::<BigEndian>(bytes.len() as u32);
    }
    blob.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpint_gets_a_sign_byte_when_the_high_bit_is_set() {
        let mut blob = Vec::new();
        write_mpint(&mut blob, &BigUint::from(0x80u8));
        assert_eq!(blob, [0, 0, 0, 2, 0x00, 0x80]);

        let mut blob = Vec::new();
        write_mpint(&mut blob, &BigUint::from(0x7Fu8));
        assert_eq!(blob, [0, 0, 0, 1, 0x7F]);
    }
}
