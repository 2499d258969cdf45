use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &[u8], val: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret)
        .expect("HMAC accepts keys of any length");
    mac.update(val);
    mac
}

pub fn get_digest(secret: &[u8], val: &[u8]) -> Vec<u8> {
    mac_for(secret, val).finalize().into_bytes().to_vec()
}

pub fn is_valid(secret: &[u8], val: &[u8], digest: &[u8]) -> bool {
    mac_for(secret, val).verify_slice(digest).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_verifies() {
        let digest = get_digest(b"foo", b"payload");
        assert!(is_valid(b"foo", b"payload", &digest));
        assert!(!is_valid(b"bar", b"payload", &digest));
        assert!(!is_valid(b"foo", b"payloaD", &digest));
    }
}
