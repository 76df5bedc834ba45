use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::CodecError;

/**
    RSA-OAEP(SHA-1) encrypt `plaintext` under `key`.

    Used to wrap a session's serialized key material for transport; the
    mask/hash choice is fixed for wire compatibility with existing peers
    and must not be "upgraded" independently of them.
*/
pub fn oaep_encrypt(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), plaintext)
        .map_err(|e| CodecError::RsaOperation(e.to_string()))
}

/**
    RSA-OAEP(SHA-1) decrypt `ciphertext` under `key`.
*/
pub fn oaep_decrypt(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
    key.decrypt(Oaep::new::<Sha1>(), ciphertext)
        .map_err(|e| CodecError::RsaOperation(e.to_string()))
}

/**
    Sign SHA-256(`data`) with RSA-PKCS1v1.5 under `key`.
*/
pub fn pkcs1v15_sign(key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let digest = Sha256::digest(data);
    key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CodecError::RsaOperation(e.to_string()))
}

/**
    Verify an RSA-PKCS1v1.5 signature over SHA-256(`data`) under `key`.
*/
pub fn pkcs1v15_verify(key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> Result<(), CodecError> {
    let digest = Sha256::digest(data);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| CodecError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts;

    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let priv_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let pub_key = RsaPublicKey::from(&priv_key);
        (priv_key, pub_key)
    }

    #[test]
    fn oaep_round_trip() {
        let (priv_key, pub_key) = test_keypair();
        let plaintext = b"serialized cipher properties";
        let ciphertext = oaep_encrypt(&pub_key, plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
        let decrypted = oaep_decrypt(&priv_key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn sign_verify_round_trip() {
        let (priv_key, pub_key) = test_keypair();
        let data = b"serialized cipher properties";
        let sig = pkcs1v15_sign(&priv_key, data).unwrap();
        pkcs1v15_verify(&pub_key, data, &sig).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_data() {
        let (priv_key, pub_key) = test_keypair();
        let sig = pkcs1v15_sign(&priv_key, b"original bytes").unwrap();
        assert!(matches!(
            pkcs1v15_verify(&pub_key, b"tampered bytes!", &sig).unwrap_err(),
            CodecError::SignatureInvalid
        ));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let (priv_key, _) = test_keypair();
        let (_, other_pub) = test_keypair();
        let sig = pkcs1v15_sign(&priv_key, b"data").unwrap();
        assert!(pkcs1v15_verify(&other_pub, b"data", &sig).is_err());
    }

    #[test]
    fn distinct_moduli_sanity() {
        let (a, _) = test_keypair();
        let (b, _) = test_keypair();
        assert_ne!(a.n(), b.n());
    }
}
