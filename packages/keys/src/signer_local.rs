use alloy_signer_local::{LocalSigner, PrivateKeySigner};
use rand::thread_rng;

use std::path::{Path, PathBuf};

/// Read a secp256k1 private key from an encrypted keystore file.
pub fn read_from_keystore<P: AsRef<Path>>(
    path: P,
    password: &str,
) -> Result<PrivateKeySigner, anyhow::Error> {
    let signer = LocalSigner::decrypt_keystore(path, password)?;
    Ok(signer)
}

/// Write a secp256k1 private key to an encrypted keystore file named `name` in `folder_path`.
///
/// Returns the path of the written keystore.
pub fn write_to_keystore<P: AsRef<Path>>(
    folder_path: P,
    name: &str,
    signer: &PrivateKeySigner,
    password: &str,
) -> Result<PathBuf, anyhow::Error> {
    let key = signer.credential().to_bytes();

    let mut rng = thread_rng();
    LocalSigner::encrypt_keystore(&folder_path, &mut rng, key, password, Some(name))?;
    Ok(folder_path.as_ref().join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_roundtrip() {
        let tmp_dir = tempdir().unwrap();
        let signer = PrivateKeySigner::random();

        let path = write_to_keystore(tmp_dir.path(), "attester", &signer, "pw").unwrap();
        assert_eq!(path, tmp_dir.path().join("attester"));

        let loaded = read_from_keystore(&path, "pw").unwrap();
        assert_eq!(signer.address(), loaded.address());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let tmp_dir = tempdir().unwrap();
        let signer = PrivateKeySigner::random();

        let path = write_to_keystore(tmp_dir.path(), "attester", &signer, "pw").unwrap();
        assert!(read_from_keystore(&path, "not-pw").is_err());
    }
}
