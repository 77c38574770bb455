use std::{env, fs};

use alloy_signer_local::PrivateKeySigner;
use eas_batch_keys::signer_local::{read_from_keystore, write_to_keystore};

use crate::{cli::SignerConfig, error::BatchError};

/// The keystore password from the environment variable named in `config`.
///
/// An unset variable means an empty password.
#[must_use]
pub fn keystore_password(config: &SignerConfig) -> String {
    env::var(&config.password_env).unwrap_or_default()
}

/// Decrypt the signer configured in `config`.
pub fn load_signer(config: &SignerConfig) -> Result<PrivateKeySigner, BatchError> {
    read_from_keystore(&config.keystore_path, &keystore_password(config)).map_err(|e| {
        BatchError::ClientConfig(format!(
            "unable to read keystore `{}`: {e}",
            config.keystore_path.display()
        ))
    })
}

/// Create a fresh key and store it at the configured keystore path.
///
/// Refuses to overwrite an existing keystore.
pub fn generate_signer(config: &SignerConfig) -> Result<PrivateKeySigner, BatchError> {
    let path = &config.keystore_path;
    if path.exists() {
        return Err(BatchError::ClientConfig(format!(
            "keystore `{}` already exists",
            path.display()
        )));
    }
    let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
    else {
        return Err(BatchError::ClientConfig(format!(
            "invalid keystore path `{}`",
            path.display()
        )));
    };
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).map_err(|e| BatchError::ClientConfig(e.to_string()))?;
    }

    let signer = PrivateKeySigner::random();
    write_to_keystore(dir, name, &signer, &keystore_password(config))
        .map_err(|e| BatchError::ClientConfig(format!("unable to write keystore: {e}")))?;
    Ok(signer)
}
