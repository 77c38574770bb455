use std::io::Write;

use alloy_primitives::address;
use eas_batch_attestor::cli::{
    BatchAttestorConfig, ConfigError, DEFAULT_ENS_REGISTRY, DEFAULT_PASSWORD_ENV,
};
use tempfile::NamedTempFile;
use tracing::Level;

/// A minimal valid config with only the required network section.
const MINIMAL: &str = r#"
[network]
chain_id = 11155111
rpc_url = "http://localhost:8545"
eas_address = "0xC2679fBD37d54388Ce493F1DB75320D236e1815e"
schema_registry_address = "0x0a7E2Ff54e76B8E6659aedc9103FB21c038050D0"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn minimal_config_uses_defaults() {
    let file = write_config(MINIMAL);
    let config = BatchAttestorConfig::from_file(file.path()).unwrap();

    assert_eq!(config.network.chain_id, 11_155_111);
    assert_eq!(
        config.network.eas_address,
        address!("0xC2679fBD37d54388Ce493F1DB75320D236e1815e")
    );
    assert_eq!(config.network.ens_registry_address, DEFAULT_ENS_REGISTRY);
    assert!(config.network.resolve_ens);
    assert_eq!(config.signer.password_env, DEFAULT_PASSWORD_ENV);
    assert!(config.signer.keystore_path.ends_with(".eas-batch/keystore"));
    assert!(config.safe.is_none());
    assert!(config.analytics.is_none());
    assert!(!config.batch.ref_uid);
    assert!(!config.batch.has_header);
    assert_eq!(config.batch.resolve_concurrency, 8);
    assert_eq!(config.log_level(), Level::INFO);
}

#[test]
fn full_config_is_parsed() {
    let contents = format!(
        r#"
log_level = "debug"
{MINIMAL}
resolve_ens = false

[signer]
keystore_path = "/tmp/owner"
password_env = "OWNER_PASSWORD"

[safe]
address = "0x1111111111111111111111111111111111111111"
service_url = "https://safe-transaction-sepolia.safe.global"

[analytics]
endpoint = "https://collector.example/events"

[batch]
ref_uid = true
has_header = true
resolve_concurrency = 2
"#
    );
    let file = write_config(&contents);
    let config = BatchAttestorConfig::from_file(file.path()).unwrap();

    assert_eq!(config.log_level(), Level::DEBUG);
    assert!(!config.network.resolve_ens);
    assert_eq!(config.signer.password_env, "OWNER_PASSWORD");

    let safe = config.safe.unwrap();
    assert_eq!(
        safe.address,
        address!("0x1111111111111111111111111111111111111111")
    );
    assert_eq!(safe.origin, "eas-batch");
    assert_eq!(
        config.analytics.unwrap().endpoint.as_str(),
        "https://collector.example/events"
    );
    assert!(config.batch.ref_uid);
    assert!(config.batch.has_header);
    assert_eq!(config.batch.resolve_concurrency, 2);
}

#[test]
fn unknown_log_level_falls_back_to_info() {
    let file = write_config(&format!("log_level = \"chatty\"\n{MINIMAL}"));
    let config = BatchAttestorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.log_level(), Level::INFO);
}

#[test]
fn missing_network_is_a_toml_error() {
    let file = write_config("log_level = \"info\"\n");
    assert!(matches!(
        BatchAttestorConfig::from_file(file.path()),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn malformed_address_is_a_toml_error() {
    let file = write_config(&MINIMAL.replace("0xC2679fBD37d54388Ce493F1DB75320D236e1815e", "0x1234"));
    assert!(matches!(
        BatchAttestorConfig::from_file(file.path()),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn zero_concurrency_is_rejected() {
    let file = write_config(&format!("{MINIMAL}\n[batch]\nresolve_concurrency = 0\n"));
    assert!(matches!(
        BatchAttestorConfig::from_file(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        BatchAttestorConfig::from_file("/nonexistent/eas-batch.toml"),
        Err(ConfigError::Io(..))
    ));
}
