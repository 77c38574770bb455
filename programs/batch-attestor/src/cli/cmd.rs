//! Defines the command line interface of the batch attestor.
use std::path::PathBuf;

use alloy_primitives::B256;
use clap::{command, Parser};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "eas-batch",
    version,
    about = "EAS batch attestor - attest CSV rows in one transaction",
    long_about = "Encodes CSV rows against an EAS schema and submits them as a single multiAttest call,\neither directly or as a Safe multisig proposal."
)]
/// The command line interface for the batch attestor.
pub struct BatchAttestorCli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the batch attestor.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Print the resolved field list of a schema.
    Schema(schema::Args),

    /// Encode a CSV file and submit it.
    Attest(attest::Args),

    /// Manage the local keystore.
    #[command(subcommand)]
    Key(key::KeyCommands),
}

/// The arguments for the schema subcommand.
pub mod schema {
    use super::{Parser, PathBuf, B256};

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file.
        #[clap(long)]
        pub config: PathBuf,
        /// The schema UID.
        #[clap(long)]
        pub schema: B256,
        /// Include the reference UID column.
        #[clap(long)]
        pub ref_uid: bool,
    }
}

/// The arguments for the attest subcommand.
pub mod attest {
    use super::{Parser, PathBuf, B256};

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file.
        #[clap(long)]
        pub config: PathBuf,
        /// The schema UID.
        #[clap(long)]
        pub schema: B256,
        /// The CSV file with one attestation per row.
        #[clap(long)]
        pub csv: PathBuf,
        /// Rows carry a reference UID column before the recipient.
        #[clap(long)]
        pub ref_uid: bool,
        /// Skip the first CSV row.
        #[clap(long)]
        pub has_header: bool,
        /// Propose to the configured Safe instead of sending directly.
        #[clap(long)]
        pub multisig: bool,
        /// Only encode the rows and print the result.
        #[clap(long)]
        pub dry_run: bool,
    }
}

/// The arguments for the key subcommand.
pub mod key {
    use super::{Parser, PathBuf};

    #[derive(Clone, Debug, Parser)]
    pub enum KeyCommands {
        Generate(GenerateArgs),
        Show(ShowArgs),
    }

    #[derive(Clone, Debug, Parser)]
    pub struct GenerateArgs {
        /// Use the `[signer]` section of this configuration file.
        #[clap(long)]
        pub config: Option<PathBuf>,
    }

    #[derive(Clone, Debug, Parser)]
    pub struct ShowArgs {
        /// Use the `[signer]` section of this configuration file.
        #[clap(long)]
        pub config: Option<PathBuf>,
        #[clap(long)]
        pub show_private: bool,
    }
}
