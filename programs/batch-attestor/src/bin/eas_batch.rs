use std::{fs, path::Path};

use clap::Parser;
use eas_batch_attestor::{
    batch::BatchOutcome,
    cli::{
        attest, key::KeyCommands, schema, BatchAttestorCli, BatchAttestorConfig, Commands,
        SignerConfig,
    },
    clients::build_batch_attestor,
    observability::init_observability,
    rows::parse_rows,
    signer::{generate_signer, load_signer},
    BatchAttestationBuilder,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = BatchAttestorCli::parse();

    match cli.command {
        Commands::Schema(args) => run_schema(args).await,
        Commands::Attest(args) => run_attest(args).await,
        Commands::Key(cmd) => run_key(cmd),
    }
}

fn load_config(path: &Path) -> Result<BatchAttestorConfig, anyhow::Error> {
    let config = BatchAttestorConfig::from_file(path)?;
    init_observability(config.log_level())?;
    Ok(config)
}

async fn run_schema(args: schema::Args) -> Result<(), anyhow::Error> {
    let config = load_config(&args.config)?;
    let mut builder = build_batch_attestor(&config, None).await?;
    let loaded = builder.load_schema(args.schema, args.ref_uid).await?;

    println!("schema:    {}", loaded.record.schema);
    println!("revocable: {}", loaded.record.revocable);
    println!("columns:");
    for (idx, field) in loaded.resolved.fields().iter().enumerate() {
        println!("  {idx}: {field}");
    }
    for error in loaded.resolved.errors() {
        println!("warning: {error}");
    }
    if let Err(e) = &loaded.encoder {
        println!("error: {e}");
    }
    Ok(())
}

fn print_outcome(outcome: &BatchOutcome) {
    for skipped in &outcome.skipped {
        println!("skipped line {}: {}", skipped.line, skipped.error);
    }
    println!(
        "{} rows included, {} skipped",
        outcome.len(),
        outcome.skipped.len()
    );
}

async fn run_attest(args: attest::Args) -> Result<(), anyhow::Error> {
    let config = load_config(&args.config)?;
    let input = fs::read(&args.csv)
        .map_err(|e| anyhow::anyhow!("unable to read `{}`: {e}", args.csv.display()))?;

    let signer = if args.dry_run {
        None
    } else {
        Some(load_signer(&config.signer)?)
    };
    let mut builder = build_batch_attestor(&config, signer).await?;

    let ref_uid = args.ref_uid || config.batch.ref_uid;
    let has_header = args.has_header || config.batch.has_header;
    builder.load_schema(args.schema, ref_uid).await?;

    let rows = parse_rows(&input, has_header);
    let outcome = builder.encode_rows(&rows).await?;
    print_outcome(&outcome);

    if args.dry_run {
        for row in &outcome.included {
            println!(
                "line {}: recipient {} refUID {} data {}",
                row.line, row.request.recipient, row.request.refUID, row.request.data
            );
        }
        return Ok(());
    }

    submit(&mut builder, &outcome, args.multisig).await
}

async fn submit(
    builder: &mut BatchAttestationBuilder,
    outcome: &BatchOutcome,
    multisig: bool,
) -> Result<(), anyhow::Error> {
    let mut states = builder.subscribe();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().tag();
            tracing::info!(state, "submission progress");
        }
    });

    let result = if multisig {
        builder.propose_multisig(outcome).await.map(|proposal| {
            println!("proposed Safe transaction {}", proposal.safe_tx_hash);
            println!("signature: {}", proposal.signature);
        })
    } else {
        builder.attest_direct(outcome).await.map(|receipt| {
            println!("transaction {}", receipt.tx_hash);
            for uid in receipt.uids {
                println!("attestation {uid}");
            }
        })
    };

    tracing::info!(state = builder.state().tag(), "submission finished");
    progress.abort();
    Ok(result?)
}

fn signer_config(config: Option<&Path>) -> Result<SignerConfig, anyhow::Error> {
    Ok(match config {
        Some(path) => BatchAttestorConfig::from_file(path)?.signer,
        None => SignerConfig::default(),
    })
}

fn run_key(cmd: KeyCommands) -> Result<(), anyhow::Error> {
    match cmd {
        KeyCommands::Generate(args) => {
            let config = signer_config(args.config.as_deref())?;
            let signer = generate_signer(&config)?;
            println!(
                "key successfully saved to {}",
                config.keystore_path.display()
            );
            println!("address: {}", signer.address());
        }
        KeyCommands::Show(args) => {
            let config = signer_config(args.config.as_deref())?;
            let signer = load_signer(&config)?;
            if args.show_private {
                println!("{}", hex::encode(signer.credential().to_bytes().as_slice()));
            }
            println!("{}", signer.address());
        }
    }
    Ok(())
}
