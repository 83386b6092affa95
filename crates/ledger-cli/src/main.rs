use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_tx::{MessageOutput, NodeKeyPair, PemFileKeys, Transaction};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current tip
    Head,
    /// List blocks newest first
    Blocks {
        #[arg(long, default_value_t = 25)]
        limit: u32,
    },
    /// Mine and append a block
    Add {
        #[arg(long)]
        payload: String,
        /// Producer (miner) address
        #[arg(long)]
        producer: String,
    },
    /// Generate a P-256 node key pair (hex)
    Keygen,
    /// Encrypt a message for a recipient's RSA public key and print the transaction
    Seal {
        /// PEM file holding the recipient's PKCS#1 public key
        #[arg(long)]
        to: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Serialize)]
struct NewBlock {
    payload: String,
    producer: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node.trim_end_matches('/');

    let request = match cli.cmd {
        Command::Keygen => return keygen(),
        Command::Seal { to, message } => return seal(to, message),
        Command::Head => client.get(format!("{node}/chain/head")),
        Command::Blocks { limit } => client
            .get(format!("{node}/chain/blocks"))
            .query(&[("limit", limit)]),
        Command::Add { payload, producer } => client
            .post(format!("{node}/blocks"))
            .json(&NewBlock { payload, producer }),
    };
    let res = request
        .send()
        .await
        .with_context(|| format!("request to {node} failed"))?;

    let status = res.status();
    debug!(%status, "node responded");
    let body: serde_json::Value = res.json().await.context("decoding node response")?;
    println!("status: {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn keygen() -> Result<()> {
    let pair = NodeKeyPair::generate();
    println!("private: {}", pair.private_hex());
    println!("public:  {}", pair.public_hex());
    Ok(())
}

fn seal(to: String, message: String) -> Result<()> {
    let output = MessageOutput {
        encrypted_data: message.into_bytes(),
        recipient: to,
    };
    let tx = Transaction::new(vec![], vec![output], &PemFileKeys).context("sealing message")?;
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}
