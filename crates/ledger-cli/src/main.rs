use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use ledger_core::{address_of, sign_challenge};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the minimal ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an Ed25519 key pair and print the secret key and address
    Keygen,
    /// Ask the node for a challenge bound to an address
    Challenge {
        #[arg(long)]
        address: String,
    },
    /// Sign a challenge message with a hex secret key
    Sign {
        #[arg(long)]
        key: String,
        #[arg(long)]
        message: String,
    },
    /// Fetch a challenge, sign it and submit a record
    Submit {
        /// Hex-encoded 32-byte secret key
        #[arg(long)]
        key: String,
        /// Record data as JSON
        #[arg(long)]
        data: String,
    },
    /// Show chain height and tip fingerprint
    Head,
    /// Show the block at a position
    Block {
        #[arg(long)]
        position: u64,
    },
    /// List records owned by an address
    Records {
        #[arg(long)]
        address: String,
    },
    /// Run full-chain validation on the node
    Validate,
}

#[derive(Deserialize)]
struct ChallengeOut {
    message: String,
}

#[derive(Serialize)]
struct SubmitIn<'a> {
    address: &'a str,
    message: &'a str,
    signature: &'a str,
    data: serde_json::Value,
}

fn parse_key(hex_key: &str) -> Result<SigningKey> {
    let mut seed = [0u8; 32];
    hex::decode_to_slice(hex_key.trim(), &mut seed).context("secret key must be 64 hex chars")?;
    Ok(SigningKey::from_bytes(&seed))
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    if !status.is_success() {
        bail!("node answered {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Keygen => {
            let key = SigningKey::generate(&mut OsRng);
            println!("secret:  {}", hex::encode(key.to_bytes()));
            println!("address: {}", address_of(&key.verifying_key()));
        }
        Command::Challenge { address } => {
            let res = client.get(format!("{node}/challenge/{address}")).send().await?;
            print_response(res).await?;
        }
        Command::Sign { key, message } => {
            let key = parse_key(&key)?;
            println!("{}", sign_challenge(&key, &message));
        }
        Command::Submit { key, data } => {
            let key = parse_key(&key)?;
            let data: serde_json::Value =
                serde_json::from_str(&data).context("--data must be valid JSON")?;
            let address = address_of(&key.verifying_key());
            let challenge: ChallengeOut = client
                .get(format!("{node}/challenge/{address}"))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            debug!(message = %challenge.message, "challenge received");
            let signature = sign_challenge(&key, &challenge.message);
            let body = SubmitIn {
                address: &address,
                message: &challenge.message,
                signature: &signature,
                data,
            };
            let res = client.post(format!("{node}/submit")).json(&body).send().await?;
            print_response(res).await?;
        }
        Command::Head => {
            print_response(client.get(format!("{node}/chain/head")).send().await?).await?;
        }
        Command::Block { position } => {
            print_response(client.get(format!("{node}/blocks/{position}")).send().await?).await?;
        }
        Command::Records { address } => {
            let res = client
                .get(format!("{node}/owners/{address}/records"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Validate => {
            print_response(client.get(format!("{node}/chain/validate")).send().await?).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Ed25519Verifier, SignatureVerifier};

    #[test]
    fn parse_key_roundtrips_keygen_output() {
        let key = SigningKey::generate(&mut OsRng);
        let parsed = parse_key(&hex::encode(key.to_bytes())).unwrap();
        assert_eq!(address_of(&parsed.verifying_key()), address_of(&key.verifying_key()));
        let sig = sign_challenge(&parsed, "m");
        assert!(Ed25519Verifier.verify("m", &address_of(&key.verifying_key()), &sig));
    }

    #[test]
    fn parse_key_rejects_bad_hex() {
        assert!(parse_key("abcd").is_err());
        assert!(parse_key(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn cli_parses_submit() {
        let cli = Cli::parse_from([
            "ledger-cli",
            "--node",
            "http://node:1",
            "submit",
            "--key",
            "00",
            "--data",
            "{}",
        ]);
        assert_eq!(cli.node, "http://node:1");
        assert!(matches!(cli.cmd, Command::Submit { .. }));
    }
}
