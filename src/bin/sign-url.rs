//! Operator CLI for minting signed URLs.
//!
//! Issuance lives with the operator holding the private key; the gateway
//! itself only ever verifies.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use edge_gateway::signing::UrlSigner;

#[derive(Parser)]
#[command(name = "sign-url")]
#[command(about = "Mint a signed access URL for a private resource", long_about = None)]
struct Args {
    /// Path to the PKCS#8 PEM private key.
    #[arg(short, long)]
    key: PathBuf,

    /// Key pair identifier the verifier knows this key by.
    #[arg(short = 'i', long)]
    key_pair_id: String,

    /// The resource URL to grant access to.
    #[arg(short, long)]
    url: String,

    /// Lifetime of the grant in seconds.
    #[arg(short, long, default_value_t = 3600)]
    ttl_secs: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let signer = UrlSigner::from_pem_file(&args.key, &args.key_pair_id)?;
    let signed = signer.signed_url(&args.url, Duration::from_secs(args.ttl_secs))?;
    println!("{signed}");
    Ok(())
}
