use std::{fs, path::PathBuf};

use anyhow::{Context, Error};
use clap::Parser;
use clap_stdin::MaybeStdin;
use isomdl_holder::{api, config::ResponseConfig, definitions::session, encoding};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with response generation settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Print any base64 or base64url encoded CBOR item as JSON.
    Decode { data: MaybeStdin<String> },
    /// Print the documents of a DeviceResponse or document store.
    DecodeDocuments {
        data: MaybeStdin<String>,
        /// Key each namespace by element identifier.
        #[arg(long)]
        separate: bool,
    },
    DecodeIssuerSigned { data: MaybeStdin<String> },
    /// Check every item of an IssuerSigned against its MSO digests.
    ValidateDigests { data: MaybeStdin<String> },
    /// Verify a COSE_Sign1 with an embedded payload.
    Verify {
        sign1: MaybeStdin<String>,
        /// Path to the public JWK.
        #[arg(long)]
        jwk: PathBuf,
    },
    /// Print the base64 SessionTranscript of an OpenID4VP presentment.
    Oid4vpTranscript {
        client_id: String,
        response_uri: String,
        nonce: String,
        /// Minted when absent.
        #[arg(long)]
        mdoc_generated_nonce: Option<String>,
    },
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    match args.action {
        Action::Decode { data } => print(api::decode_cbor(&data).context("could not decode CBOR")?),
        Action::DecodeDocuments { data, separate } => print(
            api::decode_documents(&data, separate).context("could not decode documents")?,
        ),
        Action::DecodeIssuerSigned { data } => {
            print(api::decode_issuer_signed(&data).context("could not decode IssuerSigned")?)
        }
        Action::ValidateDigests { data } => {
            api::validate_issuer_digests(&data).context("digest validation failed")?;
            println!("Validated!");
            Ok(())
        }
        Action::Verify { sign1, jwk } => {
            let jwk = fs::read_to_string(&jwk)
                .with_context(|| format!("could not read {}", jwk.display()))?;
            let jwk: serde_json::Value =
                serde_json::from_str(&jwk).context("JWK file is not JSON")?;
            let verified = api::verify(&sign1, &jwk).context("could not verify")?;
            print(serde_json::json!({ "verified": verified }))
        }
        Action::Oid4vpTranscript {
            client_id,
            response_uri,
            nonce,
            mdoc_generated_nonce,
        } => {
            let mdoc_generated_nonce = mdoc_generated_nonce.unwrap_or_else(|| {
                isomdl_holder::presentation::oid4vp::generate_mdoc_nonce(
                    config.mdoc_generated_nonce_len,
                )
            });
            let transcript = session::build_oid4vp_transcript(
                &client_id,
                &response_uri,
                &nonce,
                &mdoc_generated_nonce,
            )
            .context("could not build the session transcript")?;
            print(serde_json::json!({
                "sessionTranscript": encoding::encode_standard(&transcript),
                "mdocGeneratedNonce": mdoc_generated_nonce,
            }))
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ResponseConfig, Error> {
    let Some(path) = path else {
        return Ok(ResponseConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    ResponseConfig::from_json(&json).context("invalid configuration")
}

fn print(json: serde_json::Value) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
