use clap::Parser;
use ear::TrustVector;
use openssl::pkey::PKey;
use serde_json::json;
use std::error::Error;
use std::fs;
use tpmattest::attestation::{self, Statement};
use tpmattest::tpm::SAttest;

#[derive(Parser)]
enum TpmAttestCli {
    Verify(VerifyArgs),
    Inspect(InspectArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied TPM attestation statement against the \
    attestation key and the challenge handed to the TPM")]
struct VerifyArgs {
    #[arg(short, long, default_value = "attstmt.cbor")]
    evidence: String,

    /// PEM encoded attestation key; if missing, the key in the first x5c
    /// certificate is used
    #[arg(short, long)]
    key: Option<String>,

    /// base64url encoded qualifying data
    #[arg(short, long)]
    challenge: String,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Decode the supplied TPM attestation statement and print the \
    certification and the certified public area")]
struct InspectArgs {
    #[arg(short, long, default_value = "attstmt.cbor")]
    evidence: String,
}

fn main() {
    env_logger::init();

    match TpmAttestCli::parse() {
        TpmAttestCli::Verify(args) => match verify(&args) {
            Ok(tvec) => {
                print_json(&tvec);

                if tvec.instance_identity.get() == ear::claim::TRUSTWORTHY_INSTANCE {
                    println!("verification successful");
                } else {
                    println!("verification failed");
                }
            }
            Err(e) => eprintln!("verification failed: {e}"),
        },

        TpmAttestCli::Inspect(args) => match inspect(&args) {
            Ok(j) => println!("{j}"),
            Err(e) => eprintln!("inspection failed: {e}"),
        },
    }
}

fn print_json<T: serde::Serialize>(v: &T) {
    match serde_json::to_string_pretty(v) {
        Ok(j) => println!("{j}"),
        Err(e) => eprintln!("serialising result: {e}"),
    }
}

fn verify(args: &VerifyArgs) -> Result<TrustVector, Box<dyn Error>> {
    let c: Vec<u8> = fs::read(&args.evidence)?;

    let st = Statement::decode(c.as_slice())?;

    let key = match &args.key {
        Some(path) => PKey::public_key_from_pem(&fs::read(path)?)?,
        None => st.attestation_key()?,
    };

    let challenge = attestation::decode_str(&args.challenge)?;

    let ka = st.key_attestation(key, &challenge)?;

    log::info!("verifying {} (alg {})", args.evidence, st.alg);

    Ok(ka.appraise())
}

fn inspect(args: &InspectArgs) -> Result<String, Box<dyn Error>> {
    let c: Vec<u8> = fs::read(&args.evidence)?;

    let st = Statement::decode(c.as_slice())?;

    let cert_info = SAttest::decode(&st.cert_info)?;
    let pub_area = st.public_area()?;

    let j = json!({
        "alg": st.alg.to_string(),
        "x5c": st.x5c.len(),
        "certInfo": cert_info,
        "pubArea": pub_area,
    });

    Ok(serde_json::to_string_pretty(&j)?)
}
