use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, theme::ColorfulTheme};

use farewell::{
    config::{self, Provider},
    pipeline,
    request::MessageRequest,
    shell,
};
use farewell_common::address::Address;
use farewell_delivery::{SmtpSession, SmtpTimeouts, Transport};
use farewell_gmail::{GmailTransport, TokenStore};
use farewell_proofs::ProofExporter;

/// Send farewell emails and generate zk-email proof inputs.
///
/// Run without arguments for interactive mode, or pass a JSON file
/// exported from the Farewell UI:
///
/// {"recipients": ["alice@example.com"], "contentHash": "0x1234...",
///  "message": "Your farewell message content..."}
#[derive(Parser)]
#[command(name = "farewell", version, verbatim_doc_comment)]
struct Args {
    /// JSON file with message data (exported from Farewell UI)
    file: Option<PathBuf>,

    /// JSON file with message data (alternative to positional argument)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file_flag: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    farewell_common::logging::init();
    let args = Args::parse();

    // Positional argument takes precedence
    let message_file = args.file.or(args.file_flag);

    shell::banner();

    // Input errors abort before anything touches the network
    let loaded = match &message_file {
        Some(path) => {
            shell::section("Loading Message Data");
            let request = MessageRequest::load(path)?;
            shell::success(&format!("Loaded message data from: {}", path.display()));
            shell::info(&format!("  Recipients: {}", request.recipients.len()));
            shell::info(&format!("  Content hash: {}", request.content_hash));
            Some(request)
        }
        None => None,
    };

    let (mut transport, sender, display_name) = loop {
        match setup_transport().await {
            Ok(ready) => break ready,
            Err(e) => {
                shell::failure(&format!("{e:#}"));
                let retry = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Connection failed. Try again?")
                    .default(true)
                    .interact()?;
                if !retry {
                    anyhow::bail!("Could not connect. Please check your settings.");
                }
            }
        }
    };

    let request = match loaded {
        Some(request) => request,
        None => shell::prompt_request()?,
    };

    if !shell::confirm_send(&sender.to_string(), &request)? {
        shell::info("Aborted by user.");
        transport.close().await;
        return Ok(());
    }

    shell::section("Sending Emails & Generating Proofs");
    let exporter = ProofExporter::create(".")?;

    let report = pipeline::run(
        &mut transport,
        &sender,
        display_name.as_deref(),
        &request,
        &exporter,
        pipeline::INTER_SEND_PAUSE,
    )
    .await;

    // Session release happens on every path out of the batch
    transport.close().await;

    shell::print_report(&report);
    Ok(())
}

/// Resolves the provider selection into an open, authenticated transport.
async fn setup_transport() -> anyhow::Result<(Transport, Address, Option<String>)> {
    let provider = shell::select_provider()?;

    match provider {
        Provider::GmailOauth => {
            let (credentials, token) = config::resolve_gmail(Path::new("."))?;
            let store = TokenStore::load(&credentials, &token)?;

            let transport = GmailTransport::connect(&store, shell::show_auth_url).await?;
            let sender = Address::parse(transport.email_address())
                .context("provider returned an invalid sender address")?;
            shell::success(&format!("Authenticated as: {sender}"));

            let display_name = shell::prompt_display_name(&sender.local_part)?;
            Ok((Transport::Gmail(transport), sender, display_name))
        }
        provider => {
            let account = shell::prompt_account(provider)?;
            let custom = if provider == Provider::Manual {
                Some(shell::prompt_custom_server()?)
            } else {
                None
            };

            let session_config = config::resolve_smtp(provider, &account, custom.as_ref())?;

            shell::info("Connecting to SMTP server...");
            let session = SmtpSession::open(session_config, SmtpTimeouts::default()).await?;
            shell::success("SMTP connection successful!");

            Ok((
                Transport::Smtp(session),
                account.email.clone(),
                account.display_name,
            ))
        }
    }
}
