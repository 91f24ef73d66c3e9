//! Interactive prompts and terminal output.
//!
//! Everything here is glue: collecting the same fields the JSON input
//! carries, and reporting what the pipeline did. No sequencing decisions
//! live in this module.

use std::io::{self, BufRead};

use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};

use farewell_common::address::Address;
use farewell_delivery::Security;

use crate::{
    config::{CustomServer, Provider, SmtpAccount},
    pipeline::RunReport,
    request::MessageRequest,
};

/// Prints the tool banner.
pub fn banner() {
    println!();
    println!("{}", style("  F A R E W E L L").cyan().bold());
    println!("{}", style("  Claimer Helper").yellow());
    println!("{}", style("  ZK-Email Proof Generator").yellow());
    println!();
    println!("This tool will help you:");
    println!("  {} Configure your email sending", style("1.").green());
    println!("  {} Send the Farewell message to recipients", style("2.").green());
    println!("  {} Generate zk-email proof inputs for the blockchain", style("3.").green());
    println!();
}

/// Prints a section header.
pub fn section(title: &str) {
    println!();
    println!("{}", style("─".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan());
    println!("{}", style("─".repeat(60)).cyan());
    println!();
}

pub fn success(msg: &str) {
    println!("{} {msg}", style("✓").green());
}

pub fn failure(msg: &str) {
    println!("{} {msg}", style("✗").red());
}

pub fn warning(msg: &str) {
    println!("{} {msg}", style("⚠").yellow());
}

pub fn info(msg: &str) {
    println!("{} {msg}", style("ℹ").blue());
}

/// Asks the user to pick a provider.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn select_provider() -> dialoguer::Result<Provider> {
    section("SMTP Configuration");

    let labels: Vec<&str> = Provider::ALL.iter().map(|p| p.label()).collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select your email provider")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(Provider::ALL[choice])
}

/// Collects email, password, and display name for the SMTP paths.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn prompt_account(provider: Provider) -> dialoguer::Result<SmtpAccount> {
    if let Some(preset) = provider.preset() {
        println!();
        info(&format!("Server: {}:{}", preset.host, preset.port));
        warning(preset.note);
        info(&format!("Help: {}", preset.help_url));
        println!();
    }

    let email: Address = loop {
        let raw: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Your email address")
            .interact_text()?;
        match Address::parse(&raw) {
            Ok(address) => break address,
            Err(e) => failure(&format!("{e}")),
        }
    };

    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Your password (or app password)")
        .interact()?;

    let display_name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Display name (optional)")
        .default(email.local_part.clone())
        .interact_text()?;

    Ok(SmtpAccount {
        email,
        password,
        display_name: (!display_name.is_empty()).then_some(display_name),
    })
}

/// Prompts for a display name with a sensible default.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn prompt_display_name(default: &str) -> dialoguer::Result<Option<String>> {
    let display_name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Display name (optional)")
        .default(default.to_string())
        .interact_text()?;

    Ok((!display_name.is_empty()).then_some(display_name))
}

/// Collects host, port, and security for the manual path.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn prompt_custom_server() -> dialoguer::Result<CustomServer> {
    section("Manual SMTP Configuration");

    let host: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("SMTP server hostname")
        .interact_text()?;

    let port: u16 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("SMTP port")
        .default(587)
        .interact_text()?;

    let use_starttls = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Use STARTTLS?")
        .default(true)
        .interact()?;

    let security = if use_starttls {
        Security::Starttls
    } else {
        let use_ssl = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Use SSL/TLS?")
            .default(false)
            .interact()?;
        if use_ssl {
            Security::Implicit
        } else {
            Security::None
        }
    };

    Ok(CustomServer {
        host,
        port,
        security,
    })
}

/// Collects recipients, content hash, and body interactively, looping
/// until the fields validate.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn prompt_request() -> dialoguer::Result<MessageRequest> {
    section("Message Information");
    info("Enter the information from the decrypted Farewell message:");
    println!();

    loop {
        let recipients_raw: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Recipient email(s) (comma-separated for multiple)")
            .interact_text()?;
        let recipients: Vec<String> = recipients_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        let content_hash: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Payload Content Hash (from contract, starts with 0x)")
            .interact_text()?;

        info("Enter the message content (end with an empty line):");
        let mut lines = Vec::new();
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.unwrap_or_default();
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }

        match MessageRequest::from_parts(recipients, &content_hash, lines.join("\n"), None) {
            Ok(request) => return Ok(request),
            Err(e) => {
                failure(&format!("{e}"));
                println!();
            }
        }
    }
}

/// Shows the pre-send summary and asks for confirmation.
///
/// # Errors
///
/// Returns an error if the terminal interaction fails.
pub fn confirm_send(sender: &str, request: &MessageRequest) -> dialoguer::Result<bool> {
    section("Summary");
    println!("  {} {sender}", style("From:").bold());
    println!("  {} {}", style("Recipients:").bold(), request.recipients);
    println!("  {} {}", style("Content Hash:").bold(), request.content_hash);
    println!("  {}", style("Message Preview:").bold());
    for line in request.message.lines().take(3) {
        let preview: String = line.chars().take(60).collect();
        let ellipsis = if line.chars().count() > 60 { "..." } else { "" };
        println!("    {}", style(format!("{preview}{ellipsis}")).cyan());
    }
    println!();

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed with sending?")
        .default(true)
        .interact()
}

/// Surfaces the OAuth consent URL.
pub fn show_auth_url(url: &str) {
    println!();
    info("Open this URL in your browser, sign in, and grant permission to send emails:");
    println!();
    println!("  {url}");
    println!();
    info("Waiting for authorization...");
}

/// Prints the final per-recipient results and the claim instructions.
pub fn print_report(report: &RunReport) {
    section("Results");

    let successes: Vec<_> = report.successes().collect();
    let failures: Vec<_> = report.failures().collect();

    if !successes.is_empty() {
        success(&format!("{} email(s) sent successfully!", successes.len()));
        println!();
        println!(
            "Generated files in: {}",
            style(report.output_dir.display()).cyan()
        );
        println!();
        for (recipient, pair) in &successes {
            println!("  {} {recipient}", style("✓").green());
            println!("    .eml:   {}", pair.eml_path.display());
            println!("    proof:  {}", pair.proof_path.display());
        }
    }

    if !failures.is_empty() {
        println!();
        failure(&format!("{} email(s) failed:", failures.len()));
        for (recipient, reason) in &failures {
            println!("  {} {recipient}: {reason}", style("✗").red());
        }
    }

    section("Next Steps");
    println!("To claim your reward on Farewell:");
    println!();
    println!("  1. Go to the Farewell claim page");
    println!("  2. For each recipient, upload the corresponding .eml file");
    println!("  3. Click \"Prove Delivery\" for each recipient");
    println!("  4. Once all recipients are proven, click \"Claim Reward\"");
    println!();
    println!(
        "{} The proof files (.json) can also be used to manually",
        style("Note:").yellow()
    );
    println!("submit proofs if the UI upload doesn't work.");
    println!();
    println!("{}", style("Thank you for using Farewell!").green());
}
