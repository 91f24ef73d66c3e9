//! Provider presets and configuration resolution.
//!
//! The provider table mirrors what the Farewell UI documents: a fixed
//! enumerable set of submission servers plus the Gmail OAuth path and a
//! manual escape hatch. Selection happens once per run; the resolved
//! configuration is immutable afterwards.

use std::path::{Path, PathBuf};

use farewell_common::address::Address;
use farewell_delivery::{Credentials, Security, SmtpSessionConfig};

use crate::error::ConfigError;

/// The selectable email providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Gmail via the REST API with OAuth 2.0. No password required.
    GmailOauth,
    /// Gmail over SMTP with an App Password.
    Gmail,
    Outlook,
    Yahoo,
    Icloud,
    Zoho,
    Protonmail,
    /// User-supplied SMTP server.
    Manual,
}

/// Preset connection parameters for a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    pub host: &'static str,
    pub port: u16,
    pub security: Security,
    /// Operator guidance shown before the credential prompts.
    pub note: &'static str,
    pub help_url: &'static str,
}

impl Provider {
    /// Menu order, OAuth first as the recommended path.
    pub const ALL: [Self; 8] = [
        Self::GmailOauth,
        Self::Gmail,
        Self::Outlook,
        Self::Yahoo,
        Self::Icloud,
        Self::Zoho,
        Self::Protonmail,
        Self::Manual,
    ];

    /// Human-readable menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GmailOauth => "Gmail (OAuth 2.0) - Recommended, no password needed!",
            Self::Gmail => "Gmail (App Password) - smtp.gmail.com",
            Self::Outlook => "Outlook/Hotmail (smtp-mail.outlook.com)",
            Self::Yahoo => "Yahoo (smtp.mail.yahoo.com)",
            Self::Icloud => "iCloud (smtp.mail.me.com)",
            Self::Zoho => "Zoho (smtp.zoho.com)",
            Self::Protonmail => "ProtonMail (requires Bridge)",
            Self::Manual => "Manual Configuration (custom SMTP server)",
        }
    }

    /// The SMTP preset for this provider, or `None` for the OAuth and
    /// manual paths, which carry no fixed server.
    #[must_use]
    pub const fn preset(self) -> Option<ProviderPreset> {
        match self {
            Self::GmailOauth | Self::Manual => None,
            Self::Gmail => Some(ProviderPreset {
                host: "smtp.gmail.com",
                port: 587,
                security: Security::Starttls,
                note: "Requires an App Password (enable 2FA first)",
                help_url: "https://support.google.com/accounts/answer/185833",
            }),
            Self::Outlook => Some(ProviderPreset {
                host: "smtp-mail.outlook.com",
                port: 587,
                security: Security::Starttls,
                note: "Use your regular Outlook/Hotmail credentials",
                help_url: "https://support.microsoft.com/en-us/office/pop-imap-and-smtp-settings-for-outlook-com",
            }),
            Self::Yahoo => Some(ProviderPreset {
                host: "smtp.mail.yahoo.com",
                port: 587,
                security: Security::Starttls,
                note: "Generate an App Password in Yahoo Account settings",
                help_url: "https://help.yahoo.com/kb/generate-third-party-passwords-sln15241.html",
            }),
            Self::Icloud => Some(ProviderPreset {
                host: "smtp.mail.me.com",
                port: 587,
                security: Security::Starttls,
                note: "Generate an app-specific password at appleid.apple.com",
                help_url: "https://support.apple.com/en-us/HT204397",
            }),
            Self::Zoho => Some(ProviderPreset {
                host: "smtp.zoho.com",
                port: 587,
                security: Security::Starttls,
                note: "Use your Zoho Mail credentials",
                help_url: "https://www.zoho.com/mail/help/zoho-smtp.html",
            }),
            Self::Protonmail => Some(ProviderPreset {
                host: "smtp.protonmail.ch",
                port: 587,
                security: Security::Starttls,
                note: "Requires ProtonMail Bridge - not fully supported yet",
                help_url: "https://protonmail.com/bridge/",
            }),
        }
    }
}

/// A user-supplied SMTP server for the manual path.
#[derive(Debug, Clone)]
pub struct CustomServer {
    pub host: String,
    pub port: u16,
    pub security: Security,
}

/// Account settings collected from the user for the SMTP paths.
#[derive(Debug, Clone)]
pub struct SmtpAccount {
    pub email: Address,
    pub password: String,
    pub display_name: Option<String>,
}

/// Resolves a preset or manual provider into a session configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the manual path is missing its server,
/// or when the selected provider has no SMTP preset (`GmailOauth`).
pub fn resolve_smtp(
    provider: Provider,
    account: &SmtpAccount,
    custom: Option<&CustomServer>,
) -> Result<SmtpSessionConfig, ConfigError> {
    let (host, port, security) = match (provider, custom) {
        (Provider::Manual, Some(server)) => {
            if server.host.trim().is_empty() {
                return Err(ConfigError::MissingField("host"));
            }
            if server.port == 0 {
                return Err(ConfigError::InvalidConfiguration {
                    field: "port".to_string(),
                    reason: "must be between 1-65535".to_string(),
                });
            }
            (server.host.clone(), server.port, server.security)
        }
        (Provider::Manual, None) => return Err(ConfigError::MissingField("host")),
        (provider, _) => {
            let preset = provider
                .preset()
                .ok_or(ConfigError::MissingField("smtp preset"))?;
            (preset.host.to_string(), preset.port, preset.security)
        }
    };

    Ok(SmtpSessionConfig {
        host,
        port,
        security,
        credentials: Some(Credentials {
            username: account.email.to_string(),
            password: account.password.clone(),
        }),
        helo_domain: account.email.domain.clone(),
        accept_invalid_certs: false,
    })
}

/// Resolves the Gmail OAuth path to its credential files, failing fast
/// when `credentials.json` is absent.
///
/// # Errors
///
/// Returns [`ConfigError::OauthCredentialsMissing`].
pub fn resolve_gmail(base_dir: &Path) -> Result<(PathBuf, PathBuf), ConfigError> {
    let credentials = base_dir.join(farewell_gmail::CREDENTIALS_FILE);
    let token = base_dir.join(farewell_gmail::TOKEN_FILE);

    if !credentials.exists() {
        return Err(ConfigError::OauthCredentialsMissing(credentials));
    }

    Ok((credentials, token))
}
