//! Per-command SMTP timeouts.

use serde::{Deserialize, Serialize};

/// Timeout (seconds) for each SMTP operation. Defaults to 30 s across the
/// board, the same ceiling the interactive flow has always used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpTimeouts {
    pub connect_secs: u64,
    pub ehlo_secs: u64,
    pub starttls_secs: u64,
    pub auth_secs: u64,
    pub mail_from_secs: u64,
    pub rcpt_to_secs: u64,
    pub data_secs: u64,
    pub quit_secs: u64,
}

impl Default for SmtpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            ehlo_secs: 30,
            starttls_secs: 30,
            auth_secs: 30,
            mail_from_secs: 30,
            rcpt_to_secs: 30,
            data_secs: 30,
            quit_secs: 10,
        }
    }
}
