//! Gmail API transport for the Farewell claimer.
//!
//! The OAuth path never sees an SMTP socket: the composed message is
//! submitted through the Gmail REST API with an OAuth 2.0 bearer token.
//! Token material lives in two files next to the binary, matching what
//! the Farewell UI documents:
//!
//! - `credentials.json`: the installed-app client secret the user
//!   downloads from Google Cloud Console
//! - `token.json`: access/refresh token persisted by this tool after the
//!   first browser consent

pub mod api;
pub mod error;
pub mod token;

pub use api::{GmailTransport, SentGmailMessage};
pub use error::{GmailError, Result};
pub use token::{StoredToken, TokenStore, CREDENTIALS_FILE, GMAIL_SCOPES, TOKEN_FILE};
