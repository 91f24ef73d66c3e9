pub mod error;
pub mod session;
pub mod timeouts;
pub mod transport;

pub use error::{DeliveryError, TransportError};
pub use session::{Credentials, Security, SmtpSession, SmtpSessionConfig};
pub use timeouts::SmtpTimeouts;
pub use transport::{SentMessage, Transport};
