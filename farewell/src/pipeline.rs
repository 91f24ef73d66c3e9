//! The compose -> send -> export loop, one recipient at a time.
//!
//! Recipients are processed strictly sequentially. A transport failure on
//! one recipient is recorded and the batch continues; a proof pair is
//! written only when the send succeeded.

use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use tracing::{error, info};

use farewell_common::address::Address;
use farewell_delivery::{SentMessage, Transport};
use farewell_proofs::{ExportedPair, ProofExporter, ProofRecord};
use farewell_smtp::client::MessageBuilder;

use crate::request::MessageRequest;

/// Pause between consecutive sends.
pub const INTER_SEND_PAUSE: Duration = Duration::from_secs(1);

/// Outcome for a single recipient.
#[derive(Debug)]
pub struct RecipientOutcome {
    pub recipient: Address,
    /// The written pair on success, a human-readable failure otherwise.
    pub result: Result<ExportedPair, String>,
}

/// What happened to the whole batch.
#[derive(Debug)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<RecipientOutcome>,
}

impl RunReport {
    /// Outcomes that produced a proof pair.
    pub fn successes(&self) -> impl Iterator<Item = (&Address, &ExportedPair)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(pair) => Some((&outcome.recipient, pair)),
                Err(_) => None,
            })
    }

    /// Outcomes that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&Address, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(_) => None,
                Err(reason) => Some((&outcome.recipient, reason.as_str())),
            })
    }
}

/// Runs the batch over an open transport session.
pub async fn run(
    transport: &mut Transport,
    sender: &Address,
    display_name: Option<&str>,
    request: &MessageRequest,
    exporter: &ProofExporter,
    pause: Duration,
) -> RunReport {
    let total = request.recipients.len();
    let mut outcomes = Vec::with_capacity(total);

    for (position, recipient) in request.recipients.iter().enumerate() {
        let index = position + 1;
        info!(%recipient, index, total, "Processing recipient");

        let result = process_recipient(
            transport,
            sender,
            display_name,
            request,
            exporter,
            index,
            recipient,
        )
        .await;

        if let Err(reason) = &result {
            error!(%recipient, "Failed: {reason}");
        }

        outcomes.push(RecipientOutcome {
            recipient: recipient.clone(),
            result,
        });

        if index < total && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    RunReport {
        output_dir: exporter.dir().to_path_buf(),
        outcomes,
    }
}

async fn process_recipient(
    transport: &mut Transport,
    sender: &Address,
    display_name: Option<&str>,
    request: &MessageRequest,
    exporter: &ProofExporter,
    index: usize,
    recipient: &Address,
) -> Result<ExportedPair, String> {
    let mut builder = MessageBuilder::new()
        .from(sender.clone())
        .to(recipient.clone())
        .subject(request.subject.clone())
        .body(request.message.clone())
        .content_hash(request.content_hash.clone());
    if let Some(name) = display_name {
        builder = builder.display_name(name);
    }

    let composed = builder.build().map_err(|e| e.to_string())?;

    let sent: SentMessage = transport
        .send(sender, recipient, &composed)
        .await
        .map_err(|e| e.to_string())?;
    info!(%recipient, "Email sent");

    let record = ProofRecord::new(
        recipient,
        request.content_hash.clone(),
        sender,
        composed.message_id.clone(),
        Utc::now(),
    );

    let pair = exporter
        .export(index, recipient, &sent.raw, &record)
        .await
        .map_err(|e| format!("sent, but export failed: {e}"))?;
    info!(%recipient, eml = %pair.eml_path.display(), "Exported proof pair");

    Ok(pair)
}
