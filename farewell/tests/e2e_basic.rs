//! End-to-end pipeline tests: mock SMTP server in, proof pairs out.

mod support;

use std::time::Duration;

use farewell::{pipeline, request::MessageRequest};
use farewell_common::address::Address;
use farewell_delivery::{
    Credentials, Security, SmtpSession, SmtpSessionConfig, SmtpTimeouts, Transport,
};
use farewell_proofs::ProofExporter;
use support::mock_server::MockSmtpServer;

fn session_config(server: &MockSmtpServer) -> SmtpSessionConfig {
    SmtpSessionConfig {
        host: "127.0.0.1".to_string(),
        port: server.port(),
        security: Security::None,
        credentials: Some(Credentials {
            username: "sender@example.com".to_string(),
            password: "app-password".to_string(),
        }),
        helo_domain: "localhost".to_string(),
        accept_invalid_certs: false,
    }
}

async fn open_transport(server: &MockSmtpServer) -> Transport {
    let session = SmtpSession::open(session_config(server), SmtpTimeouts::default())
        .await
        .unwrap();
    Transport::Smtp(session)
}

#[tokio::test]
async fn two_recipients_produce_two_matching_pairs() {
    let server = MockSmtpServer::builder().build().await.unwrap();
    let base = tempfile::tempdir().unwrap();

    let request = MessageRequest::from_json(
        r#"{"recipients": ["a@x.com","b@x.com"], "contentHash": "0xdead", "message": "hi"}"#,
    )
    .unwrap();

    let sender = Address::parse("sender@example.com").unwrap();
    let exporter = ProofExporter::create(base.path()).unwrap();
    let mut transport = open_transport(&server).await;

    let report = pipeline::run(
        &mut transport,
        &sender,
        Some("Sender"),
        &request,
        &exporter,
        Duration::ZERO,
    )
    .await;
    transport.close().await;

    assert_eq!(report.successes().count(), 2);
    assert_eq!(report.failures().count(), 0);

    for name in [
        "recipient_1_a_at_x_com.eml",
        "proof_1_a_at_x_com.json",
        "recipient_2_b_at_x_com.eml",
        "proof_2_b_at_x_com.json",
    ] {
        assert!(exporter.dir().join(name).is_file(), "missing {name}");
    }

    for proof in ["proof_1_a_at_x_com.json", "proof_2_b_at_x_com.json"] {
        let json = std::fs::read_to_string(exporter.dir().join(proof)).unwrap();
        assert!(json.contains("\"contentHash\": \"0xdead\""));
    }

    // The exported .eml is byte-identical to what went over the wire
    let wire_messages = server.messages();
    assert_eq!(wire_messages.len(), 2);
    let exported =
        std::fs::read_to_string(exporter.dir().join("recipient_1_a_at_x_com.eml")).unwrap();
    assert_eq!(exported, wire_messages[0]);

    // The hash marker appears exactly once per message
    assert_eq!(exported.matches("Farewell-Hash: 0xdead").count(), 1);
}

#[tokio::test]
async fn failed_recipient_is_skipped_and_batch_continues() {
    let server = MockSmtpServer::builder()
        .with_rcpt_response(550, "User unknown")
        .build()
        .await
        .unwrap();
    let base = tempfile::tempdir().unwrap();

    let request = MessageRequest::from_json(
        r#"{"recipients": ["a@x.com","b@x.com"], "contentHash": "0xdead", "message": "hi"}"#,
    )
    .unwrap();

    let sender = Address::parse("sender@example.com").unwrap();
    let exporter = ProofExporter::create(base.path()).unwrap();
    let mut transport = open_transport(&server).await;

    let report = pipeline::run(
        &mut transport,
        &sender,
        None,
        &request,
        &exporter,
        Duration::ZERO,
    )
    .await;
    transport.close().await;

    assert_eq!(report.successes().count(), 1);
    assert_eq!(report.failures().count(), 1);

    let (failed, reason) = report.failures().next().unwrap();
    assert_eq!(failed.to_string(), "a@x.com");
    assert!(reason.contains("550"));

    // No pair for the failed recipient, a complete pair for the next one
    assert!(!exporter.dir().join("recipient_1_a_at_x_com.eml").exists());
    assert!(!exporter.dir().join("proof_1_a_at_x_com.json").exists());
    assert!(exporter.dir().join("recipient_2_b_at_x_com.eml").is_file());
    assert!(exporter.dir().join("proof_2_b_at_x_com.json").is_file());
}

#[tokio::test]
async fn proof_record_carries_send_metadata() {
    let server = MockSmtpServer::builder().build().await.unwrap();
    let base = tempfile::tempdir().unwrap();

    let request = MessageRequest::from_json(
        r#"{"recipients": ["a@x.com"], "contentHash": "0xBEEF", "message": "hello", "subject": "Custom"}"#,
    )
    .unwrap();

    let sender = Address::parse("sender@example.com").unwrap();
    let exporter = ProofExporter::create(base.path()).unwrap();
    let mut transport = open_transport(&server).await;

    pipeline::run(
        &mut transport,
        &sender,
        Some("Sender"),
        &request,
        &exporter,
        Duration::ZERO,
    )
    .await;
    transport.close().await;

    let json = std::fs::read_to_string(exporter.dir().join("proof_1_a_at_x_com.json")).unwrap();
    let proof: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(proof["recipient"], "a@x.com");
    assert_eq!(proof["sender"], "sender@example.com");
    assert_eq!(proof["contentHash"], "0xbeef");
    assert_eq!(proof["dkimDomain"], "example.com");
    assert!(proof["sentAt"].as_str().unwrap().contains('T'));

    // The messageId in the record matches the sent message's header
    let eml = std::fs::read_to_string(exporter.dir().join("recipient_1_a_at_x_com.eml")).unwrap();
    let message_id = proof["messageId"].as_str().unwrap();
    assert!(eml.contains(&format!("Message-ID: {message_id}")));
    assert!(eml.contains("Subject: Custom"));

    // publicSignals: [recipientHash, dkimPubkeyHash, contentHash]
    let signals = proof["proof"]["publicSignals"].as_array().unwrap();
    assert_eq!(signals.len(), 3);
    assert_eq!(signals[0], proof["recipientHash"]);
    assert_eq!(signals[2], "0xbeef");
}
