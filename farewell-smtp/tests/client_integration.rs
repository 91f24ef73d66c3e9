//! Integration tests for the SMTP submission client against a mock server.

mod support;

use farewell_smtp::client::{ClientError, SmtpClient};
use support::mock_server::MockSmtpServer;

#[tokio::test]
async fn test_greeting_and_ehlo() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();

    let greeting = client.read_greeting().await.unwrap();
    assert_eq!(greeting.code, 220);

    let ehlo = client.ehlo("client.example.com").await.unwrap();
    assert!(ehlo.is_success());
    assert!(ehlo.advertises("AUTH"));
    assert!(!ehlo.advertises("STARTTLS"));

    let quit = client.quit().await.unwrap();
    assert_eq!(quit.code, 221);

    assert_eq!(server.commands()[0], "EHLO client.example.com");
}

#[tokio::test]
async fn test_auth_plain_sends_rfc4616_initial_response() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();

    let response = client.auth_plain("user", "secret").await.unwrap();
    assert_eq!(response.code, 235);

    // base64("\0user\0secret")
    assert!(
        server
            .commands()
            .contains(&"AUTH PLAIN AHVzZXIAc2VjcmV0".to_string())
    );
}

#[tokio::test]
async fn test_auth_plain_rejection_is_an_error() {
    let server = MockSmtpServer::builder()
        .with_auth_response(535, "Authentication credentials invalid")
        .build()
        .await
        .unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();

    let result = client.auth_plain("user", "wrong").await;
    assert!(matches!(
        result,
        Err(ClientError::AuthRejected { code: 535, .. })
    ));
}

#[tokio::test]
async fn test_auth_login_exchange() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();

    let response = client.auth_login("user", "secret").await.unwrap();
    assert_eq!(response.code, 235);

    let commands = server.commands();
    // base64("user"), base64("secret")
    assert!(commands.contains(&"dXNlcg==".to_string()));
    assert!(commands.contains(&"c2VjcmV0".to_string()));
}

#[tokio::test]
async fn test_full_transaction_delivers_message_bytes() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();

    assert!(client.mail_from("sender@example.com").await.unwrap().is_success());
    assert!(client.rcpt_to("recipient@example.com").await.unwrap().is_success());
    assert!(client.data().await.unwrap().is_intermediate());

    let content = "Subject: Test\r\n\r\nHello World\r\n";
    let response = client.send_data(content).await.unwrap();
    assert!(response.is_success());

    client.quit().await.unwrap();

    let messages = server.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], content);
}

#[tokio::test]
async fn test_dot_stuffing_round_trips() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();
    client.mail_from("sender@example.com").await.unwrap();
    client.rcpt_to("recipient@example.com").await.unwrap();
    client.data().await.unwrap();

    // A body line starting with a dot must arrive intact, not terminate DATA
    let content = "Subject: Dots\r\n\r\n.hidden line\r\nvisible line\r\n";
    client.send_data(content).await.unwrap();

    let messages = server.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], content);
}

#[tokio::test]
async fn test_rejected_recipient_surfaces_status_code() {
    let server = MockSmtpServer::builder()
        .with_rcpt_response(550, "User unknown")
        .build()
        .await
        .unwrap();

    let mut client = SmtpClient::connect(&server.addr(), "localhost".to_string())
        .await
        .unwrap();
    client.read_greeting().await.unwrap();
    client.ehlo("localhost").await.unwrap();
    client.mail_from("sender@example.com").await.unwrap();

    let response = client.rcpt_to("nobody@example.com").await.unwrap();
    assert_eq!(response.code, 550);
    assert!(response.is_permanent_error());

    // The session remains usable for the next transaction
    assert!(client.rset().await.unwrap().is_success());
    assert!(client.rcpt_to("someone@example.com").await.unwrap().is_success());
}
