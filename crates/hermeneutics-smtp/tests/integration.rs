//! Integration tests for the SMTP and LMTP clients.
//!
//! These tests drive whole sessions against scripted mock streams
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use hermeneutics_net::Transport;
use hermeneutics_smtp::{
    Address, Client, Connected, Dialect, Error, Extension, Mechanism, SmtpConnection,
};
use tokio_test::io::{Builder, Mock};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn smtp(mock: Mock) -> Client<Connected, Mock> {
    init_tracing();
    Client::new(Transport::new(mock), Dialect::Smtp).await.unwrap()
}

async fn lmtp(mock: Mock) -> Client<Connected, Mock> {
    init_tracing();
    Client::new(Transport::new(mock), Dialect::Lmtp).await.unwrap()
}

fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

#[tokio::test]
async fn test_ehlo_advertised() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP ready\r\n")
        .write(b"EHLO client.example.org\r\n")
        .read(b"250-example.com Hi\r\n250-SIZE 1000000\r\n250 AUTH PLAIN LOGIN\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 Bye\r\n")
        .build();

    let client = smtp(mock).await;
    assert_eq!(client.server_info().domain, "mx.example.com");

    let client = client.ehlo("client.example.org").await.unwrap();
    let info = client.server_info();
    assert_eq!(info.domain, "example.com");
    assert_eq!(info.greeting, "Hi");
    assert_eq!(info.max_message_size(), Some(1_000_000));
    assert_eq!(info.auth_mechanisms(), ["PLAIN", "LOGIN"]);
    assert_eq!(
        info.extensions,
        vec![
            Extension::Size(Some(1_000_000)),
            Extension::Auth(vec!["PLAIN".into(), "LOGIN".into()]),
        ]
    );

    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_send_with_data() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<rcpt@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"354 End data with <CR><LF>.<CR><LF>\r\n")
        .write(b"Subject: dots\r\n\r\n..leading\r\nplain\r\n..\r\n.\r\n")
        .read(b"250 2.0.0 queued as 4711\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 Bye\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("rcpt@example.com")).await.unwrap();
    let client = client.data().await.unwrap();
    let client = client
        .send_message(b"Subject: dots\n\n.leading\nplain\n.\n")
        .await
        .unwrap();

    assert_eq!(client.deliveries().len(), 1);
    assert_eq!(client.deliveries()[0].last_line(), "2.0.0 queued as 4711");
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_data_refused() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"HELO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"MAIL FROM:<>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<rcpt@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"554 no valid recipients\r\n")
        .build();

    let client = smtp(mock).await.helo("client").await.unwrap();
    assert!(client.server_info().extensions.is_empty());
    let client = client.mail_from(Address::null()).await.unwrap();
    let client = client.rcpt_to(addr("rcpt@example.com")).await.unwrap();
    let err = client.data().await.unwrap_err();
    assert!(matches!(err, Error::NotReadyForData { code: 554, .. }));
}

#[tokio::test]
async fn test_recipient_refused() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<nobody@example.com>\r\n")
        .read(b"550 5.1.1 no such user\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let (err, _client) = client
        .rcpt_to(addr("nobody@example.com"))
        .await
        .unwrap_err()
        .into_parts();
    assert!(err.is_permanent());
    assert!(matches!(err, Error::NotOk { code: 550, ref message } if message == "5.1.1 no such user"));
}

#[tokio::test]
async fn test_refused_recipient_keeps_transaction() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<good@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<bad@example.com>\r\n")
        .read(b"550 no such user\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go ahead\r\n")
        .write(b"Subject: hi\r\n\r\nbody\r\n.\r\n")
        .read(b"250 queued\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("good@example.com")).await.unwrap();
    let refused = client.rcpt_to(addr("bad@example.com")).await.unwrap_err();
    assert!(matches!(refused.error, Error::NotOk { code: 550, .. }));

    let client = refused.client;
    assert_eq!(client.recipients(), 1);
    let client = client.data().await.unwrap();
    let client = client.send_message(b"Subject: hi\n\nbody\n").await.unwrap();
    assert_eq!(client.deliveries()[0].last_line(), "queued");
}

#[tokio::test]
async fn test_bdat_chunks() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250-mx.example.com\r\n250 CHUNKING\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<rcpt@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"BDAT 9\r\n")
        .write(b"Subject: ")
        .read(b"250 9 octets received\r\n")
        .write(b"BDAT 6 LAST\r\n")
        .write(b"hi\r\n\r\n")
        .read(b"250 message accepted\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    assert!(client.server_info().supports("CHUNKING"));
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("rcpt@example.com")).await.unwrap();
    let client = client
        .bdat([&b"Subject: "[..], &b"hi\r\n\r\n"[..]])
        .await
        .unwrap();
    assert_eq!(client.deliveries()[0].last_line(), "message accepted");
}

#[tokio::test]
async fn test_bdat_without_chunks() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<rcpt@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"BDAT 0 LAST\r\n")
        .read(b"250 empty message accepted\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("rcpt@example.com")).await.unwrap();
    client.bdat(Vec::<Vec<u8>>::new()).await.unwrap();
}

#[tokio::test]
async fn test_lmtp_per_recipient_replies() {
    let mock = Builder::new()
        .read(b"220 lmtp.example.com LMTP ready\r\n")
        .write(b"LHLO client\r\n")
        .read(b"250-lmtp.example.com\r\n250 PIPELINING\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<alice>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<bob>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go ahead\r\n")
        .write(b"Subject: hi\r\n\r\nbody\r\n.\r\n")
        .read(b"250 2.1.5 alice delivered\r\n250 2.1.5 bob delivered\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 Bye\r\n")
        .build();

    let client = lmtp(mock).await.lhlo("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("alice")).await.unwrap();
    let client = client.rcpt_to(addr("bob")).await.unwrap();
    assert_eq!(client.recipients(), 2);
    let client = client.data().await.unwrap();
    let client = client.send_message(b"Subject: hi\n\nbody\n").await.unwrap();

    let lines: Vec<_> = client.deliveries().iter().map(|r| r.last_line()).collect();
    assert_eq!(lines, ["2.1.5 alice delivered", "2.1.5 bob delivered"]);
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_lmtp_one_recipient_fails() {
    let mock = Builder::new()
        .read(b"220 lmtp.example.com LMTP ready\r\n")
        .write(b"LHLO client\r\n")
        .read(b"250 lmtp.example.com\r\n")
        .write(b"MAIL FROM:<sender@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<alice>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<bob>\r\n")
        .read(b"250 OK\r\n")
        .write(b"BDAT 4 LAST\r\n")
        .write(b"body")
        .read(b"452 4.2.2 alice over quota\r\n250 2.1.5 bob delivered\r\n")
        .build();

    let client = lmtp(mock).await.hello("client").await.unwrap();
    let client = client.mail_from(addr("sender@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("alice")).await.unwrap();
    let client = client.rcpt_to(addr("bob")).await.unwrap();
    let err = client.bdat([b"body"]).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, Error::NotOk { code: 452, .. }));
}

#[tokio::test]
async fn test_lmtp_rejects_ehlo() {
    let mock = Builder::new().read(b"220 lmtp.example.com LMTP\r\n").build();
    let err = lmtp(mock).await.ehlo("client").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_reset_forgets_recipients() {
    let mock = Builder::new()
        .read(b"220 lmtp.example.com LMTP\r\n")
        .write(b"LHLO client\r\n")
        .read(b"250 lmtp.example.com\r\n")
        .write(b"MAIL FROM:<a@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<alice>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RSET\r\n")
        .read(b"250 OK\r\n")
        .write(b"MAIL FROM:<a@example.org>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<bob>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go ahead\r\n")
        .write(b"x\r\n.\r\n")
        .read(b"250 bob delivered\r\n")
        .build();

    let client = lmtp(mock).await.lhlo("client").await.unwrap();
    let client = client.mail_from(addr("a@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("alice")).await.unwrap();
    let client = client.reset().await.unwrap();
    let client = client.mail_from(addr("a@example.org")).await.unwrap();
    let client = client.rcpt_to(addr("bob")).await.unwrap();
    let client = client.data().await.unwrap().send_message(b"x").await.unwrap();
    assert_eq!(client.deliveries().len(), 1);
}

#[tokio::test]
async fn test_auth_plain() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250-mx.example.com\r\n250 AUTH PLAIN\r\n")
        .write(b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n")
        .read(b"235 2.7.0 Authentication successful\r\n")
        .write(b"NOOP\r\n")
        .read(b"250 OK\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let client = client.authenticate("user", "pass").await.unwrap();
    client.noop().await.unwrap();
}

#[tokio::test]
async fn test_auth_login() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250-mx.example.com\r\n250 AUTH LOGIN\r\n")
        .write(b"AUTH LOGIN\r\n")
        .read(b"334 VXNlcm5hbWU6\r\n")
        .write(b"dXNlcg==\r\n")
        .read(b"334 UGFzc3dvcmQ6\r\n")
        .write(b"cGFzcw==\r\n")
        .read(b"235 OK\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    client.auth_login("user", "pass").await.unwrap();
}

#[tokio::test]
async fn test_auth_cram_md5() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250-mx.example.com\r\n250 AUTH LOGIN PLAIN CRAM-MD5\r\n")
        .write(b"AUTH CRAM-MD5\r\n")
        .read(b"334 PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+\r\n")
        .write(b"dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw\r\n")
        .read(b"235 OK\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    assert_eq!(
        Mechanism::preferred(client.server_info().auth_mechanisms().iter().map(String::as_str)),
        Some(Mechanism::CramMd5)
    );
    client.authenticate("tim", "tanstaaftanstaaf").await.unwrap();
}

#[tokio::test]
async fn test_auth_rejected() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"AUTH PLAIN AHVzZXIAd3Jvbmc=\r\n")
        .read(b"535 5.7.8 Authentication credentials invalid\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let err = client.auth_plain("user", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_no_usable_mechanism() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250-mx.example.com\r\n250 AUTH GSSAPI\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let err = client.authenticate("user", "pass").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_help_lines() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"HELP\r\n")
        .read(b"214-Commands:\r\n214-EHLO MAIL RCPT DATA\r\n214 End of HELP info\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let (_client, lines) = client.help(None).await.unwrap();
    assert_eq!(lines, ["Commands:", "EHLO MAIL RCPT DATA", "End of HELP info"]);
}

#[tokio::test]
async fn test_unused_reply_data() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .write(b"NOOP\r\n")
        .read(b"250 OK\r\n250 OK again\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    let err = client.noop().await.unwrap_err();
    assert!(matches!(err, Error::Unused(line) if line == "250 OK again"));
}

#[tokio::test]
async fn test_starttls_not_advertised() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO client\r\n")
        .read(b"250 mx.example.com\r\n")
        .build();

    let client = smtp(mock).await.ehlo("client").await.unwrap();
    assert!(!client.server_info().supports_starttls());
    assert_eq!(client.last_reply().unwrap().last_line(), "mx.example.com");
}
