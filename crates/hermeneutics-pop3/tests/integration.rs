//! Integration tests for the POP3 client.
//!
//! These tests drive whole sessions against scripted mock streams
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use hermeneutics_net::Transport;
use hermeneutics_pop3::{Authorization, Client, Error, ListEntry, Stat, UidEntry};
use tokio_test::io::{Builder, Mock};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn client(mock: Mock) -> Client<Authorization, Mock> {
    init_tracing();
    Client::new(Transport::new(mock)).await.unwrap()
}

#[tokio::test]
async fn test_apop_preferred() {
    let mock = Builder::new()
        .read(b"+OK POP3 ready <1896.697170952@dbc.mtview.ca.us>\r\n")
        .write(b"APOP mrose c4c9334bac560ecc979e58001b3e22fb\r\n")
        .read(b"+OK maildrop has 1 message (369 octets)\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK dewey POP3 server signing off\r\n")
        .build();

    let client = client(mock).await;
    assert_eq!(client.timestamp(), Some("<1896.697170952@dbc.mtview.ca.us>"));
    let client = client.authenticate("mrose", "tanstaaf").await.unwrap();
    assert_eq!(client.last_response(), Some("maildrop has 1 message (369 octets)"));
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_user_pass_without_timestamp() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK mrose is a real hoopy frood\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK mrose's maildrop has 2 messages (320 octets)\r\n")
        .build();

    let client = client(mock).await;
    assert_eq!(client.timestamp(), None);
    client.authenticate("mrose", "secret").await.unwrap();
}

#[tokio::test]
async fn test_auth_fail() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS wrong\r\n")
        .read(b"-ERR invalid password\r\n")
        .build();

    let err = client(mock).await.authenticate("mrose", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(matches!(err, Error::AuthFail(msg) if msg == "invalid password"));
}

#[tokio::test]
async fn test_apop_without_timestamp() {
    let mock = Builder::new().read(b"+OK POP3 server ready\r\n").build();
    let err = client(mock).await.apop("mrose", "tanstaaf").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_greeting_refused() {
    let mock = Builder::new().read(b"-ERR maildrop locked\r\n").build();
    let err = Client::<Authorization, _>::new(Transport::new(mock)).await.unwrap_err();
    assert!(matches!(err, Error::Server(msg) if msg == "maildrop locked"));
}

#[tokio::test]
async fn test_transaction() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK\r\n")
        .write(b"STAT\r\n")
        .read(b"+OK 2 320\r\n")
        .write(b"LIST\r\n")
        .read(b"+OK 2 messages (320 octets)\r\n1 120\r\n2 200\r\n.\r\n")
        .write(b"LIST 2\r\n")
        .read(b"+OK 2 200\r\n")
        .write(b"UIDL\r\n")
        .read(b"+OK\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n2 QhdPYR:00WBw1Ph7x7\r\n.\r\n")
        .write(b"UIDL 1\r\n")
        .read(b"+OK 1 whqtswO00WBw418f9t5JxYwZ\r\n")
        .write(b"RETR 1\r\n")
        .read(b"+OK 120 octets\r\nSubject: dots\r\n\r\n..leading dot\r\n")
        .read(b"body\r\n.\r\n")
        .write(b"TOP 2 0\r\n")
        .read(b"+OK\r\nSubject: second\r\n\r\n.\r\n")
        .write(b"DELE 1\r\n")
        .read(b"+OK message 1 deleted\r\n")
        .write(b"RSET\r\n")
        .read(b"+OK maildrop has 2 messages\r\n")
        .write(b"NOOP\r\n")
        .read(b"+OK\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK bye\r\n")
        .build();

    let mut client = client(mock).await.authenticate("mrose", "secret").await.unwrap();
    assert_eq!(client.stat().await.unwrap(), Stat { count: 2, size: 320 });
    assert_eq!(
        client.list(None).await.unwrap(),
        [
            ListEntry { number: 1, size: 120 },
            ListEntry { number: 2, size: 200 }
        ]
    );
    assert_eq!(
        client.list(Some(2)).await.unwrap(),
        [ListEntry { number: 2, size: 200 }]
    );
    let uids = client.uidl(None).await.unwrap();
    assert_eq!(uids.len(), 2);
    assert_eq!(uids[1].uid, "QhdPYR:00WBw1Ph7x7");
    assert_eq!(
        client.uidl(Some(1)).await.unwrap(),
        [UidEntry {
            number: 1,
            uid: "whqtswO00WBw418f9t5JxYwZ".into()
        }]
    );
    assert_eq!(
        client.retr(1).await.unwrap(),
        b"Subject: dots\n\n.leading dot\nbody\n"
    );
    assert_eq!(client.top(2, 0).await.unwrap(), b"Subject: second\n\n");
    client.dele(1).await.unwrap();
    client.rset().await.unwrap();
    client.noop().await.unwrap();
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_capa() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"CAPA\r\n")
        .read(b"+OK Capability list follows\r\nTOP\r\nUSER\r\nSASL CRAM-MD5 PLAIN\r\nUIDL\r\n.\r\n")
        .build();

    let mut client = client(mock).await;
    let caps = client.capa().await.unwrap();
    assert!(caps.has("UIDL"));
    assert_eq!(caps.args("SASL"), ["CRAM-MD5", "PLAIN"]);
}

#[tokio::test]
async fn test_wrong_item_number() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK\r\n")
        .write(b"LIST 3\r\n")
        .read(b"+OK 4 200\r\n")
        .build();

    let mut client = client(mock).await.authenticate("mrose", "secret").await.unwrap();
    let err = client.list(Some(3)).await.unwrap_err();
    assert!(matches!(err, Error::Check { expected: 3, actual: 4 }));
}

#[tokio::test]
async fn test_no_such_message() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK\r\n")
        .write(b"RETR 9\r\n")
        .read(b"-ERR no such message\r\n")
        .write(b"NOOP\r\n")
        .read(b"+OK\r\n")
        .build();

    let mut client = client(mock).await.authenticate("mrose", "secret").await.unwrap();
    let err = client.retr(9).await.unwrap_err();
    assert!(matches!(err, Error::Server(ref msg) if msg == "no such message"));
    assert!(!err.is_fatal());
    client.noop().await.unwrap();
}

#[tokio::test]
async fn test_unused_data() {
    let mock = Builder::new()
        .read(b"+OK POP3 server ready\r\n")
        .write(b"USER mrose\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS secret\r\n")
        .read(b"+OK\r\n")
        .write(b"STAT\r\n")
        .read(b"+OK 2 320\r\n1 120\r\n")
        .build();

    let mut client = client(mock).await.authenticate("mrose", "secret").await.unwrap();
    let err = client.stat().await.unwrap_err();
    assert!(matches!(err, Error::Unused(line) if line == "1 120"));
}

#[tokio::test]
async fn test_malformed_status() {
    let mock = Builder::new().read(b"* OK IMAP4rev1 ready\r\n").build();
    let err = Client::<Authorization, _>::new(Transport::new(mock)).await.unwrap_err();
    assert!(matches!(err, Error::Unspec(_)));
}
