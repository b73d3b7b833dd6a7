//! Integration tests for the IMAP client.
//!
//! Sessions run against scripted mock streams; the watcher task runs for
//! real on the test runtime.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use hermeneutics_imap::{
    Arg, Client, Error, IdleEvent, Mechanism, NotAuthenticated, SequenceSet, Status, Untagged,
    Value,
};
use hermeneutics_net::Transport;
use tokio_test::io::{Builder, Mock};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn client(mock: Mock) -> Client<NotAuthenticated, Mock> {
    init_tracing();
    Client::new(Transport::new(mock)).await.unwrap()
}

#[tokio::test]
async fn test_greeting_capabilities() {
    let mock = Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN AUTH=CRAM-MD5] Dovecot ready.\r\n")
        .build();
    let client = client(mock).await;
    assert_eq!(client.greeting().text, "Dovecot ready.");
    assert!(client.has_capability("idle"));
    assert_eq!(client.auths(), ["PLAIN", "CRAM-MD5"]);
    assert!(!client.is_preauth());
}

#[tokio::test]
async fn test_greeting_bye() {
    init_tracing();
    let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
    let err = Client::new(Transport::new(mock)).await.unwrap_err();
    assert!(matches!(err, Error::Bye(text) if text == "too many connections"));
}

#[tokio::test]
async fn test_preauth() {
    let mock = Builder::new()
        .read(b"* PREAUTH [CAPABILITY IMAP4rev1] logged in as fred\r\n")
        .build();
    let client = client(mock).await;
    assert!(client.is_preauth());
    client.preauthenticated().unwrap();
}

#[tokio::test]
async fn test_login_failure() {
    let mock = Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"H0001 LOGIN fred wrong\r\n")
        .read(b"H0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
        .build();
    let err = client(mock).await.login("fred", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(matches!(err, Error::Auth(text) if text == "Invalid credentials"));
}

#[tokio::test]
async fn test_login_disabled() {
    let mock = Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 STARTTLS LOGINDISABLED] ready\r\n")
        .build();
    let err = client(mock).await.login("fred", "secret").await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_login_quotes_password() {
    let mock = Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"H0001 LOGIN fred \"pa ss\\\"word\"\r\n")
        .read(b"H0001 OK [CAPABILITY IMAP4rev1 IDLE] done\r\n")
        .build();
    let client = client(mock).await.login("fred", "pa ss\"word").await.unwrap();
    assert!(client.has_capability("IDLE"));
}

#[tokio::test]
async fn test_authenticate_plain() {
    let mock = Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN AUTH=LOGIN] ready\r\n")
        .write(b"H0001 AUTHENTICATE PLAIN\r\n")
        .read(b"+ \r\n")
        .write(b"AGZyZWQAc2VjcmV0\r\n")
        .read(b"H0001 OK [CAPABILITY IMAP4rev1 IDLE MOVE] authenticated\r\n")
        .build();
    let client = client(mock).await.authenticate("fred", "secret").await.unwrap();
    assert!(client.has_capability("MOVE"));
    assert!(client.auths().is_empty());
}

#[tokio::test]
async fn test_authenticate_cram_md5() {
    let mock = Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"H0001 AUTHENTICATE CRAM-MD5\r\n")
        .read(b"+ PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+\r\n")
        .write(b"dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw\r\n")
        .read(b"H0001 OK CRAM authentication successful\r\n")
        .build();
    client(mock)
        .await
        .auth(Mechanism::CramMd5, "tim", "tanstaaftanstaaf")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_authenticate_cancelled_on_extra_challenge() {
    let mock = Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"H0001 AUTHENTICATE PLAIN\r\n")
        .read(b"+ \r\n")
        .write(b"AGZyZWQAc2VjcmV0\r\n")
        .read(b"+ \r\n")
        .write(b"*\r\n")
        .read(b"H0001 BAD authentication cancelled\r\n")
        .build();
    let err = client(mock)
        .await
        .auth(Mechanism::Plain, "fred", "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(hermeneutics_net::Error::Sasl(_))));
}

#[tokio::test]
async fn test_select() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 SELECT INBOX\r\n")
        .read(b"* 172 EXISTS\r\n")
        .read(b"* 1 RECENT\r\n")
        .read(b"* OK [UNSEEN 12] Message 12 is first unseen\r\n")
        .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
        .read(b"* OK [UIDNEXT 4392] Predicted next UID\r\n")
        .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
        .read(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n")
        .read(b"H0002 OK [READ-WRITE] SELECT completed\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let (client, status) = client.select("INBOX").await.unwrap();

    assert_eq!(client.mailbox(), "INBOX");
    assert_eq!(status.exists, 172);
    assert_eq!(status.recent, 1);
    assert_eq!(status.unseen, Some(12));
    assert_eq!(status.uid_validity, Some(3_857_529_045));
    assert_eq!(status.uid_next, Some(4392));
    assert_eq!(status.flags.len(), 5);
    assert_eq!(status.permanent_flags, ["\\Deleted", "\\Seen", "\\*"]);
    assert!(!status.read_only);
    assert_eq!(client.mailbox_status(), &status);
}

#[tokio::test]
async fn test_examine_missing_mailbox() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 EXAMINE Nowhere\r\n")
        .read(b"H0002 NO [NONEXISTENT] Mailbox doesn't exist\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let err = client.examine("Nowhere").await.unwrap_err();
    assert!(matches!(err, Error::No(text) if text == "Mailbox doesn't exist"));
}

#[tokio::test]
async fn test_fetch_during_search_is_unsolicited() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 SELECT INBOX\r\n")
        .read(b"* 4 EXISTS\r\n")
        .read(b"H0002 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"H0003 SEARCH UNSEEN\r\n")
        .read(b"* 2 FETCH (FLAGS (\\Seen))\r\n")
        .read(b"* SEARCH 3 4\r\n")
        .read(b"H0003 OK SEARCH completed\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let (mut client, _) = client.select("INBOX").await.unwrap();

    let found = client.search([Arg::atom("UNSEEN")]).await.unwrap();
    assert_eq!(found, [3, 4]);

    let unsolicited = client.take_unsolicited();
    assert_eq!(unsolicited.len(), 1);
    let Untagged::Data(data) = &unsolicited[0] else {
        panic!("expected data, got {:?}", unsolicited[0]);
    };
    assert_eq!(data.number, Some(2));
    assert_eq!(data.name, "FETCH");
    assert!(client.take_unsolicited().is_empty());
}

#[tokio::test]
async fn test_noop_collects_updates() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 NOOP\r\n")
        .read(b"* 22 EXPUNGE\r\n")
        .read(b"* 23 EXISTS\r\n")
        .read(b"H0002 OK NOOP completed\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    client.noop().await.unwrap();
    let names: Vec<_> = client
        .take_unsolicited()
        .iter()
        .map(|u| u.name().to_string())
        .collect();
    assert_eq!(names, ["EXPUNGE", "EXISTS"]);
}

#[tokio::test]
async fn test_fetch_literal() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 SELECT INBOX\r\n")
        .read(b"H0002 OK SELECT completed\r\n")
        .write(b"H0003 FETCH 1:2 (UID BODY[])\r\n")
        .read(b"* 1 FETCH (UID 7 BODY[] {21}\r\n")
        .read(b"Subject: hi\r\n\r\nbody\r\n")
        .read(b")\r\n")
        .read(b"* 2 FETCH (UID 9 BODY[] NIL)\r\n")
        .read(b"H0003 OK FETCH completed\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let (mut client, _) = client.select("INBOX").await.unwrap();

    let fetched = client
        .fetch(&SequenceSet::from(1..=2), &["UID", "BODY[]"])
        .await
        .unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].uid(), Some(7));
    assert_eq!(
        fetched[0].get("body[]").and_then(Value::as_bytes),
        Some(&b"Subject: hi\r\n\r\nbody\r\n"[..])
    );
    assert_eq!(fetched[1].number, 2);
    assert!(fetched[1].get("BODY[]").unwrap().is_nil());
}

#[tokio::test]
async fn test_list_decodes_names() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 LIST \"\" *\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
        .read(b"* LIST (\\HasNoChildren \\Drafts) \"/\" \"Entw&APw-rfe\"\r\n")
        .read(b"* LIST (\\Noselect) NIL \"\"\r\n")
        .read(b"H0002 OK LIST completed\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();

    let entries = client.list("", "*").await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "INBOX");
    assert_eq!(entries[0].delimiter, Some('/'));
    assert_eq!(entries[1].name, "Entwürfe");
    assert!(entries[1].has_attribute("\\drafts"));
    assert_eq!(entries[2].delimiter, None);
}

#[tokio::test]
async fn test_status() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 STATUS Entw&APw-rfe (MESSAGES UNSEEN)\r\n")
        .read(b"* STATUS \"Entw&APw-rfe\" (MESSAGES 231 UNSEEN 3)\r\n")
        .read(b"H0002 OK STATUS completed\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();

    let items = client.status("Entwürfe", &["MESSAGES", "UNSEEN"]).await.unwrap();
    assert_eq!(
        items,
        [("MESSAGES".to_string(), 231), ("UNSEEN".to_string(), 3)]
    );
}

#[tokio::test]
async fn test_generic_command_with_literal() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 APPEND Drafts {21}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write(b"Subject: hi\r\n\r\nbody\r\n\r\n")
        .read(b"H0002 OK [APPENDUID 38505 3955] APPEND completed\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();

    let command = hermeneutics_imap::Command::new("APPEND")
        .arg(Arg::mailbox("Drafts"))
        .arg(Arg::Literal(b"Subject: hi\r\n\r\nbody\r\n".to_vec()));
    client.command(&command).await.unwrap();
}

#[tokio::test]
async fn test_close_returns_to_authenticated() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 EXAMINE INBOX\r\n")
        .read(b"H0002 OK [READ-ONLY] EXAMINE completed\r\n")
        .write(b"H0003 CLOSE\r\n")
        .read(b"H0003 OK CLOSE completed\r\n")
        .write(b"H0004 LOGOUT\r\n")
        .read(b"* BYE IMAP4rev1 Server logging out\r\n")
        .read(b"H0004 OK LOGOUT completed\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let (client, status) = client.examine("INBOX").await.unwrap();
    assert!(status.read_only);
    let client = client.close().await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_logout_without_tagged_reply() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGOUT\r\n")
        .read(b"* BYE see you\r\n");
    client(builder.build()).await.logout().await.unwrap();
}

#[tokio::test]
async fn test_idle() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 SELECT INBOX\r\n")
        .read(b"H0002 OK SELECT completed\r\n")
        .write(b"H0003 IDLE\r\n")
        .read(b"+ idling\r\n")
        .read(b"* 4 EXISTS\r\n")
        .read(b"* 3 FETCH (FLAGS (\\Seen))\r\n")
        .write(b"DONE\r\n")
        .read(b"H0003 OK IDLE terminated\r\n");
    let client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let (mut client, _) = client.select("INBOX").await.unwrap();

    let mut idle = client.idle().await.unwrap();
    let update = idle.next().await.unwrap();
    assert_eq!(update.name(), "EXISTS");
    let IdleEvent::Update(update) = idle.wait(Duration::from_secs(5)).await.unwrap() else {
        panic!("expected an update");
    };
    assert_eq!(update.as_data().unwrap().number, Some(3));
    idle.done().await.unwrap();
    assert!(client.take_unsolicited().is_empty());
}

#[tokio::test]
async fn test_idle_ended_by_bye() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 IDLE\r\n")
        .read(b"+ idling\r\n")
        .read(b"* BYE Autologout; idle for too long\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();

    let mut idle = client.idle().await.unwrap();
    let bye = idle.next().await.unwrap();
    assert!(matches!(&bye, Untagged::Status(s) if s.status == Status::Bye));
    let err = idle.next().await.unwrap_err();
    assert!(matches!(err, Error::Bye(text) if text == "Autologout; idle for too long"));
    assert!(idle.done().await.unwrap_err().is_fatal());
}

#[tokio::test]
async fn test_idle_refused() {
    let mut builder = Builder::new();
    builder
        .read(b"* OK IMAP4rev1 ready\r\n")
        .write(b"H0001 LOGIN fred secret\r\n")
        .read(b"H0001 OK LOGIN completed\r\n")
        .write(b"H0002 IDLE\r\n")
        .read(b"H0002 BAD unknown command\r\n");
    let mut client = client(builder.build()).await.login("fred", "secret").await.unwrap();
    let err = client.idle().await.unwrap_err();
    assert!(matches!(err, Error::Bad(_)));
}
