//! Integration tests for the wam-client crate.
//!
//! These tests run the client against a mock speaker on localhost and verify:
//! - Request/reply correlation over separate command and listen connections
//! - Single-flight ordering and timeouts
//! - Delivery of unsolicited messages to listeners
//! - Connection loss handling


use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use test_helpers::{init_tracing, method_of, reply, MockSpeaker, Responder};
use tokio::sync::mpsc;
use wam_api::{commands, Command, Envelope};
use wam_client::{ClientConfig, ClientError, ConnectionState, WamClient};

fn config(speaker: &MockSpeaker) -> ClientConfig {
    ClientConfig::new()
        .with_port(speaker.port())
        .with_user("test-user")
        .with_request_timeout(Duration::from_secs(2))
}

async fn connected_client(speaker: &MockSpeaker) -> WamClient {
    init_tracing();
    let client = WamClient::new("127.0.0.1", config(speaker));
    client.connect().await.expect("connect");
    client.start_listening().await.expect("start listening");
    client
}

/// Replies to SetVolume/GetVolume with VolumeLevel, ignores everything else
fn volume_responder() -> Responder {
    Arc::new(|markup: &str| match method_of(markup) {
        "SetVolume" => {
            let volume = markup
                .split_once(r#"val=""#)
                .and_then(|(_, rest)| rest.split_once('"'))
                .map(|(value, _)| value.to_string())
                .unwrap_or_default();
            vec![reply("VolumeLevel", "public", "ok", &format!("<volume>{volume}</volume>"))]
        }
        "GetVolume" => vec![reply("VolumeLevel", "public", "ok", "<volume>9</volume>")],
        _ => vec![],
    })
}

#[tokio::test]
async fn test_set_volume_end_to_end() {
    let speaker = MockSpeaker::start(volume_responder()).await;
    let client = connected_client(&speaker).await;

    let envelope = client.request(&commands::set_volume(15)).await.unwrap();

    assert_eq!(envelope.method, "VolumeLevel");
    assert!(envelope.success);
    assert_eq!(envelope.get_str("volume"), Some("15"));

    let requests = speaker.requests().await;
    assert_eq!(requests.len(), 1);
    let markup = test_helpers::decode_cmd(&requests[0]);
    assert!(markup.contains("<name>SetVolume</name>"));
    assert!(markup.contains(r#"val="15""#));
    assert!(requests[0].contains("mobileUUID: test-user\r\n"));

    client.disconnect().await;
}

#[tokio::test]
async fn test_requests_are_single_flight() {
    let speaker = MockSpeaker::start(volume_responder()).await;
    let client = Arc::new(connected_client(&speaker).await);

    let started = Instant::now();
    let first = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            // GetMute gets no reply from this speaker
            client
                .request_with_timeout(&commands::get_mute(), Duration::from_millis(300))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.request(&commands::get_volume()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(speaker.requests().await.len(), 1, "second write must wait");

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(first.unwrap_err().is_timeout());
    assert_eq!(second.unwrap().get_str("volume"), Some("9"));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(speaker.requests().await.len(), 2);
}

#[tokio::test]
async fn test_timeout_keeps_connection_usable() {
    let speaker = MockSpeaker::start(volume_responder()).await;
    let client = connected_client(&speaker).await;

    let error = client
        .request_with_timeout(&commands::get_mute(), Duration::from_millis(100))
        .await
        .unwrap_err();
    match &error {
        ClientError::Timeout { method, waited } => {
            assert_eq!(method, "MuteStatus");
            assert_eq!(*waited, Duration::from_millis(100));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(client.is_listening());

    let envelope = client.request(&commands::get_volume()).await.unwrap();
    assert_eq!(envelope.get_str("volume"), Some("9"));
}

#[tokio::test]
async fn test_timeout_scales_with_command_multiple() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = connected_client(&speaker).await;
    let command = Command::uic("GetSlow").expecting("Slow").with_timeout_multiple(3);

    let error = client
        .request_with_timeout(&command, Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ClientError::Timeout { waited, .. } if waited == Duration::from_millis(150)
    ));
}

#[tokio::test]
async fn test_requester_scoped_reply_must_match_user() {
    let responder: Responder = Arc::new(|markup: &str| {
        if method_of(markup) == "GetRadioList" {
            vec![
                reply("RadioList", "someone-else", "ok", "<listcount>1</listcount>"),
                reply("RadioList", "test-user", "ok", "<listcount>2</listcount>"),
            ]
        } else {
            vec![]
        }
    });
    let speaker = MockSpeaker::start(responder).await;
    let client = connected_client(&speaker).await;
    let command = Command::cpm("GetRadioList")
        .expecting("RadioList")
        .with_requester_scope();

    let envelope = client.request(&command).await.unwrap();

    assert_eq!(envelope.sender_id, "test-user");
    assert_eq!(envelope.get_str("listcount"), Some("2"));
}

#[tokio::test]
async fn test_command_without_reply_returns_immediately() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = connected_client(&speaker).await;

    let envelope = client.request(&commands::set_trick_mode("next")).await.unwrap();

    assert!(envelope.success);
    assert!(envelope.method.is_empty());
    assert_eq!(speaker.requests().await.len(), 1);
}

#[tokio::test]
async fn test_listeners_receive_unsolicited_messages() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = connected_client(&speaker).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.add_listener(Arc::new(move |envelope: &Envelope| {
        let _ = tx.send(envelope.method.clone());
    }));

    speaker.push(&reply("MuteStatus", "public", "ok", "<mute>on</mute>"));

    // A message split across two writes is reassembled
    let framed = test_helpers::http_frame(&reply("SpkName", "public", "ok", "<spkname>Kitchen</spkname>"));
    speaker.push_raw(&framed[..20]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    speaker.push_raw(&framed[20..]);

    let first = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("MuteStatus"));
    assert_eq!(second.as_deref(), Some("SpkName"));
}

#[tokio::test]
async fn test_panicking_listener_does_not_lose_reply() {
    let speaker = MockSpeaker::start(volume_responder()).await;
    let client = connected_client(&speaker).await;
    client.add_listener(Arc::new(|_: &Envelope| panic!("listener failure")));
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.add_listener(Arc::new(move |envelope: &Envelope| {
        let _ = tx.send(envelope.method.clone());
    }));

    let envelope = client
        .request_with_timeout(&commands::get_volume(), Duration::from_millis(500))
        .await
        .unwrap();

    assert_eq!(envelope.get_str("volume"), Some("9"));
    assert_eq!(rx.try_recv().ok().as_deref(), Some("VolumeLevel"));
    assert!(client.is_listening());
}

#[tokio::test]
async fn test_malformed_body_does_not_stop_read_loop() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = connected_client(&speaker).await;
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    client.add_listener(Arc::new(move |envelope: &Envelope| {
        sink.lock().push(envelope.clone());
    }));

    speaker.push("<UIC><method>Broken</UIC>");
    speaker.push(&reply("VolumeLevel", "public", "ok", "<volume>3</volume>"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let received = received.lock();
    assert_eq!(received.len(), 2);
    assert!(received[0].is_error());
    assert_eq!(received[1].get_str("volume"), Some("3"));
    assert!(client.is_listening());
}

#[tokio::test]
async fn test_speaker_hang_up_is_observable() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = connected_client(&speaker).await;

    speaker.close();
    tokio::time::timeout(Duration::from_secs(1), client.closed())
        .await
        .expect("closed() resolves after hang-up");

    assert_eq!(client.state(), ConnectionState::Idle);
    assert!(matches!(
        client.request(&commands::get_volume()).await,
        Err(ClientError::NotConnected)
    ));
}

#[tokio::test]
async fn test_pending_request_fails_when_connection_drops() {
    let speaker = MockSpeaker::start(Arc::new(|_: &str| vec![])).await;
    let client = Arc::new(connected_client(&speaker).await);

    let pending = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.request(&commands::get_volume()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    speaker.close();

    let result = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ClientError::Connection(_))));
}

#[tokio::test]
async fn test_failed_connect_is_retryable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = WamClient::new("127.0.0.1", ClientConfig::new().with_port(port));

    assert!(client.connect().await.unwrap_err().is_transport());
    assert_eq!(client.state(), ConnectionState::Idle);
    assert!(matches!(
        client.connect().await,
        Err(ClientError::Connection(_))
    ));
}
