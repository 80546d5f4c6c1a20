// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use resmon_daemon::protocol::COMMAND_MAGIC;
use tokio::net::UnixListener;

/// Accept one connection and answer every command with its verb code.
fn echo_server(socket_path: &Path) {
    let listener = UnixListener::bind(socket_path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut decoder = FrameDecoder::new(COMMAND_MAGIC);
        let mut buf = [0u8; 8192];
        loop {
            let read = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(read) => read,
            };
            decoder.feed(&buf[..read]);
            while let Some(payload) = decoder.next_payload() {
                let verb = u16::from_le_bytes([payload[0], payload[1]]);
                let argument = String::from_utf8_lossy(&payload[2..]).into_owned();
                let reply = format!("verb={verb} arg={argument}");
                stream
                    .write_all(&encode_frame(REPLY_MAGIC, reply.as_bytes()))
                    .await
                    .unwrap();
            }
        }
    });
}

#[tokio::test]
async fn request_roundtrips_verb_and_argument() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("control.sock");
    echo_server(&socket_path);

    let mut client = Client::connect(&socket_path).await.unwrap();
    let reply = client.request(3, "db").await.unwrap();
    assert_eq!(reply, "verb=3 arg=db");

    // The connection stays usable for a follow-up command.
    let reply = client.request(0, "").await.unwrap();
    assert_eq!(reply, "verb=0 arg=");
}

#[tokio::test]
async fn connect_to_a_missing_socket_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = Client::connect(&dir.path().join("absent.sock")).await;
    assert!(matches!(result, Err(ClientError::Connect(_, _))));
}

#[tokio::test]
async fn closed_connection_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("control.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();
    tokio::spawn(async move {
        // Accept and hang up without replying.
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let mut client = Client::connect(&socket_path).await.unwrap();
    let result = client.request(0, "").await;
    assert!(matches!(result, Err(ClientError::ConnectionClosed)));
}
