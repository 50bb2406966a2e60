mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use s400w::{Command, KNOWN_COMMANDS, ProbeHit, Response, Signature};
use s400w_transport::Step;

use common::scanner;

/// Last `i2` block of the probe space, `i3 = 15`
const START: u32 = 0xF0F0_F000;

#[tokio::test(start_paused = true)]
async fn test_raw_command() {
    let (mut scanner, mock) = scanner([Step::data("scanready")]);

    let response = scanner.raw(0x5000_6000).await;

    assert_eq!(response, Response::from(Signature::ScanReady));
    assert_eq!(mock.sent(), vec![vec![0x00, 0x60, 0x00, 0x50]]);
    assert_eq!(mock.sent_commands(), vec![Command::GetStatus]);
}

#[tokio::test(start_paused = true)]
async fn test_raw_unknown_command() {
    let (mut scanner, mock) = scanner([Step::data(b"\xDE\xAD")]);

    let response = scanner.raw(0x1234_5678).await;

    assert_eq!(response.data(), Some(&[0xDE, 0xAD][..]));
    assert_eq!(mock.sent_commands(), vec![Command::Raw(0x1234_5678)]);
}

#[tokio::test(start_paused = true)]
async fn test_probe_reconnects_after_reply() {
    let mut steps = vec![Step::data("hello")];
    steps.extend(std::iter::repeat_n(Step::Silence, 15));
    let (mut scanner, mock) = scanner(steps);

    let hits = scanner.probe(START, &KNOWN_COMMANDS).await;

    assert_eq!(
        hits,
        vec![ProbeHit {
            command: START,
            response: Response::from_bytes(b"hello"),
        }]
    );
    assert_eq!(mock.sent().len(), 16);
    // Initial connect, after the reply, after the block
    assert_eq!(mock.connects(), 3);
    assert_eq!(mock.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_skips_known_commands() {
    let known = [START + 0x10, START + 0x20];
    let steps = std::iter::repeat_n(Step::Silence, 14);
    let (mut scanner, mock) = scanner(steps);
    let started = tokio::time::Instant::now();

    let hits = scanner.probe(START, &known).await;

    assert!(hits.is_empty());
    let sent = mock.sent_commands();
    assert_eq!(sent.len(), 14);
    assert!(!sent.contains(&Command::Raw(START + 0x10)));
    assert_eq!(sent[0], Command::Raw(START));
    assert_eq!(sent[1], Command::Raw(START + 0x30));
    // One second per unanswered command
    assert_eq!(started.elapsed(), Duration::from_secs(14));
}

#[tokio::test(start_paused = true)]
async fn test_probe_retries_failed_send() {
    let mut steps = vec![Step::data("devbusy")];
    steps.extend(std::iter::repeat_n(Step::Silence, 15));
    let (mut scanner, mock) = scanner(steps);
    mock.fail_sends(1);

    let hits = scanner.probe(START, &[]).await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].response, Response::from(Signature::DeviceBusy));
    assert_eq!(mock.sent().len(), 16);
    // Initial, retry, after reply, after block
    assert_eq!(mock.connects(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_probe_gives_up_on_second_failure() {
    let (mut scanner, mock) = scanner([]);
    mock.fail_sends(2);

    let hits = scanner.probe(START, &[]).await;

    assert!(hits.is_empty());
    assert!(mock.sent().is_empty());
    assert_eq!(mock.connects(), 2);
}
