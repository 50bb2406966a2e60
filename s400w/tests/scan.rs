mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use s400w::{Command, Pacing, Response, Scanner, Settings, Signature, Wait};
use s400w_transport::{MockTransport, Step};
use tokio::time::Instant;

use common::{Event, PREVIEW_TRAILER, Recorder, filler, jpeg_size, scanner};

#[tokio::test(start_paused = true)]
async fn test_full_scan_with_torn_preview_marker() {
    let preview_data = filler(40_000);
    let mut stream = preview_data.clone();
    stream.extend_from_slice(PREVIEW_TRAILER);
    // Tear the marker 3 bytes before the end of a read
    let tear = stream.len() - 3;

    let jpeg_data = filler(2048);

    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("dpistd"),
        Step::data("scango"),
        Step::data(&stream[..30_000]),
        Step::data(&stream[30_000..tear]),
        Step::data(&stream[tear..]),
        jpeg_size(2048),
        Step::data(&jpeg_data[..1000]),
        Step::data(&jpeg_data[1000..2000]),
        Step::data(&jpeg_data[2000..]),
    ]);

    let mut preview = Recorder::default();
    let mut jpeg = Recorder::default();
    let response = scanner
        .scan(Some(300), Some(&mut preview), Some(&mut jpeg))
        .await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(
        mock.sent_commands(),
        vec![
            Command::GetStatus,
            Command::SetDpiStandard,
            Command::StartScan,
            Command::SendPreviewData,
            Command::GetJpegSize,
            Command::SendJpegData,
        ]
    );

    assert_eq!(preview.data(), preview_data);
    assert_eq!(preview.finishes(), 1);
    assert_eq!(preview.events.last(), Some(&Event::Finish));
    assert!(preview.sizes().is_empty());

    assert_eq!(jpeg.events.first(), Some(&Event::Size(2048)));
    assert_eq!(jpeg.chunks(), vec![1000, 1000, 48]);
    assert_eq!(jpeg.data(), jpeg_data);
    assert_eq!(jpeg.events.last(), Some(&Event::Finish));
    assert_eq!(jpeg.finishes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_high_resolution_scan() {
    let data = filler(512);
    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("dpifine"),
        Step::data("scango"),
        jpeg_size(512),
        Step::data(&data),
    ]);
    let mut jpeg = Recorder::default();

    let response = scanner.scan(Some(600), None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(
        mock.sent_commands(),
        vec![
            Command::GetStatus,
            Command::SetDpiHigh,
            Command::StartScan,
            Command::GetJpegSize,
            Command::SendJpegData,
        ]
    );
    assert_eq!(jpeg.sizes(), vec![512]);
    assert_eq!(jpeg.data(), data);
    assert_eq!(jpeg.finishes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_data_timeout_waits_out_stalls() {
    let mut stream = filler(3000);
    stream.extend_from_slice(PREVIEW_TRAILER);

    let mock = MockTransport::with_script([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(&stream[..1000]),
        Step::Silence,
        Step::Silence,
        Step::data(&stream[1000..]),
    ]);
    let mut settings = Settings::default().with_pacing(Pacing::none());
    settings.timeouts.data = Wait::Forever;
    let mut scanner = Scanner::with_transport(mock.clone(), settings);
    let mut preview = Recorder::default();

    let response = scanner.scan(None, Some(&mut preview), None).await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(preview.data(), filler(3000));
    assert_eq!(mock.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_scan_without_sinks() {
    let (mut scanner, mock) = scanner([Step::data("scanready"), Step::data("scango")]);

    let response = scanner.scan(None, None, None).await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(mock.sent_commands(), vec![Command::GetStatus, Command::StartScan]);
}

#[tokio::test(start_paused = true)]
async fn test_zero_resolution_is_not_set() {
    let (mut scanner, mock) = scanner([Step::data("scanready"), Step::data("scango")]);

    scanner.scan(Some(0), None, None).await;

    assert_eq!(mock.sent_commands(), vec![Command::GetStatus, Command::StartScan]);
}

#[tokio::test(start_paused = true)]
async fn test_no_paper_finishes_both_sinks() {
    let (mut scanner, mock) = scanner([Step::data("nopaper")]);
    let mut preview = Recorder::default();
    let mut jpeg = Recorder::default();

    let response = scanner
        .scan(Some(600), Some(&mut preview), Some(&mut jpeg))
        .await;

    assert_eq!(response, Response::from(Signature::NoPaper));
    assert_eq!(mock.sent_commands(), vec![Command::GetStatus]);
    assert_eq!(preview.events, vec![Event::Finish]);
    assert_eq!(jpeg.events, vec![Event::Finish]);
}

#[tokio::test(start_paused = true)]
async fn test_resolution_echo_mismatch() {
    let (mut scanner, mock) = scanner([Step::data("scanready"), Step::data("dpistd")]);
    let mut jpeg = Recorder::default();

    let response = scanner.scan(Some(600), None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::from(Signature::DpiStandard));
    assert_eq!(mock.sent_commands(), vec![Command::GetStatus, Command::SetDpiHigh]);
    assert_eq!(jpeg.events, vec![Event::Finish]);
}

#[tokio::test(start_paused = true)]
async fn test_scan_not_started() {
    let (mut scanner, _mock) = scanner([Step::data("scanready"), Step::data("devbusy")]);
    let mut preview = Recorder::default();

    let response = scanner.scan(None, Some(&mut preview), None).await;

    assert_eq!(response, Response::from(Signature::DeviceBusy));
    assert_eq!(preview.events, vec![Event::Finish]);
}

#[tokio::test(start_paused = true)]
async fn test_preview_in_band_error() {
    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data("battlow"),
    ]);
    let mut preview = Recorder::default();
    let mut jpeg = Recorder::default();

    let response = scanner
        .scan(None, Some(&mut preview), Some(&mut jpeg))
        .await;

    assert_eq!(response, Response::from(Signature::BatteryLow));
    assert_eq!(preview.events, vec![Event::Finish]);
    assert_eq!(jpeg.events, vec![Event::Finish]);
    assert!(!mock.sent_commands().contains(&Command::GetJpegSize));
}

#[tokio::test(start_paused = true)]
async fn test_preview_timeout_flushes_held_bytes() {
    let data = filler(5000);
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(&data),
        Step::Silence,
    ]);
    let mut preview = Recorder::default();
    let started = Instant::now();

    let response = scanner.scan(None, Some(&mut preview), None).await;

    assert_eq!(response, Response::Timeout);
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(preview.data(), data);
    assert_eq!(preview.events.last(), Some(&Event::Finish));
    assert_eq!(preview.finishes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_preview_connection_closed() {
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(filler(100)),
        Step::Close,
    ]);
    let mut preview = Recorder::default();
    let mut jpeg = Recorder::default();

    let response = scanner
        .scan(None, Some(&mut preview), Some(&mut jpeg))
        .await;

    assert_eq!(response, Response::EndOfStream);
    assert_eq!(preview.data(), filler(100));
    assert_eq!(preview.finishes(), 1);
    assert_eq!(jpeg.events, vec![Event::Finish]);
}

#[tokio::test(start_paused = true)]
async fn test_preview_sink_stop() {
    let mut stream = filler(1000);
    stream.extend_from_slice(PREVIEW_TRAILER);
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(&stream),
    ]);
    let mut preview = Recorder::refusing_at(0);

    let response = scanner.scan(None, Some(&mut preview), None).await;

    assert_eq!(response, Response::EndOfStream);
    assert_eq!(preview.events.len(), 2);
    assert_eq!(preview.events.last(), Some(&Event::Finish));
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_size_timeout_after_preview() {
    let mut stream = filler(64);
    stream.extend_from_slice(PREVIEW_TRAILER);
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(&stream),
        Step::Silence,
    ]);
    let mut preview = Recorder::default();
    let mut jpeg = Recorder::default();
    let started = Instant::now();

    let response = scanner
        .scan(None, Some(&mut preview), Some(&mut jpeg))
        .await;

    assert_eq!(response, Response::Timeout);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    assert_eq!(preview.data(), filler(64));
    assert_eq!(jpeg.events, vec![Event::Finish]);
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_size_timeout_without_preview() {
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::Silence,
    ]);
    let mut jpeg = Recorder::default();
    let started = Instant::now();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::Timeout);
    assert_eq!(started.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_truncated_jpeg_size() {
    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        Step::data(b"jpegsize\x10\x00"),
    ]);
    let mut jpeg = Recorder::default();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::from(Signature::JpegSize));
    assert_eq!(jpeg.events, vec![Event::Finish]);
    assert!(!mock.sent_commands().contains(&Command::SendJpegData));
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_sink_refuses_size() {
    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(16),
    ]);
    let mut jpeg = Recorder::refusing_at(0);

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::EndOfStream);
    assert_eq!(jpeg.events, vec![Event::Size(16), Event::Finish]);
    assert!(!mock.sent_commands().contains(&Command::SendJpegData));
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_sink_stops_mid_transfer() {
    let data = filler(2048);
    let (mut scanner, mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(2048),
        Step::data(&data[..1000]),
        Step::data(&data[1000..]),
    ]);
    let mut jpeg = Recorder::refusing_at(1);

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::EndOfStream);
    assert_eq!(jpeg.chunks(), vec![1000]);
    assert_eq!(jpeg.finishes(), 1);
    assert_eq!(mock.remaining(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_data_timeout() {
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(2048),
        Step::data(filler(1000)),
        Step::Silence,
    ]);
    let mut jpeg = Recorder::default();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::Timeout);
    assert_eq!(jpeg.chunks(), vec![1000]);
    assert_eq!(jpeg.events.last(), Some(&Event::Finish));
}

#[tokio::test(start_paused = true)]
async fn test_jpeg_bytes_past_size_are_dropped() {
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(16),
        Step::data(filler(20)),
    ]);
    let mut jpeg = Recorder::default();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(jpeg.data(), filler(16));
}

#[tokio::test(start_paused = true)]
async fn test_scan_into_vec() {
    let data = filler(300);
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(300),
        Step::data(&data),
    ]);
    let mut jpeg: Vec<u8> = Vec::new();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::SCAN_READY);
    assert_eq!(jpeg, data);
}

#[tokio::test(start_paused = true)]
async fn test_huge_announced_size_into_vec() {
    let (mut scanner, _mock) = scanner([
        Step::data("scanready"),
        Step::data("scango"),
        jpeg_size(u32::MAX),
        Step::data(filler(100)),
        Step::Close,
    ]);
    let mut jpeg: Vec<u8> = Vec::new();

    let response = scanner.scan(None, None, Some(&mut jpeg)).await;

    assert_eq!(response, Response::EndOfStream);
    assert_eq!(jpeg, filler(100));
    assert!(jpeg.capacity() < u32::MAX as usize);
}
