// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end sessions through AppServices with the real raster and document
// adapters and an in-memory transcoding engine.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wandelwerk_app::{AppServices, EventLog, ObserverEvent, StateKind};
use wandelwerk_audio::{EngineHandle, EngineLoader, TranscodeEngine};
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{
    ConversionTarget, ConverterConfig, FailureKind, FormatFamily, SourceFile, classify,
};

/// Engine that "transcodes" by prefixing the output extension. Each step
/// yields first, so jobs sharing the engine interleave.
#[derive(Default)]
struct EchoEngine {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl EchoEngine {
    fn is_empty(&self) -> bool {
        self.files.lock().expect("files lock poisoned").is_empty()
    }
}

#[async_trait]
impl TranscodeEngine for EchoEngine {
    fn name(&self) -> &str {
        "echo"
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        tokio::task::yield_now().await;
        self.files
            .lock()
            .expect("files lock poisoned")
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn run(&self, input: &str, output: &str) -> Result<()> {
        tokio::task::yield_now().await;
        let mut files = self.files.lock().expect("files lock poisoned");
        let data = files
            .get(input)
            .cloned()
            .ok_or_else(|| WandelwerkError::EngineExecution(format!("{input} missing")))?;
        let ext = output.rsplit('.').next().unwrap_or_default().to_string();
        let mut converted = format!("{ext}:").into_bytes();
        converted.extend_from_slice(&data);
        files.insert(output.to_string(), converted);
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        tokio::task::yield_now().await;
        self.files
            .lock()
            .expect("files lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| WandelwerkError::EngineExecution(format!("{name} missing")))
    }

    async fn remove_file(&self, name: &str) -> Result<()> {
        self.files.lock().expect("files lock poisoned").remove(name);
        Ok(())
    }
}

#[derive(Default)]
struct EchoLoader {
    engine: Arc<EchoEngine>,
    loads: AtomicUsize,
}

#[async_trait]
impl EngineLoader for EchoLoader {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone())
    }
}

struct Harness {
    services: AppServices,
    loader: Arc<EchoLoader>,
    _data_dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let loader = Arc::new(EchoLoader::default());
    let handle = Arc::new(EngineHandle::new(loader.clone()));
    let services = AppServices::with_engine(
        ConverterConfig::default(),
        handle,
        data_dir.path().to_path_buf(),
    );
    Harness {
        services,
        loader,
        _data_dir: data_dir,
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(24, 16, |x, y| image::Rgb([(x * 10) as u8, (y * 15) as u8, 90]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .expect("start entry");
    writer.write_all(xml.as_bytes()).expect("write entry");
    writer.finish().expect("finish package").into_inner()
}

#[tokio::test]
async fn png_to_gif() {
    let h = harness();
    let log = Arc::new(EventLog::new());
    let session = h.services.session(log.clone());

    let source = SourceFile::new("photo.png", png_bytes()).with_declared_type("image/png");
    let targets = session.on_file_selected(source).expect("supported");
    assert_eq!(
        targets,
        vec![ConversionTarget::Jpeg, ConversionTarget::Webp, ConversionTarget::Gif]
    );

    let info = session
        .on_target_selected(ConversionTarget::Gif)
        .await
        .expect("conversion");
    assert_eq!(info.mime_type, "image/gif");
    assert!(info.suggested_name.ends_with(".gif"));

    let bytes = h.services.publisher().open(info.id).expect("live artifact");
    assert_eq!(
        image::guess_format(&bytes).expect("known format"),
        image::ImageFormat::Gif
    );
    let decoded = image::load_from_memory(&bytes).expect("decode gif");
    assert_eq!((decoded.width(), decoded.height()), (24, 16));

    let events = log.events();
    assert_eq!(events.first(), Some(&ObserverEvent::LegalTargets(targets)));
    assert_eq!(events.last(), Some(&ObserverEvent::ArtifactReady(info)));
    assert_eq!(session.state_kind(), StateKind::Ready);
}

#[tokio::test]
async fn docx_with_unknown_declared_type_becomes_one_page_pdf() {
    let h = harness();
    let log = Arc::new(EventLog::new());
    let session = h.services.session(log.clone());

    let source = SourceFile::new(
        "report.docx",
        docx_bytes(&["Quarterly report", "Revenue went up."]),
    )
    .with_declared_type("application/octet-stream");
    let targets = session.on_file_selected(source).expect("supported");
    assert_eq!(targets, vec![ConversionTarget::Pdf]);

    let info = session
        .on_target_selected(ConversionTarget::Pdf)
        .await
        .expect("conversion");
    assert_eq!(info.mime_type, "application/pdf");
    assert_eq!(info.suggested_name, "converted.pdf");

    let bytes = h.services.publisher().open(info.id).expect("live artifact");
    let pdf = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    assert_eq!(pdf.get_pages().len(), 1);
    assert_eq!(h.services.publisher().live_count(), 1);
}

#[tokio::test]
async fn first_audio_conversion_loads_the_engine_before_converting() {
    let h = harness();
    let log = Arc::new(EventLog::new());
    let session = h.services.session(log.clone());

    let source = SourceFile::new("song.mp3", b"ID3fake".to_vec()).with_declared_type("audio/mpeg");
    let targets = session.on_file_selected(source).expect("supported");
    assert_eq!(targets, vec![ConversionTarget::Wav, ConversionTarget::Ogg]);

    let info = session
        .on_target_selected(ConversionTarget::Wav)
        .await
        .expect("conversion");
    assert_eq!(info.mime_type, "audio/wav");
    assert_eq!(
        log.progress_messages(),
        vec![
            "Converting, please wait...",
            "Loading audio converter...",
            "Converting audio..."
        ]
    );

    let bytes = h.services.publisher().open(info.id).expect("live artifact");
    assert_eq!(&bytes[..], b"wav:ID3fake");

    // The engine stays loaded for the rest of the process.
    log.take();
    session
        .on_target_selected(ConversionTarget::Ogg)
        .await
        .expect("second conversion");
    assert_eq!(
        log.progress_messages(),
        vec!["Converting, please wait...", "Converting audio..."]
    );
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_sessions_converting_to_the_same_format_stay_apart() {
    let h = harness();
    let first = h.services.session(Arc::new(EventLog::new()));
    let second = h.services.session(Arc::new(EventLog::new()));

    first
        .on_file_selected(SourceFile::new("song.mp3", b"AAAA".to_vec()).with_declared_type("audio/mpeg"))
        .expect("supported");
    second
        .on_file_selected(SourceFile::new("song.mp3", b"BBBB".to_vec()).with_declared_type("audio/mpeg"))
        .expect("supported");

    let (a, b) = tokio::join!(
        first.on_target_selected(ConversionTarget::Wav),
        second.on_target_selected(ConversionTarget::Wav),
    );
    let (a, b) = (a.expect("first session"), b.expect("second session"));

    let publisher = h.services.publisher();
    assert_eq!(&publisher.open(a.id).expect("first artifact")[..], b"wav:AAAA");
    assert_eq!(&publisher.open(b.id).expect("second artifact")[..], b"wav:BBBB");
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
    assert!(h.loader.engine.is_empty());
}

#[tokio::test]
async fn mp3_output_is_tagged_audio_mp3_and_classifies_back_as_audio() {
    let h = harness();
    let session = h.services.session(Arc::new(EventLog::new()));

    session
        .on_file_selected(SourceFile::new("take.wav", b"RIFF".to_vec()).with_declared_type("audio/wav"))
        .expect("supported");
    let info = session
        .on_target_selected(ConversionTarget::Mp3)
        .await
        .expect("conversion");
    assert_eq!(info.mime_type, "audio/mp3");
    assert_eq!(info.suggested_name, "converted.mp3");

    let bytes = h.services.publisher().open(info.id).expect("live artifact");
    let again = SourceFile::new(info.suggested_name.clone(), bytes.to_vec())
        .with_declared_type(info.mime_type.clone());
    let classification = classify(&again);
    assert_eq!(classification.family, FormatFamily::Audio);
    assert_eq!(
        classification.targets,
        vec![ConversionTarget::Wav, ConversionTarget::Ogg]
    );
}

#[tokio::test]
async fn unregistered_text_file_is_unsupported() {
    let h = harness();
    let log = Arc::new(EventLog::new());
    let session = h.services.session(log.clone());

    let source = SourceFile::new("notes.txt", b"hello".to_vec()).with_declared_type("text/plain");
    let err = session.on_file_selected(source).unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnsupportedFormat);
    assert!(session.legal_targets().is_empty());
    assert_eq!(session.state_kind(), StateKind::Idle);

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ObserverEvent::Failure(FailureKind::UnsupportedFormat, _)
    ));
    assert!(log.progress_messages().is_empty());
    assert_eq!(h.services.publisher().published_total(), 0);
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_artifact_is_released_exactly_once() {
    let h = harness();
    let publisher = h.services.publisher().clone();
    let session = h.services.session(Arc::new(EventLog::new()));

    session
        .on_file_selected(SourceFile::new("a.png", png_bytes()).with_declared_type("image/png"))
        .expect("supported");
    let first = session
        .on_target_selected(ConversionTarget::Gif)
        .await
        .expect("gif");
    let second = session
        .on_target_selected(ConversionTarget::Webp)
        .await
        .expect("webp");
    assert!(!publisher.is_live(first.id));
    assert!(publisher.is_live(second.id));

    session
        .on_file_selected(SourceFile::new("b.png", png_bytes()).with_declared_type("image/png"))
        .expect("supported");
    assert!(!publisher.is_live(second.id));

    let third = session
        .on_target_selected(ConversionTarget::Jpeg)
        .await
        .expect("jpeg");
    session.on_reset().expect("reset");
    assert!(!publisher.is_live(third.id));
    assert_eq!(session.state_kind(), StateKind::Idle);

    assert_eq!(publisher.published_total(), 3);
    assert_eq!(publisher.released_total(), 3);
    assert_eq!(publisher.live_count(), 0);
}

#[tokio::test]
async fn download_saves_then_releases() {
    let h = harness();
    let out = tempfile::tempdir().expect("tempdir");
    let session = h.services.session(Arc::new(EventLog::new()));

    session
        .on_file_selected(SourceFile::new("a.png", png_bytes()).with_declared_type("image/png"))
        .expect("supported");
    let info = session
        .on_target_selected(ConversionTarget::Jpeg)
        .await
        .expect("jpeg");

    let path = session.download(out.path()).expect("download");
    assert_eq!(path, out.path().join("converted.jpeg"));
    let saved = std::fs::read(&path).expect("saved file");
    assert_eq!(saved.len(), info.size);

    assert!(!h.services.publisher().is_live(info.id));
    assert_eq!(session.state_kind(), StateKind::FileLoaded);
    assert_eq!(
        session.download(out.path()).unwrap_err().kind(),
        FailureKind::Unknown
    );
}
