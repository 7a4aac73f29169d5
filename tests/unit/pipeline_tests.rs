/*!
 * End-to-end tests for the dispatch pipeline
 *
 * These drive the dispatcher with stub backends: the echo backend returns
 * its input unchanged, which makes partition and accumulation properties
 * easy to assert.
 */

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use noveltrans::translation::dispatcher::{dispatch, translate, TaskDesc, TaskKind, TaskParams};
use noveltrans::translation::glossary::Glossary;
use noveltrans::translation::local_backend::OfflineEngine;
use noveltrans::translation::TranslatorConfig;
use noveltrans::errors::TranslationError;

use crate::common::mock_apis::EchoTranslator;
use crate::common::{lines, CollectingCallback};

fn task(kind: TaskKind) -> TaskDesc {
    TaskDesc { kind, label: "test-task".to_string() }
}

#[tokio::test]
async fn test_dispatch_withEchoBackend_shouldReturnDocumentUnchanged() {
    let translator = EchoTranslator::new(100);
    let callback = CollectingCallback::new();
    let params = TaskParams {
        lines: lines(&["こんにちは", "さようなら"]),
        glossary: Glossary::new(),
    };

    let result = dispatch(
        task(TaskKind::Local),
        params,
        callback.clone(),
        &translator,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, Some(lines(&["こんにちは", "さようなら"])));
    // No retry or failure should have been reported
    assert!(!callback.logged().iter().any(|m| m.contains("failed")));
}

#[tokio::test]
async fn test_dispatch_withSmallSegments_shouldPreserveOrderAcrossSegments() {
    // Limit of 4 chars forces one line per segment
    let translator = EchoTranslator::new(4);
    let callback = CollectingCallback::new();
    let input = lines(&["first", "second", "third", "fourth"]);
    let params = TaskParams { lines: input.clone(), glossary: Glossary::new() };

    let result = dispatch(
        task(TaskKind::Local),
        params,
        callback.clone(),
        &translator,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, Some(input));
    assert_eq!(*translator.calls.lock().unwrap(), 4);

    let progress = callback.progress.lock().unwrap().clone();
    assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

#[tokio::test]
async fn test_dispatch_withUploadDenied_shouldSkipWebTaskSilently() {
    let translator = EchoTranslator::with_upload_denied(100);
    let callback = CollectingCallback::new();
    let params = TaskParams { lines: lines(&["行こう"]), glossary: Glossary::new() };

    let result = dispatch(
        task(TaskKind::Web),
        params,
        callback.clone(),
        &translator,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, None);
    // The gate skips before any backend call
    assert_eq!(*translator.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_dispatch_withUploadDenied_shouldStillRunLibraryGate() {
    let translator = EchoTranslator::with_upload_denied(100);
    let callback = CollectingCallback::new();
    let params = TaskParams { lines: lines(&["行こう"]), glossary: Glossary::new() };

    let result = dispatch(
        task(TaskKind::Library),
        params,
        callback,
        &translator,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_dispatch_withUploadDenied_shouldStillTranslateLocalTask() {
    let translator = EchoTranslator::with_upload_denied(100);
    let callback = CollectingCallback::new();
    let params = TaskParams { lines: lines(&["行こう"]), glossary: Glossary::new() };

    let result = dispatch(
        task(TaskKind::Local),
        params,
        callback,
        &translator,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, Some(lines(&["行こう"])));
}

#[tokio::test]
async fn test_dispatch_withCancelledToken_shouldAcceptNothing() {
    let translator = EchoTranslator::new(100);
    let callback = CollectingCallback::new();
    let params = TaskParams { lines: lines(&["a", "b"]), glossary: Glossary::new() };

    let token = CancellationToken::new();
    token.cancel();

    let result = dispatch(task(TaskKind::Local), params, callback, &translator, token).await;

    assert_eq!(result, Some(Vec::new()));
    assert_eq!(*translator.calls.lock().unwrap(), 0);
}

/// Engine used to exercise the full `translate` entry with a local backend
struct EchoEngine;

#[async_trait::async_trait]
impl OfflineEngine for EchoEngine {
    async fn translate_lines(&self, lines: &[String]) -> Result<Vec<String>, TranslationError> {
        Ok(lines.to_vec())
    }
}

#[tokio::test]
async fn test_translate_withLocalEngine_shouldRunWholePipeline() {
    let callback = CollectingCallback::new();
    let params = TaskParams {
        lines: lines(&["雨が降る", "風が吹く"]),
        glossary: Glossary::new(),
    };

    let result = translate(
        task(TaskKind::Local),
        params,
        callback.clone(),
        TranslatorConfig::Local { engine: Arc::new(EchoEngine) },
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result, Some(lines(&["雨が降る", "風が吹く"])));
    assert!(callback.logged().iter().any(|m| m.contains("local file")));
}

#[tokio::test]
async fn test_translate_withGlossary_shouldPreSubstituteForLocalBackend() {
    let callback = CollectingCallback::new();
    let mut glossary = Glossary::new();
    glossary.insert("勇者", "Hero");
    let params = TaskParams { lines: lines(&["勇者は眠る"]), glossary };

    let result = translate(
        task(TaskKind::Local),
        params,
        callback,
        TranslatorConfig::Local { engine: Arc::new(EchoEngine) },
        CancellationToken::new(),
    )
    .await;

    // The echo engine sees (and returns) the substituted text
    assert_eq!(result, Some(lines(&["Heroは眠る"])));
}
