/*!
 * Full pipeline runs over the mock translator: ordering, resume,
 * cancellation and quota behavior
 */

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use yanta::app_controller::Controller;
use yanta::cancellation::CancellationToken;
use yanta::events::{EventSink, ProgressEvent};
use yanta::progress_store::ProgressStore;
use yanta::providers::mock::{MockBehavior, MockTranslator};
use yanta::translation::{ChunkTranslator, InterruptReason, RunOutcome};

use crate::common;

/// Expected sink content for a fully translated numbered input
fn expected_output(total_lines: usize, chunk_size: usize) -> String {
    let mut expected = String::new();
    let mut start = 0;
    while start < total_lines {
        let count = chunk_size.min(total_lines - start);
        expected.push_str("[TRANSLATED] ");
        expected.push_str(&common::numbered_chunk_text(start, count));
        expected.push('\n');
        start += count;
    }
    expected
}

#[tokio::test]
async fn test_run_withAlwaysSucceedingAdapter_shouldCompleteInOrder() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 250)?;
    let output = dir.path().join("out.txt");

    let mut config = common::test_config();
    config.chunk_size_lines = 100;
    let (events, captured) = EventSink::capturing();
    let controller = Controller::with_config(config)?.with_events(events);

    let mock = Arc::new(MockTranslator::working());
    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input.clone(),
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    // 250 lines at size 100 means chunks of 100, 100 and 50 lines
    assert_eq!(outcome, Some(RunOutcome::Completed { chunks: 3 }));
    assert_eq!(mock.calls(), 3);
    assert_eq!(fs::read_to_string(&output)?, expected_output(250, 100));
    assert!(
        !ProgressStore::for_input(&input).exists(),
        "progress record must be deleted on success"
    );

    let events = captured.lock();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { total_chunks: 3, resumed_from: 0 })));
    assert_eq!(
        events.iter().filter(|e| matches!(e, ProgressEvent::ChunkCompleted { .. })).count(),
        3
    );
    assert!(matches!(events.last(), Some(ProgressEvent::Finished { .. })));
    Ok(())
}

#[tokio::test]
async fn test_run_withReverseCompletionOrder_shouldStillWriteInChunkOrder() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 50)?;
    let output = dir.path().join("out.txt");

    let controller = Controller::with_config(common::test_config())?;

    // Later chunks finish earlier: chunk 4 is instant, chunk 0 the slowest
    let mut mock = MockTranslator::working();
    for i in 0..5usize {
        mock = mock.with_scripted_delay(
            common::numbered_chunk_text(i * 10, 10),
            Duration::from_millis(((4 - i) as u64) * 60),
        );
    }
    let mock = Arc::new(mock);

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input,
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(outcome, Some(RunOutcome::Completed { chunks: 5 }));
    assert_eq!(fs::read_to_string(&output)?, expected_output(50, 10));
    Ok(())
}

#[tokio::test]
async fn test_run_withRandomCompletionOrder_shouldStillWriteInChunkOrder() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 80)?;
    let output = dir.path().join("out.txt");

    let controller = Controller::with_config(common::test_config())?;

    let mut rng = rand::rng();
    let mut mock = MockTranslator::working();
    for i in 0..8usize {
        mock = mock.with_scripted_delay(
            common::numbered_chunk_text(i * 10, 10),
            Duration::from_millis(rng.random_range(0..120)),
        );
    }
    let mock = Arc::new(mock);

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input,
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(outcome, Some(RunOutcome::Completed { chunks: 8 }));
    assert_eq!(fs::read_to_string(&output)?, expected_output(80, 10));
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingProgress_shouldDispatchOnlyPendingChunks() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 30)?;
    let output = dir.path().join("out.txt");

    // A previous run already flushed chunk 0
    let chunk0 = format!("[TRANSLATED] {}\n", common::numbered_chunk_text(0, 10));
    fs::write(&output, &chunk0)?;
    ProgressStore::for_input(&input).save(1)?;

    let controller = Controller::with_config(common::test_config())?;
    let mock = Arc::new(MockTranslator::working());

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input.clone(),
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(outcome, Some(RunOutcome::Completed { chunks: 3 }));

    // Chunk 0's lines were never re-submitted
    let received = mock.received_texts();
    assert_eq!(received.len(), 2);
    assert!(received.contains(&common::numbered_chunk_text(10, 10)));
    assert!(received.contains(&common::numbered_chunk_text(20, 10)));

    assert_eq!(fs::read_to_string(&output)?, expected_output(30, 10));
    assert!(!ProgressStore::for_input(&input).exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withSatisfiedProgress_shouldMakeZeroCallsAndFinish() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 30)?;
    let output = dir.path().join("out.txt");

    fs::write(&output, expected_output(30, 10))?;
    let store = ProgressStore::for_input(&input);
    store.save(3)?;

    let controller = Controller::with_config(common::test_config())?;
    let mock = Arc::new(MockTranslator::working());

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input,
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert!(matches!(outcome, Some(RunOutcome::Completed { .. })));
    assert_eq!(mock.calls(), 0, "a satisfied run must not call the API");
    assert!(!store.exists(), "stale resume state must be removed");
    assert_eq!(fs::read_to_string(&output)?, expected_output(30, 10));
    Ok(())
}

#[tokio::test]
async fn test_run_rerunAfterCompletion_shouldSkipWithoutApiCalls() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 30)?;
    let output = dir.path().join("out.txt");

    let controller = Controller::with_config(common::test_config())?;

    let first = Arc::new(MockTranslator::working());
    controller
        .run_with_translator(
            Arc::clone(&first) as Arc<dyn ChunkTranslator>,
            input.clone(),
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;
    assert_eq!(first.calls(), 3);

    // Second run: output exists, progress is gone, no consent to overwrite
    let second = Arc::new(MockTranslator::working());
    let outcome = controller
        .run_with_translator(
            Arc::clone(&second) as Arc<dyn ChunkTranslator>,
            input,
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(outcome, None, "existing output without progress must be left alone");
    assert_eq!(second.calls(), 0);
    assert_eq!(fs::read_to_string(&output)?, expected_output(30, 10));
    Ok(())
}

#[tokio::test]
async fn test_run_cancelledAfterFirstChunk_shouldPersistExactPrefix() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 30)?;
    let output = dir.path().join("out.txt");

    // Cancel as soon as the first chunk flushes; chunks 1 and 2 are still
    // sleeping inside their simulated API calls
    let token = CancellationToken::new();
    let cancel_token = token.clone();
    let events = EventSink::new(move |event| {
        if matches!(event, ProgressEvent::ChunkCompleted { .. }) {
            cancel_token.cancel();
        }
    });

    let controller = Controller::with_config(common::test_config())?.with_events(events);

    let mock = Arc::new(
        MockTranslator::working()
            .with_scripted_delay(common::numbered_chunk_text(10, 10), Duration::from_millis(800))
            .with_scripted_delay(common::numbered_chunk_text(20, 10), Duration::from_millis(800)),
    );

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input.clone(),
            Some(output.clone()),
            false,
            token,
        )
        .await?;

    assert_eq!(
        outcome,
        Some(RunOutcome::Interrupted {
            completed: 1,
            total: 3,
            reason: InterruptReason::Cancelled,
        })
    );

    // Exactly chunk 0's text, no partial or out-of-order writes
    let chunk0 = format!("[TRANSLATED] {}\n", common::numbered_chunk_text(0, 10));
    assert_eq!(fs::read_to_string(&output)?, chunk0);
    assert_eq!(ProgressStore::for_input(&input).load(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_withQuotaExhaustion_shouldStopRunAndStayResumable() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_numbered_input(dir.path(), "novel.txt", 30)?;
    let output = dir.path().join("out.txt");

    let (events, captured) = EventSink::capturing();
    let controller = Controller::with_config(common::test_config())?.with_events(events);

    // Chunk 0 succeeds immediately; the rest hit the quota wall a beat later
    let mock = Arc::new(
        MockTranslator::working()
            .with_scripted_behavior(common::numbered_chunk_text(10, 10), MockBehavior::QuotaExhausted)
            .with_scripted_behavior(common::numbered_chunk_text(20, 10), MockBehavior::QuotaExhausted)
            .with_scripted_delay(common::numbered_chunk_text(10, 10), Duration::from_millis(250))
            .with_scripted_delay(common::numbered_chunk_text(20, 10), Duration::from_millis(250)),
    );

    let outcome = controller
        .run_with_translator(
            Arc::clone(&mock) as Arc<dyn ChunkTranslator>,
            input.clone(),
            Some(output.clone()),
            false,
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(
        outcome,
        Some(RunOutcome::Interrupted {
            completed: 1,
            total: 3,
            reason: InterruptReason::QuotaExceeded,
        })
    );

    let chunk0 = format!("[TRANSLATED] {}\n", common::numbered_chunk_text(0, 10));
    assert_eq!(fs::read_to_string(&output)?, chunk0);
    assert_eq!(ProgressStore::for_input(&input).load(), 1);
    assert!(
        captured.lock().iter().any(|e| matches!(e, ProgressEvent::QuotaExceeded)),
        "the quota signal must reach the caller"
    );
    Ok(())
}
