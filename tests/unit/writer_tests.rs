/*!
 * Tests for ordered reassembly and crash consistency against real files
 */

use std::fs;

use anyhow::Result;

use yanta::events::EventSink;
use yanta::progress_store::ProgressStore;
use yanta::translation::retry::{ChunkResult, ResultDisposition};
use yanta::writer::ReassemblyWriter;

use crate::common;

fn translated(index: usize, text: &str) -> ChunkResult {
    ChunkResult {
        index,
        text: text.to_string(),
        line_count: 1,
        disposition: ResultDisposition::Translated,
    }
}

/// Count chunks present in the sink by content (one line per chunk here)
fn chunks_in_file(path: &std::path::Path) -> usize {
    fs::read_to_string(path)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

#[test]
fn test_writer_withReverseCompletionOrder_shouldWriteAscending() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let store = ProgressStore::for_input(&input);

    let sink = fs::File::create(&output)?;
    let mut writer = ReassemblyWriter::new(sink, store, EventSink::noop(), 0, 4);

    for index in (0..4).rev() {
        writer.accept(translated(index, &format!("chunk {}", index)))?;
    }
    let completed = writer.finish()?;

    assert_eq!(completed, 4);
    assert_eq!(
        fs::read_to_string(&output)?,
        "chunk 0\nchunk 1\nchunk 2\nchunk 3\n"
    );
    Ok(())
}

#[test]
fn test_writer_atEveryFlushBoundary_progressNeverExceedsSinkContent() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let store = ProgressStore::for_input(&input);

    let sink = fs::File::create(&output)?;
    let mut writer = ReassemblyWriter::new(sink, store.clone(), EventSink::noop(), 0, 6);

    // Arrival order with gaps: each accept is a potential crash point, and at
    // every one the persisted count must be covered by the sink's content
    for index in [3, 0, 5, 1, 2, 4] {
        writer.accept(translated(index, &format!("chunk {}", index)))?;
        assert!(
            store.load() <= chunks_in_file(&output),
            "persisted progress ran ahead of the sink after chunk {}",
            index
        );
    }

    writer.finish()?;
    assert_eq!(chunks_in_file(&output), 6);
    assert!(!store.exists());
    Ok(())
}

#[test]
fn test_writer_resumedRun_shouldAppendAfterExistingContent() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let store = ProgressStore::for_input(&input);

    // A previous run flushed chunks 0 and 1
    fs::write(&output, "chunk 0\nchunk 1\n")?;
    store.save(2)?;

    let sink = fs::OpenOptions::new().append(true).open(&output)?;
    let mut writer = ReassemblyWriter::new(sink, store.clone(), EventSink::noop(), 2, 4);

    writer.accept(translated(3, "chunk 3"))?;
    writer.accept(translated(2, "chunk 2"))?;
    let completed = writer.finish()?;

    assert_eq!(completed, 4);
    assert_eq!(
        fs::read_to_string(&output)?,
        "chunk 0\nchunk 1\nchunk 2\nchunk 3\n"
    );
    assert!(!store.exists());
    Ok(())
}

#[test]
fn test_writer_interruptedWithGap_shouldPersistOnlyContiguousPrefix() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let store = ProgressStore::for_input(&input);

    let sink = fs::File::create(&output)?;
    let mut writer = ReassemblyWriter::new(sink, store.clone(), EventSink::noop(), 0, 4);

    writer.accept(translated(0, "chunk 0"))?;
    // Chunk 1 never arrives; 2 and 3 are stranded beyond the gap
    writer.accept(translated(2, "chunk 2"))?;
    writer.accept(translated(3, "chunk 3"))?;
    let completed = writer.finish()?;

    assert_eq!(completed, 1);
    assert_eq!(fs::read_to_string(&output)?, "chunk 0\n");
    assert_eq!(store.load(), 1);
    assert!(store.exists(), "interrupted run must stay resumable");
    Ok(())
}
