/*!
 * Line-based chunking of input text.
 *
 * The chunker partitions the full line sequence of the input into fixed-size
 * chunks, each tagged with its index and the line offset it starts at. Chunks
 * partition the input exactly: concatenating all chunk lines in index order
 * reproduces the original line sequence.
 */

/// Lower bound for the configurable chunk size, in lines
pub const MIN_CHUNK_SIZE_LINES: usize = 10;

/// Upper bound for the configurable chunk size, in lines
pub const MAX_CHUNK_SIZE_LINES: usize = 500;

/// One unit of translation work: a fixed-size slice of the input's lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based, contiguous index assigned at split time
    pub index: usize,

    /// Ordered raw text lines, without line terminators
    pub lines: Vec<String>,

    /// 0-based offset of the first line into the original file
    pub start_line: usize,
}

impl Chunk {
    /// Join the chunk's lines into the single text block sent to the provider
    pub fn joined_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of source lines covered by this chunk
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Clamp a requested chunk size into the supported range
pub fn clamp_chunk_size(requested: usize) -> usize {
    requested.clamp(MIN_CHUNK_SIZE_LINES, MAX_CHUNK_SIZE_LINES)
}

/// Split the input lines into chunks of `chunk_size_lines` lines each.
///
/// The size is clamped rather than rejected. All chunks have the clamped size
/// except possibly the last, which may be shorter. An empty input produces no
/// chunks.
pub fn split_into_chunks(lines: &[String], chunk_size_lines: usize) -> Vec<Chunk> {
    let size = clamp_chunk_size(chunk_size_lines);

    lines
        .chunks(size)
        .enumerate()
        .map(|(index, window)| Chunk {
            index,
            lines: window.to_vec(),
            start_line: index * size,
        })
        .collect()
}
