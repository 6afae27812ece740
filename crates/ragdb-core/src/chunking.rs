//! Document loading and parent/child chunking.
//!
//! Splitting is recursive and boundary-preferring: paragraph breaks first,
//! then line breaks, then sentence ends, then word breaks, with a hard cut
//! at a character boundary as the last resort. Parent chunks partition the
//! document exactly; child chunks partition each parent with a small
//! backward overlap for recall.

use anyhow::Result;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::types::{ChildChunk, Document, ParentChunk};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target parent chunk size in bytes.
    pub parent_chars: usize,
    /// Target child chunk size in bytes.
    pub child_chars: usize,
    /// How far a child's start is pulled back into its predecessor.
    pub child_overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { parent_chars: 2000, child_chars: 300, child_overlap_chars: 40 }
    }
}

#[derive(Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split one document into parent chunks and their child chunks.
    ///
    /// Empty and whitespace-only documents produce no chunks (not an error,
    /// so batch ingestion keeps going). A document smaller than the child
    /// target produces exactly one parent and one child sharing its text.
    pub fn chunk(&self, doc: &Document) -> (Vec<ParentChunk>, Vec<ChildChunk>) {
        if doc.raw_text.trim().is_empty() {
            return (Vec::new(), Vec::new());
        }
        let mut parents = Vec::new();
        let mut children = Vec::new();
        let parent_ranges = split_ranges(&doc.raw_text, self.config.parent_chars);
        for (parent_index, range) in parent_ranges.into_iter().enumerate() {
            let parent_id = format!("{}:{}", doc.id, parent_index);
            let parent_text = &doc.raw_text[range.clone()];
            for (child_index, child_range) in self.child_ranges(parent_text).into_iter().enumerate() {
                children.push(ChildChunk {
                    child_id: format!("{}:{}", parent_id, child_index),
                    parent_id: parent_id.clone(),
                    text: parent_text[child_range].to_string(),
                });
            }
            parents.push(ParentChunk {
                parent_id,
                doc_id: doc.id.clone(),
                text: parent_text.to_string(),
                start: range.start,
                end: range.end,
            });
        }
        (parents, children)
    }

    /// Child ranges within one parent: contiguous child-granularity ranges,
    /// each after the first pulled back by the overlap. A child range is
    /// always a slice of the parent, so the substring invariant holds.
    fn child_ranges(&self, parent_text: &str) -> Vec<Range<usize>> {
        let mut ranges = split_ranges(parent_text, self.config.child_chars);
        for r in ranges.iter_mut().skip(1) {
            let mut start = r.start.saturating_sub(self.config.child_overlap_chars);
            while start > 0 && !parent_text.is_char_boundary(start) {
                start -= 1;
            }
            r.start = start;
        }
        ranges
    }
}

/// Cut `text` into contiguous byte ranges of roughly `target` bytes or
/// less, covering the text exactly (concatenating the slices reproduces the
/// input). Separator text stays attached to the piece before it.
pub fn split_ranges(text: &str, target: usize) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    split_recursive(text, 0, target.max(1), 0, &mut out);
    out
}

fn split_recursive(text: &str, base: usize, target: usize, sep_idx: usize, out: &mut Vec<Range<usize>>) {
    if text.is_empty() {
        return;
    }
    if text.len() <= target {
        out.push(base..base + text.len());
        return;
    }
    if sep_idx >= SEPARATORS.len() {
        hard_cut(text, base, target, out);
        return;
    }
    let sep = SEPARATORS[sep_idx];
    // Segment boundaries sit just past each separator occurrence.
    let mut bounds: Vec<usize> = text.match_indices(sep).map(|(i, m)| i + m.len()).collect();
    if bounds.last() != Some(&text.len()) {
        bounds.push(text.len());
    }
    if bounds.len() <= 1 {
        split_recursive(text, base, target, sep_idx + 1, out);
        return;
    }
    // Greedily pack consecutive segments up to the target; a single segment
    // that is itself oversized recurses on the next separator level.
    let mut piece_start = 0usize;
    let mut piece_end = 0usize;
    for b in bounds {
        if piece_end > piece_start && b - piece_start > target {
            out.push(base + piece_start..base + piece_end);
            piece_start = piece_end;
        }
        piece_end = b;
        if piece_end - piece_start > target {
            split_recursive(&text[piece_start..piece_end], base + piece_start, target, sep_idx + 1, out);
            piece_start = piece_end;
        }
    }
    if piece_end > piece_start {
        out.push(base + piece_start..base + piece_end);
    }
}

fn hard_cut(text: &str, base: usize, target: usize, out: &mut Vec<Range<usize>>) {
    let mut start = 0usize;
    while start < text.len() {
        let mut end = (start + target).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        out.push(base + start..base + end);
        start = end;
    }
}

/// Load raw documents (.txt and .md) under `data_dir`, sorted by path for
/// reproducible ingestion order. Unreadable files are logged and skipped.
pub fn load_documents(data_dir: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            matches!(e.path().extension().and_then(|s| s.to_str()), Some("txt") | Some("md"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    let mut docs = Vec::with_capacity(files.len());
    for path in files {
        let raw_text = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => match fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            },
        };
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let title = raw_text
            .lines()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().chars().take(120).collect())
            .unwrap_or_else(|| id.clone());
        docs.push(Document {
            id,
            title,
            raw_text,
            source_path: path.to_string_lossy().to_string(),
        });
    }
    Ok(docs)
}
