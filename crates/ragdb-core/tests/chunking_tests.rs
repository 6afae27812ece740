use std::fs;
use tempfile::TempDir;

use ragdb_core::chunking::{load_documents, Chunker, ChunkingConfig};
use ragdb_core::types::Document;

fn doc(id: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        title: id.to_string(),
        raw_text: text.to_string(),
        source_path: format!("/tmp/{id}.txt"),
    }
}

fn sample_text(paragraphs: usize) -> String {
    let mut text = String::new();
    for i in 0..paragraphs {
        text.push_str(&format!(
            "Paragraph {i} talks about keeping a homestead running. \
             Water storage needs checking every week. Firewood should be \
             split before the first frost arrives.\n\n"
        ));
    }
    text
}

#[test]
fn parents_reconstruct_document() {
    let chunker = Chunker::default();
    let d = doc("recon", &sample_text(40));
    let (parents, _children) = chunker.chunk(&d);
    assert!(parents.len() > 1, "long document should split into several parents");
    let rebuilt: String = parents.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(rebuilt, d.raw_text);
    // offsets agree with the text payloads
    for p in &parents {
        assert_eq!(&d.raw_text[p.start..p.end], p.text);
    }
}

#[test]
fn children_are_substrings_of_their_parent() {
    let chunker = Chunker::default();
    let d = doc("subs", &sample_text(40));
    let (parents, children) = chunker.chunk(&d);
    assert!(!children.is_empty());
    for c in &children {
        let parent = parents
            .iter()
            .find(|p| p.parent_id == c.parent_id)
            .expect("child references an existing parent");
        assert!(
            parent.text.contains(&c.text),
            "child {} is not a substring of parent {}",
            c.child_id,
            c.parent_id
        );
        assert!(c.child_id.starts_with(&c.parent_id));
    }
}

#[test]
fn chunks_respect_target_sizes() {
    let config = ChunkingConfig { parent_chars: 500, child_chars: 120, child_overlap_chars: 20 };
    let chunker = Chunker::new(config);
    let d = doc("sized", &sample_text(20));
    let (parents, children) = chunker.chunk(&d);
    for p in &parents {
        assert!(p.text.len() <= 500 + 200, "parent grossly oversized: {}", p.text.len());
    }
    for c in &children {
        assert!(c.text.len() <= 120 + 40, "child grossly oversized: {}", c.text.len());
    }
}

#[test]
fn short_document_yields_one_parent_and_one_child() {
    let chunker = Chunker::default();
    let d = doc("short", "A single tiny passage.");
    let (parents, children) = chunker.chunk(&d);
    assert_eq!(parents.len(), 1);
    assert_eq!(children.len(), 1);
    assert_eq!(parents[0].text, d.raw_text);
    assert_eq!(children[0].text, d.raw_text);
    assert_eq!(children[0].parent_id, parents[0].parent_id);
}

#[test]
fn empty_and_whitespace_documents_yield_no_chunks() {
    let chunker = Chunker::default();
    for text in ["", "   \n\n \t "] {
        let (parents, children) = chunker.chunk(&doc("empty", text));
        assert!(parents.is_empty());
        assert!(children.is_empty());
    }
}

#[test]
fn unbroken_text_still_fully_covered() {
    let chunker = Chunker::new(ChunkingConfig {
        parent_chars: 100,
        child_chars: 30,
        child_overlap_chars: 5,
    });
    let d = doc("unbroken", &"x".repeat(1000));
    let (parents, _children) = chunker.chunk(&d);
    let rebuilt: String = parents.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(rebuilt, d.raw_text);
}

#[test]
fn load_documents_reads_txt_and_md_sorted() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("b.txt"), "bravo content").unwrap();
    fs::write(tmp.path().join("a.md"), "# alpha\n\nalpha content").unwrap();
    fs::write(tmp.path().join("ignored.bin"), [0u8, 159, 146, 150]).unwrap();

    let docs = load_documents(tmp.path()).expect("load");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "a");
    assert_eq!(docs[1].id, "b");
    assert_eq!(docs[0].title, "# alpha");
}
