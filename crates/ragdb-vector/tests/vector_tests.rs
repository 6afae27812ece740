use tempfile::TempDir;

use ragdb_core::traits::VectorIndexer;
use ragdb_core::types::ChildChunk;
use ragdb_vector::LanceVectorIndex;

fn child(id: &str) -> ChildChunk {
    ChildChunk {
        child_id: id.to_string(),
        parent_id: format!("{id}-parent"),
        text: String::new(),
    }
}

fn unit(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    v[hot] = 1.0;
    v
}

#[tokio::test]
async fn add_and_search_nearest() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let index = LanceVectorIndex::open(tmp.path(), "children", 8).await?;

    let chunks = vec![child("c0"), child("c1"), child("c2")];
    let embeddings = vec![unit(8, 0), unit(8, 3), unit(8, 7)];
    index.add(&chunks, &embeddings).await?;

    let mut query = unit(8, 3);
    query[0] = 0.1; // still closest to c1
    let hits = index.search_vec(&query, 2).await?;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, "c1");
    Ok(())
}

#[tokio::test]
async fn search_on_empty_index_returns_no_hits() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let index = LanceVectorIndex::open(tmp.path(), "children", 8).await?;
    let hits = index.search_vec(&unit(8, 0), 5).await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn mismatched_embedding_dim_is_rejected() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let index = LanceVectorIndex::open(tmp.path(), "children", 8).await?;
    let result = index.add(&[child("c0")], &[vec![1.0f32; 4]]).await;
    assert!(result.is_err());
    Ok(())
}
