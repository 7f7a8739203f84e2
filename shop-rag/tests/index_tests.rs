//! Vector index ordering and persistence tests.

mod common;

use std::fs;

use common::MockEmbeddingProvider;
use proptest::prelude::*;
use shop_rag::{
    Chunk, Chunker, EmbeddingProvider, FixedSizeChunker, IndexEntry, VectorIndex, load_documents,
};

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn arb_entry(dim: usize) -> impl Strategy<Value = IndexEntry> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| IndexEntry {
            chunk: Chunk {
                id,
                end: text.chars().count(),
                text,
                source_path: "doc.txt".to_string(),
                chunk_index: 0,
                start: 0,
            },
            embedding,
        },
    )
}

mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            entries in proptest::collection::vec(arb_entry(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
            k in 0usize..25,
        ) {
            let count = entries.len();
            let index = VectorIndex::from_entries(entries).unwrap();
            let results = index.search(&query, k).unwrap();

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(count));
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn search_is_deterministic(
            entries in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
        ) {
            let index = VectorIndex::from_entries(entries).unwrap();
            prop_assert_eq!(index.search(&query, 5).unwrap(), index.search(&query, 5).unwrap());
        }
    }
}

#[tokio::test]
async fn persisted_index_round_trips_search_results() {
    let corpus = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    fs::write(corpus.path().join("returns.txt"), "Refunds in 14 days.").unwrap();
    fs::write(corpus.path().join("shipping.txt"), "Ships in 2-3 days!!").unwrap();

    let documents = load_documents(corpus.path(), &["txt".to_string()]).unwrap();
    let chunks = FixedSizeChunker::new(10, 0).chunk_all(&documents);
    assert_eq!(documents.len(), 2);
    assert_eq!(chunks.len(), 4);

    let embedder = MockEmbeddingProvider::new(32);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await.unwrap();
    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
        .collect();

    let built = VectorIndex::build(entries, db.path()).unwrap();
    let query = embedder.embed("How long do refunds take?").await.unwrap();
    let before = built.search(&query, 3).unwrap();
    drop(built);

    let loaded = VectorIndex::load(db.path()).unwrap().expect("persisted index");
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.dimensions(), 32);
    assert_eq!(loaded.search(&query, 3).unwrap(), before);
}
