//! Property tests for fixed-size chunking.

use proptest::prelude::*;
use shop_rag::{Chunker, Document, FixedSizeChunker};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn chunks_respect_size_and_offsets(
        text in "[a-z가-힣 \n]{1,300}",
        chunk_size in 1usize..60,
        overlap_seed in 0usize..60,
    ) {
        let chunk_overlap = overlap_seed % chunk_size;
        let document = Document::new("a.txt", text.clone());
        let chunks = FixedSizeChunker::new(chunk_size, chunk_overlap).chunk(&document);
        let chars: Vec<char> = text.chars().collect();

        if text.trim().is_empty() {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }

        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(chunks[0].start, 0);
        prop_assert_eq!(chunks.last().unwrap().end, chars.len());
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_index, i);
            prop_assert!(chunk.text.chars().count() <= chunk_size);
            let expected: String = chars[chunk.start..chunk.end].iter().collect();
            prop_assert_eq!(&chunk.text, &expected);
        }
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].end - pair[1].start, chunk_overlap);
        }
    }

    #[test]
    fn zero_overlap_chunks_reassemble_the_text(
        text in "[a-z가-힣 .]{1,300}",
        chunk_size in 1usize..50,
    ) {
        prop_assume!(!text.trim().is_empty());
        let document = Document::new("a.txt", text.clone());
        let chunks = FixedSizeChunker::new(chunk_size, 0).chunk(&document);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        prop_assert_eq!(joined, text);
    }
}
