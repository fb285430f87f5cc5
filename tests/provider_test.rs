// Integration tests for the ByteProvider API
// Tests cover: get/iter_chunks agreement, capability flags, stream
// exhaustion, append, chains, digests

use std::io::{Cursor, Write};

use byteprovider::{
    ByteProvider, ByteView, ChainBytes, ChainMember, ChunkOptions, ChunkedVec, ContainerBytes,
    FileBytes, FillBytes, FillSpec, Flags, Kind, MemoryBytes, ProviderError, StreamBytes,
};
use tempfile::NamedTempFile;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 13) as u8).collect()
}

fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Collects every chunk, asserting offsets are contiguous from `start`.
fn concat_chunks(provider: &mut dyn ByteProvider, options: ChunkOptions) -> Vec<u8> {
    let start = options.start().unwrap_or(0);
    let mut out = Vec::new();
    for chunk in provider.iter_chunks(options).expect("iter_chunks") {
        let chunk = chunk.expect("chunk");
        assert_eq!(
            chunk.offset(),
            start + out.len() as u64,
            "Chunk offsets should be contiguous"
        );
        out.extend_from_slice(&chunk.as_bytes().expect("fresh chunk"));
    }
    out
}

fn chunk_lengths(provider: &mut dyn ByteProvider, options: ChunkOptions) -> Vec<usize> {
    provider
        .iter_chunks(options)
        .expect("iter_chunks")
        .map(|c| c.expect("chunk").len())
        .collect()
}

// ============================================================================
// Random Access / Chunking Agreement
// ============================================================================

fn assert_agreement(provider: &mut dyn ByteProvider) {
    let total = provider.total_length().expect("finite provider");
    let whole = provider.get(0..total).expect("get whole").into_bytes().unwrap();

    for chunk_size in [1, 3, 7, 64, 1000] {
        let options = ChunkOptions::new(chunk_size).unwrap();
        assert_eq!(
            concat_chunks(provider, options),
            &whole[..],
            "Chunks of {} should concatenate to get(0..len)",
            chunk_size
        );

        let lens = chunk_lengths(provider, options);
        if let Some((last, init)) = lens.split_last() {
            assert!(init.iter().all(|&l| l == chunk_size));
            assert!(*last <= chunk_size && *last > 0);
        }
    }

    let mid = total / 2;
    let options = ChunkOptions::new(5).unwrap().with_start(mid / 2).with_stop(mid);
    assert_eq!(
        concat_chunks(provider, options),
        &whole[(mid / 2) as usize..mid as usize],
        "Sub-range chunking should match get(start..stop)"
    );
}

#[test]
fn test_agreement_memory() {
    let mut provider = MemoryBytes::new(pattern(250)).unwrap();
    assert_agreement(&mut provider);
}

#[test]
fn test_agreement_fill() {
    let mut provider = FillBytes::new(FillSpec::new(60, 0x0102_0304, 4)).unwrap();
    assert_agreement(&mut provider);
}

#[test]
fn test_agreement_file() {
    let file = temp_file(&pattern(333));
    let mut provider = FileBytes::open(file.path()).unwrap();
    assert_agreement(&mut provider);
}

#[test]
fn test_agreement_container() {
    let store = ChunkedVec::from_rows(1, 16, &pattern(100)).unwrap();
    let mut provider = ContainerBytes::new(store).unwrap();
    assert_agreement(&mut provider);
}

#[test]
fn test_agreement_container_wide_rows() {
    // Chunk sizes and bounds land mid-row for 3-byte rows.
    let store = ChunkedVec::from_rows(3, 5, &pattern(99)).unwrap();
    let mut provider = ContainerBytes::new(store).unwrap();
    assert_agreement(&mut provider);
}

#[test]
fn test_agreement_chain() {
    let file = temp_file(&pattern(40));
    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(pattern(17)).unwrap()),
        Box::new(FileBytes::open(file.path()).unwrap()),
        Box::new(FillBytes::new(FillSpec::new(9, 0xAB, 1)).unwrap()),
    ];
    let mut chain = ChainBytes::new(members).unwrap();
    assert_eq!(chain.kind(), Kind::File);
    assert_agreement(&mut chain);
}

#[test]
fn test_stream_matches_memory() {
    let data = pattern(1234);
    let mut memory = MemoryBytes::new(data.clone()).unwrap();
    let mut stream = StreamBytes::new(Cursor::new(data)).unwrap();

    let options = ChunkOptions::new(100).unwrap();
    assert_eq!(
        concat_chunks(&mut stream, options),
        concat_chunks(&mut memory, options)
    );
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_fill_scenario() {
    let provider = FillBytes::new(FillSpec::new(16, 0xFF, 1)).unwrap();

    assert_eq!(provider.total_length(), Some(16));
    assert_eq!(provider.kind(), Kind::Memory);
    assert_eq!(provider.read_all().unwrap().as_bytes().unwrap(), &[0xFF; 16]);
}

#[test]
fn test_memory_chunk_scenario() {
    let data = pattern(10);
    let mut provider = MemoryBytes::writable(data.clone()).unwrap();
    assert!(provider.flags().has(Flags::WRITABLE));

    let options = ChunkOptions::new(4).unwrap();
    let lens = chunk_lengths(&mut provider, options);
    assert_eq!(lens, [4, 4, 2], "10 bytes in chunks of 4 should be 4, 4, 2");
    assert_eq!(
        concat_chunks(&mut provider, options),
        data,
        "Chunks should concatenate to the original buffer"
    );
    assert!(
        provider.flags().has(Flags::WRITABLE),
        "WRITABLE should be restored after iteration"
    );
}

#[test]
fn test_file_bounds_scenario() {
    let data = pattern(100);
    let file = temp_file(&data);
    let provider = FileBytes::open(file.path()).unwrap();

    let tail = provider.get(90..100).unwrap();
    assert_eq!(tail.as_bytes().unwrap(), &data[90..]);
    assert!(matches!(
        provider.get(95..105),
        Err(ProviderError::OutOfBounds { start: 95, end: 105, len: 100 })
    ));
}

#[test]
fn test_empty_providers() {
    let mut memory = MemoryBytes::new(Vec::new()).unwrap();
    assert_eq!(memory.total_length(), Some(0));
    assert!(chunk_lengths(&mut memory, ChunkOptions::default()).is_empty());

    let file = temp_file(b"");
    let mut provider = FileBytes::open(file.path()).unwrap();
    assert_eq!(provider.total_length(), Some(0));
    assert!(provider.get(0..0).unwrap().is_empty());
    assert!(chunk_lengths(&mut provider, ChunkOptions::new(8).unwrap()).is_empty());
}

// ============================================================================
// Capability Flags
// ============================================================================

#[test]
fn test_constant_rejects_mutation() {
    let mut provider = MemoryBytes::new(pattern(8)).unwrap();
    assert!(provider.flags().has(Flags::CONSTANT));

    let mut view = provider.get(0..4).unwrap();
    assert!(matches!(
        view.as_mut_bytes(),
        Err(ProviderError::Capability { .. })
    ));
    assert!(matches!(
        provider.append(&ByteView::detached(vec![1u8])),
        Err(ProviderError::Capability { .. })
    ));
    assert!(matches!(
        provider.write_at(0, b"x"),
        Err(ProviderError::Capability { .. })
    ));
    assert_eq!(provider.read_all().unwrap().as_bytes().unwrap(), &pattern(8)[..]);
}

#[test]
fn test_constant_chain_rejects_mutation() {
    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(pattern(6)).unwrap()),
        Box::new(ContainerBytes::constant(ChunkedVec::from_rows(2, 2, &pattern(4)).unwrap()).unwrap()),
    ];
    let mut chain = ChainBytes::new(members).unwrap();
    assert!(
        chain.flags().has(Flags::CONSTANT),
        "A chain of CONSTANT members should be CONSTANT"
    );

    let mut view = chain.get(4..8).unwrap();
    assert!(matches!(
        view.as_mut_bytes(),
        Err(ProviderError::Capability { .. })
    ));
    assert!(matches!(
        chain.append(&ByteView::detached(vec![1u8, 2])),
        Err(ProviderError::Capability { .. })
    ));
    assert!(matches!(
        chain.write_at(0, b"x"),
        Err(ProviderError::Capability { .. })
    ));
    assert_eq!(chain.total_length(), Some(10));
}

#[test]
fn test_write_at_offset_overflow() {
    let mut provider = MemoryBytes::writable(vec![0u8; 4]).unwrap();
    assert!(matches!(
        provider.write_at(u64::MAX, b"ab"),
        Err(ProviderError::OutOfBounds { .. })
    ));

    let mut fill = FillBytes::new(FillSpec::from(4usize)).unwrap();
    assert!(matches!(
        fill.write_at(u64::MAX - 1, b"ab"),
        Err(ProviderError::OutOfBounds { .. })
    ));
    assert_eq!(provider.read_all().unwrap().as_bytes().unwrap(), &[0u8; 4]);
}

#[test]
fn test_chunks_are_read_only_while_iterating() {
    let mut provider = FillBytes::new(FillSpec::from(8usize)).unwrap();
    assert!(provider.flags().has(Flags::WRITABLE));

    {
        let mut chunks = provider.iter_chunks(ChunkOptions::new(4).unwrap()).unwrap();
        let mut chunk = chunks.next().unwrap().unwrap();
        assert!(matches!(
            chunk.as_mut_bytes(),
            Err(ProviderError::Capability { .. })
        ));
    }

    assert!(
        provider.flags().has(Flags::WRITABLE),
        "WRITABLE should be restored after iteration"
    );
}

#[test]
fn test_write_at_invalidates_views() {
    let mut provider = MemoryBytes::writable(pattern(8)).unwrap();
    let before = provider.get(0..8).unwrap();

    provider.write_at(2, b"zz").unwrap();

    assert!(before.is_stale());
    assert!(matches!(before.as_bytes(), Err(ProviderError::StaleView)));
    assert_eq!(&provider.get(2..4).unwrap().as_bytes().unwrap()[..], b"zz");
}

#[test]
fn test_mutable_view_is_private_copy() {
    let provider = MemoryBytes::writable(vec![0u8; 4]).unwrap();
    let mut view = provider.get(0..4).unwrap();

    view.as_mut_bytes().unwrap()[0] = 9;

    assert_eq!(view.as_bytes().unwrap()[0], 9);
    assert_eq!(provider.read_all().unwrap().as_bytes().unwrap(), &[0u8; 4]);
}

#[test]
fn test_dropped_provider_leaves_views_stale() {
    let file = temp_file(&pattern(32));
    let provider = FileBytes::open(file.path()).unwrap();
    let view = provider.get(0..16).unwrap();
    assert!(!view.is_stale());

    provider.close();

    assert!(view.is_stale());
    assert!(matches!(view.into_bytes(), Err(ProviderError::StaleView)));
}

// ============================================================================
// Streams
// ============================================================================

#[test]
fn test_stream_single_pass() {
    let mut stream = StreamBytes::new(Cursor::new(pattern(50))).unwrap();
    assert_eq!(stream.total_length(), None);
    assert_eq!(stream.kind(), Kind::Stream);

    assert_eq!(concat_chunks(&mut stream, ChunkOptions::new(8).unwrap()), pattern(50));
    assert!(matches!(
        stream.iter_chunks(ChunkOptions::default()),
        Err(ProviderError::ExhaustedSource)
    ));
    assert!(matches!(
        stream.get(0..1),
        Err(ProviderError::UnsupportedOperation { .. })
    ));
}

#[test]
fn test_stream_terminal_chain() {
    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(&b"head-"[..]).unwrap()),
        Box::new(StreamBytes::new(Cursor::new(b"tail".to_vec())).unwrap()),
    ];
    let mut chain = ChainBytes::new(members).unwrap();

    assert_eq!(chain.kind(), Kind::Stream);
    assert_eq!(chain.total_length(), None);
    assert_eq!(concat_chunks(&mut chain, ChunkOptions::new(3).unwrap()), b"head-tail");
    assert!(matches!(
        chain.iter_chunks(ChunkOptions::default()),
        Err(ProviderError::ExhaustedSource)
    ));
}

#[test]
fn test_stream_must_be_last_in_chain() {
    let members: Vec<ChainMember> = vec![
        Box::new(StreamBytes::new(Cursor::new(vec![0u8; 4])).unwrap()),
        Box::new(MemoryBytes::new(vec![0u8; 4]).unwrap()),
    ];
    assert!(matches!(
        ChainBytes::new(members),
        Err(ProviderError::UnsupportedSource { .. })
    ));
    assert!(ChainBytes::new(Vec::new()).is_err());
}

// ============================================================================
// Append
// ============================================================================

#[test]
fn test_append_extends_length() {
    let mut provider = ContainerBytes::new(ChunkedVec::new(2, 3).unwrap()).unwrap();
    assert!(provider.is_appendable());

    let before = provider.total_length().unwrap();
    provider.append(&ByteView::detached(&b"abcd"[..])).unwrap();
    provider.append(&ByteView::detached(&b"ef"[..])).unwrap();

    assert_eq!(provider.total_length(), Some(before + 6));
    assert_eq!(provider.get(before..before + 6).unwrap().as_bytes().unwrap(), b"abcdef");
}

#[test]
fn test_append_unsupported_on_fixed_buffers() {
    let mut fill = FillBytes::new(FillSpec::from(4usize)).unwrap();
    assert!(!fill.is_appendable());
    assert!(matches!(
        fill.append(&ByteView::detached(&b"x"[..])),
        Err(ProviderError::UnsupportedOperation { .. })
    ));
}

#[test]
fn test_chain_append_goes_to_tail() {
    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(&b"ab"[..]).unwrap()),
        Box::new(ContainerBytes::new(ChunkedVec::new(1, 4).unwrap()).unwrap()),
    ];
    let mut chain = ChainBytes::new(members).unwrap();
    assert!(chain.is_appendable());

    chain.append(&ByteView::detached(&b"cd"[..])).unwrap();
    assert_eq!(chain.read_all().unwrap().as_bytes().unwrap(), b"abcd");
}

// ============================================================================
// Digests
// ============================================================================

#[cfg(feature = "hash-blake3")]
#[test]
fn test_digest_independent_of_backing_and_chunking() {
    let data = pattern(5000);
    let file = temp_file(&data);

    let mut memory = MemoryBytes::new(data.clone()).unwrap();
    let mut mapped = FileBytes::open(file.path()).unwrap();
    let mut stream = StreamBytes::new(Cursor::new(data.clone())).unwrap();

    let expected = memory.digest(ChunkOptions::default()).unwrap();
    assert_eq!(mapped.digest(ChunkOptions::new(7).unwrap()).unwrap(), expected);
    assert_eq!(stream.digest(ChunkOptions::new(1024).unwrap()).unwrap(), expected);
    assert_eq!(ByteView::detached(data).digest().unwrap(), expected);
}
