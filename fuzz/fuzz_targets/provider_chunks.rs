#![no_main]

use libfuzzer_sys::fuzz_target;
use byteprovider::{
    ByteProvider, ChainBytes, ChainMember, ChunkOptions, FillBytes, FillSpec, MemoryBytes,
};

fuzz_target!(|input: (u16, u16, u16, Vec<u8>)| {
    let (chunk_size, start, stop, data) = input;
    let len = data.len() as u64;
    let chunk_size = (chunk_size as usize % 4096).max(1);
    let start = start as u64 % (len + 1);
    let stop = start + stop as u64 % (len - start + 1);

    // Split the input across a chain so chunks straddle members
    let split = data.len() / 2;
    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(data[..split].to_vec()).unwrap()),
        Box::new(MemoryBytes::new(data[split..].to_vec()).unwrap()),
        Box::new(FillBytes::new(FillSpec::from(0usize)).unwrap()),
    ];
    let mut chain = ChainBytes::new(members).unwrap();
    let mut memory = MemoryBytes::new(data.clone()).unwrap();

    let options = ChunkOptions::new(chunk_size)
        .unwrap()
        .with_start(start)
        .with_stop(stop);

    for provider in [&mut memory as &mut dyn ByteProvider, &mut chain] {
        assert_eq!(provider.total_length(), Some(len));

        // Verify: chunks concatenate to the requested range
        let expected = provider.get(start..stop).unwrap().into_bytes().unwrap();
        let chunks: Vec<_> = provider
            .iter_chunks(options)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let mut offset = start;
        let mut joined = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            // Verify: offsets are contiguous and only the last chunk is short
            assert_eq!(chunk.offset(), offset);
            if i < chunks.len() - 1 {
                assert_eq!(chunk.len(), chunk_size);
            }
            assert!(!chunk.is_empty() && chunk.len() <= chunk_size);
            offset += chunk.len() as u64;
            joined.extend_from_slice(&chunk.as_bytes().unwrap());
        }
        assert_eq!(&joined[..], &expected[..]);

        // Verify: same range, same digest
        let digest = provider.digest(options).unwrap();
        assert_eq!(digest, byteprovider::ByteView::detached(expected).digest().unwrap());
    }

    // Verify: out-of-range requests are rejected, never clamped
    assert!(memory.get(0..len + 1).is_err());
    assert!(chain.get(start..len + 1).is_err());
});
