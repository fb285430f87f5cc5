#![no_main]

use std::io::{self, Read};

use libfuzzer_sys::fuzz_target;
use byteprovider::{ByteProvider, ChunkOptions, ProviderError, StreamBytes};

/// Returns short (and occasionally interrupted) reads sized by the fuzz
/// input.
struct Jittery {
    data: Vec<u8>,
    steps: Vec<u8>,
    pos: usize,
    calls: usize,
}

impl Read for Jittery {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let step = match self.steps.get(self.calls % self.steps.len().max(1)) {
            Some(&s) => s as usize,
            None => buf.len(),
        };
        self.calls += 1;
        if step == 0 && self.calls % 2 == 0 {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let step = step.max(1);
        let n = buf.len().min(step).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fuzz_target!(|input: (u16, Vec<u8>, Vec<u8>)| {
    let (chunk_size, steps, data) = input;
    let chunk_size = (chunk_size as usize % 4096).max(1);

    let mut provider = StreamBytes::new(Jittery {
        data: data.clone(),
        steps,
        pos: 0,
        calls: 0,
    })
    .unwrap();

    let chunks: Vec<_> = provider
        .iter_chunks(ChunkOptions::new(chunk_size).unwrap())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    // Verify: short reads never produce short chunks before the end
    for (i, chunk) in chunks.iter().enumerate() {
        if i < chunks.len() - 1 {
            assert_eq!(chunk.len(), chunk_size);
        }
    }

    // Verify: total bytes match input
    let joined: Vec<u8> = chunks
        .iter()
        .flat_map(|c| c.as_bytes().unwrap().to_vec())
        .collect();
    assert_eq!(joined, data);

    // Verify: a stream is single-pass
    assert!(matches!(
        provider.iter_chunks(ChunkOptions::default()),
        Err(ProviderError::ExhaustedSource)
    ));
});
