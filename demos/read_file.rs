//! File provider example.
//!
//! Run with:
//!     RUST_LOG=byteprovider=debug cargo run --example read_file -- /path/to/file

use std::env;

use byteprovider::{ByteProvider, ChunkOptions, FileBytes};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    println!("Mapping file: {}\n", path);

    let mut provider = FileBytes::open(path.as_str())?;
    let total = provider.total_length().unwrap_or(0);
    println!("Kind: {}, flags: {}", provider.kind(), provider.flags());
    println!("File size: {} bytes\n", total);

    // Peek at the last few bytes
    let tail_start = total.saturating_sub(16);
    let tail = provider.get(tail_start..total)?;
    println!("Tail @ {}: {:02x?}\n", tail.offset(), tail.as_bytes()?);

    let mut total_chunks = 0;
    for chunk in provider.iter_chunks(ChunkOptions::new(4096)?)? {
        let chunk = chunk?;
        total_chunks += 1;
        println!(
            "Chunk {}: offset={:>10}, len={:>8}, hash={}",
            total_chunks,
            chunk.offset(),
            chunk.len(),
            chunk.digest()?.to_hex()
        );
    }

    println!("\nTotal: {} chunks, {} bytes", total_chunks, total);
    println!("File digest: {}", provider.digest(ChunkOptions::default())?);

    Ok(())
}
