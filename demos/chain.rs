//! Chain example: header, file body and padding read as one extent.
//!
//! Run with:
//!     RUST_LOG=byteprovider=trace cargo run --example chain -- /path/to/file

use std::env;

use byteprovider::{
    ByteProvider, ByteView, ChainBytes, ChainMember, ChunkOptions, ChunkedVec, ContainerBytes,
    FileBytes, FillBytes, FillSpec, MemoryBytes,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let members: Vec<ChainMember> = vec![
        Box::new(MemoryBytes::new(&b"HEADER\n"[..])?),
        Box::new(FileBytes::open(path.as_str())?),
        Box::new(FillBytes::constant(FillSpec::new(8, b'.' as u64, 1))?),
        Box::new(ContainerBytes::new(ChunkedVec::new(4, 16)?)?),
    ];
    let mut chain = ChainBytes::new(members)?;
    println!(
        "Chain of {}: kind={}, flags={}, length={:?}\n",
        chain.len(),
        chain.kind(),
        chain.flags(),
        chain.total_length()
    );

    // The trailing container accepts whole 4-byte rows
    chain.append(&ByteView::detached(&b"END!"[..]))?;
    println!("After append: length={:?}\n", chain.total_length());

    for chunk in chain.iter_chunks(ChunkOptions::new(1024)?)? {
        let chunk = chunk?;
        println!("Chunk: offset={:>8}, len={:>6}", chunk.offset(), chunk.len());
    }

    let total = chain.total_length().unwrap_or(0);
    let tail = chain.get(total.saturating_sub(12)..total)?;
    println!("\nTail: {:?}", String::from_utf8_lossy(&tail.as_bytes()?));

    Ok(())
}
