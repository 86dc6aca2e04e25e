pub mod document;
pub mod embedding;

pub use document::chunker::{assemble_chunks, Chunk, ChunkConfig};
pub use document::{Heading, Segment, SegmentError, SegmentSource};
pub use embedding::{create_embedder, Embedder, EmbeddingError};
