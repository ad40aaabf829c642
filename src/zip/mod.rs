//! ZIP archive reading.
//!
//! Both the full modpack and its patches are ZIP archives. This module reads
//! them through any [`ReadAt`](crate::io::ReadAt) source:
//!
//! - [`structures`]: the fixed-layout ZIP records (EOCD, ZIP64 EOCD, entries)
//! - [`parser`]: locating and decoding the Central Directory
//! - [`extractor`]: [`ZipArchive`], name lookup and entry extraction
//!
//! ## Supported Features
//!
//! - Standard ZIP format and ZIP64 extensions
//! - STORED and DEFLATE compression methods, CRC-32 checked
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipArchive;
pub use structures::{CompressionMethod, ZipFileEntry};
