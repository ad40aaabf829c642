use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use flate2::Crc;
use flate2::write::DeflateDecoder;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Compressed bytes read from the source per step.
const CHUNK_SIZE: u64 = 64 * 1024;

/// An opened ZIP archive with entries addressable by exact name.
pub struct ZipArchive<R: ReadAt> {
    reader: R,
    entries: Vec<ZipFileEntry>,
    by_name: HashMap<String, usize>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Read the central directory of `reader`.
    pub async fn open(reader: R) -> Result<Self> {
        let entries = parser::read_entries(&reader).await?;
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.file_name.clone(), i))
            .collect();

        Ok(Self {
            reader,
            entries,
            by_name,
        })
    }

    /// All entries, in central directory order.
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Look up an entry by its exact name.
    pub fn by_name(&self, name: &str) -> Option<&ZipFileEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Stream the decompressed contents of `entry` into `out`, returning
    /// the number of bytes written.
    ///
    /// The data is checked against the size and CRC-32 recorded in the
    /// central directory.
    pub async fn copy_to<W>(&self, entry: &ZipFileEntry, out: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if entry.is_encrypted() {
            bail!("{}: encrypted entries are not supported", entry.file_name);
        }

        let mut decoder = match entry.compression_method {
            CompressionMethod::Stored => Decoder::Stored,
            CompressionMethod::Deflate => Decoder::Deflate(DeflateDecoder::new(Vec::new())),
            CompressionMethod::Unknown(method) => bail!(
                "{}: unsupported compression method {method} (only STORED and DEFLATE are supported)",
                entry.file_name
            ),
        };

        let mut position = parser::data_offset(&self.reader, entry).await?;
        let mut remaining = entry.compressed_size;
        let mut buf = vec![0u8; remaining.min(CHUNK_SIZE) as usize];
        let mut crc = Crc::new();
        let mut written = 0u64;

        while remaining > 0 {
            let n = remaining.min(CHUNK_SIZE) as usize;
            self.reader.read_exact_at(position, &mut buf[..n]).await?;
            position += n as u64;
            remaining -= n as u64;

            let plain = decoder
                .feed(&buf[..n])
                .with_context(|| format!("{}: corrupt compressed data", entry.file_name))?;
            crc.update(&plain);
            out.write_all(&plain).await?;
            written += plain.len() as u64;
        }

        let tail = decoder
            .finish()
            .with_context(|| format!("{}: corrupt compressed data", entry.file_name))?;
        crc.update(&tail);
        out.write_all(&tail).await?;
        written += tail.len() as u64;
        out.flush().await?;

        if written != entry.uncompressed_size {
            bail!(
                "{}: expected {} bytes but extracted {written}",
                entry.file_name,
                entry.uncompressed_size
            );
        }
        if crc.sum() != entry.crc32 {
            bail!(
                "{}: CRC-32 mismatch (expected {:08x}, got {:08x})",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(written)
    }

    /// Extract file data to memory
    pub async fn read_to_vec(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(entry.uncompressed_size.min(CHUNK_SIZE) as usize);
        self.copy_to(entry, &mut data).await?;
        Ok(data)
    }

    /// Extract `entry` to `output_path`, creating parent directories and
    /// replacing any existing file.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("cannot create directory {}", parent.display()))?;
            }
        }

        let mut file = fs::File::create(output_path)
            .await
            .with_context(|| format!("cannot create {}", output_path.display()))?;
        self.copy_to(entry, &mut file)
            .await
            .with_context(|| format!("cannot extract {} to {}", entry.file_name, output_path.display()))?;

        Ok(())
    }
}

/// Turns compressed chunks into plain bytes.
enum Decoder {
    Stored,
    Deflate(DeflateDecoder<Vec<u8>>),
}

impl Decoder {
    fn feed(&mut self, input: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Decoder::Stored => Ok(input.to_vec()),
            Decoder::Deflate(decoder) => {
                decoder.write_all(input)?;
                Ok(std::mem::take(decoder.get_mut()))
            }
        }
    }

    fn finish(self) -> std::io::Result<Vec<u8>> {
        match self {
            Decoder::Stored => Ok(Vec::new()),
            Decoder::Deflate(decoder) => decoder.finish(),
        }
    }
}
