//! Low-level ZIP archive parser.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, follow the locator to the ZIP64 EOCD
//! 3. Read the whole Central Directory in one go and decode every entry
//! 4. For extraction, read the entry's Local File Header to find its data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Where the central directory lives and how many entries it holds.
struct CentralDirectory {
    offset: u64,
    size: u64,
    entries: u64,
}

/// Find and parse the End of Central Directory record.
///
/// Tries the common comment-less layout first, then searches backwards
/// through the largest possible comment.
///
/// # Returns
///
/// A tuple of (EOCD record, offset of EOCD in file).
async fn find_eocd<R: ReadAt + ?Sized>(reader: &R) -> Result<(EndOfCentralDirectory, u64)> {
    let size = reader.size();
    if size < EndOfCentralDirectory::SIZE as u64 {
        bail!("Not a valid ZIP file: too short");
    }

    let offset = size - EndOfCentralDirectory::SIZE as u64;
    let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
    reader.read_exact_at(offset, &mut buf).await?;

    if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
        return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
    }

    let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(size);
    let search_start = size - search_size;

    let mut buf = vec![0u8; search_size as usize];
    reader.read_exact_at(search_start, &mut buf).await?;

    for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
        if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }

        // A real EOCD's comment runs exactly to the end of the file.
        let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
        if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
            let eocd = EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
            return Ok((eocd, search_start + i as u64));
        }
    }

    bail!("Not a valid ZIP file")
}

/// Locate the central directory, going through the ZIP64 records when the
/// regular EOCD carries sentinel values.
async fn locate_central_directory<R: ReadAt + ?Sized>(reader: &R) -> Result<CentralDirectory> {
    let (eocd, eocd_offset) = find_eocd(reader).await?;

    if !eocd.is_zip64() {
        return Ok(CentralDirectory {
            offset: eocd.cd_offset as u64,
            size: eocd.cd_size as u64,
            entries: eocd.total_entries as u64,
        });
    }

    // The ZIP64 EOCD Locator is located immediately before the regular EOCD
    let locator_offset = eocd_offset
        .checked_sub(Zip64EOCDLocator::SIZE as u64)
        .context("Invalid ZIP64 format")?;
    let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
    reader.read_exact_at(locator_offset, &mut locator_buf).await?;
    let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

    let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
    reader.read_exact_at(locator.eocd64_offset, &mut eocd64_buf).await?;
    let eocd64 = Zip64EOCD::from_bytes(&eocd64_buf)?;

    Ok(CentralDirectory {
        offset: eocd64.cd_offset,
        size: eocd64.cd_size,
        entries: eocd64.total_entries,
    })
}

/// Read every entry listed in the central directory, in archive order.
pub async fn read_entries<R: ReadAt + ?Sized>(reader: &R) -> Result<Vec<ZipFileEntry>> {
    let cd = locate_central_directory(reader).await?;

    if cd.offset.saturating_add(cd.size) > reader.size() {
        bail!("Central Directory lies outside the file");
    }

    let mut cd_data = vec![0u8; cd.size as usize];
    reader.read_exact_at(cd.offset, &mut cd_data).await?;

    let mut cursor = Cursor::new(cd_data.as_slice());
    let mut entries = Vec::with_capacity(cd.entries.min(u16::MAX as u64) as usize);

    for index in 0..cd.entries {
        let entry = parse_cdfh(&mut cursor)
            .with_context(|| format!("Invalid Central Directory entry #{index}"))?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Parse a Central Directory File Header from a cursor, leaving the cursor
/// at the next header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = (cursor.position() + field_size).min(extra_field_end);

        if header_id == ZIP64_EXTRA_ID {
            // Present only for the header fields that hold 0xFFFFFFFF, in this order
            for value in [&mut uncompressed_size, &mut compressed_size, &mut lfh_offset] {
                if *value == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    *value = cursor.read_u64::<LittleEndian>()?;
                }
            }
        }

        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
    })
}

/// Offset of the first data byte of `entry`.
///
/// The Local File Header's name and extra field may differ in length from
/// the central directory's copy, so the LFH itself is read.
pub async fn data_offset<R: ReadAt + ?Sized>(reader: &R, entry: &ZipFileEntry) -> Result<u64> {
    let mut lfh_buf = vec![0u8; LFH_SIZE];
    reader.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;

    if &lfh_buf[0..4] != LFH_SIGNATURE {
        bail!("Invalid Local File Header for {}", entry.file_name);
    }

    let mut cursor = Cursor::new(&lfh_buf);
    cursor.set_position(26); // Offset to filename length field

    let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
    let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

    Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
}
