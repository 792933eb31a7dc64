//! Archive I/O: rewrites every `.class` member of a zip/jar archive, copying everything
//! else byte-for-byte. Mirrors the teacher's `fix_class` dispatch loop, generalized to an
//! arbitrary [`MappingTable`] instead of a single hardcoded fix.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::mapping::MappingTable;
use crate::rewrite::transform;

/// Reads every member of the zip archive backed by `input`, applies [`transform`] to every
/// member whose name ends in `.class`, and writes the result (rewritten or raw-copied) to
/// `output`. Returns the number of members that were actually rewritten.
pub fn rewrite_archive<R, W>(input: R, output: W, mapping: &MappingTable) -> Result<u32>
where
    R: Read + std::io::Seek,
    W: Write + std::io::Seek,
{
    let mut zip = ZipArchive::new(input).context("opening input archive")?;
    let mut writer = ZipWriter::new(output);
    let mut rewritten = 0u32;

    for i in 0..zip.len() {
        let mut file = zip.by_index(i).context("reading archive member")?;
        if !file.is_file() || !file.name().ends_with(".class") {
            drop(file);
            writer
                .raw_copy_file(zip.by_index_raw(i).context("re-reading archive member")?)
                .context("copying non-class member")?;
            continue;
        }

        let name = file.name().to_string();
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .with_context(|| format!("reading {name}"))?;

        log::debug!("Checking {name}");
        match transform(&bytes, mapping).with_context(|| format!("rewriting {name}"))? {
            std::borrow::Cow::Borrowed(_) => {
                drop(file);
                writer
                    .raw_copy_file(zip.by_index_raw(i).context("re-reading archive member")?)
                    .with_context(|| format!("copying unchanged member {name}"))?;
            }
            std::borrow::Cow::Owned(patched) => {
                log::info!("Rewrote {name}");
                let mut options = FileOptions::default()
                    .large_file(file.compressed_size().max(file.size()) > u32::MAX as u64)
                    .last_modified_time(file.last_modified())
                    .compression_method(file.compression());
                if let Some(perms) = file.unix_mode() {
                    options = options.unix_permissions(perms);
                }
                drop(file);
                writer
                    .start_file(name.as_str(), options)
                    .with_context(|| format!("starting rewritten member {name}"))?;
                writer
                    .write_all(&patched)
                    .with_context(|| format!("writing rewritten member {name}"))?;
                rewritten += 1;
            }
        }
    }

    writer.finish().context("finalizing output archive")?;
    Ok(rewritten)
}
