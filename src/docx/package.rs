//! `.docx` container handling.
//!
//! A Word document is a zip archive of XML parts. Rendering copies every
//! entry in order and passes the parts that may hold placeholders through a
//! rewrite function.

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::DOCUMENT_PART;
use crate::error::{Error, Result};

/// Whether an archive entry is a part that may contain placeholders.
pub fn is_templated_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

/// Copy `template` into a new archive, rewriting templated parts with `rewrite`.
///
/// Fails if the archive has no main document part.
pub fn repackage<F>(template: &[u8], mut rewrite: F) -> Result<Vec<u8>>
where
    F: FnMut(&str, &str) -> Result<String>,
{
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut has_document = false;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer.add_directory(name, options)?;
            continue;
        }

        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut data)?;

        if is_templated_part(&name) {
            has_document |= name == DOCUMENT_PART;
            let xml = String::from_utf8(data)
                .map_err(|e| Error::template(format!("{name} is not UTF-8: {e}")))?;
            data = rewrite(&name, &xml)?.into_bytes();
        }

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    if !has_document {
        return Err(Error::template(format!("template has no {DOCUMENT_PART}")));
    }

    Ok(writer.finish()?.into_inner())
}
