use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::extension::error::InstallError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Unpacks `archive` on top of `profile_dir`. Plain and gzip tars are accepted.
///
/// Extraction is not transactional: entries written before a failure stay in
/// place and the error is reported as-is.
pub fn install(archive: &Path, profile_dir: &Path) -> Result<(), InstallError> {
    let fail = |source: io::Error| InstallError {
        archive: archive.to_path_buf(),
        dest: profile_dir.to_path_buf(),
        source,
    };

    if !profile_dir.is_dir() {
        return Err(fail(io::Error::new(
            io::ErrorKind::NotFound,
            "profile directory does not exist",
        )));
    }

    let mut file = File::open(archive).map_err(fail)?;
    let gzipped = is_gzip(&mut file).map_err(fail)?;
    let reader = BufReader::new(file);

    tracing::info!(
        "extracting {} into {}{}",
        archive.display(),
        profile_dir.display(),
        if gzipped { " (gzip)" } else { "" }
    );

    if gzipped {
        unpack(GzDecoder::new(reader), profile_dir).map_err(fail)
    } else {
        unpack(reader, profile_dir).map_err(fail)
    }
}

fn unpack<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive.unpack(dest)
}

fn is_gzip(file: &mut File) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(filled == magic.len() && magic == GZIP_MAGIC)
}
