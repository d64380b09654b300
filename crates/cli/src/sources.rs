use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Read `<data_dir>/<source>/<component>.txt` for every source directory.
///
/// Each immediate subdirectory of `data_dir` is a source. Sources without a
/// file for the component are skipped; a missing `data_dir` yields no documents.
pub fn read_component_docs(data_dir: &Path, component: &str) -> io::Result<BTreeMap<String, String>> {
    let mut docs = BTreeMap::new();
    if !data_dir.is_dir() {
        log::warn!("data directory {} does not exist", data_dir.display());
        return Ok(docs);
    }

    let file_name = format!("{component}.txt");
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let source = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path().join(&file_name);
        match fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("read {} ({} bytes)", path.display(), text.len());
                docs.insert(source, text);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("source '{source}' has no {file_name}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(docs)
}
