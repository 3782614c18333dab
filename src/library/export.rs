//! Group export as a zip brush package.
//!
//! Layout of the archive:
//! - `<name>.myb` and `<name>_prev.png` for every member
//! - `order.conf`: a `Group: <group>` header, then member names in list order

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::registry::Registry;
use crate::error::{LibraryError, Result};

pub const ORDER_FILE_NAME: &str = "order.conf";

impl Registry {
    /// Writes every member of `group` into a zip archive at `dest`.
    pub fn export_group(&self, group: &str, dest: &Path) -> Result<()> {
        let members = self.group_member_names(group)?;
        let store = self.store();

        // Read everything up front so a missing member leaves no partial archive
        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(members.len() * 2);
        for name in &members {
            for path in [store.parameter_path(name), store.preview_path(name)] {
                let bytes = std::fs::read(&path).map_err(|e| LibraryError::from_io_at(e, &path))?;
                let entry_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| LibraryError::InvalidName(name.clone()))?;
                entries.push((entry_name, bytes));
            }
        }

        let file = File::create(dest)?;
        let mut zip = ZipWriter::new(file);
        let options_deflate = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (entry_name, bytes) in &entries {
            zip.start_file(entry_name.as_str(), options_deflate)?;
            zip.write_all(bytes)?;
        }

        zip.start_file(ORDER_FILE_NAME, options_deflate)?;
        zip.write_all(render_order_file(group, &members).as_bytes())?;
        zip.finish()?;

        tracing::info!(
            "Exported brush group {} ({} presets) to {:?}",
            group,
            members.len(),
            dest
        );
        Ok(())
    }
}

fn render_order_file(group: &str, members: &[String]) -> String {
    let mut out = format!("Group: {}\n", group);
    for name in members {
        out.push_str(name);
        out.push('\n');
    }
    out
}
