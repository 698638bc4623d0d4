//! Physical path to logical URL resolution.
//!
//! A crawl root whose first path segment names a protocol (`smb`, `nfs`,
//! `ftp`, `http`, `https`) carries a (protocol, server, share) triple in its
//! next two segments. The mapper turns every on-disk path under that root
//! into the URL an auditor can click: `file://server/share/...` for mounted
//! shares (so operating-system file browsers open it), the raw protocol for
//! mirrored sites, and the bare path when the root has no recognized prefix.

use std::path::{Component, Path, PathBuf};

/// Protocol prefixes recognized in a crawl root's first path segment.
const RECOGNIZED_PROTOCOLS: &[&str] = &["smb", "nfs", "ftp", "http", "https"];

/// Resolves logical URLs for every file under one crawl root.
///
/// Created once per run from the root path; immutable afterwards.
#[derive(Debug, Clone)]
pub struct UrlMapper {
    root: PathBuf,
    /// URL scheme when the root carries a protocol prefix.
    scheme: Option<String>,
    server: String,
    share: String,
}

impl UrlMapper {
    /// Parse the protocol prefix triple out of a crawl root.
    ///
    /// When the first segment is not a recognized protocol the mapper falls
    /// back to raw-path URLs with empty server and share fields.
    #[must_use]
    pub fn from_root(root: &Path) -> Self {
        let segments: Vec<String> = root
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let protocol = segments
            .first()
            .filter(|seg| RECOGNIZED_PROTOCOLS.contains(&seg.as_str()));

        match protocol {
            Some(proto) => {
                // smb and nfs roots are mounted shares; file:// URLs open in
                // OS file browsers. Mirrors keep their own scheme.
                let scheme = match proto.as_str() {
                    "smb" | "nfs" => "file".to_string(),
                    other => other.to_string(),
                };
                Self {
                    root: root.to_path_buf(),
                    scheme: Some(scheme),
                    server: segments.get(1).cloned().unwrap_or_default(),
                    share: segments.get(2).cloned().unwrap_or_default(),
                }
            }
            None => Self {
                root: root.to_path_buf(),
                scheme: None,
                server: String::new(),
                share: String::new(),
            },
        }
    }

    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    #[must_use]
    pub fn share(&self) -> &str {
        &self.share
    }

    /// Logical URL for a file read directly from disk.
    #[must_use]
    pub fn logical_url(&self, physical: &Path) -> String {
        let Some(scheme) = &self.scheme else {
            return physical.to_string_lossy().into_owned();
        };

        let rest = physical
            .strip_prefix(&self.root)
            .unwrap_or(physical)
            .to_string_lossy()
            .replace('\\', "/");

        let mut out = format!("{scheme}://{}/{}", self.server, self.share);
        if !rest.is_empty() {
            out.push('/');
            out.push_str(&rest);
        }
        out
    }

    /// Logical URL for a file embedded in a container.
    ///
    /// The record keeps the parent's physical path; only the URL carries the
    /// nested name.
    #[must_use]
    pub fn nested_url(parent_url: &str, nested_name: &str) -> String {
        format!("{parent_url}#{nested_name}")
    }
}

/// Extension of a filename: the suffix after the last dot, lowercased.
/// Empty when there is no dot or the name starts with the only dot.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smb_root_maps_to_file_url() {
        let mapper = UrlMapper::from_root(Path::new("smb/fs01/share"));
        assert_eq!(mapper.server(), "fs01");
        assert_eq!(mapper.share(), "share");
        assert_eq!(
            mapper.logical_url(Path::new("smb/fs01/share/Finance/Q1.docx")),
            "file://fs01/share/Finance/Q1.docx"
        );
    }

    #[test]
    fn nfs_root_maps_to_file_url() {
        let mapper = UrlMapper::from_root(Path::new("nfs/nas02/exports"));
        assert_eq!(
            mapper.logical_url(Path::new("nfs/nas02/exports/backup.tar")),
            "file://nas02/exports/backup.tar"
        );
    }

    #[test]
    fn http_root_keeps_scheme() {
        let mapper = UrlMapper::from_root(Path::new("https/intranet.corp/wiki"));
        assert_eq!(
            mapper.logical_url(Path::new("https/intranet.corp/wiki/page.html")),
            "https://intranet.corp/wiki/page.html"
        );
    }

    #[test]
    fn unrecognized_prefix_falls_back_to_raw_path() {
        let mapper = UrlMapper::from_root(Path::new("local/data"));
        assert_eq!(mapper.server(), "");
        assert_eq!(mapper.share(), "");
        assert_eq!(
            mapper.logical_url(Path::new("local/data/notes.txt")),
            "local/data/notes.txt"
        );
    }

    #[test]
    fn nested_url_appends_fragment() {
        assert_eq!(
            UrlMapper::nested_url("file://fs01/share/bundle.zip", "report.pdf"),
            "file://fs01/share/bundle.zip#report.pdf"
        );
        // A container inside a container chains fragments.
        assert_eq!(
            UrlMapper::nested_url("file://fs01/share/outer.zip#inner.zip", "doc.pdf"),
            "file://fs01/share/outer.zip#inner.zip#doc.pdf"
        );
    }

    #[test]
    fn extension_is_lowercased_suffix() {
        assert_eq!(extension_of(Path::new("a/b/Report.DOCX")), "docx");
        assert_eq!(extension_of(Path::new("a/b/README")), "");
        assert_eq!(extension_of(Path::new("a/b/archive.tar.gz")), "gz");
    }
}
