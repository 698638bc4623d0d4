//! Ordered MIME-pattern dispatch table.
//!
//! Patterns are normalized substrings matched against the probed MIME type
//! in declaration order; the first hit wins. Classes form a closed set —
//! anything unmatched is `Unknown`, whose extractor probes textuality and
//! emits plain content when the file turns out to be text.

use serde::{Deserialize, Serialize};

/// Closed set of document classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocClass {
    Html,
    Text,
    Word,
    Excel,
    Powerpoint,
    Visio,
    Pdf,
    Lnk,
    Executable,
    Image,
    Audio,
    Video,
    Thumbsdb,
    Archive,
    Package,
    Bytecode,
    Winevent,
    Message,
    Sqlite,
    Pcap,
    Raw,
    Unknown,
}

impl DocClass {
    /// Wire name recorded in the CSV `class` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::Powerpoint => "powerpoint",
            Self::Visio => "visio",
            Self::Pdf => "pdf",
            Self::Lnk => "lnk",
            Self::Executable => "executable",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Thumbsdb => "thumbsdb",
            Self::Archive => "archive",
            Self::Package => "package",
            Self::Bytecode => "bytecode",
            Self::Winevent => "winevent",
            Self::Message => "message",
            Self::Sqlite => "sqlite",
            Self::Pcap => "pcap",
            Self::Raw => "raw",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadline category an extractor runs under. The engine maps categories to
/// configured seconds; adapters never see the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// `command-timeout-seconds`, default 60.
    Default,
    /// OCR runs long on large scans: 120 s.
    Image,
    /// Speech transcription is the slowest extractor family: 300 s.
    Audio,
}

/// Nested-expansion behavior declared per registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Extractor never yields nested files.
    None,
    /// Extractor always unpacks into scratch (archives, mail, Thumbs.db);
    /// fan-out unbounded by default.
    Unpack,
    /// Always expands, but the payload is media destined for OCR, so the
    /// `ocr-max-images` cap applies (video keyframes).
    UnpackCapped,
    /// Media extraction runs only when the primary text came back shorter
    /// than the sparse-text threshold; fan-out capped by `ocr-max-images`.
    SparseMedia,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub patterns: &'static [&'static str],
    pub class: DocClass,
    pub timeout: TimeoutClass,
    pub expansion: Expansion,
}

/// The dispatch table. Order is the ambiguity tie-break: specific office and
/// forensic types sit above the broad container and media families, and
/// `octet-stream` sits last before the unknown fallback.
pub const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        patterns: &["html", "xhtml"],
        class: DocClass::Html,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["msword", "wordprocessingml", "opendocument.text"],
        class: DocClass::Word,
        timeout: TimeoutClass::Default,
        expansion: Expansion::SparseMedia,
    },
    RegistryEntry {
        patterns: &["ms-excel", "spreadsheetml", "opendocument.spreadsheet"],
        class: DocClass::Excel,
        timeout: TimeoutClass::Default,
        expansion: Expansion::SparseMedia,
    },
    RegistryEntry {
        patterns: &["ms-powerpoint", "presentationml", "opendocument.presentation"],
        class: DocClass::Powerpoint,
        timeout: TimeoutClass::Default,
        expansion: Expansion::SparseMedia,
    },
    RegistryEntry {
        patterns: &["visio", "opendocument"],
        class: DocClass::Visio,
        timeout: TimeoutClass::Default,
        expansion: Expansion::SparseMedia,
    },
    RegistryEntry {
        patterns: &["pdf"],
        class: DocClass::Pdf,
        timeout: TimeoutClass::Default,
        expansion: Expansion::SparseMedia,
    },
    RegistryEntry {
        patterns: &["ms-shortcut"],
        class: DocClass::Lnk,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["rfc822", "vnd.ms-outlook", "message/"],
        class: DocClass::Message,
        timeout: TimeoutClass::Default,
        expansion: Expansion::Unpack,
    },
    RegistryEntry {
        patterns: &["sqlite"],
        class: DocClass::Sqlite,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["evtx", "winevt"],
        class: DocClass::Winevent,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    // Legacy OLE blobs that are not office documents are almost always
    // Explorer thumbnail caches on audited shares.
    RegistryEntry {
        patterns: &["thumbs", "cdfv2"],
        class: DocClass::Thumbsdb,
        timeout: TimeoutClass::Default,
        expansion: Expansion::Unpack,
    },
    RegistryEntry {
        patterns: &["executable", "sharedlib", "dosexec", "mach-binary", "pie-executable"],
        class: DocClass::Executable,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["bytecode"],
        class: DocClass::Bytecode,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["pcap", "tcpdump"],
        class: DocClass::Pcap,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    // deb is an ar archive underneath; package must outrank the x-archive
    // pattern below.
    RegistryEntry {
        patterns: &["rpm", "debian"],
        class: DocClass::Package,
        timeout: TimeoutClass::Default,
        expansion: Expansion::Unpack,
    },
    RegistryEntry {
        patterns: &[
            "zip",
            "rar",
            "tar",
            "gzip",
            "compressed",
            "msi",
            "java-archive",
            "x-archive",
            "7z",
            "cab",
        ],
        class: DocClass::Archive,
        timeout: TimeoutClass::Default,
        expansion: Expansion::Unpack,
    },
    RegistryEntry {
        patterns: &["image/"],
        class: DocClass::Image,
        timeout: TimeoutClass::Image,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["audio/"],
        class: DocClass::Audio,
        timeout: TimeoutClass::Audio,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["video/"],
        class: DocClass::Video,
        timeout: TimeoutClass::Default,
        expansion: Expansion::UnpackCapped,
    },
    RegistryEntry {
        patterns: &["text/"],
        class: DocClass::Text,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
    RegistryEntry {
        patterns: &["octet-stream"],
        class: DocClass::Raw,
        timeout: TimeoutClass::Default,
        expansion: Expansion::None,
    },
];

static UNKNOWN_ENTRY: RegistryEntry = RegistryEntry {
    patterns: &[],
    class: DocClass::Unknown,
    timeout: TimeoutClass::Default,
    expansion: Expansion::None,
};

/// Resolve a probed MIME type to its registry entry, first match wins.
#[must_use]
pub fn resolve(mime: &str) -> &'static RegistryEntry {
    let mime = mime.to_ascii_lowercase();
    REGISTRY
        .iter()
        .find(|entry| entry.patterns.iter().any(|p| mime.contains(p)))
        .unwrap_or(&UNKNOWN_ENTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_types_resolve_before_archive() {
        // docx is zip-over-xml; the wordprocessingml pattern must win.
        let entry = resolve(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );
        assert_eq!(entry.class, DocClass::Word);
        assert_eq!(entry.expansion, Expansion::SparseMedia);

        let entry = resolve("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        assert_eq!(entry.class, DocClass::Excel);

        let entry =
            resolve("application/vnd.openxmlformats-officedocument.presentationml.presentation");
        assert_eq!(entry.class, DocClass::Powerpoint);
    }

    #[test]
    fn html_wins_over_generic_text() {
        assert_eq!(resolve("text/html").class, DocClass::Html);
        assert_eq!(resolve("text/plain").class, DocClass::Text);
        assert_eq!(resolve("text/csv; charset=utf-8").class, DocClass::Text);
    }

    #[test]
    fn archive_pattern_family() {
        for mime in [
            "application/zip",
            "application/x-rar",
            "application/x-tar",
            "application/gzip",
            "application/x-7z-compressed",
            "application/x-msi",
            "application/java-archive",
            "application/x-archive",
        ] {
            assert_eq!(resolve(mime).class, DocClass::Archive, "{mime}");
        }
    }

    #[test]
    fn packages_outrank_archives() {
        assert_eq!(resolve("application/x-rpm").class, DocClass::Package);
        assert_eq!(
            resolve("application/vnd.debian.binary-package").class,
            DocClass::Package
        );
    }

    #[test]
    fn forensic_types() {
        assert_eq!(resolve("application/x-ms-shortcut").class, DocClass::Lnk);
        assert_eq!(resolve("application/x-sqlite3").class, DocClass::Sqlite);
        assert_eq!(resolve("application/vnd.tcpdump.pcap").class, DocClass::Pcap);
        assert_eq!(resolve("application/x-dosexec").class, DocClass::Executable);
        assert_eq!(resolve("application/CDFV2").class, DocClass::Thumbsdb);
        assert_eq!(resolve("message/rfc822").class, DocClass::Message);
        assert_eq!(resolve("application/vnd.ms-outlook").class, DocClass::Message);
    }

    #[test]
    fn word_outranks_thumbsdb_for_ole_office() {
        // Legacy .doc probes as msword even though it is a CDFV2 container.
        assert_eq!(resolve("application/msword").class, DocClass::Word);
    }

    #[test]
    fn media_families() {
        assert_eq!(resolve("image/png").class, DocClass::Image);
        assert_eq!(resolve("audio/mpeg").class, DocClass::Audio);
        assert_eq!(resolve("video/mp4").class, DocClass::Video);
        assert_eq!(resolve("image/png").timeout, TimeoutClass::Image);
        assert_eq!(resolve("audio/mpeg").timeout, TimeoutClass::Audio);
    }

    #[test]
    fn unmatched_mime_is_unknown() {
        assert_eq!(resolve("application/x-completely-novel").class, DocClass::Unknown);
        assert_eq!(resolve("application/octet-stream").class, DocClass::Raw);
    }
}
