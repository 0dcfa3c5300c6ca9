//! File safety validation for blocking executables and dangerous file types.
//!
//! Multi-layer protection:
//! 1. Magic byte detection for executables
//! 2. Extension blocklist
//! 3. Size limit enforcement
//!
//! Also provides filename sanitization and MIME detection for imports.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Magic byte signatures for executable files
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),           // MZ header
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),         // Linux ELF
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),   // macOS 32-bit
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),   // macOS 64-bit
    ("Mach-O Fat", &[0xCA, 0xFE, 0xBA, 0xBE]),  // Universal binary (also Java)
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]), // WASM
];

/// Blocked file extensions (case-insensitive)
static BLOCKED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Windows executables
        "exe", "dll", "scr", "pif", "com", "msi", "msp", "mst",
        // Unix executables (compiled binaries only — text scripts are allowed)
        "so", "dylib", "out", // Java/JVM
        "jar", "war", "ear", "class", // Packages
        "deb", "rpm", "apk", "app", "dmg", "pkg", // Office macros
        "xlsm", "xlsb", "xltm", "docm", "dotm", "pptm", "potm", "ppam",
        // Other dangerous
        "reg", "inf", "scf", "lnk", "url", "hta",
    ]
    .into_iter()
    .collect()
});

/// Result of file safety validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
    pub detected_type: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            block_reason: None,
            detected_type: None,
        }
    }

    pub fn blocked(reason: impl Into<String>, detected: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
            detected_type: Some(detected.into()),
        }
    }
}

/// Validate file safety before import.
pub fn validate_file(filename: &str, data: &[u8], max_size_bytes: u64) -> ValidationResult {
    if data.len() as u64 > max_size_bytes {
        return ValidationResult::blocked(
            format!("File exceeds maximum size of {} bytes", max_size_bytes),
            "oversize",
        );
    }

    if data.is_empty() {
        return ValidationResult::blocked("File is empty", "empty");
    }

    // Magic byte check
    for (name, signature) in MAGIC_SIGNATURES {
        if data.starts_with(signature) {
            return ValidationResult::blocked(
                format!("Executable file type blocked: {}", name),
                *name,
            );
        }
    }

    // Extension blocklist
    if let Some(ext) = extension_of(filename) {
        if BLOCKED_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()) {
            return ValidationResult::blocked(
                format!("File extension blocked: .{}", ext),
                format!("extension:{}", ext),
            );
        }
    }

    ValidationResult::allowed()
}

/// Sanitize a filename for vault storage.
///
/// Strips directory components, control characters, and leading dots so a
/// stored name can never escape the vault or hide as a dotfile.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == ':' { '_' } else { c })
        .collect();

    let trimmed = cleaned.trim_start_matches('.').trim();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Detect the MIME type of file content.
///
/// Magic bytes (via `infer`) win; falls back to the filename extension and
/// finally `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    match extension_of(filename).map(|e| e.to_ascii_lowercase()) {
        Some(ext) => match ext.as_str() {
            "txt" => "text/plain",
            "md" | "markdown" => "text/markdown",
            "html" | "htm" => "text/html",
            "csv" => "text/csv",
            "json" => "application/json",
            "yaml" | "yml" => "application/yaml",
            "xml" => "application/xml",
            _ => "application/octet-stream",
        }
        .to_string(),
        None => "application/octet-stream".to_string(),
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_elf_binary() {
        let data = [0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01];
        let result = validate_file("innocent.txt", &data, 1024);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("ELF"));
    }

    #[test]
    fn test_blocks_exe_extension() {
        let result = validate_file("setup.EXE", b"plain text really", 1024);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains(".EXE"));
    }

    #[test]
    fn test_blocks_oversize() {
        let result = validate_file("big.txt", &[0u8; 32], 16);
        assert!(!result.allowed);
        assert_eq!(result.detected_type.as_deref(), Some("oversize"));
    }

    #[test]
    fn test_blocks_empty_file() {
        let result = validate_file("empty.txt", &[], 1024);
        assert!(!result.allowed);
    }

    #[test]
    fn test_allows_plain_text() {
        let result = validate_file("notes.txt", b"grocery list: eggs, milk", 1024);
        assert!(result.allowed);
        assert!(result.block_reason.is_none());
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\doc.pdf"), "doc.pdf");
    }

    #[test]
    fn test_sanitize_strips_leading_dots_and_controls() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("a\u{0000}b.txt"), "ab.txt");
    }

    #[test]
    fn test_sanitize_empty_becomes_unnamed() {
        assert_eq!(sanitize_filename("..."), "unnamed");
        assert_eq!(sanitize_filename(""), "unnamed");
    }

    #[test]
    fn test_detect_content_type_magic_bytes_win() {
        // PNG magic bytes with a misleading extension
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(detect_content_type("photo.txt", &png), "image/png");
    }

    #[test]
    fn test_detect_content_type_extension_fallback() {
        assert_eq!(detect_content_type("readme.md", b"# Title"), "text/markdown");
        assert_eq!(
            detect_content_type("mystery", b"no magic here"),
            "application/octet-stream"
        );
    }
}
