//! Input normalisation: the CPF mask and boletim file selection.
//!
//! The CPF is masked as the participant types, so the flow only ever stores
//! the formatted value. Completeness is a formatting check (14 characters),
//! not a checksum validation.

use crate::error::{BoletimError, ValidationError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of digits in a CPF.
pub const CPF_DIGITS: usize = 11;

/// Length of a fully formatted CPF (`###.###.###-##`).
pub const CPF_FORMATTED_LEN: usize = 14;

/// Content type of PDF documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Apply the `###.###.###-##` mask to raw keystroke text.
///
/// Non-digits are dropped and the digits are truncated to 11. Periods follow
/// the 3rd and 6th digits once a following digit exists; the hyphen appears
/// only when 10 or 11 digits are present. Re-applying the mask to its own
/// output returns it unchanged.
pub fn normalize_cpf(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CPF_DIGITS)
        .collect();

    let mut out = String::with_capacity(CPF_FORMATTED_LEN);
    for (i, d) in digits.iter().enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(*d);
    }
    out
}

/// `true` once the masked CPF has all of its 14 characters.
pub fn is_cpf_complete(value: &str) -> bool {
    value.chars().count() == CPF_FORMATTED_LEN
}

/// Whether the file picker accepts this content type (`image/*,application/pdf`).
///
/// The type must be a bare `type/subtype`: parameters, whitespace and the
/// data URL delimiter are refused so the header never leaks into the payload.
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let ct = content_type.trim().to_ascii_lowercase();
    let Some((kind, subtype)) = ct.split_once('/') else {
        return false;
    };
    if !is_mime_token(kind) || !is_mime_token(subtype) {
        return false;
    }
    ct == PDF_CONTENT_TYPE || kind == "image"
}

// RFC 6838 restricted-name characters.
fn is_mime_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}

/// Sniff the content type from the first bytes of a document.
pub fn sniff_content_type(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(b"%PDF") {
        return Some(PDF_CONTENT_TYPE);
    }
    image::guess_format(head).ok().map(|f| f.to_mime_type())
}

/// A boletim chosen by the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
    content_type: String,
}

impl SelectedFile {
    /// Select `path` with a content type declared by the caller.
    pub fn new(
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let content_type = content_type.into();
        if !is_accepted_content_type(&content_type) {
            return Err(ValidationError::UnsupportedFile { content_type });
        }
        let content_type = content_type.trim().to_string();
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            content_type,
        })
    }

    /// Select `path`, detecting its content type from the magic bytes.
    pub fn detect(path: impl AsRef<Path>) -> Result<Self, BoletimError> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path).map_err(|e| BoletimError::from_io(path, e))?;

        let mut head = [0u8; 32];
        let mut filled = 0;
        while filled < head.len() {
            match file.read(&mut head[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BoletimError::from_io(path, e)),
            }
        }
        if filled == 0 {
            return Err(ValidationError::EmptyFile {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content_type = sniff_content_type(&head[..filled]).ok_or_else(|| {
            ValidationError::UnsupportedFile {
                content_type: "application/octet-stream".into(),
            }
        })?;
        debug!("Detected {} for {}", content_type, path.display());

        Ok(Self::new(path, content_type)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown next to the preview.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn formats_full_cpf() {
        assert_eq!(normalize_cpf("12345678901"), "123.456.789-01");
    }

    #[test]
    fn strips_non_digits_and_truncates() {
        assert_eq!(normalize_cpf("123.456.789-0123"), "123.456.789-01");
        assert_eq!(normalize_cpf("abc 123 def 456"), "123.456");
    }

    #[test]
    fn partial_input_grows_like_the_mask() {
        let cases = [
            ("", ""),
            ("1", "1"),
            ("123", "123"),
            ("1234", "123.4"),
            ("123456", "123.456"),
            ("1234567", "123.456.7"),
            ("123456789", "123.456.789"),
            ("1234567890", "123.456.789-0"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_cpf(raw), expected, "input {raw:?}");
        }
    }

    /// Expected `###.###.###-##` shape for a prefix of `len` digits.
    fn mask_shape(len: usize) -> String {
        let mut shape = String::new();
        for i in 0..len {
            match i {
                3 | 6 => shape.push('.'),
                9 => shape.push('-'),
                _ => {}
            }
            shape.push('#');
        }
        shape
    }

    #[test]
    fn mask_shape_and_idempotence_for_all_lengths() {
        let samples = [
            "98765432109",
            "00000000000",
            "12345678901",
            "99999999999",
            "10203040506",
            "31415926535",
        ];
        for digits in samples {
            for len in 0..=CPF_DIGITS {
                let raw = &digits[..len];
                let once = normalize_cpf(raw);
                let shape: String = once
                    .chars()
                    .map(|c| if c.is_ascii_digit() { '#' } else { c })
                    .collect();
                assert_eq!(shape, mask_shape(len), "input {raw:?}");
                assert_eq!(once.chars().filter(char::is_ascii_digit).collect::<String>(), raw);
                assert_eq!(normalize_cpf(&once), once, "input {raw:?}");
            }
            if digits.len() == CPF_DIGITS {
                assert!(is_cpf_complete(&normalize_cpf(digits)));
            }
        }
    }

    #[test]
    fn non_ascii_digits_are_dropped() {
        assert_eq!(normalize_cpf("١٢٣123"), "123");
    }

    #[test]
    fn completeness_is_length_based() {
        assert!(is_cpf_complete("000.000.000-00"));
        assert!(!is_cpf_complete("123.456.789-0"));
        assert!(!is_cpf_complete(""));
    }

    #[test]
    fn accepted_content_types() {
        assert!(is_accepted_content_type("image/jpeg"));
        assert!(is_accepted_content_type("IMAGE/PNG"));
        assert!(is_accepted_content_type("application/pdf"));
        assert!(!is_accepted_content_type("image/"));
        assert!(!is_accepted_content_type("text/plain"));
    }

    #[test]
    fn content_types_with_parameters_or_delimiters_are_refused() {
        for ct in [
            "image/x,y",
            "image/png;base64",
            "image/png; charset=x",
            "image /png",
            "image/p ng",
            "image",
            "image/png/extra",
            "/png",
            "application/pdf,",
        ] {
            assert!(!is_accepted_content_type(ct), "{ct:?} must be refused");
            assert!(SelectedFile::new("boletim.bin", ct).is_err(), "{ct:?}");
        }
    }

    #[test]
    fn declared_type_is_stored_trimmed() {
        let file = SelectedFile::new("boletim.png", "  image/png ").unwrap();
        assert_eq!(file.content_type(), "image/png");
    }

    #[test]
    fn new_rejects_unsupported_type() {
        let err = SelectedFile::new("notes.txt", "text/plain").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedFile {
                content_type: "text/plain".into()
            }
        );
    }

    #[test]
    fn sniffs_pdf_and_png() {
        assert_eq!(sniff_content_type(b"%PDF-1.7\n"), Some("application/pdf"));
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(sniff_content_type(png), Some("image/png"));
        assert_eq!(sniff_content_type(b"hello world"), None);
    }

    #[test]
    fn detect_reads_magic_bytes() {
        let mut tmp = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4 fake boletim").unwrap();
        let file = SelectedFile::detect(tmp.path()).unwrap();
        assert!(file.is_pdf());
        assert!(file.name().ends_with(".bin"));
    }

    #[test]
    fn detect_rejects_empty_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = SelectedFile::detect(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            BoletimError::Validation(ValidationError::EmptyFile { .. })
        ));
    }

    #[test]
    fn detect_missing_file() {
        let err = SelectedFile::detect("/definitely/not/a/boletim.png").unwrap_err();
        assert!(matches!(err, BoletimError::FileNotFound { .. }));
    }
}
