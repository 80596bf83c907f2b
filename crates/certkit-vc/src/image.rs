//! # Image Embedding
//!
//! Certificates carry their images inline as `data:` URIs. Images are
//! loaded and encoded once, while the template is built.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::Config;
use crate::error::CredentialError;

/// Read an image file and encode it as a base64 `data:` URI.
///
/// The media type follows the file extension; anything unrecognised is
/// treated as PNG.
pub fn encode_image(path: &Path) -> Result<String, CredentialError> {
    let bytes = std::fs::read(path).map_err(|e| CredentialError::io(path, e))?;
    Ok(format!(
        "data:{};base64,{}",
        media_type(path),
        STANDARD.encode(bytes)
    ))
}

fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

/// Encoded images referenced by the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateImages {
    pub certificate: Option<String>,
    pub issuer_logo: Option<String>,
    pub issuer_signature: Option<String>,
    /// One per configured signature line, in order.
    pub signature_lines: Vec<String>,
}

impl TemplateImages {
    /// Load and encode every image file named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] for the first unreadable file.
    pub fn load(config: &Config) -> Result<Self, CredentialError> {
        let encode = |file: &Option<std::path::PathBuf>| {
            file.as_ref()
                .map(|f| encode_image(&config.resolve(f)))
                .transpose()
        };
        let signature_lines = config
            .issuer_signature_lines
            .iter()
            .map(|line| encode_image(&config.resolve(&line.signature_image)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            certificate: encode(&config.cert_image_file)?,
            issuer_logo: encode(&config.issuer_logo_file)?,
            issuer_signature: encode(&config.issuer_signature_file)?,
            signature_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn png_is_the_default_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(encode_image(&path).unwrap(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(media_type(Path::new("a.png")), "image/png");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = encode_image(Path::new("/nonexistent/logo.png")).unwrap_err();
        assert!(matches!(err, CredentialError::Io { .. }));
    }

    #[test]
    fn load_resolves_against_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cert.png"), b"c").unwrap();
        std::fs::write(dir.path().join("sig.png"), b"s").unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            cert_image_file: Some(PathBuf::from("cert.png")),
            issuer_signature_lines: vec![crate::config::SignatureLine {
                job_title: "Registrar".into(),
                signature_image: PathBuf::from("sig.png"),
                name: "R. Smith".into(),
            }],
            ..Config::default()
        };

        let images = TemplateImages::load(&config).unwrap();
        assert_eq!(images.certificate.as_deref(), Some("data:image/png;base64,Yw=="));
        assert!(images.issuer_logo.is_none());
        assert_eq!(images.signature_lines, vec!["data:image/png;base64,cw==".to_string()]);
    }
}
