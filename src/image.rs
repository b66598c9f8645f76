use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::TrackerError;

/// Largest image accepted for analysis.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// MIME type for a supported image extension, case-insensitive.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Checks the things a user must supply before any analysis runs and
/// hands back the image path.
pub fn validate_request<'a>(
    image: Option<&'a Path>,
    plant_id: &str,
) -> Result<&'a Path, TrackerError> {
    match image {
        Some(image) if !plant_id.trim().is_empty() => Ok(image),
        _ => Err(missing_input()),
    }
}

pub(crate) fn missing_input() -> TrackerError {
    TrackerError::InvalidInput("Selecciona una imagen e ingresa un ID de planta".to_string())
}

/// Reads an image file into an embedded `data:` URI.
pub async fn load_data_uri(path: &Path) -> Result<String, TrackerError> {
    let mime = mime_for(path).ok_or_else(|| {
        TrackerError::InvalidInput(format!(
            "Formato de imagen no soportado: {} (usa jpg, jpeg, png, gif o webp)",
            path.display()
        ))
    })?;

    let read_err = |source| TrackerError::ImageRead {
        path: path.to_path_buf(),
        source,
    };
    let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
    if metadata.len() > MAX_IMAGE_BYTES {
        return Err(TrackerError::InvalidInput(format!(
            "La imagen pesa {} bytes; el máximo es {MAX_IMAGE_BYTES}",
            metadata.len()
        )));
    }
    let bytes = tokio::fs::read(path).await.map_err(read_err)?;
    Ok(to_data_uri(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_for(Path::new("hoja.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("a/b/flor.png")), Some("image/png"));
        assert_eq!(mime_for(Path::new("notas.txt")), None);
        assert_eq!(mime_for(Path::new("sin_extension")), None);
    }

    #[test]
    fn encodes_data_uri() {
        assert_eq!(to_data_uri("image/png", b"hola"), "data:image/png;base64,aG9sYQ==");
    }

    #[test]
    fn requires_image_and_plant_id() {
        let image = PathBuf::from("foto.jpg");
        assert!(validate_request(Some(image.as_path()), "p1").is_ok());
        assert!(validate_request(None, "p1").unwrap_err().is_input_error());
        assert!(validate_request(Some(image.as_path()), "   ").unwrap_err().is_input_error());
    }

    #[tokio::test]
    async fn loads_file_as_data_uri() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planta.jpeg");
        std::fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let uri = load_data_uri(&path).await.unwrap();
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");
    }

    #[tokio::test]
    async fn rejects_unsupported_and_missing_files() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("planta.txt");
        std::fs::write(&text, "no soy imagen").unwrap();
        assert!(load_data_uri(&text).await.unwrap_err().is_input_error());

        let missing = dir.path().join("nada.png");
        let err = load_data_uri(&missing).await.unwrap_err();
        assert!(matches!(err, TrackerError::ImageRead { .. }));
    }
}
