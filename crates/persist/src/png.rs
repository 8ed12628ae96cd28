use crate::store::StoreError;
use garment_canvas::PaintCanvas;
use std::path::Path;

/// Write the canvas as an RGBA PNG, creating parent directories.
pub fn export_png(canvas: &PaintCanvas, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    canvas
        .to_image()
        .save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!("exported {}x{} texture to {}", canvas.width(), canvas.height(), path.display());
    Ok(())
}

/// Read a PNG (any color type) into a canvas.
pub fn import_png(path: impl AsRef<Path>) -> Result<PaintCanvas, StoreError> {
    let image = image::open(path.as_ref())?.into_rgba8();
    Ok(PaintCanvas::from_image(image)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garment_common::Rgba;

    #[test]
    fn export_then_import_keeps_pixels() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("exports").join("paint.png");

        let mut canvas = PaintCanvas::new(32, 16).unwrap();
        canvas.fill_rect(4.0, 4.0, 8.0, 8.0, Rgba([200, 100, 50, 128]));
        export_png(&canvas, &path).unwrap();

        let loaded = import_png(&path).unwrap();
        assert_eq!(loaded.size(), (32, 16));
        assert_eq!(loaded.pixels(), canvas.pixels());
    }

    #[test]
    fn import_missing_file_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(import_png(tmp.path().join("nope.png")).is_err());
    }
}
