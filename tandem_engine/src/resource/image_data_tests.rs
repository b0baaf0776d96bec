use super::*;
use crate::error::ErrorKind;

// ============================================================================
// Construction tests
// ============================================================================

#[test]
fn test_new_accepts_exact_size() {
    let image = ImageData::new(2, 3, vec![0; 24]).unwrap();
    assert_eq!(image.byte_size(), 24);
}

#[test]
fn test_new_rejects_short_buffer() {
    let err = ImageData::new(2, 2, vec![0; 15]).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn test_new_rejects_long_buffer() {
    let err = ImageData::new(1, 1, vec![0; 8]).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn test_payload_matches_extent() {
    let image = ImageData::new(3, 2, vec![7; 24]).unwrap();
    assert_eq!(image.pixels().len(), (image.width() * image.height() * 4) as usize);
}

#[test]
fn test_new_rejects_zero_extent() {
    assert!(ImageData::new(0, 4, Vec::new()).is_err());
}

#[test]
fn test_solid_is_one_texel() {
    let image = ImageData::solid([255, 255, 255, 255]);
    assert_eq!((image.width(), image.height()), (1, 1));
    assert_eq!(image.pixels(), &[255; 4][..]);
}

// ============================================================================
// Decoding tests
// ============================================================================

#[test]
fn test_load_rgba8_missing_file_is_load_error() {
    let err = load_rgba8(Path::new("definitely/not/here.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
}

#[test]
fn test_load_rgba8_round_trips_png() {
    let dir = std::env::temp_dir().join("tandem_image_data_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("checker.png");

    let mut source = image::RgbaImage::new(2, 1);
    source.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    source.put_pixel(1, 0, image::Rgba([0, 0, 255, 128]));
    source.save(&path).unwrap();

    let loaded = load_rgba8(&path).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (2, 1));
    assert_eq!(loaded.pixels(), &[255, 0, 0, 255, 0, 0, 255, 128][..]);
}
