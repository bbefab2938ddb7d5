//! Decoded image data, ready for GPU upload.

use crate::error::AssetError;

/// An 8-bit RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// A single opaque white texel.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }
}

/// Six square faces in `+X, -X, +Y, -Y, +Z, -Z` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeTextureData {
    pub size: u32,
    pub faces: Vec<TextureData>,
}

/// Decodes PNG or JPEG bytes into RGBA.
pub fn decode_texture(name: &str, bytes: &[u8]) -> Result<TextureData, AssetError> {
    let image = image::load_from_memory(bytes)
        .map_err(|source| AssetError::Decode {
            name: name.to_string(),
            source,
        })?
        .to_rgba8();
    Ok(TextureData {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Checks that six decoded faces are square and the same size.
pub fn decode_cube(faces: Vec<TextureData>) -> Result<CubeTextureData, AssetError> {
    if faces.len() != 6 {
        return Err(AssetError::CubeFaceCount(faces.len()));
    }
    let size = faces[0].width;
    for (index, face) in faces.iter().enumerate() {
        if face.width != size || face.height != size {
            return Err(AssetError::CubeFaceSize {
                index,
                width: face.width,
                height: face.height,
                expected: size,
            });
        }
    }
    Ok(CubeTextureData { size, faces })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    /// Encodes a solid-color PNG.
    pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let texture = decode_texture("red.png", &png_bytes(3, 2, [255, 0, 0, 128])).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.rgba.len(), 3 * 2 * 4);
        assert_eq!(&texture.rgba[..4], &[255, 0, 0, 128]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_texture("junk.png", b"not an image"),
            Err(AssetError::Decode { .. })
        ));
    }

    #[test]
    fn test_cube_requires_six_square_faces() {
        let face = |w, h| TextureData {
            width: w,
            height: h,
            rgba: vec![0; (w * h * 4) as usize],
        };
        assert!(decode_cube(vec![face(4, 4); 6]).is_ok());
        assert!(matches!(
            decode_cube(vec![face(4, 4); 5]),
            Err(AssetError::CubeFaceCount(5))
        ));

        let mut faces = vec![face(4, 4); 6];
        faces[3] = face(4, 2);
        assert!(matches!(
            decode_cube(faces),
            Err(AssetError::CubeFaceSize { index: 3, .. })
        ));
    }
}
