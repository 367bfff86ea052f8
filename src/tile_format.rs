use crate::error::{GpkgError, Result};
use std::fmt;

/// Encoding of a stored tile blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileFormat {
    Png,
    Jpeg,
    /// Gzip-compressed Mapbox vector tile.
    Pbf,
    Webp,
    Lerc,
    Tiff,
    /// Cesium quantized-mesh terrain.
    Terrain,
}

impl TileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pbf => "pbf",
            Self::Webp => "webp",
            Self::Lerc => "lerc",
            Self::Tiff => "tiff",
            Self::Terrain => "terrain",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pbf => "application/x-protobuf",
            Self::Webp => "image/webp",
            Self::Lerc => "image/lerc",
            Self::Tiff => "image/tiff",
            Self::Terrain => "application/vnd.quantized-mesh",
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

const SIGNATURES: &[(TileFormat, &[u8])] = &[
    (TileFormat::Png, b"\x89PNG\r\n\x1a\n"),
    (TileFormat::Jpeg, b"\xFF\xD8\xFF"),
    (TileFormat::Pbf, b"\x1F\x8B"),
    (TileFormat::Lerc, b"CntZImage "),
    (TileFormat::Lerc, b"Lerc2 "),
    (TileFormat::Tiff, b"MM"),
    (TileFormat::Tiff, b"II"),
];

/// Size of the fixed quantized-mesh header.
const QUANTIZED_MESH_HEADER_SIZE: usize = 88;

/// Guess the format of a tile from its leading bytes.
///
/// Known magic prefixes are tried first. Otherwise the blob is checked as a
/// quantized-mesh header, which is accepted when its center equals its
/// bounding sphere center.
pub fn detect_tile_format(data: &[u8]) -> Result<TileFormat> {
    for (format, signature) in SIGNATURES {
        if data.starts_with(signature) {
            return Ok(*format);
        }
    }

    // RIFF <u32 size> WEBP
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Ok(TileFormat::Webp);
    }

    if is_quantized_mesh(data) {
        return Ok(TileFormat::Terrain);
    }

    log::debug!("unrecognized tile of {} bytes", data.len());
    Err(GpkgError::UnknownTileFormat)
}

// cf. https://github.com/CesiumGS/quantized-mesh#header
fn is_quantized_mesh(data: &[u8]) -> bool {
    if data.len() < QUANTIZED_MESH_HEADER_SIZE {
        return false;
    }

    let f64_at = |offset: usize| {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&data[offset..offset + 8]);
        f64::from_le_bytes(raw)
    };

    // center xyz, then min/max height as f32, then bounding sphere center xyz
    let center = [f64_at(0), f64_at(8), f64_at(16)];
    let sphere_center = [f64_at(32), f64_at(40), f64_at(48)];

    center == sphere_center
}

#[cfg(test)]
mod tests {
    use super::{TileFormat, detect_tile_format};
    use crate::error::GpkgError;

    fn quantized_mesh_header(center: [f64; 3], sphere_center: [f64; 3]) -> Vec<u8> {
        let mut buf = Vec::new();
        for v in center {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&10.0f32.to_le_bytes());
        buf.extend_from_slice(&250.0f32.to_le_bytes());
        for v in sphere_center {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&1000.0f64.to_le_bytes());
        for v in [0.1f64, 0.2, 0.3] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[test]
    fn png_regardless_of_trailing_bytes() -> crate::Result<()> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_tile_format(&data)?, TileFormat::Png);
        data.extend_from_slice(b"IHDR anything");
        assert_eq!(detect_tile_format(&data)?, TileFormat::Png);
        Ok(())
    }

    #[test]
    fn detects_magic_prefixes() -> crate::Result<()> {
        assert_eq!(detect_tile_format(&[0xFF, 0xD8, 0xFF, 0xE0])?, TileFormat::Jpeg);
        assert_eq!(detect_tile_format(&[0x1F, 0x8B, 0x08])?, TileFormat::Pbf);
        assert_eq!(detect_tile_format(b"MM\x00\x2A")?, TileFormat::Tiff);
        assert_eq!(detect_tile_format(b"II\x2A\x00")?, TileFormat::Tiff);
        assert_eq!(detect_tile_format(b"CntZImage 1")?, TileFormat::Lerc);
        assert_eq!(detect_tile_format(b"Lerc2 \x03")?, TileFormat::Lerc);
        assert_eq!(
            detect_tile_format(b"RIFF\xc0\x00\x00\x00WEBPVP8 ")?,
            TileFormat::Webp
        );
        Ok(())
    }

    #[test]
    fn empty_buffer_is_unknown() {
        assert!(matches!(
            detect_tile_format(&[]),
            Err(GpkgError::UnknownTileFormat)
        ));
    }

    #[test]
    fn detects_quantized_mesh_header() -> crate::Result<()> {
        let center = [1_234_567.5, -4_567_890.25, 3_987_654.0];
        let data = quantized_mesh_header(center, center);
        assert_eq!(detect_tile_format(&data)?, TileFormat::Terrain);

        let data = quantized_mesh_header(center, [0.0, 0.0, 0.0]);
        assert!(matches!(
            detect_tile_format(&data),
            Err(GpkgError::UnknownTileFormat)
        ));

        let data = quantized_mesh_header(center, center);
        assert!(matches!(
            detect_tile_format(&data[..40]),
            Err(GpkgError::UnknownTileFormat)
        ));
        Ok(())
    }

    #[test]
    fn format_metadata() {
        assert_eq!(TileFormat::Terrain.content_type(), "application/vnd.quantized-mesh");
        assert_eq!(TileFormat::Jpeg.to_string(), "jpg");
    }
}
