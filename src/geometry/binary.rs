use super::bounds::{Extent, bounding_box};
use super::{BinaryHeader, ByteOrder, EnvelopeType};
use crate::error::{GpkgError, Result};
use geo_traits::GeometryTrait;
use wkb::reader::Wkb;

/// A geometry as persisted in a GeoPackage geometry column: binary header
/// followed by the WKB payload.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardBinary {
    header: BinaryHeader,
    srs_id: i32,
    wkb: Vec<u8>,
}

impl StandardBinary {
    /// Encode a geometry with an XY envelope computed from its bounding box.
    /// Empty geometries get a NaN envelope and the empty flag.
    pub fn new<G: GeometryTrait<T = f64>>(srs_id: i32, geometry: &G) -> Result<Self> {
        let mut wkb = Vec::new();
        wkb::writer::write_geometry(&mut wkb, geometry, &Default::default())?;
        let header = header_for_geometry(srs_id, geometry)?;
        Ok(Self {
            header,
            srs_id,
            wkb,
        })
    }

    /// Wrap an already encoded WKB payload.
    pub fn from_wkb(srs_id: i32, wkb: &[u8]) -> Result<Self> {
        let geometry = Wkb::try_new(wkb)?;
        let header = header_for_geometry(srs_id, &geometry)?;
        Ok(Self {
            header,
            srs_id,
            wkb: geometry.buf().to_vec(),
        })
    }

    /// Pair an explicit header with a WKB payload.
    pub fn from_parts(header: BinaryHeader, srs_id: i32, wkb: Vec<u8>) -> Result<Self> {
        if header.srs_id() != srs_id {
            return Err(GpkgError::SrsIdMismatch {
                header: header.srs_id(),
                binary: srs_id,
            });
        }
        Wkb::try_new(&wkb)?;
        Ok(Self {
            header,
            srs_id,
            wkb,
        })
    }

    /// Write the header with another byte order.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.header = self.header.with_byte_order(byte_order);
        self
    }

    /// Parse a stored blob. Unlike [`BinaryHeader::decode`], a wrong magic is
    /// an error here.
    pub fn decode(b: &[u8]) -> Result<Self> {
        let header = BinaryHeader::decode(b)?.into_result()?;
        let geometry = Wkb::try_new(&b[header.size()..])?;
        let wkb = geometry.buf().to_vec();
        Ok(Self {
            srs_id: header.srs_id(),
            header,
            wkb,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header.size() + self.wkb.len());
        self.header.encode_to(&mut buf);
        buf.extend_from_slice(&self.wkb);
        buf
    }

    pub fn header(&self) -> &BinaryHeader {
        &self.header
    }

    pub fn srs_id(&self) -> i32 {
        self.srs_id
    }

    /// Raw WKB payload without the header.
    pub fn wkb(&self) -> &[u8] {
        &self.wkb
    }

    pub fn geometry(&self) -> Result<Wkb<'_>> {
        Ok(Wkb::try_new(&self.wkb)?)
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Bounding box computed from the payload; `None` when empty.
    pub fn extent(&self) -> Option<Extent> {
        if self.header.is_empty() {
            return None;
        }
        let geometry = self.geometry().ok()?;
        bounding_box(&geometry)
    }
}

fn header_for_geometry<G: GeometryTrait<T = f64>>(
    srs_id: i32,
    geometry: &G,
) -> Result<BinaryHeader> {
    let (envelope, empty) = match bounding_box(geometry) {
        Some(extent) => (extent.to_envelope(), false),
        None => (vec![f64::NAN; 4], true),
    };
    BinaryHeader::new(
        ByteOrder::LittleEndian,
        srs_id,
        envelope,
        EnvelopeType::Xy,
        false,
        empty,
    )
}
