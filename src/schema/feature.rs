use crate::error::Result;
use crate::types::Value;
use geo_traits::GeometryTrait;
use wkb::reader::Wkb;

/// A feature-like record: optional identity, WKB geometry and named
/// attributes in insertion order.
///
/// Attribute names are lower-cased on insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    id: Option<Value>,
    geometry: Vec<u8>,
    properties: Vec<(String, Value)>,
}

impl Feature {
    /// Encode `geometry` to WKB and attach the properties.
    pub fn new<G, I, K, V>(geometry: &G, properties: I) -> Result<Self>
    where
        G: GeometryTrait<T = f64>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut wkb = Vec::new();
        wkb::writer::write_geometry(&mut wkb, geometry, &Default::default())?;
        Self::from_wkb(wkb, properties)
    }

    /// Build a feature from an already encoded WKB geometry.
    pub fn from_wkb<I, K, V>(wkb: Vec<u8>, properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Wkb::try_new(&wkb)?;
        let mut feature = Self {
            id: None,
            geometry: wkb,
            properties: Vec::new(),
        };
        for (name, value) in properties {
            feature.set_property(name, value);
        }
        Ok(feature)
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set or replace a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((name, value)),
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn wkb(&self) -> &[u8] {
        &self.geometry
    }

    pub fn geometry(&self) -> Result<Wkb<'_>> {
        Ok(Wkb::try_new(&self.geometry)?)
    }
}
