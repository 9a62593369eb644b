//! Point marker textures shared between point clouds.
//!
//! Markers are small RGBA sprites rasterized from a symbol name. A
//! [`MarkerRegistry`] owns one texture per symbol and counts the primitives
//! using it; the texture is dropped when the last user releases it.

use std::collections::HashMap;

use crate::error::{GeoSceneError, Result};

/// Edge length in pixels of a rasterized marker.
pub const MARKER_SIZE: usize = 32;

/// Symbols that can be rasterized into a marker texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerSymbol {
    Circle,
    Square,
    Diamond,
    Cross,
    Triangle,
}

impl MarkerSymbol {
    /// Parses a symbol name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "circle" => Some(Self::Circle),
            "square" => Some(Self::Square),
            "diamond" => Some(Self::Diamond),
            "cross" => Some(Self::Cross),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    /// Coverage test in normalized sprite coordinates `[-1, 1]²`, y up.
    fn covers(self, x: f32, y: f32) -> bool {
        match self {
            Self::Circle => x * x + y * y <= 1.0,
            Self::Square => x.abs() <= 0.8 && y.abs() <= 0.8,
            Self::Diamond => x.abs() + y.abs() <= 1.0,
            Self::Cross => x.abs() <= 0.25 || y.abs() <= 0.25,
            Self::Triangle => y >= -0.8 && y <= 1.0 - 2.0 * x.abs(),
        }
    }
}

/// An RGBA marker sprite, white with coverage in the alpha channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTexture {
    /// Symbol this texture was rasterized from.
    pub symbol: MarkerSymbol,
    /// Edge length in pixels.
    pub size: usize,
    /// Row-major RGBA8 pixels.
    pub pixels: Vec<u8>,
}

impl MarkerTexture {
    /// Rasterizes a symbol at [`MARKER_SIZE`].
    #[must_use]
    pub fn rasterize(symbol: MarkerSymbol) -> Self {
        let size = MARKER_SIZE;
        let mut pixels = Vec::with_capacity(size * size * 4);
        let scale = 2.0 / size as f32;
        for row in 0..size {
            for col in 0..size {
                let x = (col as f32 + 0.5) * scale - 1.0;
                let y = 1.0 - (row as f32 + 0.5) * scale;
                let alpha = if symbol.covers(x, y) { 255 } else { 0 };
                pixels.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        Self {
            symbol,
            size,
            pixels,
        }
    }

    /// Number of covered pixels.
    #[must_use]
    pub fn coverage(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }
}

/// A counted reference to a marker texture held by a primitive.
///
/// Handles are not `Clone`: every handle corresponds to exactly one
/// [`MarkerRegistry::acquire`] and must be given back through
/// [`MarkerRegistry::release`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle {
    symbol: MarkerSymbol,
}

impl MarkerHandle {
    /// Symbol of the referenced texture.
    #[must_use]
    pub fn symbol(&self) -> MarkerSymbol {
        self.symbol
    }
}

struct MarkerEntry {
    texture: MarkerTexture,
    users: usize,
}

/// Reference-counted cache of marker textures keyed by symbol.
#[derive(Default)]
pub struct MarkerRegistry {
    entries: HashMap<MarkerSymbol, MarkerEntry>,
}

impl MarkerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a reference to the texture for `name`, rasterizing it on first use.
    pub fn acquire(&mut self, name: &str) -> Result<MarkerHandle> {
        let symbol = MarkerSymbol::from_name(name).ok_or_else(|| {
            log::error!("unknown marker symbol '{name}'");
            GeoSceneError::UnknownMarker(name.to_string())
        })?;
        let entry = self.entries.entry(symbol).or_insert_with(|| {
            log::debug!("rasterizing marker texture {symbol:?}");
            MarkerEntry {
                texture: MarkerTexture::rasterize(symbol),
                users: 0,
            }
        });
        entry.users += 1;
        Ok(MarkerHandle { symbol })
    }

    /// Gives a reference back; the texture is disposed when no users remain.
    pub fn release(&mut self, handle: MarkerHandle) {
        let Some(entry) = self.entries.get_mut(&handle.symbol) else {
            log::warn!("released marker {:?} that is not cached", handle.symbol);
            return;
        };
        entry.users -= 1;
        if entry.users == 0 {
            log::debug!("disposing marker texture {:?}", handle.symbol);
            self.entries.remove(&handle.symbol);
        }
    }

    /// Returns the texture behind a handle.
    pub fn texture(&self, handle: &MarkerHandle) -> Option<&MarkerTexture> {
        self.entries.get(&handle.symbol).map(|e| &e.texture)
    }

    /// Number of live users of a symbol's texture.
    pub fn users(&self, name: &str) -> usize {
        MarkerSymbol::from_name(name)
            .and_then(|s| self.entries.get(&s))
            .map_or(0, |e| e.users)
    }

    /// Number of cached textures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no texture is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_symbols() {
        let circle = MarkerTexture::rasterize(MarkerSymbol::Circle);
        let square = MarkerTexture::rasterize(MarkerSymbol::Square);
        let diamond = MarkerTexture::rasterize(MarkerSymbol::Diamond);
        assert_eq!(circle.pixels.len(), MARKER_SIZE * MARKER_SIZE * 4);
        assert!(circle.coverage() > diamond.coverage());
        assert!(square.coverage() > diamond.coverage());
        assert!(circle.coverage() < MARKER_SIZE * MARKER_SIZE);
    }

    #[test]
    fn test_shared_texture_survives_first_release() {
        let mut registry = MarkerRegistry::new();
        let a = registry.acquire("circle").unwrap();
        let b = registry.acquire("circle").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.users("circle"), 2);

        registry.release(a);
        assert!(registry.texture(&b).is_some());
        assert_eq!(registry.users("circle"), 1);

        registry.release(b);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_symbol() {
        let mut registry = MarkerRegistry::new();
        assert!(matches!(
            registry.acquire("hexagram"),
            Err(GeoSceneError::UnknownMarker(_))
        ));
        assert!(registry.is_empty());
    }
}
