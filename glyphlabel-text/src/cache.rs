//! Atlas caches.
//!
//! A label asks its cache for the atlas matching the current pixel size
//! and never rasterizes on its own. Two strategies ship:
//!
//! - [`LabelAtlasCache`] — owned by exactly one label, keyed by pixel size.
//! - [`SharedAtlasCache`] — a cloneable handle onto one LRU keyed by
//!   `(face id, pixel size)`, so labels sharing a face share atlases.
//!
//! Both hand out `Rc<GlyphAtlas>`; an atlas is never mutated once built,
//! so eviction only drops the cache's own reference.

use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;

use crate::atlas::GlyphAtlas;
use crate::error::Result;
use crate::face::Rasterizer;

/// Get-or-build access to glyph atlases.
pub trait AtlasCache<R: Rasterizer + ?Sized> {
    /// Return the atlas for `face` at `pixel_size`, building it on first use.
    fn get_or_build(&mut self, face: &mut R, pixel_size: u32) -> Result<Rc<GlyphAtlas>>;

    /// Whether an atlas for this face and size is already cached.
    fn contains(&self, face_id: u64, pixel_size: u32) -> bool;

    /// Number of cached atlases.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Per-label cache ─────────────────────────────────────────────────

/// Atlases for a single face, keyed by pixel size.
#[derive(Debug, Default)]
pub struct LabelAtlasCache {
    face_id: Option<u64>,
    atlases: HashMap<u32, Rc<GlyphAtlas>>,
}

impl LabelAtlasCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached pixel sizes, ascending.
    pub fn sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.atlases.keys().copied().collect();
        sizes.sort_unstable();
        sizes
    }
}

impl<R: Rasterizer + ?Sized> AtlasCache<R> for LabelAtlasCache {
    fn get_or_build(&mut self, face: &mut R, pixel_size: u32) -> Result<Rc<GlyphAtlas>> {
        let face_id = face.face_id();
        let same_face = self.face_id == Some(face_id);
        if same_face {
            if let Some(atlas) = self.atlases.get(&pixel_size) {
                return Ok(Rc::clone(atlas));
            }
        }

        // Old-face atlases survive a failed build.
        let atlas = Rc::new(GlyphAtlas::build(face, pixel_size)?);
        if !same_face {
            if !self.atlases.is_empty() {
                log::debug!(
                    "LabelAtlasCache: face changed, dropping {} atlases",
                    self.atlases.len()
                );
            }
            self.atlases.clear();
            self.face_id = Some(face_id);
        }
        self.atlases.insert(pixel_size, Rc::clone(&atlas));
        Ok(atlas)
    }

    fn contains(&self, face_id: u64, pixel_size: u32) -> bool {
        self.face_id == Some(face_id) && self.atlases.contains_key(&pixel_size)
    }

    fn len(&self) -> usize {
        self.atlases.len()
    }
}

// ── Shared cache ────────────────────────────────────────────────────

type SharedKey = (u64, u32);

/// Cloneable handle onto an LRU of atlases shared by many labels.
#[derive(Clone)]
pub struct SharedAtlasCache {
    inner: Rc<RefCell<LruCache<SharedKey, Rc<GlyphAtlas>>>>,
}

impl SharedAtlasCache {
    /// A cache holding at most `capacity` atlases.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LruCache::new(capacity))),
        }
    }

    /// A cache that never evicts.
    pub fn unbounded() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LruCache::unbounded())),
        }
    }

    /// Drop every cached atlas. Labels keep the atlases they hold.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}

impl Default for SharedAtlasCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for SharedAtlasCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SharedAtlasCache")
            .field("len", &inner.len())
            .field("cap", &inner.cap())
            .finish()
    }
}

impl<R: Rasterizer + ?Sized> AtlasCache<R> for SharedAtlasCache {
    fn get_or_build(&mut self, face: &mut R, pixel_size: u32) -> Result<Rc<GlyphAtlas>> {
        let key = (face.face_id(), pixel_size);
        if let Some(atlas) = self.inner.borrow_mut().get(&key) {
            return Ok(Rc::clone(atlas));
        }

        let atlas = Rc::new(GlyphAtlas::build(face, pixel_size)?);
        if let Some((evicted, _)) = self.inner.borrow_mut().push(key, Rc::clone(&atlas)) {
            if evicted != key {
                log::debug!(
                    "SharedAtlasCache: evicted face {} at {}px",
                    evicted.0,
                    evicted.1
                );
            }
        }
        Ok(atlas)
    }

    fn contains(&self, face_id: u64, pixel_size: u32) -> bool {
        self.inner.borrow().contains(&(face_id, pixel_size))
    }

    fn len(&self) -> usize {
        self.inner.borrow().len()
    }
}

// ===================================================================
// Tests
// ===================================================================
