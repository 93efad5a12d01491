//! Asset identity, fetching and caching
//!
//! Layer artwork is addressed by [`ResourceIdentity`], a structured key that
//! names a category, a variant, an optional authored color and an optional
//! body-type discriminator. Identities resolve to relative paths through
//! [`crate::avatar::paths`], are fetched through an [`AssetFetch`] backend and
//! land in the [`ResourceCache`] as decoded [`RasterSheet`]s.

pub mod cache;
pub mod fetch;

pub use cache::{ResourceCache, ResourceCacheStats};
pub use fetch::{backend_fetcher, AssetFetch, FileFetcher, HttpFetcher};

use crate::avatar::configuration::BodyType;
use image::RgbaImage;
use thiserror::Error;

/// Resource categories understood by the path resolver.
///
/// Background and foreground wing plates are separate categories because they
/// are distinct draw calls even when a style ships both in one sheet, and the
/// hair back plate is likewise addressed independently of the front plate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Body,
    Head,
    Eyes,
    Hair,
    HairBack,
    Beard,
    Top,
    Bottom,
    Shoes,
    Hat,
    Glasses,
    WingsBackground,
    WingsForeground,
    Tail,
    Horns,
    Ears,
    Accessory,
    /// Escape hatch for catalog entries the resolver has no dedicated rule
    /// for. Resolved with a best-guess pattern and a warning, never an error.
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Body => "body",
            Category::Head => "head",
            Category::Eyes => "eyes",
            Category::Hair => "hair",
            Category::HairBack => "hair_back",
            Category::Beard => "beard",
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Shoes => "shoes",
            Category::Hat => "hat",
            Category::Glasses => "glasses",
            Category::WingsBackground => "wings_background",
            Category::WingsForeground => "wings_foreground",
            Category::Tail => "tail",
            Category::Horns => "horns",
            Category::Ears => "ears",
            Category::Accessory => "accessory",
            Category::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured cache key for one layer's artwork.
///
/// Two identities compare equal exactly when they would produce the same
/// cache slot. The resolved path is derived data; aliased body types that
/// collapse onto the same file still occupy separate slots on purpose, so
/// the cache never has to understand the alias tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    pub category: Category,
    /// Variant tokens, most significant first (style, then sub-variant).
    pub variants: Vec<String>,
    /// Authored color file to select, for categories shipped per color.
    pub color: Option<String>,
    /// Body type the file is fitted to, for categories that vary by body.
    pub body: Option<BodyType>,
}

impl ResourceIdentity {
    pub fn new(category: Category, variant: impl Into<String>) -> Self {
        Self {
            category,
            variants: vec![variant.into()],
            color: None,
            body: None,
        }
    }

    /// Identity with no variant token, for categories keyed by color alone.
    pub fn bare(category: Category) -> Self {
        Self {
            category,
            variants: Vec::new(),
            color: None,
            body: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variants.push(variant.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_body(mut self, body: BodyType) -> Self {
        self.body = Some(body);
        self
    }

    /// Relative path of the backing file under the asset root.
    pub fn resolve_path(&self) -> String {
        crate::avatar::paths::resolve(self)
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category)?;
        for variant in &self.variants {
            write!(f, "/{variant}")?;
        }
        if let Some(color) = &self.color {
            write!(f, ":{color}")?;
        }
        if let Some(body) = self.body {
            write!(f, "@{body}")?;
        }
        Ok(())
    }
}

/// Why a layer sheet could not be produced.
///
/// Failures are cloneable so the cache can memoize one outcome and hand it
/// to every interested caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    #[error("asset not found: {path}")]
    NotFound { path: String },

    #[error("asset fetch timed out after {seconds}s: {path}")]
    Timeout { path: String, seconds: u64 },

    #[error("asset decode failed for {path}: {reason}")]
    Decode { path: String, reason: String },
}

pub type LoadResult<T> = Result<T, LoadFailure>;

/// A decoded layer sheet in RGBA form.
///
/// Sheets are laid out on a fixed square grid. A full sheet carries one row
/// per animation row of the composed output; a narrow sheet carries only the
/// walk block and relies on row fallback at draw time.
#[derive(Clone)]
pub struct RasterSheet {
    pub image: RgbaImage,
    /// Edge length of one frame cell in pixels.
    pub frame_size: u32,
    /// Whole frame rows available in the image.
    pub rows: u32,
    /// Whole frame columns available in the image.
    pub cols: u32,
}

impl RasterSheet {
    /// Decode PNG (or any supported container) bytes into a sheet.
    ///
    /// Dimensions are not required to be exact grid multiples; partial
    /// trailing rows and columns are ignored. An image smaller than a single
    /// frame is a decode failure.
    pub fn from_bytes(bytes: &[u8], frame_size: u32, path: &str) -> LoadResult<Self> {
        let decoded = image::load_from_memory(bytes).map_err(|err| LoadFailure::Decode {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        let image = decoded.to_rgba8();
        let rows = image.height() / frame_size;
        let cols = image.width() / frame_size;
        if rows == 0 || cols == 0 {
            return Err(LoadFailure::Decode {
                path: path.to_string(),
                reason: format!(
                    "sheet is {}x{} px, smaller than one {frame_size} px frame",
                    image.width(),
                    image.height()
                ),
            });
        }
        Ok(Self {
            image,
            frame_size,
            rows,
            cols,
        })
    }

    pub fn has_column(&self, col: u32) -> bool {
        col < self.cols
    }
}

impl std::fmt::Debug for RasterSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSheet")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("frame_size", &self.frame_size)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}
