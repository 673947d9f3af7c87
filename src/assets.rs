use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use strata_blocks::BlockStateTable;

use crate::config::AssetsConfig;

/// Decoded RGBA8 image.
#[derive(Clone, Debug)]
pub struct TextureHandle {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

/// Loaded textures keyed by asset id. Cleared only by [`TextureCache::clear`].
#[derive(Default)]
pub struct TextureCache {
    map: HashMap<String, TextureHandle>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&TextureHandle> {
        self.map.get(id)
    }

    pub fn insert(&mut self, tex: TextureHandle) {
        self.map.insert(tex.id.clone(), tex);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Resolves versioned asset paths against a list of roots and loads them.
pub struct AssetLoader {
    roots: Vec<PathBuf>,
    fallback_version: Option<String>,
    textures: TextureCache,
}

impl AssetLoader {
    pub fn new(roots: Vec<PathBuf>, fallback_version: Option<String>) -> Self {
        Self {
            roots,
            fallback_version: fallback_version.filter(|v| !v.is_empty()),
            textures: TextureCache::new(),
        }
    }

    /// Roots in order: the working directory's `public/`, then the configured root.
    pub fn from_config(cfg: &AssetsConfig) -> Self {
        let mut roots = vec![PathBuf::from("public")];
        if let Some(root) = cfg.root.clone() {
            roots.push(root);
        }
        Self::new(roots, cfg.fallback_version.clone())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn clear_cache(&mut self) {
        self.textures.clear();
    }

    /// `textures/<v>.png`, `textures/<v>/<rest>` and `blocksStates/<v>.toml`
    /// rewritten to the fallback version. `None` for other paths.
    fn with_fallback_version(&self, rel: &str) -> Option<String> {
        let fb = self.fallback_version.as_deref()?;
        if let Some(rest) = rel.strip_prefix("textures/") {
            if let Some((_, tail)) = rest.split_once('/') {
                return Some(format!("textures/{fb}/{tail}"));
            }
            if rest.ends_with(".png") {
                return Some(format!("textures/{fb}.png"));
            }
        }
        if let Some(rest) = rel.strip_prefix("blocksStates/") {
            if !rest.contains('/') && rest.ends_with(".toml") {
                return Some(format!("blocksStates/{fb}.toml"));
            }
        }
        None
    }

    /// First existing candidate; the first candidate when none exists.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        let direct = Path::new(rel);
        if direct.is_absolute() {
            return direct.to_path_buf();
        }
        let mut candidates: Vec<PathBuf> = self.roots.iter().map(|r| r.join(rel)).collect();
        if let Some(fb) = self.with_fallback_version(rel) {
            candidates.extend(self.roots.iter().map(|r| r.join(&fb)));
        }
        for c in &candidates {
            if c.exists() {
                return c.clone();
            }
        }
        candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| direct.to_path_buf())
    }

    pub fn load_texture(&mut self, id: &str) -> Result<TextureHandle, Box<dyn Error>> {
        if let Some(tex) = self.textures.get(id) {
            return Ok(tex.clone());
        }
        let path = self.resolve(id);
        let img = image::open(&path)
            .map_err(|e| format!("texture {id} ({}): {e}", path.display()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let tex = TextureHandle {
            id: id.to_string(),
            width,
            height,
            rgba: Arc::from(img.into_raw()),
        };
        log::info!(target: "assets", "loaded texture {} ({}x{}) from {:?}", id, width, height, path);
        self.textures.insert(tex.clone());
        Ok(tex)
    }

    pub fn load_block_descriptor_table(
        &self,
        version: &str,
    ) -> Result<Arc<BlockStateTable>, Box<dyn Error>> {
        let path = self.resolve(&format!("blocksStates/{version}.toml"));
        let table = BlockStateTable::from_path(&path)
            .map_err(|e| format!("descriptor table {}: {e}", path.display()))?;
        log::info!(
            target: "assets",
            "loaded {} block states for {} from {:?}",
            table.len(),
            version,
            path
        );
        Ok(Arc::new(table))
    }
}
