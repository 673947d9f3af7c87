//! Streams a voxel world into section meshes across a fixed worker pool.
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod dispatch;
pub mod scene;
pub mod settle;
pub mod stream;

pub use assets::{AssetLoader, TextureCache, TextureHandle};
pub use config::Config;
pub use dispatch::{DispatchController, DispatchStats};
pub use scene::{HeadlessMesh, HeadlessScene, MeshId, Scene, SceneSync};
pub use settle::Settle;
pub use stream::StreamEvent;

pub use strata_blocks as blocks;
pub use strata_mesh as mesh;
pub use strata_runtime as runtime;
pub use strata_world as world;
