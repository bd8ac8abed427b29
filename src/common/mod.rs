//! Scene files shared by the library and the command-line tool.

pub mod scene;

pub use scene::{Node, Scene, SceneLoadError, load_scene};
