use std::fs;
use std::path::{Path, PathBuf};

use msl::ast::ShaderKind;

/// Discover all .msl files in the shaders/ directory
pub fn discover_shaders() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");

    let mut shaders: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("Failed to read shaders directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("msl"))
        .collect();
    shaders.sort();
    shaders
}

/// Load a shader from shaders/ by file stem
pub fn load_shader(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("shaders")
        .join(format!("{}.msl", name));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e))
}

/// The target whose entry point the source defines
pub fn kind_of(source: &str) -> ShaderKind {
    [ShaderKind::Vertex, ShaderKind::Pixel, ShaderKind::Vm]
        .into_iter()
        .find(|kind| source.contains(&format!("void {}(", kind.entry_point())))
        .expect("shader defines no entry point")
}
