//! Built-in demo sculptures

/// Name and source of every bundled demo
pub const DEMOS: &[(&str, &str)] = &[
    ("menger", include_str!("../../../demos/menger.rhai")),
    ("sphere", include_str!("../../../demos/sphere.rhai")),
    ("rainbow_terrain", include_str!("../../../demos/rainbow_terrain.rhai")),
    ("checker_cube", include_str!("../../../demos/checker_cube.rhai")),
    ("lattice", include_str!("../../../demos/lattice.rhai")),
];

/// The demo run when no name is given
pub const DEFAULT_DEMO: &str = "menger";

pub fn find(name: &str) -> Option<&'static str> {
    DEMOS
        .iter()
        .find(|(demo, _)| demo.eq_ignore_ascii_case(name))
        .map(|(_, source)| *source)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    DEMOS.iter().map(|(name, _)| *name)
}
