/// Renderer module - the public operations and their configuration

pub mod renderer;

#[cfg(test)]
pub(crate) mod mock_renderer;

pub use renderer::*;
