pub mod engine;
pub mod logging;
pub mod renderer;
pub mod world;
