pub mod monte_carlo;
pub mod presets;
pub mod scenario;
