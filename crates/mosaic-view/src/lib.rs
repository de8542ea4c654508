pub mod cull;
pub mod export;
pub mod hit;
pub mod route;
pub mod viewport;

pub use cull::{CullConfig, CullReport, VisibilityCuller};
pub use export::ExportSnapshot;
pub use route::{CUT_SAMPLES, Route, RouteCache};
pub use viewport::{Placement, ViewportConfig, ViewportModel};
