pub mod event;
mod input;
mod layer;
mod loop_runner;
mod metrics;
mod rendering;
mod resources;
mod view;

pub use input::translate_window_event;
pub use layer::{Layer, LayerCommand, LayerId, LayerStack};
pub use loop_runner::{AppError, Application, LayerBuildContext, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{FrameCanvas, Renderer, SpriteRenderer, CLEAR_COLOR};
pub use resources::{ResourceError, ResourceManager, Texture, TextureHandle};
pub use view::{MapView, Projection, Viewport, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
