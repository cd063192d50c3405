use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event as WinitEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::{resolve_app_paths, AppPaths, StartupError};

use super::event::{EventKind, KeyCode, KeyPressed};
use super::input::translate_window_event;
use super::layer::{Layer, LayerId, LayerStack};
use super::metrics::{FrameSample, MetricsAccumulator};
use super::rendering::{Renderer, CLEAR_COLOR};
use super::resources::ResourceManager;
use super::view::{MapView, Viewport};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub clear_color: [u8; 4],
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tramline".to_string(),
            window_width: 1024,
            window_height: 1024,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            clear_color: CLEAR_COLOR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to build layer: {0}")]
    LayerBuild(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// What a layer may touch while it is being constructed, before the first frame.
pub struct LayerBuildContext<'a> {
    pub resources: &'a mut ResourceManager,
    pub paths: &'a AppPaths,
    pub view: &'a mut MapView,
}

/// Owns the layer stack and the shared state it works against, and drives the frame loop.
pub struct Application {
    config: LoopConfig,
    paths: AppPaths,
    resources: ResourceManager,
    view: MapView,
    layers: LayerStack,
}

impl Application {
    pub fn new(config: LoopConfig) -> Result<Self, AppError> {
        let paths = resolve_app_paths()?;
        info!(
            root = %paths.root.display(),
            assets_dir = %paths.assets_dir.display(),
            "startup"
        );
        Ok(Self::with_paths(config, paths))
    }

    pub fn with_paths(config: LoopConfig, paths: AppPaths) -> Self {
        let resources = ResourceManager::new(paths.assets_dir.clone());
        let view = MapView::new(Viewport {
            width: config.window_width.max(1),
            height: config.window_height.max(1),
        });
        Self {
            config,
            paths,
            resources,
            view,
            layers: LayerStack::new(),
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.layer_names()
    }

    /// Builds a layer against the shared resources and pushes it on top. A build error aborts
    /// and leaves the stack untouched.
    pub fn push_layer_with<L, E, F>(&mut self, build: F) -> Result<LayerId, AppError>
    where
        L: Layer + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce(&mut LayerBuildContext<'_>) -> Result<L, E>,
    {
        let mut context = LayerBuildContext {
            resources: &mut self.resources,
            paths: &self.paths,
            view: &mut self.view,
        };
        let layer = build(&mut context).map_err(|err| AppError::LayerBuild(Box::new(err)))?;
        Ok(self.layers.push_layer(Box::new(layer)))
    }

    pub fn run(self) -> Result<(), AppError> {
        let Self {
            config,
            paths: _,
            resources,
            mut view,
            mut layers,
        } = self;

        let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.window_title.clone())
                .with_inner_size(LogicalSize::new(
                    config.window_width as f64,
                    config.window_height as f64,
                ))
                .build(&event_loop)
                .map_err(AppError::CreateWindow)?,
        );
        let mut renderer = Renderer::new(Arc::clone(&window), config.clear_color)
            .map_err(AppError::CreateRenderer)?;
        let viewport = renderer.viewport();
        view.set_viewport(viewport.width, viewport.height);

        event_loop.set_control_flow(ControlFlow::Poll);

        let target_tps = config.target_tps.max(1);
        let max_frame_delta =
            normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
        let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
        let metrics_log_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
        let fixed_dt_seconds = fixed_dt.as_secs_f32();

        info!(
            target_tps,
            max_frame_delta_ms = max_frame_delta.as_millis() as u64,
            max_ticks_per_frame,
            metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
            layers = ?layers.layer_names(),
            "loop_config"
        );

        let mut accumulator = Duration::ZERO;
        let mut last_frame_instant = Instant::now();
        let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

        event_loop
            .run(move |event, window_target| match event {
                WinitEvent::WindowEvent { window_id, event } if window_id == window.id() => {
                    match event {
                        WindowEvent::Resized(new_size) => {
                            if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                                warn!(error = %error, "renderer_resize_failed");
                                window_target.exit();
                            }
                            view.set_viewport(new_size.width, new_size.height);
                        }
                        WindowEvent::ScaleFactorChanged { .. } => {
                            let size = window.inner_size();
                            if let Err(error) = renderer.resize(size.width, size.height) {
                                warn!(error = %error, "renderer_resize_failed");
                                window_target.exit();
                            }
                            view.set_viewport(size.width, size.height);
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                            last_frame_instant = now;

                            let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                            accumulator = accumulator.saturating_add(clamped_frame_dt);

                            let step_plan =
                                plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                            accumulator = step_plan.remaining_accumulator;

                            if step_plan.dropped_backlog > Duration::ZERO {
                                warn!(
                                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                    max_ticks_per_frame, "sim_clamp_triggered"
                                );
                            }

                            let frame = layers.run_frame(
                                step_plan.ticks_to_run,
                                fixed_dt_seconds,
                                &view,
                                |draw| {
                                    renderer.render_frame(&resources, view.projection(), |sprites| {
                                        draw(sprites)
                                    })
                                },
                            );
                            let layer_changes = match frame {
                                Ok(applied) => applied,
                                Err(error) => {
                                    warn!(error = %error, "renderer_draw_failed");
                                    window_target.exit();
                                    0
                                }
                            };
                            metrics_accumulator.record(FrameSample {
                                frame_dt: raw_frame_dt,
                                ticks: step_plan.ticks_to_run,
                                layer_changes,
                            });

                            if let Some(snapshot) =
                                metrics_accumulator.maybe_snapshot(now, layers.len())
                            {
                                info!(
                                    fps = snapshot.fps,
                                    tps = snapshot.tps,
                                    frame_time_ms = snapshot.frame_time_ms,
                                    worst_frame_ms = snapshot.worst_frame_ms,
                                    layer_changes = snapshot.layer_changes,
                                    layer_count = snapshot.layer_count,
                                    "loop_metrics"
                                );
                            }
                        }
                        _ => {}
                    }

                    let Some(mut engine_event) = translate_window_event(&event) else {
                        return;
                    };
                    layers.raise_event(&mut engine_event, &mut view);
                    if let Some(reason) = shutdown_reason(engine_event.kind()) {
                        info!(reason, "shutdown_requested");
                        window_target.exit();
                    }
                }
                WinitEvent::AboutToWait => {
                    window.request_redraw();
                }
                WinitEvent::LoopExiting => {
                    layers.clear();
                    info!("shutdown");
                }
                _ => {}
            })
            .map_err(AppError::EventLoopRun)
    }
}

/// Close and Escape still travel through the stack before the loop stops.
fn shutdown_reason(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::WindowClose(_) => Some("window_close"),
        EventKind::KeyPressed(KeyPressed {
            key: KeyCode::Escape,
            ..
        }) => Some("escape_key"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::path::PathBuf;

    use super::*;
    use crate::app::event::{MouseButton, MouseButtonPressed, WindowClosed};
    use crate::math::Vec2;

    #[derive(Debug)]
    struct BuildFailed;

    impl fmt::Display for BuildFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "build failed")
        }
    }

    impl std::error::Error for BuildFailed {}

    struct MapSizedLayer;

    impl Layer for MapSizedLayer {
        fn name(&self) -> &'static str {
            "map_sized"
        }
    }

    fn test_paths() -> AppPaths {
        AppPaths {
            root: PathBuf::from("project"),
            assets_dir: PathBuf::from("project").join("assets"),
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_tick() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn zero_durations_fall_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn close_and_escape_request_shutdown() {
        assert_eq!(
            shutdown_reason(&EventKind::WindowClose(WindowClosed)),
            Some("window_close")
        );
        assert_eq!(
            shutdown_reason(&EventKind::KeyPressed(KeyPressed {
                key: KeyCode::Escape,
                repeat: false
            })),
            Some("escape_key")
        );
        assert_eq!(
            shutdown_reason(&EventKind::MouseButtonPressed(MouseButtonPressed {
                button: MouseButton::Left
            })),
            None
        );
    }

    #[test]
    fn push_layer_with_exposes_shared_state() {
        let mut app = Application::with_paths(LoopConfig::default(), test_paths());

        app.push_layer_with(|context| {
            assert_eq!(context.paths.assets_dir, PathBuf::from("project").join("assets"));
            let viewport = context.view.viewport();
            context.view.set_map_size(Vec2::new(
                viewport.width as f32 * 2.0,
                viewport.height as f32 * 2.0,
            ));
            Ok::<_, BuildFailed>(MapSizedLayer)
        })
        .expect("layer builds");

        assert_eq!(app.layer_names(), vec!["map_sized"]);
        assert_eq!(app.view().map_size(), Some(Vec2::new(2048.0, 2048.0)));
    }

    #[test]
    fn failed_build_leaves_stack_untouched() {
        let mut app = Application::with_paths(LoopConfig::default(), test_paths());

        let result = app.push_layer_with(|_| Err::<MapSizedLayer, _>(BuildFailed));

        assert!(matches!(result, Err(AppError::LayerBuild(_))));
        assert!(app.layer_names().is_empty());
    }

    #[test]
    fn default_config_matches_map_window() {
        let config = LoopConfig::default();
        assert_eq!((config.window_width, config.window_height), (1024, 1024));
        assert_eq!(config.target_tps, 60);
        assert_eq!(config.clear_color, CLEAR_COLOR);
    }
}
