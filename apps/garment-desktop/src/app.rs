use anyhow::{Context, Result};
use garment_assets::{AssetLoader, AssetSource, LoadOptions, LoadStatus, ModelAsset};
use garment_author::{BrushSettings, PaintEditor};
use garment_canvas::PaintCanvas;
use garment_common::ViewerConfig;
use garment_input::{Action, GestureController, GestureSettings, SurfacePicker};
use garment_persist::{Session, SessionStore, ViewState, export_png};
use garment_render_wgpu::ZoomCamera;
use garment_scene::{Scene, uv_to_texel};
use glam::Vec2;
use std::path::PathBuf;

/// Model loading progress shown in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading(String),
    Ready(String),
    Failed(String),
}

/// Raycasts window positions into the scene for the gesture controller.
pub struct ScenePicker<'a> {
    pub scene: &'a Scene,
    pub camera: &'a ZoomCamera,
    pub viewport: Vec2,
    pub canvas_size: (u32, u32),
}

impl SurfacePicker for ScenePicker<'_> {
    fn has_target(&self) -> bool {
        self.scene.has_model()
    }

    fn pick_texel(&self, screen: Vec2) -> Option<Vec2> {
        let ray = self.camera.screen_ray(screen, self.viewport);
        let uv = self.scene.pick_uv(&ray)?;
        Some(uv_to_texel(uv, self.canvas_size.0, self.canvas_size.1))
    }
}

/// Everything the viewer owns apart from GPU resources.
pub struct AppState {
    pub scene: Scene,
    pub camera: ZoomCamera,
    pub canvas: PaintCanvas,
    pub editor: PaintEditor,
    pub gestures: GestureController,
    pub loader: Option<AssetLoader>,
    pub model_source: AssetSource,
    pub model_status: ModelStatus,
    /// Last save/load/export outcome.
    pub message: Option<String>,
    pub viewport: Vec2,
    pub cursor: Vec2,
    pub session_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let canvas = PaintCanvas::new(config.canvas_size, config.canvas_size)?;
        let editor = PaintEditor::new(
            BrushSettings {
                line_width: config.line_width,
                eraser_radius: config.eraser_radius,
            },
            config.stroke_rgba(),
            config.history_depth,
        );
        let gestures = GestureController::new(GestureSettings {
            zoom_speed: config.zoom_speed,
            rotate_speed: config.rotate_speed,
        });

        let model_source = AssetSource::parse(&config.model);
        let options = LoadOptions {
            cache_dir: Some(config.cache_dir.clone()),
            ..LoadOptions::default()
        };
        let loader = AssetLoader::spawn(model_source.clone(), options)
            .context("failed to start model loader")?;

        Ok(Self {
            scene: Scene::new(),
            camera: ZoomCamera::default(),
            canvas,
            editor,
            gestures,
            loader: Some(loader),
            model_status: ModelStatus::Loading(model_source.display_name()),
            model_source,
            message: None,
            viewport: Vec2::new(1280.0, 720.0),
            cursor: Vec2::ZERO,
            session_dir: config.session_dir.clone(),
        })
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.camera.set_viewport(width, height);
    }

    /// Feed a pointer event through the gesture controller and apply what it yields.
    pub fn gesture(
        &mut self,
        f: impl FnOnce(&mut GestureController, &ScenePicker<'_>) -> Option<Action>,
    ) {
        let picker = ScenePicker {
            scene: &self.scene,
            camera: &self.camera,
            viewport: self.viewport,
            canvas_size: self.canvas.size(),
        };
        if let Some(action) = f(&mut self.gestures, &picker) {
            tracing::trace!("gesture {action:?}");
            self.apply(action);
        }
    }

    /// Non-blocking check on the background load. Returns the model once.
    pub fn poll_loader(&mut self) -> Option<ModelAsset> {
        let loader = self.loader.as_mut()?;
        match loader.poll() {
            LoadStatus::Pending => None,
            LoadStatus::Ready(model) => {
                self.loader = None;
                self.model_status = ModelStatus::Ready(model.summary().to_string());
                Some(*model)
            }
            LoadStatus::Failed(e) => {
                self.loader = None;
                self.model_status = ModelStatus::Failed(e.to_string());
                None
            }
            LoadStatus::Done => {
                self.loader = None;
                None
            }
        }
    }

    /// Route an action to the camera, the scene or the paint editor.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Zoom(delta) => self.camera.zoom(delta),
            Action::RotateModel(delta) => self.scene.rotate_model(delta),
            Action::Noop => {}
            paint => {
                if let Err(e) = self.editor.apply(paint, &mut self.canvas) {
                    tracing::error!("paint action {paint:?} failed: {e}");
                }
            }
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            tool: self.editor.tool(),
            color: self.editor.color(),
            camera_distance: self.camera.distance(),
            model_yaw: self.scene.model_yaw(),
        }
    }

    pub fn save_session(&mut self) {
        let result = self.try_save_session();
        self.report(result.map(|path| format!("saved {}", path.display())), "save failed");
    }

    pub fn load_session(&mut self) {
        let result = self.try_load_session();
        self.report(result.map(|()| "session restored".to_string()), "load failed");
    }

    pub fn export_texture(&mut self) {
        let result = self.try_export();
        self.report(result.map(|path| format!("exported {}", path.display())), "export failed");
    }

    fn try_save_session(&mut self) -> Result<PathBuf> {
        self.apply(Action::EndStroke);
        let mut store = SessionStore::open(&self.session_dir)?;
        let session = Session::capture(&self.canvas, self.view_state(), Some(self.model_source.to_string()));
        Ok(store.save(&session)?)
    }

    fn try_load_session(&mut self) -> Result<()> {
        let store = SessionStore::open(&self.session_dir)?;
        let session = store.load_latest()?;
        let mut canvas = session.restore_canvas()?;
        canvas.set_line_width(self.editor.brush().line_width);
        canvas.mark_all_dirty();

        self.canvas = canvas;
        self.editor.reset_history();
        self.apply(Action::SelectTool(session.view.tool));
        self.apply(Action::SetColor(session.view.color));
        self.camera.set_distance(session.view.camera_distance);
        self.scene.set_model_yaw(session.view.model_yaw);
        Ok(())
    }

    fn try_export(&mut self) -> Result<PathBuf> {
        let store = SessionStore::open(&self.session_dir)?;
        let path = store.next_export_path();
        export_png(&self.canvas, &path)?;
        Ok(path)
    }

    fn report(&mut self, result: Result<String>, failure: &str) {
        match result {
            Ok(msg) => {
                tracing::info!("{msg}");
                self.message = Some(msg);
            }
            Err(e) => {
                tracing::error!("{failure}: {e:#}");
                self.message = Some(format!("{failure}: {e}"));
            }
        }
    }
}
