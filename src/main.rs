use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use leaf_batch::prelude::*;
// glutin's prelude has a trait of the same name
use leaf_batch::rendering::context::{log_gl_config, GlContext};
use raw_window_handle::HasWindowHandle;
use std::error::Error;
use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

const SCENE_WIDTH: u32 = 320;
const SCENE_HEIGHT: u32 = 180;
const FONT_SIZE: f32 = 24.0;

/// everything that lives as long as the window and its gl context
struct Graphics {
    // the gpu resources have to be released while the context is still alive
    renderer: BatchRenderer,
    scene: RenderTarget,
    font: Option<FontAtlas>,
    _context: SharedContext,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

/// demo application that renders a small animated scene
struct Demo {
    attributes: RendererAttributes,
    font_path: Option<PathBuf>,
    graphics: Option<Graphics>,
    started: Instant,
}

impl Demo {
    fn new(attributes: RendererAttributes, font_path: Option<PathBuf>) -> Self {
        Self {
            attributes,
            font_path,
            graphics: None,
            started: Instant::now(),
        }
    }

    /// creates the window, the gl context and the renderer
    fn create_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, Box<dyn Error>> {
        let (width, height) = self.attributes.surface_size();
        let window_attributes = Window::default_attributes()
            .with_title(WIN_TITLE)
            .with_inner_size(PhysicalSize::new(width, height));

        let config_template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));
        let (window, gl_config) =
            display_builder.build(event_loop, config_template, gl_config_picker)?;
        let window = window.ok_or("no window was created")?;
        log::info!("Picked a config with {} samples", gl_config.num_samples());

        let raw_window_handle = window.window_handle().ok().map(|handle| handle.as_raw());
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(None))
            .build(raw_window_handle);

        let fallback_context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(None))
            .build(raw_window_handle);

        let legacy_context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(2, 1))))
            .build(raw_window_handle);

        let (not_current_gl_context, dialect) = unsafe {
            match gl_display.create_context(&gl_config, &context_attributes) {
                Ok(context) => (context, ShaderDialect::Core),
                Err(_) => match gl_display.create_context(&gl_config, &fallback_context_attributes) {
                    Ok(context) => (context, ShaderDialect::Gles),
                    Err(_) => (
                        gl_display.create_context(&gl_config, &legacy_context_attributes)?,
                        ShaderDialect::Legacy,
                    ),
                },
            }
        };
        log::info!("Created a context for {dialect:?} shaders");

        let attrs = window.build_surface_attributes(Default::default())?;
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs)? };
        let gl_context = not_current_gl_context.make_current(&gl_surface)?;

        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        });
        log_gl_config();

        if let Some(interval) = NonZeroU32::new(1) {
            if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(interval)) {
                log::warn!("Error setting vsync: {err}");
            }
        }

        let size = window.inner_size();
        let context = GlContext::shared();
        let renderer = BatchRenderer::new(
            &context,
            self.attributes
                .with_surface_size(size.width, size.height)
                .with_shader_dialect(dialect),
        )?;
        let scene = RenderTarget::with_filter(&context, SCENE_WIDTH, SCENE_HEIGHT, FilterMode::Nearest);
        let font = self.font_path.as_ref().and_then(|path| {
            FontAtlas::from_file(&context, path, FONT_SIZE, FilterMode::Linear, DEFAULT_CHARS)
                .inspect_err(|err| log::error!("{err}"))
                .ok()
        });

        Ok(Graphics {
            renderer,
            scene,
            font,
            _context: context,
            gl_surface,
            gl_context,
            window,
        })
    }
}

impl Graphics {
    /// renders one frame and presents it
    fn render(&mut self, time: f32, clear_color: Vec4) -> Result<(), Box<dyn Error>> {
        let renderer = &mut self.renderer;
        renderer.begin_frame();

        // the scene is drawn at a low resolution and scaled up afterwards
        renderer.set_render_target(Some(&self.scene))?;
        renderer.clear(0.08, 0.09, 0.13, 1.0)?;
        renderer.set_color(1.0, 0.6, 0.2, 1.0);
        renderer.draw_circle(160.0, 90.0, 50.0 + time.sin() * 8.0)?;
        renderer.set_color(0.2, 0.8, 1.0, 1.0);
        renderer.fill_rect(160.0, 90.0, 70.0, 12.0, time)?;
        renderer.set_color(0.9, 0.9, 0.9, 1.0);
        renderer.draw_lines(
            &[20.0, 20.0, 300.0, 20.0, 300.0, 160.0, 20.0, 160.0],
            &LineParams::new(2.0, true),
        )?;

        renderer.set_render_target(None)?;
        renderer.clear(clear_color.x, clear_color.y, clear_color.z, clear_color.w)?;
        let (width, height) = renderer.surface_size();
        let scale = (width as f32 / SCENE_WIDTH as f32).min(height as f32 / SCENE_HEIGHT as f32);
        renderer.set_color(1.0, 1.0, 1.0, 1.0);
        // framebuffer rows start at the bottom, so the scene is flipped vertically
        renderer.draw_texture(
            &self.scene,
            width as f32 / 2.0,
            height as f32 / 2.0,
            &QuadParams::new()
                .with_pivot(0.5, 0.5)
                .with_scale(scale, -scale),
        )?;

        renderer.set_color(0.4, 1.0, 0.5, 0.6);
        renderer.draw_polygon(&[20.0, 20.0, 120.0, 30.0, 100.0, 90.0, 30.0, 70.0])?;

        if let Some(font) = self.font.as_ref() {
            renderer.set_color(1.0, 1.0, 1.0, 1.0);
            let stats = format!("leaf batch\ndraw calls: {}", renderer.draw_calls());
            renderer.draw_text(font, &stats, 16.0, height as f32 - 3.0 * font.line_height())?;
        }
        renderer.end_frame()?;

        self.gl_surface.swap_buffers(&self.gl_context)?;
        self.window.request_redraw();
        Ok(())
    }

    /// adapts the gl surface and the renderer to a new window size
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), Box<dyn Error>> {
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        self.gl_surface.resize(&self.gl_context, width, height);
        self.renderer.resize_surface(size.width, size.height)?;
        Ok(())
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.create_graphics(event_loop) {
            Ok(graphics) => {
                graphics.window.request_redraw();
                self.graphics = Some(graphics);
            }
            Err(err) => {
                log::error!("failed to set up graphics: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };
        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => graphics.resize(size),
            WindowEvent::RedrawRequested => graphics.render(
                self.started.elapsed().as_secs_f32(),
                self.attributes.clear_color(),
            ),
            _ => Ok(()),
        };
        if let Err(err) = result {
            log::error!("{err}");
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // release all gpu resources while the context is still current
        self.graphics = None;
    }
}

/// prefers transparency support and more samples
fn gl_config_picker(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|accum, config| {
            let transparency_check = config.supports_transparency().unwrap_or(false)
                & !accum.supports_transparency().unwrap_or(false);

            if transparency_check || config.num_samples() > accum.num_samples() {
                config
            } else {
                accum
            }
        })
        .unwrap()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let font_path = std::env::args_os().nth(1).map(PathBuf::from);
    let attributes = RendererAttributes::new()
        .with_surface_size(DEFAULT_WIN_WIDTH, DEFAULT_WIN_HEIGHT)
        .with_clear_color(0.02, 0.02, 0.03, 1.0);

    let event_loop = EventLoop::new()?;
    let mut demo = Demo::new(attributes, font_path);
    event_loop.run_app(&mut demo)?;
    Ok(())
}
