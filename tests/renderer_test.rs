use leaf_batch::glm;
use leaf_batch::prelude::*;
use leaf_batch::rendering::recording::{DrawCall, GpuCommand};
use std::collections::HashMap;
use std::f32::consts::PI;
use std::rc::Rc;

const FULL_VERT: &str = "
    attribute vec2 a_position;
    attribute vec2 a_texcoords;
    attribute vec4 a_color;
    uniform mat4 u_proj;
    void main() {}
";
const NO_COLOR_VERT: &str = "
    attribute vec2 a_position;
    attribute vec2 a_texcoords;
    uniform mat4 u_proj;
    void main() {}
";
const FRAG: &str = "
    uniform sampler2D u_texture;
    void main() {}
";

fn setup(attributes: RendererAttributes) -> (Rc<RecordingContext>, SharedContext, BatchRenderer) {
    let recorder = Rc::new(RecordingContext::new());
    let context: SharedContext = recorder.clone();
    let mut renderer = BatchRenderer::new(&context, attributes).unwrap();
    renderer.begin_frame();
    (recorder, context, renderer)
}

fn checker(context: &SharedContext, size: u32) -> Texture {
    Texture::new(
        context,
        &PixelData::filled(size, size, [200, 100, 50, 255]),
        FilterMode::Nearest,
    )
    .unwrap()
}

fn close(a: glm::Vec2, b: glm::Vec2) -> bool {
    glm::distance(&a, &b) < 1e-4
}

/// the last projection uploaded before every draw call
fn projections_per_draw(commands: &[GpuCommand]) -> Vec<glm::Mat4> {
    let mut current = None;
    let mut result = Vec::new();
    for command in commands {
        match command {
            GpuCommand::UniformMatrix4 { matrix, .. } => current = Some(*matrix),
            GpuCommand::DrawIndexedTriangles { .. } => result.extend(current),
            _ => {}
        }
    }
    result
}

fn triangle_area(call: &DrawCall, triangle: &[u16]) -> f32 {
    let [a, b, c] = [0, 1, 2].map(|k| call.vertices[triangle[k] as usize].position);
    ((b - a).perp(&(c - a)) / 2.0).abs()
}

#[test]
fn quads_of_one_run_share_a_draw_call() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    for i in 0..10 {
        renderer.fill_rect(i as f32 * 10.0, 0.0, 8.0, 8.0, 0.0).unwrap();
    }
    assert_eq!(renderer.pending_vertex_count(), 40);
    assert_eq!(renderer.pending_index_count(), 60);
    renderer.end_frame().unwrap();

    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].indices.len(), 6 * 10);
    assert_eq!(calls[0].texture, renderer.white_texture().id());
    assert_eq!(renderer.draw_calls(), 1);
    assert_eq!(renderer.pending_index_count(), 0);
    // vertices stay in submission order
    assert!(close(calls[0].vertices[0].position, glm::vec2(0.0, 0.0)));
    assert!(close(calls[0].vertices[36].position, glm::vec2(90.0, 0.0)));
}

#[test]
fn texture_switch_splits_batches() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let first = checker(&context, 16);
    let second = checker(&context, 16);
    renderer.draw_texture(&first, 0.0, 0.0, &QuadParams::new()).unwrap();
    renderer.draw_texture(&second, 0.0, 0.0, &QuadParams::new()).unwrap();
    // drawing the same texture again does not split the batch
    renderer.draw_texture(&second, 20.0, 0.0, &QuadParams::new()).unwrap();
    renderer.end_frame().unwrap();

    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].texture, first.id());
    assert_eq!(calls[0].indices.len(), 6);
    assert_eq!(calls[1].texture, second.id());
    assert_eq!(calls[1].indices.len(), 12);
}

#[test]
fn textured_quad_geometry() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let texture = checker(&context, 64);
    let params = QuadParams::new()
        .with_uv(UvRect::new(0.0, 0.0, 0.5, 0.25))
        .with_scale(2.0, 2.0)
        .with_pivot(0.5, 0.5);
    renderer.set_color(1.0, 0.0, 0.0, 0.5);
    renderer.draw_texture(&texture, 100.0, 50.0, &params).unwrap();
    renderer.end_frame().unwrap();

    let call = &recorder.draw_calls()[0];
    assert_eq!(call.indices, vec![0, 1, 2, 0, 2, 3]);
    // 64 * 0.5 * 2 = 64 wide, 64 * 0.25 * 2 = 32 high, centered on the position
    assert!(close(call.vertices[0].position, glm::vec2(68.0, 34.0)));
    assert!(close(call.vertices[2].position, glm::vec2(132.0, 66.0)));
    assert!(close(call.vertices[1].uv_coords, glm::vec2(0.5, 0.0)));
    assert!(close(call.vertices[3].uv_coords, glm::vec2(0.0, 0.25)));
    assert_eq!(call.vertices[0].color, glm::vec4(1.0, 0.0, 0.0, 0.5));
}

#[test]
fn polygon_with_too_few_points_writes_nothing() {
    let (_recorder, _context, mut renderer) = setup(RendererAttributes::new());
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();

    let err = renderer.draw_polygon(&[0.0, 0.0, 10.0, 0.0]).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        RenderError::Validation(ValidationError::TooFewPoints { required: 3, given: 4, .. })
    ));
    let err = renderer.draw_polygon(&[0.0, 0.0, 10.0, 0.0, 5.0]).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(renderer.pending_vertex_count(), 4);
    assert_eq!(renderer.pending_index_count(), 6);
}

#[test]
fn polygon_is_a_fan() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    renderer
        .draw_polygon(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0, -5.0, 5.0])
        .unwrap();
    renderer.end_frame().unwrap();
    let call = &recorder.draw_calls()[0];
    assert_eq!(call.vertices.len(), 5);
    assert_eq!(call.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
}

#[test]
fn circle_is_a_closed_fan() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    let (segments, radius) = (64, 50.0);
    renderer.draw_circle_segments(200.0, 100.0, radius, segments).unwrap();
    assert_eq!(renderer.pending_vertex_count(), segments as usize + 1);
    assert_eq!(renderer.pending_index_count(), 3 * segments as usize);
    renderer.end_frame().unwrap();

    let call = &recorder.draw_calls()[0];
    assert!(close(call.vertices[0].position, glm::vec2(200.0, 100.0)));
    // the last triangle closes the fan on the first perimeter vertex
    assert_eq!(&call.indices[call.indices.len() - 3..], &[0, 64, 1]);
    let area: f32 = call
        .indices
        .chunks(3)
        .map(|triangle| triangle_area(call, triangle))
        .sum();
    let expected = PI * radius * radius;
    assert!((area - expected).abs() / expected < 0.01);
}

#[test]
fn circle_uses_configured_segments() {
    let (_recorder, _context, mut renderer) =
        setup(RendererAttributes::new().with_circle_segments(12));
    renderer.draw_circle(0.0, 0.0, 5.0).unwrap();
    assert_eq!(renderer.pending_vertex_count(), 13);
    assert_eq!(renderer.pending_index_count(), 36);
    assert!(matches!(
        renderer.draw_circle_segments(0.0, 0.0, 5.0, 0),
        Err(RenderError::Validation(ValidationError::ZeroSegments))
    ));
}

#[test]
fn line_strips_expand_to_ribbons() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    let points = [0.0, 0.0, 10.0, 0.0, 10.0, 10.0];
    renderer.draw_lines(&points, &LineParams::new(4.0, false)).unwrap();
    assert_eq!(renderer.pending_vertex_count(), 6);
    assert_eq!(renderer.pending_index_count(), 12);
    renderer.draw_lines(&points, &LineParams::new(4.0, true)).unwrap();
    assert_eq!(renderer.pending_vertex_count(), 12);
    assert_eq!(renderer.pending_index_count(), 30);
    renderer.end_frame().unwrap();

    let call = &recorder.draw_calls()[0];
    assert!(close(call.vertices[0].position, glm::vec2(0.0, 2.0)));
    assert!(close(call.vertices[1].position, glm::vec2(0.0, -2.0)));
    assert_eq!(&call.indices[..6], &[0, 1, 2, 1, 3, 2]);
    // the closing segment of the loop wraps back to the first point
    assert_eq!(&call.indices[24..], &[10, 11, 6, 11, 7, 6]);

    assert!(renderer.draw_lines(&[1.0, 2.0], &LineParams::default()).unwrap_err().is_validation());
}

#[test]
fn text_follows_the_atlas() {
    struct TestAtlas {
        texture: Texture,
        rects: HashMap<char, GlyphRect>,
    }

    impl GlyphAtlas for TestAtlas {
        fn lookup(&self, ch: char) -> Option<GlyphRect> {
            self.rects.get(&ch).copied()
        }

        fn texture(&self) -> &Texture {
            &self.texture
        }

        fn line_height(&self) -> f32 {
            16.0
        }
    }

    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let mut rects = HashMap::new();
    rects.insert('a', GlyphRect { x: 0, y: 0, width: 8, height: 16 });
    rects.insert(' ', GlyphRect { x: 8, y: 0, width: 4, height: 16 });
    let atlas = TestAtlas {
        texture: checker(&context, 32),
        rects,
    };

    // 'b' is missing and drawn with the space glyph
    renderer.draw_text(&atlas, "ab\na", 10.0, 20.0).unwrap();
    renderer.end_frame().unwrap();
    let call = &recorder.draw_calls()[0];
    assert_eq!(call.texture, atlas.texture.id());
    assert_eq!(call.vertices.len(), 12);
    assert!(close(call.vertices[0].position, glm::vec2(10.0, 20.0)));
    assert!(close(call.vertices[2].uv_coords, glm::vec2(0.25, 0.5)));
    assert!(close(call.vertices[4].position, glm::vec2(18.0, 20.0)));
    assert!(close(call.vertices[5].uv_coords, glm::vec2(0.375, 0.0)));
    assert!(close(call.vertices[8].position, glm::vec2(10.0, 36.0)));

    let without_space = TestAtlas {
        texture: checker(&context, 32),
        rects: [('a', GlyphRect { x: 0, y: 0, width: 8, height: 16 })].into(),
    };
    renderer.draw_text(&without_space, "ab", 0.0, 0.0).unwrap();
    assert_eq!(renderer.pending_vertex_count(), 4);
}

#[test]
fn render_target_projection_maps_corners_to_clip_space() {
    let (_recorder, context, mut renderer) = setup(RendererAttributes::new());
    let target = RenderTarget::new(&context, 512, 256);
    renderer.set_render_target(Some(&target)).unwrap();

    let proj = *renderer.projection();
    assert!(close(to_ndc(&proj, 0.0, 0.0), glm::vec2(-1.0, 1.0)));
    assert!(close(to_ndc(&proj, 512.0, 0.0), glm::vec2(1.0, 1.0)));
    assert!(close(to_ndc(&proj, 512.0, 256.0), glm::vec2(1.0, -1.0)));
    assert!(close(to_ndc(&proj, 0.0, 256.0), glm::vec2(-1.0, -1.0)));
}

#[test]
fn pending_counts_never_exceed_capacity() {
    let (_recorder, context, mut renderer) = setup(
        RendererAttributes::new()
            .with_max_vertices(20)
            .with_max_indices(30),
    );
    let texture = checker(&context, 4);
    for i in 0..50 {
        match i % 5 {
            0 => renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap(),
            1 => renderer.draw_circle_segments(0.0, 0.0, 3.0, 8).unwrap(),
            2 => renderer.draw_texture(&texture, 0.0, 0.0, &QuadParams::new()).unwrap(),
            3 => renderer
                .draw_lines(&[0.0, 0.0, 5.0, 5.0, 9.0, 1.0], &LineParams::default())
                .unwrap(),
            _ => renderer
                .draw_polygon(&[0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0])
                .unwrap(),
        }
        assert!(renderer.pending_vertex_count() <= renderer.max_vertices());
        assert!(renderer.pending_index_count() <= renderer.max_indices());
    }
}

#[test]
fn one_quad_capacity_submits_twice() {
    let (recorder, _context, mut renderer) = setup(
        RendererAttributes::new()
            .with_max_vertices(4)
            .with_max_indices(6),
    );
    renderer.fill_rect(0.0, 0.0, 10.0, 10.0, 0.0).unwrap();
    renderer.fill_rect(20.0, 0.0, 10.0, 10.0, 0.0).unwrap();
    assert_eq!(recorder.draw_call_count(), 1);
    renderer.end_frame().unwrap();

    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| call.indices.len() == 6));
    assert!(close(calls[1].vertices[0].position, glm::vec2(20.0, 0.0)));
}

#[test]
fn oversized_primitives_are_rejected_up_front() {
    let (_recorder, _context, mut renderer) = setup(
        RendererAttributes::new()
            .with_max_vertices(4)
            .with_max_indices(6),
    );
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    let err = renderer.draw_circle(0.0, 0.0, 10.0).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Validation(ValidationError::PrimitiveTooLarge { vertices: 33, indices: 96, .. })
    ));
    assert_eq!(renderer.pending_vertex_count(), 4);
}

#[test]
fn render_target_round_trip() {
    let (recorder, context, mut renderer) =
        setup(RendererAttributes::new().with_surface_size(800, 600));
    let target = RenderTarget::new(&context, 512, 512);

    renderer.set_render_target(Some(&target)).unwrap();
    renderer.clear(0.0, 0.0, 0.0, 1.0).unwrap();
    renderer.draw_circle(256.0, 256.0, 100.0).unwrap();
    let target_projection = *renderer.projection();

    renderer.set_render_target(None).unwrap();
    renderer.clear(0.2, 0.2, 0.2, 1.0).unwrap();
    renderer.fill_rect(10.0, 10.0, 50.0, 50.0, 0.0).unwrap();
    renderer.end_frame().unwrap();

    assert_ne!(target_projection, *renderer.projection());
    assert_eq!(*renderer.projection(), ortho_projection(800, 600));
    assert_eq!(recorder.viewport_size(), Some((800, 600)));

    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].framebuffer, target.framebuffer().unwrap());
    assert_eq!(calls[1].framebuffer, 0);

    let projections = projections_per_draw(&recorder.commands());
    assert_eq!(projections, vec![ortho_projection(512, 512), ortho_projection(800, 600)]);
}

#[test]
fn default_surface_viewport_is_only_restored_after_a_target() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    recorder.clear_commands();
    renderer.set_render_target(None).unwrap();
    assert!(!recorder
        .commands()
        .iter()
        .any(|command| matches!(command, GpuCommand::Viewport { .. } | GpuCommand::BindFramebuffer(_))));

    let target = RenderTarget::new(&context, 64, 64);
    renderer.set_render_target(Some(&target)).unwrap();
    assert_eq!(recorder.viewport_size(), Some((64, 64)));
    renderer.set_render_target(None).unwrap();
    assert_eq!(recorder.viewport_size(), Some((800, 450)));
    assert_eq!(recorder.bound_framebuffer(), 0);
}

#[test]
fn clear_keeps_draw_order() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.clear(0.0, 0.0, 0.0, 1.0).unwrap();
    let commands = recorder.commands();
    let draw = commands
        .iter()
        .position(|command| matches!(command, GpuCommand::DrawIndexedTriangles { .. }))
        .unwrap();
    let clear = commands
        .iter()
        .position(|command| matches!(command, GpuCommand::Clear(_)))
        .unwrap();
    assert!(draw < clear);
}

#[test]
fn begin_frame_sets_blending_state() {
    let (recorder, _context, _renderer) = setup(RendererAttributes::new());
    let commands = recorder.commands();
    assert!(commands.contains(&GpuCommand::EnableAlphaBlending));
    assert!(commands.contains(&GpuCommand::DisableFaceCulling));
    assert!(!commands.iter().any(|command| matches!(command, GpuCommand::Clear(_))));
}

#[test]
fn shader_switch_uploads_projection() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let custom = Rc::new(ShaderProgram::build(&context, FULL_VERT, FRAG).unwrap());
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.set_shader_program(Some(&custom)).unwrap();
    // the pending rect was submitted with the default program
    assert_eq!(recorder.draw_calls()[0].program, renderer.default_shader().id().unwrap());

    let program = custom.id().unwrap();
    assert_eq!(recorder.bound_program(), program);
    assert_eq!(
        recorder.uniform_matrix(program, UNIF_PROJ),
        Some(*renderer.projection())
    );

    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.set_shader_program(None).unwrap();
    assert_eq!(recorder.draw_calls()[1].program, program);
}

#[test]
fn missing_attributes_abort_the_flush() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let broken = Rc::new(ShaderProgram::build(&context, NO_COLOR_VERT, FRAG).unwrap());
    renderer.set_shader_program(Some(&broken)).unwrap();
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();

    let err = renderer.flush().unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "shader is missing required vertex attributes: a_color"
    );
    assert_eq!(recorder.draw_call_count(), 0);
    assert_eq!(renderer.pending_vertex_count(), 4);
    assert_eq!(renderer.pending_index_count(), 6);
}

#[test]
fn replacing_a_shader_without_the_batch_layout_recovers() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let broken = Rc::new(ShaderProgram::build(&context, NO_COLOR_VERT, FRAG).unwrap());
    renderer.set_shader_program(Some(&broken)).unwrap();
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    assert!(renderer.end_frame().unwrap_err().is_configuration());

    // the stuck geometry is drawn with the program that replaces the broken one
    renderer.set_shader_program(None).unwrap();
    renderer.fill_rect(2.0, 2.0, 1.0, 1.0, 0.0).unwrap();
    renderer.end_frame().unwrap();

    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, renderer.default_shader().id().unwrap());
    assert_eq!(calls[0].vertices.len(), 8);
    assert_eq!(calls[0].indices.len(), 12);
}

#[test]
fn discarding_clears_a_stuck_batch() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let broken = Rc::new(ShaderProgram::build(&context, NO_COLOR_VERT, FRAG).unwrap());
    renderer.set_shader_program(Some(&broken)).unwrap();
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    assert!(renderer.flush().is_err());

    renderer.discard();
    assert_eq!(renderer.pending_vertex_count(), 0);
    assert_eq!(renderer.pending_index_count(), 0);
    renderer.set_render_target(None).unwrap();
    renderer.set_shader_program(None).unwrap();
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.end_frame().unwrap();
    assert_eq!(recorder.draw_call_count(), 1);
    assert_eq!(recorder.draw_calls()[0].indices.len(), 6);
}

#[test]
fn unusable_shader_is_refused() {
    let (_recorder, context, mut renderer) = setup(RendererAttributes::new());
    let inert = Rc::new(ShaderProgram::new(&context, "", FRAG));
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    assert!(matches!(
        renderer.set_shader_program(Some(&inert)),
        Err(RenderError::Resource(ResourceError::Unusable))
    ));
    assert_eq!(renderer.pending_vertex_count(), 4);
}

#[test]
fn destroyed_targets_cannot_be_used() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let mut target = RenderTarget::new(&context, 32, 32);
    target.destroy();
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();

    assert!(matches!(
        renderer.set_render_target(Some(&target)),
        Err(RenderError::Resource(ResourceError::Destroyed))
    ));
    assert!(matches!(
        renderer.draw_texture(&target, 0.0, 0.0, &QuadParams::new()),
        Err(RenderError::Resource(ResourceError::Destroyed))
    ));
    assert_eq!(recorder.draw_call_count(), 0);
    assert_eq!(renderer.pending_vertex_count(), 4);
}

#[test]
fn destroying_a_bound_target_stops_the_flush() {
    let (recorder, context, mut renderer) =
        setup(RendererAttributes::new().with_surface_size(800, 600));
    let mut target = RenderTarget::new(&context, 64, 64);
    renderer.set_render_target(Some(&target)).unwrap();
    renderer.fill_rect(0.0, 0.0, 8.0, 8.0, 0.0).unwrap();
    target.destroy();

    assert!(matches!(
        renderer.end_frame(),
        Err(RenderError::Resource(ResourceError::Destroyed))
    ));
    assert_eq!(recorder.draw_call_count(), 0);
    assert_eq!(renderer.pending_vertex_count(), 4);
    assert_eq!(*renderer.projection(), ortho_projection(64, 64));

    renderer.discard();
    assert_eq!(renderer.pending_vertex_count(), 0);
    assert_eq!(recorder.bound_framebuffer(), 0);
    assert_eq!(recorder.viewport_size(), Some((800, 600)));
    assert_eq!(*renderer.projection(), ortho_projection(800, 600));

    renderer.fill_rect(0.0, 0.0, 8.0, 8.0, 0.0).unwrap();
    renderer.end_frame().unwrap();
    let calls = recorder.draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].framebuffer, 0);
}

#[test]
fn dropping_a_bound_texture_stops_the_flush() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let texture = checker(&context, 16);
    renderer
        .draw_texture(&texture, 0.0, 0.0, &QuadParams::new())
        .unwrap();
    drop(texture);

    assert!(matches!(
        renderer.flush(),
        Err(RenderError::Resource(ResourceError::Destroyed))
    ));
    assert_eq!(recorder.draw_call_count(), 0);
    assert_eq!(renderer.pending_index_count(), 6);

    renderer.discard();
    assert_eq!(
        renderer.current_texture(),
        Some(renderer.white_texture().id())
    );
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.end_frame().unwrap();
    assert_eq!(recorder.draw_call_count(), 1);
    assert_eq!(recorder.draw_calls()[0].texture, renderer.white_texture().id());
}

#[test]
fn textures_are_told_apart_by_identity() {
    let (_recorder, context, _renderer) = setup(RendererAttributes::new());
    let first = checker(&context, 8);
    let second = checker(&context, 8);
    assert!(first.liveness().same_resource(&first.liveness()));
    assert!(!first.liveness().same_resource(&second.liveness()));
}

#[test]
fn render_targets_can_be_sampled() {
    let (recorder, context, mut renderer) = setup(RendererAttributes::new());
    let target = RenderTarget::new(&context, 128, 64);
    renderer.draw_texture(&target, 0.0, 0.0, &QuadParams::new()).unwrap();
    renderer.end_frame().unwrap();
    let call = &recorder.draw_calls()[0];
    assert_eq!(call.texture, target.texture_id());
    assert!(close(call.vertices[2].position, glm::vec2(128.0, 64.0)));
}

#[test]
fn resizing_the_surface_updates_the_projection() {
    let (recorder, _context, mut renderer) = setup(RendererAttributes::new());
    renderer.fill_rect(0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
    renderer.resize_surface(1024, 768).unwrap();
    assert_eq!(recorder.draw_call_count(), 1);
    assert_eq!(*renderer.projection(), ortho_projection(1024, 768));
    assert_eq!(recorder.viewport_size(), Some((1024, 768)));
    assert_eq!(
        recorder.uniform_matrix(renderer.default_shader().id().unwrap(), UNIF_PROJ),
        Some(ortho_projection(1024, 768))
    );
}

#[test]
fn dropping_the_renderer_releases_its_resources() {
    let (recorder, _context, renderer) = setup(RendererAttributes::new());
    assert_eq!(recorder.live_buffers(), 2);
    assert_eq!(recorder.live_textures(), 1);
    assert_eq!(recorder.live_programs(), 1);
    drop(renderer);
    assert_eq!(recorder.live_buffers(), 0);
    assert_eq!(recorder.live_textures(), 0);
    assert_eq!(recorder.live_programs(), 0);
}
