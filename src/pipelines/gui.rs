//! egui overlay drawn on top of the scene.

use winit::{event::WindowEvent, window::Window};

/// Single-sampled and without depth: the panel is drawn after the scene pass.
pub fn renderer_options() -> egui_wgpu::RendererOptions {
    egui_wgpu::RendererOptions {
        msaa_samples: 1,
        depth_stencil_format: None,
        dithering: true,
        ..Default::default()
    }
}

/// Makes egui lay out for a surface of `size_in_pixels` drawn at
/// `pixels_per_point`, which may sit below the native scale factor.
/// The screen keeps the logical size egui-winit uses for pointer positions.
pub fn fit_to_surface(
    raw_input: &mut egui::RawInput,
    size_in_pixels: [u32; 2],
    pixels_per_point: f32,
) {
    let [width, height] = size_in_pixels;
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(width as f32, height as f32) / pixels_per_point,
    ));
    raw_input
        .viewports
        .entry(raw_input.viewport_id)
        .or_default()
        .native_pixels_per_point = Some(pixels_per_point);
}

pub struct GuiRenderer {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl GuiRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let renderer = egui_wgpu::Renderer::new(device, format, renderer_options());
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Returns whether egui consumed the event.
    pub fn handle_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn wants_pointer_input(&self) -> bool {
        self.ctx.wants_pointer_input()
    }

    /// Runs `run_ui` and renders its output into `view`, a surface of
    /// `size_in_pixels` drawn at `pixels_per_point`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        pixels_per_point: f32,
        run_ui: impl FnMut(&egui::Context),
    ) {
        let mut raw_input = self.state.take_egui_input(window);
        fit_to_surface(&mut raw_input, size_in_pixels, pixels_per_point);
        let full_output = self.ctx.run(raw_input, run_ui);
        let pixels_per_point = full_output.pixels_per_point;
        self.state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self.ctx.tessellate(full_output.shapes, pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &primitives, &screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, &primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_surface_keeps_the_logical_screen() {
        // 3x display rendered at the 2x cap: 400x300 logical points
        let mut raw_input = egui::RawInput::default();
        fit_to_surface(&mut raw_input, [800, 600], 2.0);
        let screen = raw_input.screen_rect.expect("screen rect");
        assert_eq!(screen.size(), egui::vec2(400.0, 300.0));

        let ctx = egui::Context::default();
        let output = ctx.run(raw_input, |_| {});
        assert_eq!(output.pixels_per_point, 2.0);
    }

    #[test]
    fn panel_draws_without_depth_or_multisampling() {
        let options = renderer_options();
        assert_eq!(options.msaa_samples, 1);
        assert!(options.depth_stencil_format.is_none());
    }
}
