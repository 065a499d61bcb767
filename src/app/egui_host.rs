use egui_winit::winit::event::WindowEvent;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Tessellated panel for one frame, ready for the renderer.
pub struct EguiFrameOutput {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl EguiFrameOutput {
    /// Screen description for the egui pass over a surface of `size`.
    pub fn screen_descriptor(&self, size: PhysicalSize<u32>) -> egui_wgpu::ScreenDescriptor {
        egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width.max(1), size.height.max(1)],
            pixels_per_point: self.pixels_per_point,
        }
    }
}

/// Owns the egui context and its winit glue for the viewer window.
pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            context,
            winit_state,
        }
    }

    /// Feeds one window event to egui. Returns true when the panel consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over, or dragging inside, the panel. Orbit
    /// controls must not start while this holds.
    pub fn captures_pointer(&self) -> bool {
        pointer_captured(&self.context)
    }

    pub fn frame<F>(&mut self, window: &Window, build_panel: F) -> EguiFrameOutput
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let full_output = self.context.run(raw_input, build_panel);
        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        EguiFrameOutput {
            clipped_primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }
}

fn pointer_captured(context: &egui::Context) -> bool {
    context.wants_pointer_input() || context.is_pointer_over_area()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_descriptor_never_has_a_zero_extent() {
        let output = EguiFrameOutput {
            clipped_primitives: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            pixels_per_point: 1.5,
        };
        let descriptor = output.screen_descriptor(PhysicalSize::new(0, 480));
        assert_eq!(descriptor.size_in_pixels, [1, 480]);
        assert_eq!(descriptor.pixels_per_point, 1.5);
    }

    #[test]
    fn idle_context_does_not_capture_the_pointer() {
        let context = egui::Context::default();
        let _ = context.run(egui::RawInput::default(), |ctx| {
            egui::Window::new("Controls").show(ctx, |ui| {
                ui.label("panel");
            });
        });
        assert!(!pointer_captured(&context));
    }
}
