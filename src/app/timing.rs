use std::time::{Duration, Instant};
use winit::window::Window;

/// Longest step fed to the camera, so a stalled frame does not fling it.
const MAX_FRAME_DT: f32 = 0.1;
const TITLE_INTERVAL: Duration = Duration::from_millis(500);

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_title_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String, now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_title_time: now,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Advances one frame and returns the clamped delta in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 1.0 / 60.0,
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.frame_count = self.frame_count.saturating_add(1);
        self.frame_dt
    }

    /// Refreshes the fps readout in the window title twice a second.
    pub fn update_title(&mut self, window: &Window, now: Instant, model: Option<&str>) {
        let elapsed = now.saturating_duration_since(self.last_title_time);
        if elapsed < TITLE_INTERVAL {
            return;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        let title = match model {
            Some(model) => format!("{} - {} - {:.0} fps", self.base_title, model, fps),
            None => format!("{} - {:.0} fps", self.base_title, fps),
        };
        window.set_title(&title);
        self.frame_count = 0;
        self.last_title_time = now;
    }
}
