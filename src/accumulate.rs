//! Progressive frame accumulation.
//!
//! Stochastic frames converge by folding each new frame into a running
//! average: frame `n` moves every channel `1/n` of the way from the held
//! value toward the new sample, which is an incremental mean without storing
//! history. Any camera motion invalidates the average and restarts it.

/// Running average over successive RGBA frames of one fixed camera pose.
#[derive(Debug, Default)]
pub struct AccumulationBuffer {
    previous: Option<Vec<u8>>,
    iteration: u32,
}

impl AccumulationBuffer {
    /// Empty buffer; the first frame passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many frames the current average holds.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Fold `frame` (RGBA bytes) into the average and return the blend.
    ///
    /// `moved` discards the held average first, so the returned frame is
    /// `frame` itself and the count restarts at 1. Pixels whose held alpha is
    /// zero also take the new frame's value directly; nothing was drawn there
    /// before, and averaging against black would dim the first real sample.
    pub fn blend(&mut self, frame: Vec<u8>, moved: bool) -> Vec<u8> {
        if moved || self.previous.as_ref().is_none_or(|p| p.len() != frame.len()) {
            self.previous = Some(frame.clone());
            self.iteration = 1;
            return frame;
        }

        self.iteration += 1;
        let weight = 1.0 / self.iteration as f32;
        let previous = self.previous.as_mut().unwrap();

        for (held, new) in previous.chunks_exact_mut(4).zip(frame.chunks_exact(4)) {
            if held[3] == 0 {
                held.copy_from_slice(new);
                continue;
            }
            // Alpha stays at the held value; coverage does not average.
            for channel in 0..3 {
                let prev = held[channel] as f32;
                let blended = prev - (prev - new[channel] as f32) * weight;
                held[channel] = blended.round() as u8;
            }
        }
        previous.clone()
    }

    /// Drop the held average; the next frame starts a new one.
    pub fn reset(&mut self) {
        self.previous = None;
        self.iteration = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], index: usize) -> [u8; 4] {
        frame[4 * index..4 * index + 4].try_into().unwrap()
    }

    #[test]
    fn first_frame_passes_through() {
        let mut buffer = AccumulationBuffer::new();
        let frame = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let out = buffer.blend(frame.clone(), false);
        assert_eq!(out, frame);
        assert_eq!(buffer.iteration(), 1);
    }

    #[test]
    fn identical_frames_are_a_fixed_point() {
        let mut buffer = AccumulationBuffer::new();
        let frame = vec![100, 150, 200, 255];
        for _ in 0..10 {
            let out = buffer.blend(frame.clone(), false);
            assert_eq!(out, frame);
        }
        assert_eq!(buffer.iteration(), 10);
    }

    #[test]
    fn converges_to_the_running_mean() {
        // Five frames alternating 100 and 200 in one channel; the rounded
        // incremental mean stays within 1.5 of the exact mean throughout.
        let mut buffer = AccumulationBuffer::new();
        let samples = [100u8, 200, 100, 200, 100];
        let mut out = Vec::new();
        for (n, &value) in samples.iter().enumerate() {
            out = buffer.blend(vec![value, 0, 0, 255], false);
            let exact: f32 = samples[..=n].iter().map(|&v| v as f32).sum::<f32>() / (n + 1) as f32;
            assert!(
                (out[0] as f32 - exact).abs() <= 1.5,
                "frame {n}: got {} want about {exact}",
                out[0]
            );
        }
        assert_eq!(buffer.iteration(), 5);
        assert!((out[0] as f32 - 140.0).abs() <= 1.5);
    }

    #[test]
    fn motion_restarts_the_average() {
        let mut buffer = AccumulationBuffer::new();
        buffer.blend(vec![0, 0, 0, 255], false);
        buffer.blend(vec![0, 0, 0, 255], false);
        assert_eq!(buffer.iteration(), 2);

        let out = buffer.blend(vec![250, 0, 0, 255], true);
        assert_eq!(out, vec![250, 0, 0, 255]);
        assert_eq!(buffer.iteration(), 1);
    }

    #[test]
    fn held_transparent_pixels_take_the_new_sample() {
        let mut buffer = AccumulationBuffer::new();
        buffer.blend(vec![0, 0, 0, 0, 100, 100, 100, 255], false);
        let out = buffer.blend(vec![200, 200, 200, 255, 200, 200, 200, 255], false);
        // Nothing was held at the first pixel, so it is not averaged down.
        assert_eq!(pixel(&out, 0), [200, 200, 200, 255]);
        // The second pixel blends halfway and keeps its held alpha.
        assert_eq!(pixel(&out, 1), [150, 150, 150, 255]);
    }

    #[test]
    fn alpha_channel_is_held_not_averaged() {
        let mut buffer = AccumulationBuffer::new();
        buffer.blend(vec![100, 100, 100, 200], false);
        let out = buffer.blend(vec![100, 100, 100, 40], false);
        assert_eq!(out[3], 200);
    }

    #[test]
    fn resolution_change_restarts_the_average() {
        let mut buffer = AccumulationBuffer::new();
        buffer.blend(vec![10, 10, 10, 255], false);
        let bigger = vec![90, 90, 90, 255, 90, 90, 90, 255];
        let out = buffer.blend(bigger.clone(), false);
        assert_eq!(out, bigger);
        assert_eq!(buffer.iteration(), 1);
    }

    #[test]
    fn reset_clears_held_state() {
        let mut buffer = AccumulationBuffer::new();
        buffer.blend(vec![10, 10, 10, 255], false);
        buffer.reset();
        assert_eq!(buffer.iteration(), 0);
        let out = buffer.blend(vec![80, 80, 80, 255], false);
        assert_eq!(out, vec![80, 80, 80, 255]);
        assert_eq!(buffer.iteration(), 1);
    }
}
