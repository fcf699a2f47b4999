//! Fixed-point color compositing.
//!
//! All operators work on 0-255 RGB byte triples, the same representation the
//! map buffer uses. Intermediate math is f32; results are truncated and
//! clamped back into byte range, matching the renderer's integer pipeline.

/// RGB byte triple, as sampled from the map buffer.
pub type Rgb = [u8; 3];

fn saturate(c: f32) -> u8 {
    c.clamp(0.0, 255.0) as u8
}

/// Move `base` toward `mix` by `factor` (0 keeps `base`, 1 yields `mix`).
pub fn mix_linear(base: Rgb, mix: Rgb, factor: f32) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = saturate(base[i] as f32 - (base[i] as f32 - mix[i] as f32) * factor);
    }
    out
}

/// Channel-wise multiply blend, treating each byte as a 0-1 fraction.
pub fn mix_multiply(base: Rgb, mix: Rgb) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = saturate(base[i] as f32 * mix[i] as f32 / 255.0);
    }
    out
}

/// Add `mix * factor` onto `base`, clamping at white.
pub fn mix_add(base: Rgb, mix: Rgb, factor: f32) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = saturate(base[i] as f32 + mix[i] as f32 * factor);
    }
    out
}

/// Scale all channels by `factor`, clamping at white.
pub fn scale(base: Rgb, factor: f32) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = saturate(base[i] as f32 * factor);
    }
    out
}

/// Display gamma curve used by the projector.
///
/// Compresses the byte range into 32..224 so fully dark walls stay visible:
/// `32 + 192 * (c / 255) ^ (1 / gamma)`.
pub fn gamma_correct(base: Rgb, gamma: f32) -> Rgb {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = saturate(32.0 + 192.0 * (base[i] as f32 / 255.0).powf(1.0 / gamma));
    }
    out
}

/// `#rrggbbaa` encoding with `alpha` given as a 0-1 fraction.
pub fn to_hex(rgb: Rgb, alpha: f32) -> String {
    let a = saturate(alpha * 255.0);
    format!("#{:02x}{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2], a)
}
