//! Julibrot: a 2D view of a 4D orbit/parameter volume.
//!
//! Each screen pixel is a ray from the viewer's eye through a virtual screen
//! into the volume. Along the ray the orbit start (jx, jy) moves through the
//! dynamical plane while c (mx, my) sweeps the configured parameter range,
//! one step per depth slice. The first slice whose orbit stays bounded sets
//! the pixel's color, so nearer surfaces come out darker.
//!
//! Geometry is in "inches" of the virtual screen: the screen is `width` by
//! `height`, the eyes sit `distance` in front of it, and the fractal volume
//! is `depth` deep centered `origin` behind the eyes.

use crate::{Calculator, CancellationChecker, CompletionStatus, Plotter, WorkItem};
use escapetime_core::{Complex, EngineConfig, NumericContext, OrbitOutcome, Scalar, StereoMode};

/// Projection origin of one eye.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perspective {
    pub x: f64,
    pub y: f64,
    /// Distance to the screen used for horizontal projection.
    pub zx: f64,
    /// Distance to the screen used for vertical projection.
    pub zy: f64,
}

/// Orbit start and its per-slice increment for one ray, before c is added.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub j: (f64, f64),
    pub dj: (f64, f64),
}

/// Seeds along one ray in the image's representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthRay<T> {
    pub j: Complex<T>,
    pub dj: Complex<T>,
    pub m: Complex<T>,
    pub dm: Complex<T>,
}

impl<T: Scalar> DepthRay<T> {
    /// Orbit start and c at depth slice `k`.
    ///
    /// Computed as base + k·increment rather than accumulated, so every
    /// slice is exact relative to the ray's base.
    #[inline]
    pub fn slice(&self, k: u32, ctx: &mut NumericContext) -> (Complex<T>, Complex<T>) {
        let k = k as i32;
        (
            self.j.add(&self.dj.mul_int(k, ctx)),
            self.m.add(&self.dm.mul_int(k, ctx)),
        )
    }
}

/// Result of walking one ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZlineOutcome {
    /// A slice stayed bounded and this color was plotted.
    Plotted(u32),
    /// Every slice escaped; nothing was plotted.
    Empty,
    Interrupted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JulibrotStats {
    /// Scanline pairs visited.
    pub rows: u32,
    pub zlines: u64,
    pub plotted: u64,
    /// The plane stopped at an empty row before reaching row 0.
    pub stopped_early: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JulibrotRun {
    pub status: CompletionStatus,
    pub stats: JulibrotStats,
}

/// Per-image Julibrot geometry, derived once from the configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JulibrotProjector {
    pub left: Perspective,
    pub right: Perspective,
    stereo: StereoMode,
    brightness_ratio: f64,
    x_offset: f64,
    y_offset: f64,
    x_per_inch: f64,
    y_per_inch: f64,
    inch_per_xdot: f64,
    inch_per_ydot: f64,
    init_z: f64,
    depth: f64,
    width: f64,
    z_dots: u32,
    colors: u32,
    m_start: (f64, f64),
    m_step: (f64, f64),
    x_dots: u32,
    y_dots: u32,
}

impl JulibrotProjector {
    pub fn new(config: &EngineConfig) -> Self {
        let jb = &config.julibrot;
        let ext = &config.extents;
        let z_dots = jb.z_dots.max(1);
        let half_sep = match jb.stereo {
            StereoMode::Monocular => 0.0,
            _ => jb.eye_separation / 2.0,
        };
        let right = Perspective {
            x: half_sep,
            y: 0.0,
            zx: jb.distance,
            zy: jb.distance,
        };
        let left = Perspective {
            x: -half_sep,
            ..right
        };
        let (x_offset, y_offset) = ext.center();
        Self {
            left,
            right,
            stereo: jb.stereo,
            brightness_ratio: jb.brightness_ratio,
            x_offset,
            y_offset,
            x_per_inch: (ext.x_min - ext.x_max) / jb.width,
            y_per_inch: (ext.y_max - ext.y_min) / jb.height,
            inch_per_xdot: jb.width / config.screen_width as f64,
            inch_per_ydot: jb.height / config.screen_height as f64,
            init_z: jb.origin - jb.depth / 2.0,
            depth: jb.depth,
            width: jb.width,
            z_dots,
            colors: config.colors,
            m_start: (jb.slice_x.0, jb.slice_y.0),
            m_step: (
                (jb.slice_x.1 - jb.slice_x.0) / z_dots as f64,
                (jb.slice_y.1 - jb.slice_y.0) / z_dots as f64,
            ),
            x_dots: config.screen_width,
            y_dots: config.screen_height,
        }
    }

    pub fn z_dots(&self) -> u32 {
        self.z_dots
    }

    /// Eye used for the pixel plotted at (`col`, `row`).
    ///
    /// Red/blue stereo alternates eyes in a checkerboard.
    pub fn eye(&self, col: u32, row: u32) -> &Perspective {
        match self.stereo {
            StereoMode::Monocular | StereoMode::LeftEye => &self.left,
            StereoMode::RightEye => &self.right,
            StereoMode::RedBlue if (row + col) & 1 == 1 => &self.left,
            StereoMode::RedBlue => &self.right,
        }
    }

    /// Project the screen point (`x`, `y`), in inches from the screen
    /// center, as seen from `eye`.
    pub fn project(&self, eye: &Perspective, x: f64, y: f64) -> Projection {
        let z_dots = self.z_dots as f64;
        let jx = ((eye.x - x) * self.init_z / eye.zx - x) * self.x_per_inch + self.x_offset;
        let jy = ((eye.y - y) * self.init_z / eye.zy - y) * self.y_per_inch + self.y_offset;
        let djx = (self.depth / eye.zx) * (eye.x - x) * self.x_per_inch / z_dots;
        let djy = (self.depth / eye.zy) * (eye.y - y) * self.y_per_inch / z_dots;
        Projection {
            j: (jx, jy),
            dj: (djx, djy),
        }
    }

    pub fn ray<T: Scalar>(&self, eye: &Perspective, x: f64, y: f64, ctx: &NumericContext) -> DepthRay<T> {
        let p = self.project(eye, x, y);
        DepthRay {
            j: Complex::from_f64_pair(p.j.0, p.j.1, ctx),
            dj: Complex::from_f64_pair(p.dj.0, p.dj.1, ctx),
            m: Complex::from_f64_pair(self.m_start.0, self.m_start.1, ctx),
            dm: Complex::from_f64_pair(self.m_step.0, self.m_step.1, ctx),
        }
    }

    /// Color for a ray that first stays bounded at slice `k`.
    ///
    /// Grey ramp 1..=254 across depth, or for red/blue stereo two ramps of
    /// 127 steps: 127 down to 0 for the left eye, and 255 down to 128 for the
    /// right eye scaled by the brightness ratio. Ramps are laid out for a
    /// 256-color palette and squeezed proportionally into smaller ones.
    pub fn slice_color(&self, k: u32, col: u32, row: u32) -> u32 {
        let k = u64::from(k);
        let z_dots = u64::from(self.z_dots);
        let color = if self.stereo == StereoMode::RedBlue {
            let shade = (128 * k / z_dots) as i64;
            if (row + col) & 1 == 1 {
                (127 - shade) as u32
            } else {
                let scaled = ((shade as f64 * self.brightness_ratio) as i64).clamp(1, 127);
                (127 + 128 - scaled) as u32
            }
        } else {
            (254 * k / z_dots) as u32 + 1
        };
        if self.colors < 256 {
            color * self.colors / 256
        } else {
            color
        }
    }

    /// Walk the ray through screen point (`x`, `y`) and plot at (`col`, `row`).
    ///
    /// Cancellation is polled before every slice.
    #[allow(clippy::too_many_arguments)]
    pub fn zline<T, P, C>(
        &self,
        calc: &Calculator<T>,
        x: f64,
        y: f64,
        col: u32,
        row: u32,
        plotter: &mut P,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> ZlineOutcome
    where
        T: Scalar,
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let ray = self.ray::<T>(self.eye(col, row), x, y, ctx);
        for k in 0..self.z_dots {
            if cancel.is_cancelled() {
                return ZlineOutcome::Interrupted;
            }
            let (z0, c) = ray.slice(k, ctx);
            match calc.orbit(z0, c, ctx, cancel) {
                OrbitOutcome::Bounded => {
                    let color = self.slice_color(k, col, row);
                    plotter.plot(col, row, color);
                    return ZlineOutcome::Plotted(color);
                }
                OrbitOutcome::Interrupted => return ZlineOutcome::Interrupted,
                OrbitOutcome::Escaped { .. } => {}
            }
        }
        ZlineOutcome::Empty
    }

    /// Render the plane, two point-symmetric scanlines at a time.
    ///
    /// Rows run from just above the vertical midpoint up to row 0, each
    /// paired with its mirror image below. A row pair that plots nothing
    /// ends the plane, except the center row which may be empty while rows
    /// further out are not. `start_row` continues an interrupted plane.
    pub fn run_plane<T, P, C>(
        &self,
        calc: &Calculator<T>,
        start_row: Option<u32>,
        plotter: &mut P,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> JulibrotRun
    where
        T: Scalar,
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let mut stats = JulibrotStats::default();
        let half = self.y_dots / 2;
        if half == 0 {
            return JulibrotRun {
                status: CompletionStatus::Complete,
                stats,
            };
        }
        let first = start_row.map_or(half - 1, |r| r.min(half - 1));

        for row in (0..=first).rev() {
            let step = half - 1 - row;
            let y = -(step as f64) * self.inch_per_ydot;
            let mirror_row = self.y_dots - 1 - row;
            let mut plotted = false;

            for col in 0..self.x_dots {
                let x = -self.width / 2.0 + col as f64 * self.inch_per_xdot;
                let mirror_col = self.x_dots - 1 - col;
                for (px, py, c, r) in [(x, y, col, row), (-x, -y, mirror_col, mirror_row)] {
                    stats.zlines += 1;
                    match self.zline(calc, px, py, c, r, plotter, ctx, cancel) {
                        ZlineOutcome::Plotted(_) => {
                            plotted = true;
                            stats.plotted += 1;
                        }
                        ZlineOutcome::Empty => {}
                        ZlineOutcome::Interrupted => {
                            return JulibrotRun {
                                status: CompletionStatus::Interrupted(WorkItem::JulibrotPlane {
                                    row,
                                }),
                                stats,
                            };
                        }
                    }
                }
            }
            stats.rows += 1;

            if !plotted && step != 0 {
                log::debug!("julibrot row {row} is empty, remaining rows skipped");
                stats.stopped_early = true;
                break;
            }
        }

        JulibrotRun {
            status: CompletionStatus::Complete,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escapetime_core::JulibrotConfig;

    fn config(stereo: StereoMode, z_dots: u32) -> EngineConfig {
        EngineConfig {
            screen_width: 20,
            screen_height: 14,
            julibrot: JulibrotConfig {
                stereo,
                z_dots,
                ..JulibrotConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn monocular_eye_is_centered() {
        let p = JulibrotProjector::new(&config(StereoMode::Monocular, 4));
        assert_eq!(p.left.x, 0.0);
        assert_eq!(p.right.x, 0.0);
        assert_eq!(p.left.zx, 24.0);
    }

    #[test]
    fn stereo_eyes_are_separated() {
        let p = JulibrotProjector::new(&config(StereoMode::LeftEye, 4));
        assert_eq!(p.left.x, -1.25);
        assert_eq!(p.right.x, 1.25);
        assert_eq!(p.eye(3, 4).x, -1.25);

        let p = JulibrotProjector::new(&config(StereoMode::RightEye, 4));
        assert_eq!(p.eye(3, 4).x, 1.25);
    }

    #[test]
    fn red_blue_alternates_by_parity() {
        let p = JulibrotProjector::new(&config(StereoMode::RedBlue, 4));
        assert_eq!(p.eye(0, 1).x, -1.25);
        assert_eq!(p.eye(1, 1).x, 1.25);
        assert_eq!(p.eye(2, 5).x, -1.25);
    }

    #[test]
    fn third_slice_is_base_plus_two_increments() {
        let p = JulibrotProjector::new(&config(StereoMode::Monocular, 4));
        let mut ctx = NumericContext::float();
        let (x, y) = (1.5, -0.75);
        let ray = p.ray::<f64>(p.eye(0, 0), x, y, &ctx);
        let (z, c) = ray.slice(2, &mut ctx);
        assert_eq!(z.re, ray.j.re + 2.0 * ray.dj.re);
        assert_eq!(z.im, ray.j.im + 2.0 * ray.dj.im);
        assert_eq!(c.re, ray.m.re + 2.0 * ray.dm.re);
        assert_eq!(c.im, ray.m.im + 2.0 * ray.dm.im);

        // default extents -2.5..1.5 x -1.5..1.5 on a 10 x 7 inch screen,
        // eye at distance 24, volume from 4 to 12 inches
        let x_per_inch = -4.0 / 10.0;
        let y_per_inch = 3.0 / 7.0;
        let jx = ((0.0 - x) * 4.0 / 24.0 - x) * x_per_inch + (-0.5);
        let djx = (8.0 / 24.0) * (0.0 - x) * x_per_inch / 4.0;
        let jy = ((0.0 - y) * 4.0 / 24.0 - y) * y_per_inch;
        let djy = (8.0 / 24.0) * (0.0 - y) * y_per_inch / 4.0;
        assert!((ray.j.re - jx).abs() < 1e-12);
        assert!((ray.dj.re - djx).abs() < 1e-12);
        assert!((ray.j.im - jy).abs() < 1e-12);
        assert!((ray.dj.im - djy).abs() < 1e-12);
    }

    #[test]
    fn slice_colors() {
        let grey = JulibrotProjector::new(&config(StereoMode::Monocular, 128));
        assert_eq!(grey.slice_color(0, 0, 0), 1);
        assert_eq!(grey.slice_color(64, 0, 0), 128);
        assert_eq!(grey.slice_color(127, 0, 0), 253);

        let rb = JulibrotProjector::new(&config(StereoMode::RedBlue, 128));
        assert_eq!(rb.slice_color(0, 1, 0), 127);
        assert_eq!(rb.slice_color(127, 1, 0), 0);
        // even parity: clamped to at least 1
        assert_eq!(rb.slice_color(0, 0, 0), 254);
        assert_eq!(rb.slice_color(127, 0, 0), 128);
    }

    #[test]
    fn small_palettes_squeeze_the_ramps() {
        let mut cfg = config(StereoMode::Monocular, 128);
        cfg.colors = 16;
        let grey = JulibrotProjector::new(&cfg);
        assert_eq!(grey.slice_color(127, 0, 0), 15);
        assert_eq!(grey.slice_color(64, 0, 0), 8);
        assert!((0..128).all(|k| grey.slice_color(k, 0, 0) < 16));

        cfg.julibrot.stereo = StereoMode::RedBlue;
        let rb = JulibrotProjector::new(&cfg);
        assert!((0..128).all(|k| rb.slice_color(k, 0, 0) >= 8 && rb.slice_color(k, 0, 0) < 16));
        assert!((0..128).all(|k| rb.slice_color(k, 1, 0) < 8));
    }

    #[test]
    fn brightness_ratio_scales_right_eye() {
        let mut cfg = config(StereoMode::RedBlue, 128);
        cfg.julibrot.brightness_ratio = 0.5;
        let rb = JulibrotProjector::new(&cfg);
        assert_eq!(rb.slice_color(100, 0, 0), 255 - 50);
        assert_eq!(rb.slice_color(100, 1, 0), 27);
    }
}
