//! Pixel plot/read capability and an in-memory implementation.

/// Where computed colors go, and where coherence checks read them back.
///
/// A plot may have side effects on other pixels (symmetry, stereo
/// composition). Callers never assume a plot touches only its own pixel.
pub trait Plotter {
    fn plot(&mut self, x: u32, y: u32, color: u32);

    fn get_color(&self, x: u32, y: u32) -> u32;

    /// True when [`Plotter::put_span`] is a plain bulk write.
    fn supports_spans(&self) -> bool {
        false
    }

    /// Write `color` to columns `x_start..=x_end` of row `y`.
    fn put_span(&mut self, y: u32, x_start: u32, x_end: u32, color: u32) {
        for x in x_start..=x_end {
            self.plot(x, y, color);
        }
    }
}

/// Row-major buffer of palette indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    spans: bool,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize)],
            spans: true,
        }
    }

    /// Buffer that refuses span writes, forcing per-pixel fills.
    pub fn without_spans(width: u32, height: u32) -> Self {
        Self {
            spans: false,
            ..Self::new(width, height)
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Reset every pixel to `color`.
    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize) * (self.width as usize) + x as usize)
        } else {
            None
        }
    }
}

impl Plotter for PixelBuffer {
    #[inline]
    fn plot(&mut self, x: u32, y: u32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Out-of-range reads return 0.
    #[inline]
    fn get_color(&self, x: u32, y: u32) -> u32 {
        self.get(x, y).unwrap_or(0)
    }

    fn supports_spans(&self) -> bool {
        self.spans
    }

    fn put_span(&mut self, y: u32, x_start: u32, x_end: u32, color: u32) {
        if y >= self.height || x_start > x_end || x_start >= self.width {
            return;
        }
        let row = (y as usize) * (self.width as usize);
        let end = x_end.min(self.width - 1) as usize;
        self.pixels[row + x_start as usize..=row + end].fill(color);
    }
}

/// Plots every pixel twice, mirrored across the horizontal center line.
///
/// Used when the image is symmetric about the real axis: the caller computes
/// the top half and the bottom half follows. Spans are refused so that fills
/// go through [`Plotter::plot`] and get mirrored too.
pub struct MirrorPlotter<'a, P: Plotter + ?Sized> {
    inner: &'a mut P,
    height: u32,
}

impl<'a, P: Plotter + ?Sized> MirrorPlotter<'a, P> {
    pub fn new(inner: &'a mut P, height: u32) -> Self {
        Self { inner, height }
    }
}

impl<P: Plotter + ?Sized> Plotter for MirrorPlotter<'_, P> {
    fn plot(&mut self, x: u32, y: u32, color: u32) {
        self.inner.plot(x, y, color);
        if y < self.height {
            let mirrored = self.height - 1 - y;
            if mirrored != y {
                self.inner.plot(x, mirrored, color);
            }
        }
    }

    fn get_color(&self, x: u32, y: u32) -> u32 {
        self.inner.get_color(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_and_read_back() {
        let mut buf = PixelBuffer::new(4, 3);
        buf.plot(2, 1, 9);
        assert_eq!(buf.get_color(2, 1), 9);
        assert_eq!(buf.pixels()[4 + 2], 9);
        assert_eq!(buf.get(4, 0), None);
    }

    #[test]
    fn out_of_range_plot_is_ignored() {
        let mut buf = PixelBuffer::new(2, 2);
        buf.plot(5, 5, 1);
        assert!(buf.pixels().iter().all(|&p| p == 0));
        assert_eq!(buf.get_color(5, 5), 0);
    }

    #[test]
    fn span_write_is_inclusive_and_clipped() {
        let mut buf = PixelBuffer::new(5, 2);
        buf.put_span(1, 1, 3, 4);
        assert_eq!(buf.pixels(), &[0, 0, 0, 0, 0, 0, 4, 4, 4, 0]);
        buf.put_span(0, 3, 10, 2);
        assert_eq!(&buf.pixels()[..5], &[0, 0, 0, 2, 2]);
    }

    #[test]
    fn span_support_can_be_disabled() {
        assert!(PixelBuffer::new(2, 2).supports_spans());
        assert!(!PixelBuffer::without_spans(2, 2).supports_spans());
    }

    #[test]
    fn mirror_plotter_duplicates_rows() {
        let mut buf = PixelBuffer::new(3, 5);
        {
            let mut mirror = MirrorPlotter::new(&mut buf, 5);
            assert!(!mirror.supports_spans());
            mirror.plot(1, 0, 3);
            mirror.plot(2, 2, 6);
            // default span goes through plot and is mirrored as well
            mirror.put_span(1, 0, 1, 8);
        }
        assert_eq!(buf.get_color(1, 0), 3);
        assert_eq!(buf.get_color(1, 4), 3);
        assert_eq!(buf.get_color(2, 2), 6);
        assert_eq!(buf.get_color(0, 1), 8);
        assert_eq!(buf.get_color(0, 3), 8);
        assert_eq!(buf.get_color(1, 3), 8);
    }
}
