//! Tesseral boundary-coherence acceleration.
//!
//! A box whose four edges and midline all come out one color is filled with
//! that color without computing its interior. Any other box is bisected
//! along its longer side and both halves are examined the same way. The
//! midline doubles as the shared edge of the two halves, so each bisection
//! costs one line of computed pixels.
//!
//! This is a heuristic: detail that lies entirely inside a box with a
//! coherent border and midline is painted over.
//!
//! Boxes live on an explicit stack. Bisection always happens at the midpoint
//! of the longer side, and the left/top half is pushed last so it is
//! processed first. [`ResumeToken`] relies on this order.

use crate::{CancellationChecker, CompletionStatus, Plotter, ResumeToken, WorkItem};
use escapetime_core::{FillColor, PixelRect};

/// Interruption before the box stack exists; the rectangle starts over.
const RESTART: Option<ResumeToken> = None;

/// Color state of one box edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeColor {
    /// Not yet read back from the plotter.
    Unknown,
    /// Pixels along the edge disagree.
    Mixed,
    Color(u32),
}

/// A box with inclusive pixel bounds and its four edge colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TessBox {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
    pub top: EdgeColor,
    pub bot: EdgeColor,
    pub lft: EdgeColor,
    pub rgt: EdgeColor,
}

impl TessBox {
    /// Box covering `rect`. The rectangle must not be empty.
    pub fn new(rect: &PixelRect) -> Self {
        Self {
            x1: rect.x,
            x2: rect.right(),
            y1: rect.y,
            y2: rect.bottom(),
            top: EdgeColor::Unknown,
            bot: EdgeColor::Unknown,
            lft: EdgeColor::Unknown,
            rgt: EdgeColor::Unknown,
        }
    }

    pub fn with_unknown_edges(self) -> Self {
        Self {
            top: EdgeColor::Unknown,
            bot: EdgeColor::Unknown,
            lft: EdgeColor::Unknown,
            rgt: EdgeColor::Unknown,
            ..self
        }
    }

    /// True when the next bisection is vertical (down the middle).
    #[inline]
    pub fn is_wide(&self) -> bool {
        self.x2 - self.x1 > self.y2 - self.y1
    }

    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.x1, self.x2, self.y1, self.y2)
    }

    /// Top, bottom, left, right.
    pub fn edges(&self) -> [EdgeColor; 4] {
        [self.top, self.bot, self.lft, self.rgt]
    }

    /// Read all four edges back from the plotter.
    ///
    /// Rows span the full width, columns only the rows between them.
    pub fn check_edges<P: Plotter + ?Sized>(&self, plotter: &P) -> [EdgeColor; 4] {
        [
            check_row(plotter, self.x1, self.x2, self.y1),
            check_row(plotter, self.x1, self.x2, self.y2),
            check_col(plotter, self.x1, self.y1, self.y2),
            check_col(plotter, self.x2, self.y1, self.y2),
        ]
    }

    fn has_mixed_edge(&self) -> bool {
        self.edges().contains(&EdgeColor::Mixed)
    }

    fn is_degenerate(&self) -> bool {
        self.x2 - self.x1 < 2 || self.y2 - self.y1 < 2
    }
}

/// Shared color of row `y` over `x1..=x2`, from already plotted pixels.
pub fn check_row<P: Plotter + ?Sized>(plotter: &P, x1: u32, x2: u32, y: u32) -> EdgeColor {
    let first = plotter.get_color(x1, y);
    if (x1 + 1..=x2).any(|x| plotter.get_color(x, y) != first) {
        EdgeColor::Mixed
    } else {
        EdgeColor::Color(first)
    }
}

/// Shared color of column `x` strictly between rows `y1` and `y2`.
pub fn check_col<P: Plotter + ?Sized>(plotter: &P, x: u32, y1: u32, y2: u32) -> EdgeColor {
    let first = plotter.get_color(x, y1 + 1);
    if (y1 + 2..y2).any(|y| plotter.get_color(x, y) != first) {
        EdgeColor::Mixed
    } else {
        EdgeColor::Color(first)
    }
}

/// Where the accelerator gets pixel colors from.
pub trait PixelSource {
    /// Color of one pixel, `None` if its orbit was interrupted.
    fn color(&mut self, x: u32, y: u32) -> Option<u32>;

    /// Called before each edge or midline is scanned, so a source that
    /// carries state from pixel to pixel can restart it per line.
    fn start_line(&mut self) {}
}

impl<S: PixelSource + ?Sized> PixelSource for &mut S {
    #[inline]
    fn color(&mut self, x: u32, y: u32) -> Option<u32> {
        (**self).color(x, y)
    }

    #[inline]
    fn start_line(&mut self) {
        (**self).start_line()
    }
}

/// A plain closure as a pixel source.
struct ClosureSource<F>(F);

impl<F: FnMut(u32, u32) -> Option<u32>> PixelSource for ClosureSource<F> {
    #[inline]
    fn color(&mut self, x: u32, y: u32) -> Option<u32> {
        (self.0)(x, y)
    }
}

/// Counters for one tesseral run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TesseralStats {
    /// Initial edge lines computed.
    pub edge_scans: u32,
    /// Edges read back from the plotter.
    pub edge_checks: u32,
    /// Midlines computed.
    pub mid_scans: u32,
    pub splits: u32,
    pub fills: u32,
    /// Rectangles too thin to subdivide, computed pixel by pixel.
    pub direct_fills: u32,
    pub computed_pixels: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TesseralRun {
    pub status: CompletionStatus,
    pub stats: TesseralStats,
}

/// Tesseral settings for one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TesseralAccelerator {
    pub fill: FillColor,
    pub colors: u32,
    /// Span-filled rows between cancellation polls.
    pub fill_poll_rows: u32,
    /// Individually plotted fill pixels between cancellation polls.
    pub fill_poll_pixels: u32,
}

impl TesseralAccelerator {
    pub const FILL_POLL_ROWS: u32 = 25;
    pub const FILL_POLL_PIXELS: u32 = 500;

    pub fn new(fill: FillColor, colors: u32) -> Self {
        Self {
            fill,
            colors,
            fill_poll_rows: Self::FILL_POLL_ROWS,
            fill_poll_pixels: Self::FILL_POLL_PIXELS,
        }
    }

    pub fn with_poll_intervals(mut self, rows: u32, pixels: u32) -> Self {
        self.fill_poll_rows = rows.max(1);
        self.fill_poll_pixels = pixels.max(1);
        self
    }

    /// Calculate `rect`.
    ///
    /// `compute` returns the color of one pixel, or `None` if the orbit was
    /// interrupted; the accelerator plots what it computes. With `resume` the
    /// box stack is rebuilt from the token and edges are read back from
    /// `plotter`, which must still hold the pixels of the interrupted run.
    pub fn run<F, P, C>(
        &self,
        rect: PixelRect,
        resume: Option<&ResumeToken>,
        compute: F,
        plotter: &mut P,
        cancel: &C,
    ) -> TesseralRun
    where
        F: FnMut(u32, u32) -> Option<u32>,
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        self.run_source(rect, resume, ClosureSource(compute), plotter, cancel)
    }

    /// [`run`](Self::run) with a source that is told where scan lines start.
    pub fn run_source<S, P, C>(
        &self,
        rect: PixelRect,
        resume: Option<&ResumeToken>,
        source: S,
        plotter: &mut P,
        cancel: &C,
    ) -> TesseralRun
    where
        S: PixelSource,
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let mut pass = Pass {
            source,
            plotter,
            stats: TesseralStats::default(),
        };
        let status = if rect.is_empty() {
            CompletionStatus::Complete
        } else {
            match self.drive(rect, resume, &mut pass, cancel) {
                Ok(()) => CompletionStatus::Complete,
                Err(resume) => CompletionStatus::Interrupted(WorkItem::Tesseral { rect, resume }),
            }
        };
        TesseralRun {
            status,
            stats: pass.stats,
        }
    }

    /// `Err` carries the resume point.
    fn drive<S, P, C>(
        &self,
        rect: PixelRect,
        resume: Option<&ResumeToken>,
        pass: &mut Pass<'_, S, P>,
        cancel: &C,
    ) -> Result<(), Option<ResumeToken>>
    where
        S: PixelSource,
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let root = TessBox::new(&rect);
        if root.is_degenerate() {
            pass.stats.direct_fills += 1;
            for y in root.y1..=root.y2 {
                for x in root.x1..=root.x2 {
                    pass.pixel(x, y).ok_or(RESTART)?;
                }
            }
            return Ok(());
        }

        let replayed = resume.and_then(|token| {
            let stack = token.replay(root);
            match &stack {
                Some(stack) => log::debug!(
                    "tesseral resume at ({}, {}), rebuilt {} boxes",
                    token.x,
                    token.y,
                    stack.len()
                ),
                None => log::warn!("resume token {token:?} does not fit {rect:?}, starting over"),
            }
            stack
        });

        let mut stack = match replayed {
            Some(stack) => stack,
            None => {
                let mut b = root;
                b.top = pass.scan_row(b.x1, b.x2, b.y1).ok_or(RESTART)?;
                b.bot = pass.scan_row(b.x1, b.x2, b.y2).ok_or(RESTART)?;
                b.lft = pass.scan_col(b.x1, b.y1 + 1, b.y2 - 1).ok_or(RESTART)?;
                b.rgt = pass.scan_col(b.x2, b.y1 + 1, b.y2 - 1).ok_or(RESTART)?;
                pass.stats.edge_scans += 4;
                if cancel.is_cancelled() {
                    return Err(RESTART);
                }
                vec![b]
            }
        };

        while let Some(mut b) = stack.pop() {
            let mut mid_color = None;
            if let Some(color) = agreed_color(&mut b, &*pass.plotter, &mut pass.stats) {
                let mid = pass
                    .scan_midline(&b)
                    .ok_or_else(|| Some(ResumeToken::encode(&b)))?;
                if mid == EdgeColor::Color(color) {
                    if !self.fill(&b, color, pass, cancel) {
                        return Err(Some(ResumeToken::encode(&b)));
                    }
                    continue;
                }
                mid_color = Some(mid);
            }
            let mid = match mid_color {
                Some(mid) => mid,
                None => pass
                    .scan_midline(&b)
                    .ok_or_else(|| Some(ResumeToken::encode(&b)))?,
            };
            pass.stats.splits += 1;
            split(b, mid, &mut stack);
        }
        Ok(())
    }

    /// Paint the interior of `b`. Returns false if cancelled part way.
    fn fill<S, P, C>(&self, b: &TessBox, color: u32, pass: &mut Pass<'_, S, P>, cancel: &C) -> bool
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        pass.stats.fills += 1;
        let color = match self.fill {
            FillColor::Skip => return true,
            FillColor::BoxColor => color,
            FillColor::Override(c) => c % self.colors.max(1),
        };
        let plotter = &mut *pass.plotter;
        let width = b.x2 - b.x1 - 1;
        let mut since_poll = 0;

        if !plotter.supports_spans() || width < 2 {
            for x in b.x1 + 1..b.x2 {
                for y in b.y1 + 1..b.y2 {
                    plotter.plot(x, y, color);
                    since_poll += 1;
                    if since_poll >= self.fill_poll_pixels {
                        if cancel.is_cancelled() {
                            return false;
                        }
                        since_poll = 0;
                    }
                }
            }
        } else {
            for y in b.y1 + 1..b.y2 {
                plotter.put_span(y, b.x1 + 1, b.x2 - 1, color);
                since_poll += 1;
                if since_poll >= self.fill_poll_rows {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    since_poll = 0;
                }
            }
        }
        true
    }
}

/// Resolve unknown edges in order top, bottom, left, right, stopping at the
/// first disagreement. Returns the color when all four agree.
fn agreed_color<P: Plotter + ?Sized>(
    b: &mut TessBox,
    plotter: &P,
    stats: &mut TesseralStats,
) -> Option<u32> {
    if b.has_mixed_edge() {
        return None;
    }
    if b.top == EdgeColor::Unknown {
        b.top = check_row(plotter, b.x1, b.x2, b.y1);
        stats.edge_checks += 1;
    }
    let EdgeColor::Color(color) = b.top else {
        return None;
    };
    if b.bot == EdgeColor::Unknown {
        b.bot = check_row(plotter, b.x1, b.x2, b.y2);
        stats.edge_checks += 1;
    }
    if b.bot != b.top {
        return None;
    }
    if b.lft == EdgeColor::Unknown {
        b.lft = check_col(plotter, b.x1, b.y1, b.y2);
        stats.edge_checks += 1;
    }
    if b.lft != b.top {
        return None;
    }
    if b.rgt == EdgeColor::Unknown {
        b.rgt = check_col(plotter, b.x2, b.y1, b.y2);
        stats.edge_checks += 1;
    }
    (b.rgt == b.top).then_some(color)
}

/// Replace `b` by its halves, top/left half on top of the stack. A half with
/// no interior pixels is dropped.
fn split(mut b: TessBox, mid_color: EdgeColor, stack: &mut Vec<TessBox>) {
    if b.is_wide() {
        let mid = (b.x1 + b.x2) >> 1;
        log::trace!("split {:?} down x={mid}", b.bounds());
        if b.x2 - mid <= 1 {
            return;
        }
        if b.top == EdgeColor::Mixed {
            b.top = EdgeColor::Unknown;
        }
        if b.bot == EdgeColor::Mixed {
            b.bot = EdgeColor::Unknown;
        }
        stack.push(TessBox {
            x1: mid,
            lft: mid_color,
            ..b
        });
        if mid - b.x1 > 1 {
            stack.push(TessBox {
                x2: mid,
                rgt: mid_color,
                ..b
            });
        }
    } else {
        let mid = (b.y1 + b.y2) >> 1;
        log::trace!("split {:?} across y={mid}", b.bounds());
        if b.y2 - mid <= 1 {
            return;
        }
        if b.lft == EdgeColor::Mixed {
            b.lft = EdgeColor::Unknown;
        }
        if b.rgt == EdgeColor::Mixed {
            b.rgt = EdgeColor::Unknown;
        }
        stack.push(TessBox {
            y1: mid,
            top: mid_color,
            ..b
        });
        if mid - b.y1 > 1 {
            stack.push(TessBox {
                y2: mid,
                bot: mid_color,
                ..b
            });
        }
    }
}

/// Pixel source, plot target and counters for one run.
struct Pass<'a, S, P: ?Sized> {
    source: S,
    plotter: &'a mut P,
    stats: TesseralStats,
}

impl<S, P> Pass<'_, S, P>
where
    S: PixelSource,
    P: Plotter + ?Sized,
{
    fn pixel(&mut self, x: u32, y: u32) -> Option<u32> {
        let color = self.source.color(x, y)?;
        self.plotter.plot(x, y, color);
        self.stats.computed_pixels += 1;
        Some(color)
    }

    fn scan_row(&mut self, x1: u32, x2: u32, y: u32) -> Option<EdgeColor> {
        self.source.start_line();
        let mut color = EdgeColor::Color(self.pixel(x1, y)?);
        for x in x1 + 1..=x2 {
            if EdgeColor::Color(self.pixel(x, y)?) != color {
                color = EdgeColor::Mixed;
            }
        }
        Some(color)
    }

    fn scan_col(&mut self, x: u32, y1: u32, y2: u32) -> Option<EdgeColor> {
        self.source.start_line();
        let mut color = EdgeColor::Color(self.pixel(x, y1)?);
        for y in y1 + 1..=y2 {
            if EdgeColor::Color(self.pixel(x, y)?) != color {
                color = EdgeColor::Mixed;
            }
        }
        Some(color)
    }

    /// Compute the line a bisection of `b` would follow.
    fn scan_midline(&mut self, b: &TessBox) -> Option<EdgeColor> {
        self.stats.mid_scans += 1;
        if b.is_wide() {
            self.scan_col((b.x1 + b.x2) >> 1, b.y1 + 1, b.y2 - 1)
        } else {
            self.scan_row(b.x1 + 1, b.x2 - 1, (b.y1 + b.y2) >> 1)
        }
    }
}
