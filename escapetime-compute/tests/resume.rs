use escapetime_compute::{
    CancelAfter, CompletionStatus, Engine, InterruptFlag, NeverCancel, PixelBuffer, Plotter,
    TessBox, TesseralAccelerator, WorkItem, Worklist,
};
use std::thread;
use escapetime_core::{EngineConfig, FillColor, PixelRect};

fn disk(x: u32, y: u32) -> u32 {
    let (dx, dy) = (x as i64 - 20, y as i64 - 14);
    if dx * dx + dy * dy < 100 {
        1
    } else {
        2
    }
}

fn stripes(x: u32, _y: u32) -> u32 {
    x * 3 / 17
}

fn rings(x: u32, y: u32) -> u32 {
    let (dx, dy) = (x as i64 - 31, y as i64 - 20);
    ((dx * dx + dy * dy) / 150) as u32
}

/// Interrupt at every fill poll in turn and check that resuming from the
/// token reproduces the uninterrupted image.
fn check_resume_everywhere(shape: fn(u32, u32) -> u32, width: u32, height: u32) -> u32 {
    let tess = TesseralAccelerator::new(FillColor::BoxColor, 256).with_poll_intervals(1, 1);
    let rect = PixelRect::new(0, 0, width, height);
    let compute = |x: u32, y: u32| Some(shape(x, y));

    let mut full = PixelBuffer::new(width, height);
    assert!(tess.run(rect, None, compute, &mut full, &NeverCancel).status.is_complete());

    let mut interruptions = 0;
    for polls in 1..5000 {
        let mut buffer = PixelBuffer::new(width, height);
        let first = tess.run(rect, None, compute, &mut buffer, &CancelAfter::new(polls));
        let token = match first.status {
            CompletionStatus::Complete => break,
            CompletionStatus::Interrupted(WorkItem::Tesseral {
                resume: Some(token),
                ..
            }) => token,
            other => panic!("unexpected status {other:?} after {polls} polls"),
        };
        interruptions += 1;

        let stack = token.replay(TessBox::new(&rect)).unwrap();
        assert_eq!(stack.last().map(|b| b.x1), Some(token.x));
        assert_eq!(stack.last().map(|b| b.y1), Some(token.y));

        let second = tess.run(rect, Some(&token), compute, &mut buffer, &NeverCancel);
        assert!(second.status.is_complete());
        assert_eq!(second.stats.edge_scans, 0);
        assert_eq!(buffer, full, "resume after {polls} polls diverged");
    }
    interruptions
}

#[test]
fn test_resume_disk() {
    assert!(check_resume_everywhere(disk, 40, 30) > 100);
}

#[test]
fn test_resume_stripes() {
    assert!(check_resume_everywhere(stripes, 64, 48) > 100);
}

#[test]
fn test_resume_rings() {
    assert!(check_resume_everywhere(rings, 75, 41) > 100);
}

#[test]
fn test_resume_tall_disk() {
    assert!(check_resume_everywhere(disk, 33, 61) > 10);
}

#[test]
fn test_worklist_survives_interruption() {
    let config = EngineConfig {
        screen_width: 48,
        screen_height: 36,
        ..EngineConfig::default()
    };
    let rect = PixelRect::screen(48, 36);

    let mut reference = Engine::new(config.clone()).unwrap();
    let mut full = PixelBuffer::new(48, 36);
    assert!(reference
        .run_tesseral(rect, &mut full, &NeverCancel)
        .status
        .is_complete());

    let mut engine = Engine::new(config).unwrap().with_fill_poll_intervals(1, 1);
    let mut buffer = PixelBuffer::new(48, 36);
    let mut worklist: Worklist = [WorkItem::Tesseral { rect, resume: None }]
        .into_iter()
        .collect();

    let status = engine.run_worklist(&mut worklist, &mut buffer, &CancelAfter::new(3));
    assert!(!status.is_complete());
    assert_eq!(worklist.len(), 1);
    assert!(matches!(
        worklist.iter().next(),
        Some(WorkItem::Tesseral { resume: Some(_), .. })
    ));

    let json = worklist.to_json().unwrap();
    let mut restored = Worklist::from_json(&json).unwrap();
    assert_eq!(restored, worklist);

    let status = engine.run_worklist(&mut restored, &mut buffer, &NeverCancel);
    assert!(status.is_complete());
    assert!(restored.is_empty());

    for x in 0..48 {
        assert_eq!(buffer.get(x, 0), full.get(x, 0));
        assert_eq!(buffer.get(x, 35), full.get(x, 35));
    }
    for y in 0..36 {
        assert_eq!(buffer.get(0, y), full.get(0, y));
        assert_eq!(buffer.get(47, y), full.get(47, y));
    }
}

#[test]
fn test_worklist_covers_every_item() {
    let config = EngineConfig {
        screen_width: 32,
        screen_height: 32,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    let halves = [PixelRect::new(0, 0, 32, 16), PixelRect::new(0, 16, 32, 16)];
    let mut worklist: Worklist = halves
        .iter()
        .map(|&rect| WorkItem::Tesseral { rect, resume: None })
        .collect();

    let mut buffer = PixelBuffer::new(32, 32);
    buffer.clear(999);
    assert!(engine
        .run_worklist(&mut worklist, &mut buffer, &NeverCancel)
        .is_complete());
    assert!(buffer.pixels().iter().all(|&c| c != 999));
}

/// Raises an interrupt once a number of pixels have been plotted, the way a
/// keypress arrives while the image is being drawn.
struct InterruptAfterPlots {
    buffer: PixelBuffer,
    flag: InterruptFlag,
    plots_left: u32,
}

impl Plotter for InterruptAfterPlots {
    fn plot(&mut self, x: u32, y: u32, color: u32) {
        self.buffer.plot(x, y, color);
        self.plots_left = self.plots_left.saturating_sub(1);
        if self.plots_left == 0 {
            self.flag.raise();
        }
    }

    fn get_color(&self, x: u32, y: u32) -> u32 {
        self.buffer.get_color(x, y)
    }

    fn supports_spans(&self) -> bool {
        self.buffer.supports_spans()
    }

    fn put_span(&mut self, y: u32, x_start: u32, x_end: u32, color: u32) {
        self.buffer.put_span(y, x_start, x_end, color);
    }
}

#[test]
fn test_interrupt_flag_stops_tesseral_run() {
    let config = EngineConfig {
        screen_width: 48,
        screen_height: 36,
        periodicity: 0,
        ..EngineConfig::default()
    };
    let rect = PixelRect::screen(48, 36);
    let mut reference = Engine::new(config.clone()).unwrap();
    let mut full = PixelBuffer::new(48, 36);
    assert!(reference
        .run_tesseral(rect, &mut full, &NeverCancel)
        .status
        .is_complete());

    // the edges take 164 plots, so the flag goes up inside the box stack
    let flag = InterruptFlag::new();
    let mut plotter = InterruptAfterPlots {
        buffer: PixelBuffer::new(48, 36),
        flag: flag.clone(),
        plots_left: 200,
    };
    let mut engine = Engine::new(config).unwrap().with_fill_poll_intervals(1, 1);
    let first = engine.run_tesseral(rect, &mut plotter, &flag);
    let Some(item) = first.status.remaining().copied() else {
        panic!("run finished despite the interrupt");
    };
    assert!(matches!(item, WorkItem::Tesseral { resume: Some(_), .. }));

    flag.clear();
    plotter.plots_left = u32::MAX;
    assert!(engine.resume(&item, &mut plotter, &flag).is_complete());
    for x in 0..48 {
        assert_eq!(plotter.buffer.get(x, 0), full.get(x, 0));
        assert_eq!(plotter.buffer.get(x, 35), full.get(x, 35));
    }
}

#[test]
fn test_interrupt_from_another_thread_restarts_rect() {
    let config = EngineConfig {
        screen_width: 32,
        screen_height: 24,
        ..EngineConfig::default()
    };
    let rect = PixelRect::screen(32, 24);
    let mut engine = Engine::new(config).unwrap();
    let flag = InterruptFlag::new();
    let remote = flag.clone();
    thread::spawn(move || remote.raise()).join().unwrap();

    let mut buffer = PixelBuffer::new(32, 24);
    let run = engine.run_tesseral(rect, &mut buffer, &flag);
    assert_eq!(
        run.status,
        CompletionStatus::Interrupted(WorkItem::Tesseral { rect, resume: None })
    );
    assert_eq!(run.stats.edge_scans, 4);
    assert_eq!(run.stats.mid_scans, 0);
}
