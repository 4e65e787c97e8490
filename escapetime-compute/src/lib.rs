pub mod calculator;
pub mod cancellation;
pub mod engine;
pub mod fractals;
pub mod julibrot;
pub mod orbit;
pub mod plotter;
pub mod tesseral;
pub mod worklist;

pub use calculator::{Calculator, PlaneMapping};
pub use cancellation::{CancelAfter, CancellationChecker, InterruptFlag, NeverCancel};
pub use engine::Engine;
pub use fractals::{create_orbit_function, IntegerPower, Lambda, OrbitFunction, Quadratic, Seeding};
pub use julibrot::{
    DepthRay, JulibrotProjector, JulibrotRun, JulibrotStats, Perspective, Projection,
    ZlineOutcome,
};
pub use orbit::{OrbitIterator, Periodicity};
pub use plotter::{MirrorPlotter, PixelBuffer, Plotter};
pub use tesseral::{
    check_col, check_row, EdgeColor, PixelSource, TessBox, TesseralAccelerator, TesseralRun,
    TesseralStats,
};
pub use worklist::{CompletionStatus, ResumeToken, WorkItem, Worklist};

// Re-export core types for convenience
pub use escapetime_core::*;
