#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Projective 4x4 algebra, rational B-spline curves with Bezier span
//! analysis, and closest-approach and picking searches over indexed meshes.
//!
//! Everything lives under [`geom`]. The crate never installs a logger on its
//! own; call [`init_logger`] to raise the `log` max level when the
//! `debug_logs` feature is on.

pub mod geom;

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Raises the `log` max level to `Debug`.
        pub fn init_logger() {
            log::set_max_level(log::LevelFilter::Debug);
        }
    } else {
        /// No-op without the `debug_logs` feature.
        pub fn init_logger() {}
    }
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(all(feature = "debug_logs", not(target_arch = "wasm32")))]
        {
            println!("{}", format!($($t)*));
        }
    }};
}
