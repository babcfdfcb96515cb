pub mod logging;
pub mod preloader;
