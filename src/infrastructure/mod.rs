pub mod logging;
pub mod radio;
pub mod scan_worker;
