mod service;

pub use service::QuarantineSweeper;
