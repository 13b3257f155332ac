pub mod controller;
pub mod debounce;
pub mod frame;
pub mod input;
pub mod navigation;
pub mod search;
pub mod tooltip;
