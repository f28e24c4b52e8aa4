pub mod colors;
pub mod controls;
pub mod font;
pub mod inputs;
pub mod lights;
pub mod surface;
pub mod timer;
