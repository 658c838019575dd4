pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod profile;
pub mod surgery;

pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use profile::*;
pub use surgery::*;
