// Output generation module

pub mod diagrams;
pub mod site;
pub mod templates;

pub use diagrams::*;
pub use site::*;
pub use templates::*;
