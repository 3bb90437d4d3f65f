pub mod patterns;
pub mod run;
pub mod transcript;

pub use patterns::*;
pub use run::*;
pub use transcript::*;
