pub mod pattern;
pub mod run;
pub mod settings;
pub mod strategy;
pub mod stream;
pub mod transcript;
pub mod vendor;

pub use pattern::*;
pub use run::*;
pub use settings::*;
pub use strategy::*;
pub use stream::*;
pub use transcript::*;
pub use vendor::*;
