pub mod fanout;
pub mod specialist;
pub mod team;

pub use fanout::FanOutCoordinator;
pub use specialist::SpecialistInvoker;
pub use team::SynthesisInvoker;
