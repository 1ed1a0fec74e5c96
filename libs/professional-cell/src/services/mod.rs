pub mod professional;
pub mod validation;

pub use professional::ProfessionalService;
