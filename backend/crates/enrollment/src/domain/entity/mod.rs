pub mod discipline;
pub mod enrollment;
pub mod subscription;

pub use discipline::Discipline;
pub use enrollment::Enrollment;
pub use subscription::Subscription;
