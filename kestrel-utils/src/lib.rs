pub mod fisheryates;
pub mod indexed;
