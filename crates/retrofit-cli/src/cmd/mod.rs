pub mod detect;
pub mod imports;
pub mod run;
pub mod tailwind;
