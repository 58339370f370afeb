pub mod email;
pub mod name;
pub mod policy;
pub mod recipient;
