pub mod campaign;
pub mod recipient;
