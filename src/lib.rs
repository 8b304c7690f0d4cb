#[allow(non_snake_case)]
pub mod StarFormation;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
