pub mod alerts;
pub mod devices;
pub mod users;

#[cfg(test)]
mod tests;
